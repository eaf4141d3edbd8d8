//! Commitment-tree binding over the commitments table.
//!
//! A fixed-shape incremental Merkle accumulator: depth 32, arity 2, SHA-256
//! over the concatenation of the two children. Leaves append left to right;
//! unfilled subtrees carry precomputed empty digests rooted in the hash of
//! empty input.
//!
//! Table layout, keyed by slot atom:
//! - slots `0..32`: the filled-subtree frontier, one node per level
//! - slot `32`: leaf count
//! - slot `33`: current root

use std::sync::OnceLock;

use vellum_tables::{Row, TableManager, TableTxn, TxOutcome};
use vellum_types::{EMPTY_HASH, Hash, Noun, decode, encode, sha256_pair};

/// Tree depth: the accumulator holds up to 2^32 leaves.
pub const TREE_DEPTH: usize = 32;

/// Fixed arity; every interior node hashes exactly two children.
pub const TREE_ARITY: usize = 2;

const COUNT_SLOT: u64 = TREE_DEPTH as u64;
const ROOT_SLOT: u64 = TREE_DEPTH as u64 + 1;

/// Digests of all-empty subtrees, by level. `zeros()[TREE_DEPTH]` is the
/// root of an empty tree.
fn zeros() -> &'static [Hash; TREE_DEPTH + 1] {
    static ZEROS: OnceLock<[Hash; TREE_DEPTH + 1]> = OnceLock::new();
    ZEROS.get_or_init(|| {
        let mut digests = [EMPTY_HASH; TREE_DEPTH + 1];
        for level in 0..TREE_DEPTH {
            digests[level + 1] = sha256_pair(&digests[level], &digests[level]);
        }
        digests
    })
}

fn slot_key(slot: u64) -> Noun {
    Noun::atom(slot)
}

/// The accumulator, bound to its backing table.
#[derive(Clone)]
pub struct CommitmentTree<M: TableManager> {
    tables: M,
    table: String,
}

impl<M: TableManager> CommitmentTree<M> {
    /// Bind the accumulator to `table`.
    pub fn new(tables: M, table: impl Into<String>) -> Self {
        CommitmentTree {
            tables,
            table: table.into(),
        }
    }

    /// Append a leaf digest, returning its index.
    pub fn append(&self, leaf: Hash) -> TxOutcome<u64> {
        self.tables.transaction(|txn| {
            let count = self.read_count(txn)?;
            let mut node = leaf;
            let mut index = count;
            for level in 0..TREE_DEPTH {
                if index % 2 == 0 {
                    // This node becomes the frontier: its right sibling is
                    // still the empty subtree.
                    txn.write(&self.table, Row::new(slot_key(level as u64), encode(&node)?))?;
                    node = sha256_pair(&node, &zeros()[level]);
                } else {
                    let sibling = self.read_frontier(txn, level)?;
                    node = sha256_pair(&sibling, &node);
                }
                index /= 2;
            }
            txn.write(&self.table, Row::new(slot_key(ROOT_SLOT), encode(&node)?))?;
            txn.write(
                &self.table,
                Row::new(slot_key(COUNT_SLOT), encode(&(count + 1))?),
            )?;
            Ok(count)
        })
    }

    /// The current root; the empty-tree digest before any append.
    pub fn root(&self) -> TxOutcome<Hash> {
        self.tables.transaction(|txn| {
            match txn.read(&self.table, &slot_key(ROOT_SLOT))?.into_iter().next() {
                Some(row) => Ok(decode(&row.value)?),
                None => Ok(zeros()[TREE_DEPTH]),
            }
        })
    }

    /// Number of appended leaves.
    pub fn leaf_count(&self) -> TxOutcome<u64> {
        self.tables.transaction(|txn| self.read_count(txn))
    }

    fn read_count<T: TableTxn>(&self, txn: &T) -> vellum_tables::Result<u64> {
        match txn.read(&self.table, &slot_key(COUNT_SLOT))?.into_iter().next() {
            Some(row) => Ok(decode(&row.value)?),
            None => Ok(0),
        }
    }

    fn read_frontier<T: TableTxn>(
        &self,
        txn: &T,
        level: usize,
    ) -> vellum_tables::Result<Hash> {
        match txn
            .read(&self.table, &slot_key(level as u64))?
            .into_iter()
            .next()
        {
            Some(row) => Ok(decode(&row.value)?),
            // Unreachable for odd indices; the empty digest keeps the walk total.
            None => Ok(zeros()[level]),
        }
    }
}

#[cfg(test)]
mod tests {
    use vellum_tables::{MemoryTables, TableManager};
    use vellum_types::sha256;

    use super::*;

    fn tree() -> CommitmentTree<MemoryTables> {
        let tables = MemoryTables::new();
        tables.create_table("commitments").expect("create");
        CommitmentTree::new(tables, "commitments")
    }

    /// Root of a tree holding exactly the given leaves, computed naively.
    fn expected_root(leaves: &[Hash]) -> Hash {
        let mut level: Vec<Hash> = leaves.to_vec();
        for depth in 0..TREE_DEPTH {
            if level.len() % 2 == 1 {
                level.push(zeros()[depth]);
            }
            level = level
                .chunks(2)
                .map(|pair| sha256_pair(&pair[0], &pair[1]))
                .collect();
        }
        level[0]
    }

    #[test]
    fn empty_root_is_the_empty_digest() {
        assert_eq!(tree().root().committed(), Some(zeros()[TREE_DEPTH]));
    }

    #[test]
    fn append_assigns_sequential_indices() {
        let tree = tree();
        assert_eq!(tree.append(sha256(b"a")).committed(), Some(0));
        assert_eq!(tree.append(sha256(b"b")).committed(), Some(1));
        assert_eq!(tree.leaf_count().committed(), Some(2));
    }

    #[test]
    fn roots_match_a_naive_computation() {
        let tree = tree();
        let leaves = [sha256(b"a"), sha256(b"b"), sha256(b"c")];
        for (i, leaf) in leaves.iter().enumerate() {
            tree.append(*leaf);
            assert_eq!(
                tree.root().committed(),
                Some(expected_root(&leaves[..=i])),
                "root after {} leaves",
                i + 1
            );
        }
    }

    #[test]
    fn append_changes_the_root() {
        let tree = tree();
        let empty = tree.root().committed().expect("root");
        tree.append(sha256(b"leaf"));
        assert_ne!(tree.root().committed().expect("root"), empty);
    }
}
