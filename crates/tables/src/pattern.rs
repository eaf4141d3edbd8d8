//! Element-wise key patterns for table selects.

use vellum_types::Noun;

/// Equality constraints on the leading list elements of a key.
///
/// A key matches when, for each pattern element `i`, the key is a chain of
/// cells whose `i`-th head equals that element. The key may continue past
/// the pattern (deeper elements and improper tails are unconstrained), so a
/// pattern acts as an element-wise prefix filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    elements: Vec<Noun>,
}

impl KeyPattern {
    /// Constrain the first `elements.len()` list elements of the key.
    pub fn prefix(elements: Vec<Noun>) -> Self {
        KeyPattern { elements }
    }

    /// The constrained elements.
    pub fn elements(&self) -> &[Noun] {
        &self.elements
    }

    /// Whether `key` satisfies every constraint.
    pub fn matches(&self, key: &Noun) -> bool {
        let mut cursor = key;
        for want in &self.elements {
            match cursor.as_cell() {
                Some((head, tail)) if head == want => cursor = tail,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(parts: &[&str]) -> Noun {
        Noun::list(parts.iter().map(|p| Noun::from(*p)))
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let pattern = KeyPattern::prefix(vec![]);
        assert!(pattern.matches(&key(&["a", "b"])));
        assert!(pattern.matches(&Noun::from(7u64)));
    }

    #[test]
    fn prefix_elements_must_match_in_order() {
        let pattern = KeyPattern::prefix(vec![Noun::from("a")]);
        assert!(pattern.matches(&key(&["a"])));
        assert!(pattern.matches(&key(&["a", "1"])));
        assert!(pattern.matches(&key(&["a", "2", "x"])));
        assert!(!pattern.matches(&key(&["b", "1"])));
        assert!(!pattern.matches(&Noun::from("a")));
    }

    #[test]
    fn improper_tails_are_unconstrained() {
        let pattern = KeyPattern::prefix(vec![Noun::from("ns")]);
        let improper = Noun::cell(Noun::from("ns"), Noun::from("leaf"));
        assert!(pattern.matches(&improper));
    }

    #[test]
    fn pattern_longer_than_key_fails() {
        let pattern = KeyPattern::prefix(vec![Noun::from("a"), Noun::from("b")]);
        assert!(!pattern.matches(&key(&["a"])));
    }
}
