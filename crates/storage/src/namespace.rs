//! Namespaced-key codec.
//!
//! A namespace is an ordered list of atoms prepended (as list elements) to a
//! logical key to form its physical name. The empty namespace is the
//! identity. For qualified keys `[version, key | tail]` only the middle
//! element is namespaced; the head version and the improper tail are
//! preserved untouched.

use vellum_types::{Atom, Noun, Version};

use crate::error::{BadShapeSnafu, NamespaceSnafu, Result};

/// Prepend the namespace elements to a key.
///
/// Concatenation happens at the list head, so improper tails survive.
pub fn namespace(ns: &[Atom], key: &Noun) -> Noun {
    ns.iter().rev().fold(key.clone(), |tail, atom| {
        Noun::cell(Noun::Atom(atom.clone()), tail)
    })
}

/// Strip the exact namespace prefix from a physical key.
///
/// Fails when the prefix does not match element-for-element.
pub fn denamespace(ns: &[Atom], nskey: &Noun) -> Result<Noun> {
    let mut cursor = nskey;
    for atom in ns {
        match cursor.as_cell() {
            Some((head, tail)) if head.as_atom() == Some(atom) => cursor = tail,
            _ => {
                return NamespaceSnafu {
                    key: nskey.to_string(),
                }
                .fail();
            },
        }
    }
    Ok(cursor.clone())
}

/// Build the qualified key `[version, nskey | 0]` for an already-namespaced key.
pub fn qualified_key(version: Version, nskey: &Noun) -> Noun {
    Noun::cell(
        Noun::atom(version),
        Noun::cell(nskey.clone(), Noun::zero()),
    )
}

/// Namespace the middle element of a qualified key `[version, key | tail]`.
pub fn namespace_qualified(ns: &[Atom], qkey: &Noun) -> Result<Noun> {
    let (version, key, tail) = split_qualified(qkey)?;
    Ok(Noun::cell(
        version.clone(),
        Noun::cell(namespace(ns, key), tail.clone()),
    ))
}

/// Strip the namespace from the middle element of a qualified key.
pub fn denamespace_qualified(ns: &[Atom], qkey: &Noun) -> Result<Noun> {
    let (version, key, tail) = split_qualified(qkey)?;
    Ok(Noun::cell(
        version.clone(),
        Noun::cell(denamespace(ns, key)?, tail.clone()),
    ))
}

/// Decompose `[version, key | tail]`, rejecting other shapes.
pub fn split_qualified(qkey: &Noun) -> Result<(&Noun, &Noun, &Noun)> {
    let shape_err = || BadShapeSnafu {
        key: qkey.to_string(),
    };
    let (version, rest) = qkey.as_cell().ok_or_else(|| shape_err().build())?;
    let (key, tail) = rest.as_cell().ok_or_else(|| shape_err().build())?;
    Ok((version, key, tail))
}
