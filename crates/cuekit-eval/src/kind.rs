//! Value kinds
//!
//! A [`KindSet`] is the set of kinds a value may still take. Type keywords
//! map to kind sets (`number` is `int | float`), and meeting two
//! constraints intersects their sets.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A set of value kinds, stored as a bitmask
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);
    pub const NULL: KindSet = KindSet(1);
    pub const BOOL: KindSet = KindSet(1 << 1);
    pub const INT: KindSet = KindSet(1 << 2);
    pub const FLOAT: KindSet = KindSet(1 << 3);
    pub const STRING: KindSet = KindSet(1 << 4);
    pub const BYTES: KindSet = KindSet(1 << 5);
    pub const STRUCT: KindSet = KindSet(1 << 6);
    pub const LIST: KindSet = KindSet(1 << 7);
    pub const NUMBER: KindSet = KindSet(Self::INT.0 | Self::FLOAT.0);
    pub const ALL: KindSet = KindSet(u8::MAX);

    const NAMES: [(KindSet, &'static str); 8] = [
        (Self::NULL, "null"),
        (Self::BOOL, "bool"),
        (Self::INT, "int"),
        (Self::FLOAT, "float"),
        (Self::STRING, "string"),
        (Self::BYTES, "bytes"),
        (Self::STRUCT, "struct"),
        (Self::LIST, "list"),
    ];

    pub const fn union(self, other: KindSet) -> KindSet {
        KindSet(self.0 | other.0)
    }

    pub const fn intersect(self, other: KindSet) -> KindSet {
        KindSet(self.0 & other.0)
    }

    /// Whether every kind in `other` is also in `self`
    pub const fn contains(self, other: KindSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Kind set named by a predeclared type identifier
    pub fn from_keyword(name: &str) -> Option<KindSet> {
        match name {
            "bool" => Some(Self::BOOL),
            "int" => Some(Self::INT),
            "float" => Some(Self::FLOAT),
            "number" => Some(Self::NUMBER),
            "string" => Some(Self::STRING),
            "bytes" => Some(Self::BYTES),
            _ => None,
        }
    }
}

impl BitOr for KindSet {
    type Output = KindSet;

    fn bitor(self, rhs: KindSet) -> KindSet {
        self.union(rhs)
    }
}

impl BitAnd for KindSet {
    type Output = KindSet;

    fn bitand(self, rhs: KindSet) -> KindSet {
        self.intersect(rhs)
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("_");
        }
        if *self == Self::NUMBER {
            return f.write_str("number");
        }
        if self.is_empty() {
            return f.write_str("_|_");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(kind, _)| self.contains(*kind))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KindSet({})", self)
    }
}
