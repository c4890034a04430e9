use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Handle to a BDD node, possibly complemented.
///
/// The sign of the inner value encodes the complement edge: `-r` denotes the
/// negation of the function `r`. The absolute value is the index of the node
/// in the manager's storage. Index `0` is never used.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Ref(i32);

impl Ref {
    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Drop the complement bit.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }

    /// Index of the referenced node.
    pub const fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Return the internal representation of the reference.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate_twice() {
        let r = Ref::positive(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
        assert_eq!((-r).regular(), r);
    }

    #[test]
    fn test_display() {
        let r = Ref::positive(3);
        assert_eq!(r.to_string(), "@3");
        assert_eq!((-r).to_string(), "~@3");
    }
}
