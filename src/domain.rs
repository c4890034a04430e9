//! Enumeration domains.
//!
//! An [`EnumDomain`] is an ordered set of `(symbol, value)` entries. Fields
//! declared over a domain are encoded as integers of the domain's width,
//! and may only ever hold one of the domain's values.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::error::{DomainError, Result};

#[derive(Debug, Eq, PartialEq)]
pub struct EnumDomain {
    name: String,
    entries: Vec<(String, i64)>,
    width: u32,
    signed: bool,
}

impl EnumDomain {
    /// Create a domain from explicit `(symbol, value)` entries.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (S, i64)>,
    ) -> Result<Rc<Self>> {
        let name = name.into();
        let entries: Vec<(String, i64)> = entries.into_iter().map(|(s, v)| (s.into(), v)).collect();

        if entries.is_empty() {
            return Err(DomainError::Empty { domain: name }.into());
        }

        let mut symbols = HashSet::new();
        let mut values = HashSet::new();
        for (symbol, value) in &entries {
            if !symbols.insert(symbol.as_str()) {
                return Err(DomainError::Duplicate {
                    domain: name,
                    entry: symbol.clone(),
                }
                .into());
            }
            if !values.insert(*value) {
                return Err(DomainError::Duplicate {
                    domain: name,
                    entry: value.to_string(),
                }
                .into());
            }
        }

        let (width, signed) = encoding_of(entries.iter().map(|&(_, v)| v));
        Ok(Rc::new(Self {
            name,
            entries,
            width,
            signed,
        }))
    }

    /// Create a domain whose symbols are numbered `0, 1, 2, ...` in order.
    pub fn sequential<S: Into<String>>(
        name: impl Into<String>,
        symbols: impl IntoIterator<Item = S>,
    ) -> Result<Rc<Self>> {
        Self::new(name, symbols.into_iter().zip(0..))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width of the encoded values.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|&(_, v)| v)
    }

    pub fn members(self: &Rc<Self>) -> impl Iterator<Item = EnumValue> + '_ {
        (0..self.entries.len()).map(move |index| EnumValue {
            domain: Rc::clone(self),
            index,
        })
    }

    /// Look up a member by symbol.
    pub fn member(self: &Rc<Self>, symbol: &str) -> Result<EnumValue, DomainError> {
        self.entries
            .iter()
            .position(|(s, _)| s == symbol)
            .map(|index| EnumValue {
                domain: Rc::clone(self),
                index,
            })
            .ok_or_else(|| DomainError::NotAMember {
                domain: self.name.clone(),
                value: symbol.to_string(),
            })
    }

    /// Look up a member by its encoded value.
    pub fn from_value(self: &Rc<Self>, value: i128) -> Result<EnumValue, DomainError> {
        self.entries
            .iter()
            .position(|&(_, v)| i128::from(v) == value)
            .map(|index| EnumValue {
                domain: Rc::clone(self),
                index,
            })
            .ok_or_else(|| DomainError::NotAMember {
                domain: self.name.clone(),
                value: value.to_string(),
            })
    }
}

/// Minimal `(width, signed)` able to encode all the given values.
fn encoding_of(values: impl Iterator<Item = i64> + Clone) -> (u32, bool) {
    let signed = values.clone().any(|v| v < 0);
    let width = values
        .map(|v| {
            if signed {
                // Bits for the magnitude plus the sign bit.
                let magnitude = if v < 0 { !v } else { v };
                65 - magnitude.leading_zeros()
            } else {
                64 - v.leading_zeros()
            }
        })
        .max()
        .unwrap_or(1);
    (width.max(1), signed)
}

/// A member of an [`EnumDomain`].
#[derive(Debug, Clone)]
pub struct EnumValue {
    domain: Rc<EnumDomain>,
    index: usize,
}

impl EnumValue {
    pub fn domain(&self) -> &Rc<EnumDomain> {
        &self.domain
    }

    pub fn symbol(&self) -> &str {
        &self.domain.entries[self.index].0
    }

    pub fn value(&self) -> i64 {
        self.domain.entries[self.index].1
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.domain, &other.domain) && self.index == other.index
    }
}

impl Eq for EnumValue {}

impl Display for EnumValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.domain.name, self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    use crate::error::Error;

    #[test]
    fn test_sequential_domain() {
        let color = EnumDomain::sequential("Color", ["RED", "GREEN", "BLUE"]).unwrap();
        assert_eq!(color.len(), 3);
        assert_eq!(color.width(), 2);
        assert!(!color.is_signed());
        assert_eq!(color.values().collect::<Vec<_>>(), vec![0, 1, 2]);

        let green = color.member("GREEN").unwrap();
        assert_eq!(green.value(), 1);
        assert_eq!(green.to_string(), "Color::GREEN");
        assert_eq!(color.from_value(1).unwrap(), green);
    }

    #[test]
    fn test_signed_domain_width() {
        let d = EnumDomain::new("Delta", [("DOWN", -1), ("SAME", 0), ("UP", 1)]).unwrap();
        assert!(d.is_signed());
        assert_eq!(d.width(), 2);

        let d = EnumDomain::new("Wide", [("LOW", -128), ("HIGH", 127)]).unwrap();
        assert_eq!(d.width(), 8);

        let d = EnumDomain::new("Single", [("ONLY", 0)]).unwrap();
        assert_eq!(d.width(), 1);
    }

    #[test]
    fn test_unknown_member() {
        let color = EnumDomain::sequential("Color", ["RED", "GREEN"]).unwrap();
        assert_eq!(
            color.member("PURPLE"),
            Err(DomainError::NotAMember {
                domain: "Color".to_string(),
                value: "PURPLE".to_string(),
            })
        );
        assert!(color.from_value(5).is_err());
    }

    #[test]
    fn test_invalid_domains() {
        let empty: [(&str, i64); 0] = [];
        assert!(matches!(
            EnumDomain::new("Empty", empty),
            Err(Error::Domain(DomainError::Empty { .. }))
        ));
        assert!(matches!(
            EnumDomain::new("Dup", [("A", 0), ("A", 1)]),
            Err(Error::Domain(DomainError::Duplicate { .. }))
        ));
        assert!(matches!(
            EnumDomain::new("Dup", [("A", 0), ("B", 0)]),
            Err(Error::Domain(DomainError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_members_of_different_domains_differ() {
        let a = EnumDomain::sequential("A", ["X"]).unwrap();
        let b = EnumDomain::sequential("B", ["X"]).unwrap();
        assert_ne!(a.member("X").unwrap(), b.member("X").unwrap());
        assert_eq!(a.members().count(), 1);
    }
}
