// ============================================================================
// Domain Lattice
// Subset classification of number systems and their infinity policies
// ============================================================================

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a domain represents infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InfinityPolicy {
    /// No infinite values exist
    None,
    /// Distinct +∞ and −∞
    Signed,
    /// A single point at infinity
    Unsigned,
}

/// Number system a representation lives in.
///
/// The subset order is
///
/// ```text
/// Integers ⊆ Rationals ⊆ Reals ⊆ Complex ⊆ ExtendedComplex
///                         Reals ⊆ ExtendedReals ⊆ ExtendedComplex
/// ```
///
/// Reals has two immediate supersets, so the order is a lattice rather than
/// a chain: the join of Complex and ExtendedReals is ExtendedComplex and
/// their meet is Reals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Domain {
    Integers,
    Rationals,
    Reals,
    Complex,
    ExtendedReals,
    ExtendedComplex,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Integers,
        Domain::Rationals,
        Domain::Reals,
        Domain::Complex,
        Domain::ExtendedReals,
        Domain::ExtendedComplex,
    ];

    const fn index(self) -> usize {
        match self {
            Domain::Integers => 0,
            Domain::Rationals => 1,
            Domain::Reals => 2,
            Domain::Complex => 3,
            Domain::ExtendedReals => 4,
            Domain::ExtendedComplex => 5,
        }
    }

    // SUBSET[a][b]: a ⊆ b
    const SUBSET: [[bool; 6]; 6] = [
        // Int   Rat    Real   Cplx   XReal  XCplx
        [true, true, true, true, true, true],     // Integers
        [false, true, true, true, true, true],    // Rationals
        [false, false, true, true, true, true],   // Reals
        [false, false, false, true, false, true], // Complex
        [false, false, false, false, true, true], // ExtendedReals
        [false, false, false, false, false, true], // ExtendedComplex
    ];

    /// Reflexive subset test.
    pub const fn is_subset_of(self, other: Domain) -> bool {
        Self::SUBSET[self.index()][other.index()]
    }

    /// Least domain containing both.
    pub const fn join(self, other: Domain) -> Domain {
        if self.is_subset_of(other) {
            return other;
        }
        if other.is_subset_of(self) {
            return self;
        }
        // the only incomparable pair is Complex / ExtendedReals
        Domain::ExtendedComplex
    }

    /// Greatest domain contained in both.
    pub const fn meet(self, other: Domain) -> Domain {
        if self.is_subset_of(other) {
            return self;
        }
        if other.is_subset_of(self) {
            return other;
        }
        Domain::Reals
    }

    pub const fn infinity_policy(self) -> InfinityPolicy {
        match self {
            Domain::Integers | Domain::Rationals | Domain::Reals | Domain::Complex => {
                InfinityPolicy::None
            },
            Domain::ExtendedReals => InfinityPolicy::Signed,
            Domain::ExtendedComplex => InfinityPolicy::Unsigned,
        }
    }

    /// Whether values of this domain can ever be infinite.
    pub const fn admits_infinity(self) -> bool {
        !matches!(self.infinity_policy(), InfinityPolicy::None)
    }

    /// Whether the domain is ordered, so signs are meaningful.
    pub const fn is_ordered(self) -> bool {
        matches!(
            self,
            Domain::Integers | Domain::Rationals | Domain::Reals | Domain::ExtendedReals
        )
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Integers => "integers",
            Domain::Rationals => "rationals",
            Domain::Reals => "reals",
            Domain::Complex => "complex",
            Domain::ExtendedReals => "extended reals",
            Domain::ExtendedComplex => "extended complex",
        };
        f.write_str(name)
    }
}

/// Static domain of a concrete representation.
pub trait Classified {
    const DOMAIN: Domain;

    /// Compile-time answer to "can this type hold an infinity".
    const ADMITS_INFINITY: bool = Self::DOMAIN.admits_infinity();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_chain() {
        assert!(Domain::Integers.is_subset_of(Domain::Rationals));
        assert!(Domain::Rationals.is_subset_of(Domain::Reals));
        assert!(Domain::Reals.is_subset_of(Domain::Complex));
        assert!(Domain::Reals.is_subset_of(Domain::ExtendedReals));
        assert!(Domain::ExtendedReals.is_subset_of(Domain::ExtendedComplex));
        assert!(Domain::Complex.is_subset_of(Domain::ExtendedComplex));
        assert!(!Domain::Complex.is_subset_of(Domain::ExtendedReals));
        assert!(!Domain::ExtendedReals.is_subset_of(Domain::Complex));
    }

    #[test]
    fn test_subset_is_partial_order() {
        for a in Domain::ALL {
            assert!(a.is_subset_of(a));
            for b in Domain::ALL {
                if a != b && a.is_subset_of(b) {
                    assert!(!b.is_subset_of(a));
                }
                for c in Domain::ALL {
                    if a.is_subset_of(b) && b.is_subset_of(c) {
                        assert!(a.is_subset_of(c));
                    }
                }
            }
        }
    }

    #[test]
    fn test_join_and_meet() {
        assert_eq!(Domain::Integers.join(Domain::Reals), Domain::Reals);
        assert_eq!(
            Domain::Complex.join(Domain::ExtendedReals),
            Domain::ExtendedComplex
        );
        assert_eq!(Domain::Complex.meet(Domain::ExtendedReals), Domain::Reals);
        for a in Domain::ALL {
            for b in Domain::ALL {
                assert!(a.is_subset_of(a.join(b)));
                assert!(b.is_subset_of(a.join(b)));
                assert!(a.meet(b).is_subset_of(a));
                assert!(a.meet(b).is_subset_of(b));
            }
        }
    }

    #[test]
    fn test_infinity_policy() {
        assert!(!Domain::Integers.admits_infinity());
        assert!(!Domain::Complex.admits_infinity());
        assert_eq!(Domain::ExtendedReals.infinity_policy(), InfinityPolicy::Signed);
        assert_eq!(
            Domain::ExtendedComplex.infinity_policy(),
            InfinityPolicy::Unsigned
        );
    }

    #[test]
    fn test_classified_const() {
        struct Whole;
        impl Classified for Whole {
            const DOMAIN: Domain = Domain::Integers;
        }
        assert!(!Whole::ADMITS_INFINITY);
    }
}
