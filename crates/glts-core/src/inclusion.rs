/// Inclusion predicate derived from a combiner.
///
/// A property `a` is included in `b` under a combiner when combining them
/// yields `b` again. This assumes the combiner's result on combinable inputs
/// is either equal to both operands or to neither.
use crate::combine::Combiner;

// ---------------------------------------------------------------------------
// Inclusion
// ---------------------------------------------------------------------------

/// Decides inclusion between two property values under a combiner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inclusion<C> {
    combiner: C,
}

impl<C> Inclusion<C> {
    /// Creates an inclusion predicate on top of `combiner`.
    pub fn new(combiner: C) -> Self {
        Self { combiner }
    }

    /// Returns `true` if `left` is included in `right`:
    /// `combine(left, right) == right`.
    ///
    /// Non-combinable operands are never included in each other.
    pub fn is_included_in<T>(&self, left: &T, right: &T) -> bool
    where
        C: Combiner<T>,
        T: PartialEq,
    {
        self.combiner.are_combinable(left, right)
            && self.combiner.combine(left, right) == *right
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
