/// Projector operators over state and transition properties.
///
/// A projector answers what part of a property survives projection along a
/// given element. `None` means the property is fully eliminated, which in
/// turn eliminates the state or transition that carried it (see
/// [`crate::glts::Glts::project`]).
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Projector trait
// ---------------------------------------------------------------------------

/// Projects a property of type `T` along an element of type `U`.
pub trait Projector<T, U> {
    /// Returns the part of `property` that survives projection along
    /// `along`, or `None` when the property is fully eliminated.
    fn project(&self, property: &T, along: &U) -> Option<T>;
}

// ---------------------------------------------------------------------------
// IdentityProjector
// ---------------------------------------------------------------------------

/// Projection that keeps every property unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityProjector;

impl<T: Clone, U> Projector<T, U> for IdentityProjector {
    fn project(&self, property: &T, _along: &U) -> Option<T> {
        Some(property.clone())
    }
}

// ---------------------------------------------------------------------------
// SetProjector
// ---------------------------------------------------------------------------

/// Projects each element of a set and keeps the survivors.
///
/// The result is present even when no element survives: an empty set is a
/// legitimate property value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetProjector<P> {
    element: P,
}

impl<P> SetProjector<P> {
    /// Creates a set projector from an element projector.
    pub fn new(element: P) -> Self {
        Self { element }
    }
}

impl<T, U, P> Projector<BTreeSet<T>, U> for SetProjector<P>
where
    T: Clone + Ord,
    P: Projector<T, U>,
{
    fn project(&self, property: &BTreeSet<T>, along: &U) -> Option<BTreeSet<T>> {
        Some(
            property
                .iter()
                .filter_map(|element| self.element.project(element, along))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// OptionProjector
// ---------------------------------------------------------------------------

/// Projects an optional property through an inner projector.
///
/// An absent value survives as absent; a present value is eliminated iff the
/// inner projection eliminates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionProjector<P> {
    inner: P,
}

impl<P> OptionProjector<P> {
    /// Creates an option projector from an inner projector.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<T, U, P: Projector<T, U>> Projector<Option<T>, U> for OptionProjector<P> {
    fn project(&self, property: &Option<T>, along: &U) -> Option<Option<T>> {
        match property {
            None => Some(None),
            Some(value) => self.inner.project(value, along).map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// MappedProjector
// ---------------------------------------------------------------------------

/// Projects a property type through a view onto a base type.
///
/// The counterpart of [`crate::combine::MappedCombiner`]: `embed` extracts
/// the base view, the base projector projects it, and `rebuild` folds the
/// surviving view back into the property type.
#[derive(Debug, Clone, Copy)]
pub struct MappedProjector<P, T, B> {
    base: P,
    embed: fn(&T) -> B,
    rebuild: fn(&T, B) -> T,
}

impl<P, T, B> MappedProjector<P, T, B> {
    /// Creates a mapped projector from a base projector and the
    /// embed/rebuild function pair.
    pub fn new(base: P, embed: fn(&T) -> B, rebuild: fn(&T, B) -> T) -> Self {
        Self {
            base,
            embed,
            rebuild,
        }
    }
}

impl<T, B, U, P: Projector<B, U>> Projector<T, U> for MappedProjector<P, T, B> {
    fn project(&self, property: &T, along: &U) -> Option<T> {
        self.base
            .project(&(self.embed)(property), along)
            .map(|surviving| (self.rebuild)(property, surviving))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Projector used as a building block: keeps values equal to `along`.
    #[derive(Debug, Clone, Copy)]
    struct KeepEqual;

    impl Projector<u32, u32> for KeepEqual {
        fn project(&self, property: &u32, along: &u32) -> Option<u32> {
            (property == along).then_some(*property)
        }
    }

    #[test]
    fn identity_projector_keeps_everything() {
        let p = IdentityProjector;
        assert_eq!(Projector::<u32, u32>::project(&p, &3, &9), Some(3));
    }

    #[test]
    fn set_projector_keeps_survivors() {
        let p = SetProjector::new(KeepEqual);
        let set: BTreeSet<u32> = [1, 2, 2, 3].into_iter().collect();
        assert_eq!(p.project(&set, &2), Some([2].into_iter().collect()));
    }

    #[test]
    fn set_projector_survives_as_empty_set() {
        let p = SetProjector::new(KeepEqual);
        let set: BTreeSet<u32> = [1, 3].into_iter().collect();
        assert_eq!(p.project(&set, &2), Some(BTreeSet::new()));
    }

    #[test]
    fn option_projector_keeps_absent_values() {
        let p = OptionProjector::new(KeepEqual);
        assert_eq!(p.project(&None, &2), Some(None));
        assert_eq!(p.project(&Some(2), &2), Some(Some(2)));
        assert_eq!(p.project(&Some(1), &2), None);
    }

    #[test]
    fn mapped_projector_rebuilds_the_property() {
        // Project (value, label) pairs through their value; the label rides
        // along unchanged.
        let p = MappedProjector::new(
            KeepEqual,
            |property: &(u32, char)| property.0,
            |property: &(u32, char), surviving| (surviving, property.1),
        );
        assert_eq!(p.project(&(2, 'x'), &2), Some((2, 'x')));
        assert_eq!(p.project(&(1, 'x'), &2), None);
    }
}
