/// Properties carrying auxiliary annotations.
///
/// An [`AnnotatedProperty`] wraps an inner property together with a list of
/// annotations that play no role in combinability but should survive
/// combination. Hiding an annotated property hides the inner value and drops
/// the annotations.
use crate::combine::Combiner;
use crate::hide::Hider;

// ---------------------------------------------------------------------------
// AnnotatedProperty
// ---------------------------------------------------------------------------

/// A property value with attached annotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotatedProperty<T, A> {
    /// The property itself.
    pub inner: T,
    /// Annotations attached to the property, in attachment order.
    pub annotations: Vec<A>,
}

impl<T, A> AnnotatedProperty<T, A> {
    /// Creates an annotated property with no annotations.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            annotations: Vec::new(),
        }
    }

    /// Returns `self` with `annotation` appended.
    pub fn with_annotation(mut self, annotation: A) -> Self {
        self.annotations.push(annotation);
        self
    }
}

// ---------------------------------------------------------------------------
// AnnotatedPropertyCombiner
// ---------------------------------------------------------------------------

/// Combines annotated properties through their inner values.
///
/// Annotations never affect combinability; the combination carries the left
/// annotations followed by the right annotations not already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotatedPropertyCombiner<C> {
    inner: C,
}

impl<C> AnnotatedPropertyCombiner<C> {
    /// Creates an annotated-property combiner from an inner combiner.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<T, A, C> Combiner<AnnotatedProperty<T, A>> for AnnotatedPropertyCombiner<C>
where
    A: Clone + PartialEq,
    C: Combiner<T>,
{
    fn are_combinable(
        &self,
        left: &AnnotatedProperty<T, A>,
        right: &AnnotatedProperty<T, A>,
    ) -> bool {
        self.inner.are_combinable(&left.inner, &right.inner)
    }

    fn combine(
        &self,
        left: &AnnotatedProperty<T, A>,
        right: &AnnotatedProperty<T, A>,
    ) -> AnnotatedProperty<T, A> {
        let mut annotations = left.annotations.clone();
        for annotation in &right.annotations {
            if !annotations.contains(annotation) {
                annotations.push(annotation.clone());
            }
        }
        AnnotatedProperty {
            inner: self.inner.combine(&left.inner, &right.inner),
            annotations,
        }
    }
}

// ---------------------------------------------------------------------------
// AnnotatedPropertyHider
// ---------------------------------------------------------------------------

/// Hides the inner property and drops all annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotatedPropertyHider<H> {
    inner: H,
}

impl<H> AnnotatedPropertyHider<H> {
    /// Creates an annotated-property hider from an inner hider.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<T, A, H: Hider<T>> Hider<AnnotatedProperty<T, A>> for AnnotatedPropertyHider<H> {
    fn hide(&self, property: &AnnotatedProperty<T, A>) -> AnnotatedProperty<T, A> {
        AnnotatedProperty {
            inner: self.inner.hide(&property.inner),
            annotations: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::EqualityCombiner;
    use crate::hide::SubstitutionHider;

    fn annotated(inner: &str, annotations: &[&str]) -> AnnotatedProperty<String, String> {
        AnnotatedProperty {
            inner: inner.to_owned(),
            annotations: annotations.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    #[test]
    fn combiner_ignores_annotations_for_combinability() {
        let c = AnnotatedPropertyCombiner::new(EqualityCombiner);
        assert!(c.are_combinable(&annotated("e", &["x"]), &annotated("e", &["y"])));
        assert!(!c.are_combinable(&annotated("e", &["x"]), &annotated("f", &["x"])));
    }

    #[test]
    fn combiner_merges_annotations_without_duplicates() {
        let c = AnnotatedPropertyCombiner::new(EqualityCombiner);
        let combined = c.combine(&annotated("e", &["x", "y"]), &annotated("e", &["y", "z"]));
        assert_eq!(combined, annotated("e", &["x", "y", "z"]));
    }

    #[test]
    fn hider_hides_inner_and_drops_annotations() {
        let h = AnnotatedPropertyHider::new(SubstitutionHider::new("tau".to_owned()));
        let hidden = h.hide(&annotated("event", &["x"]));
        assert_eq!(hidden, annotated("tau", &[]));
        assert!(h.is_hidden(&hidden));
    }
}
