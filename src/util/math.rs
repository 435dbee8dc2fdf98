//! Math type re-exports and transform attribute helpers.
//!
//! Vectors come from `glam` in double precision; scene hosts report
//! translate/rotate/scale as doubles and the scene description stores them
//! as IEEE-754 doubles.

pub use glam::DVec3;

use serde::{Deserialize, Serialize};

/// Translate/rotate/scale triple of a transform node.
///
/// Rotation is Euler angles in degrees, as the host reports them; no
/// normalization is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub translate: DVec3,
    pub rotate: DVec3,
    pub scale: DVec3,
}

impl Attributes {
    /// Zero translate and rotate, unit scale.
    pub const IDENTITY: Self = Self {
        translate: DVec3::ZERO,
        rotate: DVec3::ZERO,
        scale: DVec3::ONE,
    };

    #[inline]
    pub const fn new(translate: DVec3, rotate: DVec3, scale: DVec3) -> Self {
        Self { translate, rotate, scale }
    }

    /// Attributes expressed relative to `root`.
    ///
    /// Translate and rotate are differences, scale is a component-wise ratio.
    /// Always returns a fresh value; neither input is modified. A zero root
    /// scale component yields an infinite or NaN ratio, so callers that
    /// cannot accept that check [`Attributes::has_zero_scale`] first.
    #[inline]
    pub fn relative_to(&self, root: &Attributes) -> Attributes {
        Attributes {
            translate: self.translate - root.translate,
            rotate: self.rotate - root.rotate,
            scale: self.scale / root.scale,
        }
    }

    /// True if any scale component is exactly zero.
    #[inline]
    pub fn has_zero_scale(&self) -> bool {
        self.scale.cmpeq(DVec3::ZERO).any()
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_relative_to() {
        let a = Attributes::new(
            DVec3::new(5.0, 2.0, -1.0),
            DVec3::new(90.0, 0.0, 45.0),
            DVec3::new(2.0, 4.0, 1.0),
        );
        let root = Attributes::new(
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 0.0, 45.0),
            DVec3::new(2.0, 2.0, 2.0),
        );

        let rel = a.relative_to(&root);
        assert_eq!(rel.translate, DVec3::new(4.0, 1.0, -2.0));
        assert_eq!(rel.rotate, DVec3::new(90.0, 0.0, 0.0));
        assert_eq!(rel.scale, DVec3::new(1.0, 2.0, 0.5));

        // inputs untouched, second call identical
        assert_eq!(a.translate, DVec3::new(5.0, 2.0, -1.0));
        assert_eq!(a.relative_to(&root), rel);
    }

    #[test]
    fn test_zero_scale() {
        let mut a = Attributes::IDENTITY;
        assert!(!a.has_zero_scale());
        a.scale.y = 0.0;
        assert!(a.has_zero_scale());
    }

    #[test]
    fn test_serializes_as_triples() {
        let json = serde_json::to_value(Attributes::IDENTITY).unwrap();
        assert_eq!(json["translate"], serde_json::json!([0.0, 0.0, 0.0]));
        assert_eq!(json["scale"], serde_json::json!([1.0, 1.0, 1.0]));
    }

    fn vec3(range: std::ops::Range<f64>) -> impl Strategy<Value = DVec3> {
        (range.clone(), range.clone(), range).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_identity_root_is_noop(t in vec3(-1e4..1e4), r in vec3(-360.0..360.0), s in vec3(0.01..100.0)) {
            let a = Attributes::new(t, r, s);
            prop_assert_eq!(a.relative_to(&Attributes::IDENTITY), a);
        }

        #[test]
        fn prop_relative_round_trips(t in vec3(-1e3..1e3), root_t in vec3(-1e3..1e3), root_s in vec3(0.5..4.0)) {
            let a = Attributes::new(t, DVec3::ZERO, DVec3::ONE);
            let root = Attributes::new(root_t, DVec3::ZERO, root_s);
            let rel = a.relative_to(&root);
            prop_assert!((rel.translate + root.translate - a.translate).abs().max_element() < 1e-9);
            prop_assert!((rel.scale * root.scale - a.scale).abs().max_element() < 1e-9);
        }
    }
}
