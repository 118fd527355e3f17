//! Math type re-exports and mesh-space helpers.
//!
//! All geometry is carried in double precision; the single precision glam
//! types are not re-exported on purpose.

pub use glam::{DMat3, DMat4, DVec2, DVec3, DVec4};

use std::fmt;

/// 3D bounding box with double precision.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox3d {
    pub min: DVec3,
    pub max: DVec3,
}

impl BBox3d {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

impl Default for BBox3d {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl FromIterator<DVec3> for BBox3d {
    fn from_iter<I: IntoIterator<Item = DVec3>>(iter: I) -> Self {
        let mut b = Self::EMPTY;
        for p in iter {
            b.expand_by_point(p);
        }
        b
    }
}

impl fmt::Debug for BBox3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3d({:?} - {:?})", self.min, self.max)
    }
}

/// Transform a normal by the linear part of `m`.
///
/// Uses the inverse-transpose so non-uniform scale keeps normals
/// perpendicular to their surface. Singular matrices fall back to the plain
/// linear part.
pub fn transform_normal(m: &DMat4, n: DVec3) -> DVec3 {
    let linear = DMat3::from_mat4(*m);
    let det = linear.determinant();
    let normal_matrix = if det.abs() > f64::EPSILON {
        linear.inverse().transpose()
    } else {
        linear
    };
    (normal_matrix * n).normalize_or_zero()
}
