//! Model transforms read from `Properties60` / `Properties70` records.
//!
//! The local matrix follows the FBX pivot chain:
//!
//! ```text
//! T * Roff * Rp * Rpre * R * Rpost^-1 * Rp^-1 * Soff * Sp * S * Sp^-1
//! ```
//!
//! and the geometric transform `Gt * Gr * Gs` is applied to the mesh only,
//! never inherited by children.

use crate::container::{Document, NodeId, Property};
use crate::util::{DMat4, DVec3};

/// Property records of the legacy and newer layouts.
pub const PROPERTY_RECORDS: [&str; 2] = ["Properties60", "Properties70"];

/// Euler rotation order; the first axis is applied first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationOrder {
    #[default]
    Xyz,
    Xzy,
    Yzx,
    Yxz,
    Zxy,
    Zyx,
}

impl RotationOrder {
    /// Map the `RotationOrder` enum value. Spheric XYZ (6) is treated as XYZ.
    pub fn from_value(v: i64) -> Self {
        match v {
            1 => Self::Xzy,
            2 => Self::Yzx,
            3 => Self::Yxz,
            4 => Self::Zxy,
            5 => Self::Zyx,
            _ => Self::Xyz,
        }
    }
}

/// Rotation matrix for Euler angles in degrees.
pub fn euler_matrix(degrees: DVec3, order: RotationOrder) -> DMat4 {
    let x = DMat4::from_rotation_x(degrees.x.to_radians());
    let y = DMat4::from_rotation_y(degrees.y.to_radians());
    let z = DMat4::from_rotation_z(degrees.z.to_radians());
    // column vectors: the first rotation applied sits rightmost
    match order {
        RotationOrder::Xyz => z * y * x,
        RotationOrder::Xzy => y * z * x,
        RotationOrder::Yzx => x * z * y,
        RotationOrder::Yxz => z * x * y,
        RotationOrder::Zxy => y * x * z,
        RotationOrder::Zyx => x * y * z,
    }
}

/// Transform channels of one model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTransform {
    pub translation: DVec3,
    /// Degrees.
    pub rotation: DVec3,
    pub scaling: DVec3,
    pub rotation_order: RotationOrder,
    pub pre_rotation: DVec3,
    pub post_rotation: DVec3,
    pub rotation_offset: DVec3,
    pub rotation_pivot: DVec3,
    pub scaling_offset: DVec3,
    pub scaling_pivot: DVec3,
    pub geometric_translation: DVec3,
    pub geometric_rotation: DVec3,
    pub geometric_scaling: DVec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scaling: DVec3::ONE,
            rotation_order: RotationOrder::Xyz,
            pre_rotation: DVec3::ZERO,
            post_rotation: DVec3::ZERO,
            rotation_offset: DVec3::ZERO,
            rotation_pivot: DVec3::ZERO,
            scaling_offset: DVec3::ZERO,
            scaling_pivot: DVec3::ZERO,
            geometric_translation: DVec3::ZERO,
            geometric_rotation: DVec3::ZERO,
            geometric_scaling: DVec3::ONE,
        }
    }
}

impl ModelTransform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Read the transform channels of a model record.
    ///
    /// Returns `None` if the record has no property block.
    pub fn from_model(doc: &Document, model: NodeId) -> Option<Self> {
        let block = PROPERTY_RECORDS.iter().find_map(|name| doc.child(model, name))?;
        let mut xf = Self::default();

        for (_, prop) in doc.children(block) {
            // legacy "Property" and newer "P" entries both lead with the name
            if prop.name != "Property" && prop.name != "P" {
                continue;
            }
            let Some(name) = prop.first_str() else { continue };
            // skip the leading name/type/flag strings
            let numbers: Vec<f64> = prop
                .properties
                .iter()
                .skip_while(|p| p.as_str().is_some())
                .filter_map(Property::as_f64)
                .collect();
            let vec3 = || (numbers.len() >= 3).then(|| DVec3::new(numbers[0], numbers[1], numbers[2]));

            let slot = match name {
                "Lcl Translation" => &mut xf.translation,
                "Lcl Rotation" => &mut xf.rotation,
                "Lcl Scaling" => &mut xf.scaling,
                "PreRotation" => &mut xf.pre_rotation,
                "PostRotation" => &mut xf.post_rotation,
                "RotationOffset" => &mut xf.rotation_offset,
                "RotationPivot" => &mut xf.rotation_pivot,
                "ScalingOffset" => &mut xf.scaling_offset,
                "ScalingPivot" => &mut xf.scaling_pivot,
                "GeometricTranslation" => &mut xf.geometric_translation,
                "GeometricRotation" => &mut xf.geometric_rotation,
                "GeometricScaling" => &mut xf.geometric_scaling,
                "RotationOrder" => {
                    if let Some(&v) = numbers.first() {
                        xf.rotation_order = RotationOrder::from_value(v as i64);
                    }
                    continue;
                }
                _ => continue,
            };
            if let Some(v) = vec3() {
                *slot = v;
            }
        }

        Some(xf)
    }

    /// Local matrix relative to the parent model.
    pub fn local_matrix(&self) -> DMat4 {
        let t = DMat4::from_translation(self.translation);
        let r_off = DMat4::from_translation(self.rotation_offset);
        let r_piv = DMat4::from_translation(self.rotation_pivot);
        let r_pre = euler_matrix(self.pre_rotation, RotationOrder::Xyz);
        let r = euler_matrix(self.rotation, self.rotation_order);
        let r_post = euler_matrix(self.post_rotation, RotationOrder::Xyz);
        let s_off = DMat4::from_translation(self.scaling_offset);
        let s_piv = DMat4::from_translation(self.scaling_pivot);
        let s = DMat4::from_scale(self.scaling);

        t * r_off * r_piv * r_pre * r * r_post.inverse() * r_piv.inverse() * s_off * s_piv * s * s_piv.inverse()
    }

    /// Geometry-only offset applied after the local matrix.
    pub fn geometric_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.geometric_translation)
            * euler_matrix(self.geometric_rotation, RotationOrder::Xyz)
            * DMat4::from_scale(self.geometric_scaling)
    }
}
