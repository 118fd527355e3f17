//! Attribute layers (normals, UVs) and their mapping/reference resolution.

use std::fmt;

use crate::container::{Document, NodeId};
use crate::util::{Error, Result};

/// How attribute elements are keyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingMode {
    /// One element per control point.
    ByVertex,
    /// One element per polygon corner.
    ByPolygonVertex,
    /// One element per polygon. Recognized, not handled.
    ByPolygon,
    /// One element per edge. Recognized, not handled.
    ByEdge,
    /// A single element for the whole mesh. Recognized, not handled.
    AllSame,
}

impl MappingMode {
    /// Parse a `MappingInformationType` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ByVertex" | "ByVertice" => Some(Self::ByVertex),
            "ByPolygonVertex" => Some(Self::ByPolygonVertex),
            "ByPolygon" => Some(Self::ByPolygon),
            "ByEdge" => Some(Self::ByEdge),
            "AllSame" => Some(Self::AllSame),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::ByVertex => "ByVertex",
            Self::ByPolygonVertex => "ByPolygonVertex",
            Self::ByPolygon => "ByPolygon",
            Self::ByEdge => "ByEdge",
            Self::AllSame => "AllSame",
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether elements are stored directly or through an index table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceMode {
    Direct,
    IndexToDirect,
}

impl ReferenceMode {
    /// Parse a `ReferenceInformationType` value. `Index` is the old
    /// spelling of `IndexToDirect`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Direct" => Some(Self::Direct),
            "IndexToDirect" | "Index" => Some(Self::IndexToDirect),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::IndexToDirect => "IndexToDirect",
        }
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute carried by a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Normal,
    Uv,
}

impl LayerKind {
    /// Record holding the layer.
    pub const fn record_name(self) -> &'static str {
        match self {
            Self::Normal => "LayerElementNormal",
            Self::Uv => "LayerElementUV",
        }
    }

    const fn data_name(self) -> &'static str {
        match self {
            Self::Normal => "Normals",
            Self::Uv => "UV",
        }
    }

    const fn index_name(self) -> &'static str {
        match self {
            Self::Normal => "NormalsIndex",
            Self::Uv => "UVIndex",
        }
    }

    /// Components per element.
    pub const fn arity(self) -> usize {
        match self {
            Self::Normal => 3,
            Self::Uv => 2,
        }
    }
}

/// One attribute layer of a geometry record.
#[derive(Clone, Debug)]
pub struct Layer {
    pub kind: LayerKind,
    pub mapping: MappingMode,
    pub reference: ReferenceMode,
    /// Flat components, `arity` per element.
    pub data: Vec<f64>,
    /// Index table for `IndexToDirect`.
    pub indices: Option<Vec<i64>>,
}

impl Layer {
    /// Read a layer record (`LayerElementNormal` / `LayerElementUV`).
    pub fn from_record(doc: &Document, id: NodeId, kind: LayerKind) -> Result<Self> {
        let text = |name: &str| {
            doc.child(id, name)
                .and_then(|c| doc.node(c).first_str())
                .map(str::to_owned)
        };
        let mapping_str = text("MappingInformationType");
        let reference_str = text("ReferenceInformationType");

        let unsupported = || Error::UnsupportedAttributeLayout {
            layer: kind.record_name().to_string(),
            mapping: mapping_str.clone().unwrap_or_else(|| "<none>".into()),
            reference: reference_str.clone().unwrap_or_else(|| "<none>".into()),
        };
        let mapping = mapping_str
            .as_deref()
            .and_then(MappingMode::parse)
            .ok_or_else(unsupported)?;
        let reference = reference_str
            .as_deref()
            .and_then(ReferenceMode::parse)
            .ok_or_else(unsupported)?;

        let data = doc
            .child(id, kind.data_name())
            .map(|c| doc.node(c).f64_values())
            .ok_or_else(|| Error::corrupt(format!("{} has no {} array", kind.record_name(), kind.data_name())))?;

        let indices = match doc.child(id, kind.index_name()) {
            Some(c) => Some(doc.node(c).i64_values().ok_or_else(|| {
                Error::corrupt(format!("{} holds non-integer values", kind.index_name()))
            })?),
            None => None,
        };

        Ok(Self { kind, mapping, reference, data, indices })
    }

    /// Number of complete elements.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.data.len() / self.kind.arity()
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedAttributeLayout {
            layer: self.kind.record_name().to_string(),
            mapping: self.mapping.to_string(),
            reference: self.reference.to_string(),
        }
    }

    /// Check that the layer's lengths agree with its layout.
    ///
    /// `num_vertices` is the control point count, `num_corners` the length of
    /// the polygon-vertex index array.
    pub fn validate(&self, num_vertices: usize, num_corners: usize) -> Result<()> {
        let name = self.kind.record_name();
        if self.data.len() % self.kind.arity() != 0 {
            return Err(Error::corrupt(format!(
                "{}: {} components is not a multiple of {}",
                name,
                self.data.len(),
                self.kind.arity()
            )));
        }
        if let Some(pos) = self.data.iter().position(|c| !c.is_finite()) {
            return Err(Error::corrupt(format!(
                "{}: component {} is {}",
                name, pos, self.data[pos]
            )));
        }

        let keyed = match self.mapping {
            MappingMode::ByVertex => num_vertices,
            MappingMode::ByPolygonVertex => num_corners,
            MappingMode::ByPolygon | MappingMode::ByEdge | MappingMode::AllSame => {
                return Err(self.unsupported());
            }
        };

        let elements = self.num_elements();
        match self.reference {
            ReferenceMode::Direct => {
                if elements != keyed {
                    return Err(Error::corrupt(format!(
                        "{} {}: {} elements for {} keys",
                        name, self.mapping, elements, keyed
                    )));
                }
            }
            ReferenceMode::IndexToDirect => {
                let indices = self
                    .indices
                    .as_ref()
                    .ok_or_else(|| Error::corrupt(format!("{} IndexToDirect without index array", name)))?;
                if indices.len() != keyed {
                    return Err(Error::corrupt(format!(
                        "{} {}: {} indices for {} keys",
                        name,
                        self.mapping,
                        indices.len(),
                        keyed
                    )));
                }
                if let Some(bad) = indices.iter().find(|&&i| i < 0 || i as usize >= elements) {
                    return Err(Error::corrupt(format!(
                        "{} index {} outside 0..{}",
                        name, bad, elements
                    )));
                }
            }
        }
        Ok(())
    }

    /// Element index for a corner.
    ///
    /// `vertex` is the control point the corner refers to, `corner` the
    /// running position in the polygon-vertex index array.
    pub fn element_index(&self, vertex: usize, corner: usize) -> Result<usize> {
        let element = match (self.mapping, self.reference) {
            (MappingMode::ByVertex, ReferenceMode::Direct) => vertex,
            (MappingMode::ByVertex, ReferenceMode::IndexToDirect) => self.lookup(vertex)?,
            (MappingMode::ByPolygonVertex, ReferenceMode::Direct) => corner,
            (MappingMode::ByPolygonVertex, ReferenceMode::IndexToDirect) => self.lookup(corner)?,
            (MappingMode::ByPolygon | MappingMode::ByEdge | MappingMode::AllSame, _) => {
                return Err(self.unsupported());
            }
        };
        if element >= self.num_elements() {
            return Err(Error::corrupt(format!(
                "{} element {} outside 0..{}",
                self.kind.record_name(),
                element,
                self.num_elements()
            )));
        }
        Ok(element)
    }

    fn lookup(&self, key: usize) -> Result<usize> {
        let indices = self.indices.as_deref().unwrap_or(&[]);
        match indices.get(key) {
            Some(&i) if i >= 0 => Ok(i as usize),
            _ => Err(Error::corrupt(format!(
                "{} has no valid index for key {}",
                self.kind.record_name(),
                key
            ))),
        }
    }

    /// Components of the element for a corner.
    pub fn resolve(&self, vertex: usize, corner: usize) -> Result<&[f64]> {
        let n = self.kind.arity();
        let e = self.element_index(vertex, corner)?;
        Ok(&self.data[e * n..e * n + n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(kind: LayerKind, mapping: MappingMode, reference: ReferenceMode, data: Vec<f64>, indices: Option<Vec<i64>>) -> Layer {
        Layer { kind, mapping, reference, data, indices }
    }

    #[test]
    fn test_non_finite_data_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let l = layer(LayerKind::Uv, MappingMode::ByVertex, ReferenceMode::Direct, vec![0.0, 0.0, bad, 1.0], None);
            assert!(matches!(l.validate(2, 2), Err(Error::CorruptContainer(_))));
        }
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(MappingMode::parse("ByVertice"), Some(MappingMode::ByVertex));
        assert_eq!(MappingMode::parse("ByPolygonVertex"), Some(MappingMode::ByPolygonVertex));
        assert_eq!(MappingMode::parse("Bogus"), None);
        assert_eq!(ReferenceMode::parse("Index"), Some(ReferenceMode::IndexToDirect));
        assert_eq!(ReferenceMode::parse("IndexToDirect"), Some(ReferenceMode::IndexToDirect));
    }

    #[test]
    fn test_by_vertex_direct_identity() {
        let raw = vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let l = layer(LayerKind::Normal, MappingMode::ByVertex, ReferenceMode::Direct, raw.clone(), None);
        l.validate(3, 6).unwrap();

        let mut resolved = Vec::new();
        for v in 0..3 {
            // corner counter is irrelevant for ByVertex
            resolved.extend_from_slice(l.resolve(v, 99).unwrap());
        }
        assert_eq!(resolved, raw);
    }

    #[test]
    fn test_by_vertex_index() {
        let l = layer(LayerKind::Uv, MappingMode::ByVertex, ReferenceMode::IndexToDirect, vec![0.0, 0.0, 1.0, 1.0], Some(vec![1, 0, 1]));
        l.validate(3, 3).unwrap();
        assert_eq!(l.resolve(0, 0).unwrap(), &[1.0, 1.0]);
        assert_eq!(l.resolve(1, 0).unwrap(), &[0.0, 0.0]);
        assert_eq!(l.resolve(2, 0).unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn test_by_polygon_vertex() {
        let direct = layer(LayerKind::Uv, MappingMode::ByPolygonVertex, ReferenceMode::Direct, vec![0.1, 0.2, 0.3, 0.4], None);
        direct.validate(10, 2).unwrap();
        assert_eq!(direct.resolve(7, 1).unwrap(), &[0.3, 0.4]);

        let indexed = layer(LayerKind::Uv, MappingMode::ByPolygonVertex, ReferenceMode::IndexToDirect, vec![0.1, 0.2, 0.3, 0.4], Some(vec![1, 1, 0]));
        indexed.validate(10, 3).unwrap();
        assert_eq!(indexed.resolve(0, 2).unwrap(), &[0.1, 0.2]);
        assert_eq!(indexed.resolve(0, 0).unwrap(), &[0.3, 0.4]);
    }

    #[test]
    fn test_unsupported_combinations() {
        for mapping in [MappingMode::ByPolygon, MappingMode::ByEdge, MappingMode::AllSame] {
            for reference in [ReferenceMode::Direct, ReferenceMode::IndexToDirect] {
                let l = layer(LayerKind::Normal, mapping, reference, vec![0.0, 0.0, 1.0], Some(vec![0]));
                assert!(matches!(l.validate(1, 1), Err(Error::UnsupportedAttributeLayout { .. })));
                assert!(matches!(l.element_index(0, 0), Err(Error::UnsupportedAttributeLayout { .. })));
            }
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let l = layer(LayerKind::Normal, MappingMode::ByPolygonVertex, ReferenceMode::Direct, vec![0.0; 9], None);
        assert!(l.validate(3, 3).is_ok());
        assert!(matches!(l.validate(3, 4), Err(Error::CorruptContainer(_))));

        let ragged = layer(LayerKind::Normal, MappingMode::ByVertex, ReferenceMode::Direct, vec![0.0; 8], None);
        assert!(matches!(ragged.validate(3, 3), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn test_bad_index_rejected() {
        let missing = layer(LayerKind::Uv, MappingMode::ByVertex, ReferenceMode::IndexToDirect, vec![0.0; 4], None);
        assert!(matches!(missing.validate(2, 2), Err(Error::CorruptContainer(_))));

        let negative = layer(LayerKind::Uv, MappingMode::ByVertex, ReferenceMode::IndexToDirect, vec![0.0; 4], Some(vec![0, -1]));
        assert!(matches!(negative.validate(2, 2), Err(Error::CorruptContainer(_))));

        let overflow = layer(LayerKind::Uv, MappingMode::ByVertex, ReferenceMode::IndexToDirect, vec![0.0; 4], Some(vec![0, 2]));
        assert!(matches!(overflow.validate(2, 2), Err(Error::CorruptContainer(_))));
    }
}
