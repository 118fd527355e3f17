//! Raw geometry arrays read from a mesh-bearing record.

use crate::container::{Document, NodeId};
use crate::util::{Error, Result};

use super::layer::{Layer, LayerKind};

/// Record holding control point positions.
pub const VERTICES_RECORD: &str = "Vertices";

/// Record holding polygon corner indices.
pub const POLYGON_VERTEX_INDEX_RECORD: &str = "PolygonVertexIndex";

/// Unprocessed geometry of one mesh.
#[derive(Clone, Debug, Default)]
pub struct GeometryRecord {
    /// Flat x, y, z triples.
    pub vertices: Vec<f64>,
    /// Corner indices; the last corner of each polygon is stored as `!index`.
    pub polygon_vertex_index: Vec<i32>,
    pub normals: Option<Layer>,
    pub uvs: Option<Layer>,
}

impl GeometryRecord {
    /// Check whether a record carries mesh geometry.
    pub fn is_mesh(doc: &Document, id: NodeId) -> bool {
        doc.child(id, VERTICES_RECORD).is_some() && doc.child(id, POLYGON_VERTEX_INDEX_RECORD).is_some()
    }

    /// Read the geometry arrays and the requested layers of a mesh record.
    pub fn from_record(doc: &Document, id: NodeId, read_normals: bool, read_uvs: bool) -> Result<Self> {
        let vertices = doc
            .child(id, VERTICES_RECORD)
            .map(|c| doc.node(c).f64_values())
            .ok_or_else(|| Error::corrupt("mesh record without Vertices"))?;

        let raw_indices = doc
            .child(id, POLYGON_VERTEX_INDEX_RECORD)
            .map(|c| doc.node(c).i64_values())
            .ok_or_else(|| Error::corrupt("mesh record without PolygonVertexIndex"))?
            .ok_or_else(|| Error::corrupt("PolygonVertexIndex holds non-integer values"))?;

        let polygon_vertex_index = raw_indices
            .into_iter()
            .map(|i| i32::try_from(i).map_err(|_| Error::corrupt(format!("polygon index {} exceeds 32 bits", i))))
            .collect::<Result<Vec<_>>>()?;

        let layer = |kind: LayerKind, wanted: bool| -> Result<Option<Layer>> {
            if !wanted {
                return Ok(None);
            }
            let mut records = doc.children(id).filter(|(_, n)| n.name == kind.record_name());
            let Some((first, _)) = records.next() else { return Ok(None) };
            let extra = records.count();
            if extra > 0 {
                tracing::debug!(layer = kind.record_name(), extra, "using first layer, ignoring the rest");
            }
            Layer::from_record(doc, first, kind).map(Some)
        };

        Ok(Self {
            vertices,
            polygon_vertex_index,
            normals: layer(LayerKind::Normal, read_normals)?,
            uvs: layer(LayerKind::Uv, read_uvs)?,
        })
    }

    /// Number of control points (complete triples).
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of polygons (end-of-polygon markers).
    pub fn num_polygons(&self) -> usize {
        self.polygon_vertex_index.iter().filter(|&&i| i < 0).count()
    }
}
