//! Mesh reconstruction: polygons, fan triangulation, attribute resolution
//! and world placement.

use smallvec::SmallVec;

use crate::container::NodeId;
use crate::util::{transform_normal, BBox3d, DMat4, DVec2, DVec3, Error, Result};

use super::layer::Layer;
use super::record::GeometryRecord;

/// One corner of an output triangle, fully dereferenced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    /// Control point index in the source mesh.
    pub vertex: u32,
    /// World-space position.
    pub position: DVec3,
    pub normal: Option<DVec3>,
    pub uv: Option<DVec2>,
}

/// Output triangle; corners in source winding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub corners: [Corner; 3],
}

/// A polygon read from the polygon-vertex index array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polygon {
    /// Position of the first corner in the index array.
    pub first_corner: usize,
    /// Control point indices in source order.
    pub vertices: SmallVec<[u32; 8]>,
}

/// Counters collected while reconstructing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub vertices: usize,
    pub polygons: usize,
    pub triangles: usize,
    /// Polygons with fewer than three corners (emitted as nothing).
    pub degenerate_polygons: usize,
}

/// Triangulated mesh in world pose.
#[derive(Clone, Debug, Default)]
pub struct ReconstructedMesh {
    pub name: String,
    /// Geometry record the mesh was rebuilt from, when known.
    pub source: Option<NodeId>,
    /// World-space control points, one per source vertex.
    pub positions: Vec<DVec3>,
    pub triangles: Vec<Triangle>,
    pub has_normals: bool,
    pub has_uvs: bool,
    pub stats: MeshStats,
}

impl ReconstructedMesh {
    /// Number of triangle corners.
    #[inline]
    pub fn num_corners(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// World-space bounds of the control points.
    pub fn bounds(&self) -> BBox3d {
        self.positions.iter().copied().collect()
    }
}

/// Group flat triples into points.
pub fn parse_points(flat: &[f64]) -> Result<Vec<DVec3>> {
    if flat.len() % 3 != 0 {
        return Err(Error::corrupt(format!(
            "Vertices holds {} values, not a multiple of 3",
            flat.len()
        )));
    }
    if let Some(pos) = flat.iter().position(|c| !c.is_finite()) {
        return Err(Error::corrupt(format!(
            "vertex {} has non-finite component {}",
            pos / 3,
            flat[pos]
        )));
    }
    Ok(flat
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect())
}

/// Split the polygon-vertex index array into polygons.
///
/// A negative entry holds `!index` and closes the current polygon. Every
/// index must address one of `num_vertices` control points, and the array
/// must end on a closing entry.
pub fn split_polygons(indices: &[i32], num_vertices: usize) -> Result<Vec<Polygon>> {
    let mut polygons = Vec::new();
    let mut current: SmallVec<[u32; 8]> = SmallVec::new();
    let mut first_corner = 0;

    for (corner, &raw) in indices.iter().enumerate() {
        let closes = raw < 0;
        let vertex = (if closes { !raw } else { raw }) as u32;
        if vertex as usize >= num_vertices {
            return Err(Error::corrupt(format!(
                "polygon corner {} references vertex {} of {}",
                corner, vertex, num_vertices
            )));
        }
        current.push(vertex);
        if closes {
            polygons.push(Polygon {
                first_corner,
                vertices: std::mem::take(&mut current),
            });
            first_corner = corner + 1;
        }
    }

    if !current.is_empty() {
        return Err(Error::corrupt(format!(
            "PolygonVertexIndex ends with {} corners and no end-of-polygon marker",
            current.len()
        )));
    }
    Ok(polygons)
}

/// Fan triangulation around the first corner: `(0, i, i + 1)`.
///
/// Yields nothing for polygons with fewer than three corners.
pub fn fan_triangulate(n: usize) -> impl Iterator<Item = [usize; 3]> {
    (1..n.saturating_sub(1)).map(|i| [0, i, i + 1])
}

/// Rebuild the triangles of one geometry record.
///
/// `transform` places the mesh in world pose: positions take the full
/// affine transform, normals only its linear part.
#[tracing::instrument(skip_all, fields(mesh = name))]
pub fn reconstruct(record: &GeometryRecord, name: &str, transform: &DMat4) -> Result<ReconstructedMesh> {
    let local = parse_points(&record.vertices)?;
    let polygons = split_polygons(&record.polygon_vertex_index, local.len())?;
    let num_corners = record.polygon_vertex_index.len();

    for layer in [&record.normals, &record.uvs].into_iter().flatten() {
        layer.validate(local.len(), num_corners)?;
    }

    if !transform.is_finite() {
        return Err(Error::corrupt(format!("mesh '{}' has a non-finite transform", name)));
    }
    let positions: Vec<DVec3> = local.iter().map(|&p| transform.transform_point3(p)).collect();
    // finite inputs can still overflow
    if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
        return Err(Error::corrupt(format!("vertex {} leaves the f64 range when placed", i)));
    }

    let normal_at = |layer: &Layer, vertex: usize, corner: usize| -> Result<DVec3> {
        let n = layer.resolve(vertex, corner)?;
        Ok(transform_normal(transform, DVec3::new(n[0], n[1], n[2])))
    };
    let uv_at = |layer: &Layer, vertex: usize, corner: usize| -> Result<DVec2> {
        let t = layer.resolve(vertex, corner)?;
        Ok(DVec2::new(t[0], t[1]))
    };

    let mut stats = MeshStats {
        vertices: local.len(),
        polygons: polygons.len(),
        ..Default::default()
    };
    let mut triangles = Vec::with_capacity(num_corners.saturating_sub(2 * polygons.len()));

    for polygon in &polygons {
        if polygon.vertices.len() < 3 {
            stats.degenerate_polygons += 1;
            continue;
        }

        let corner_at = |k: usize| -> Result<Corner> {
            let vertex = polygon.vertices[k] as usize;
            let corner = polygon.first_corner + k;
            Ok(Corner {
                vertex: vertex as u32,
                position: positions[vertex],
                normal: record.normals.as_ref().map(|l| normal_at(l, vertex, corner)).transpose()?,
                uv: record.uvs.as_ref().map(|l| uv_at(l, vertex, corner)).transpose()?,
            })
        };

        for [a, b, c] in fan_triangulate(polygon.vertices.len()) {
            triangles.push(Triangle {
                corners: [corner_at(a)?, corner_at(b)?, corner_at(c)?],
            });
        }
    }

    if stats.degenerate_polygons > 0 {
        tracing::warn!(count = stats.degenerate_polygons, "skipped polygons with fewer than 3 corners");
    }
    stats.triangles = triangles.len();
    tracing::debug!(vertices = stats.vertices, polygons = stats.polygons, triangles = stats.triangles, "mesh reconstructed");

    Ok(ReconstructedMesh {
        name: name.to_string(),
        source: None,
        positions,
        triangles,
        has_normals: record.normals.is_some(),
        has_uvs: record.uvs.is_some(),
        stats,
    })
}
