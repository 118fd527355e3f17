//! Geometry extraction and reconstruction.
//!
//! - [`GeometryRecord`] - Raw arrays of a mesh-bearing record
//! - [`Layer`] - Normal / UV layers with mapping and reference modes
//! - [`reconstruct`] - Polygons to world-space triangles
//! - [`ModelTransform`] - Transform channels of the owning model

pub mod layer;
pub mod mesh;
pub mod record;
pub mod xform;

pub use layer::{Layer, LayerKind, MappingMode, ReferenceMode};
pub use mesh::{
    fan_triangulate, parse_points, reconstruct, split_polygons, Corner, MeshStats, Polygon,
    ReconstructedMesh, Triangle,
};
pub use record::{GeometryRecord, POLYGON_VERTEX_INDEX_RECORD, VERTICES_RECORD};
pub use xform::{euler_matrix, ModelTransform, RotationOrder, PROPERTY_RECORDS};
