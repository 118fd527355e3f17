//! # legacy-fbx
//!
//! Decoder for legacy binary FBX files (versions 5000-6999) with Wavefront
//! OBJ output. Modern loaders reject these pre-2011 files; this crate reads
//! them far enough to recover polygon meshes with their normals and UVs.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`container`] - Binary container: header, record tree, typed properties
//! - [`scene`] - Locating meshes and their model transforms
//! - [`geom`] - Geometry records, attribute layers, triangulation
//! - [`obj`] - OBJ text encoder
//! - [`convert`] - End-to-end conversion
//!
//! ## Example
//!
//! ```ignore
//! use legacy_fbx::{convert_file, ConvertOptions};
//!
//! let obj = convert_file("old_model.fbx", &ConvertOptions::default())?;
//! std::fs::write("old_model.obj", obj)?;
//! ```
//!
//! Callers holding a file of unknown age can check the header first:
//!
//! ```ignore
//! match legacy_fbx::probe_version(&bytes) {
//!     Some(v) if legacy_fbx::is_legacy_version(v) => legacy_fbx::convert(&bytes)?,
//!     _ => modern_loader(&bytes)?,
//! }
//! ```

pub mod util;
pub mod container;
pub mod geom;
pub mod scene;
pub mod obj;
pub mod convert;

// Re-export commonly used types
pub use util::{Error, Result};
pub use container::{is_legacy_version, probe_version, Document};
pub use convert::{convert, convert_file, convert_with, decode, decode_document, Conversion, ConvertOptions};
pub use obj::{ObjEncoder, OBJ_CONTENT_TYPE};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::container::{Document, Node, NodeId, Property};
    pub use crate::convert::{convert, convert_file, convert_with, decode, Conversion, ConvertOptions};
    pub use crate::geom::{GeometryRecord, ReconstructedMesh};
    pub use crate::obj::{ObjEncoder, OBJ_CONTENT_TYPE};
    pub use crate::scene::{locate_meshes, MeshSource};
}
