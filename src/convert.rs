//! End-to-end conversion: bytes in, OBJ text out.

use std::path::Path;

use rayon::prelude::*;

use crate::container::Document;
use crate::geom::{reconstruct, GeometryRecord, MeshStats, ReconstructedMesh};
use crate::obj::{ObjEncoder, DEFAULT_PRECISION};
use crate::scene::locate_meshes;
use crate::util::{Error, Result};

/// Conversion settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Decimal places for every coordinate.
    pub precision: usize,
    /// Place meshes in world pose using their models' transforms.
    pub apply_transforms: bool,
    /// Read normal layers and write `vn` lines.
    pub emit_normals: bool,
    /// Read UV layers and write `vt` lines.
    pub emit_uvs: bool,
    /// Start the output with a `#` comment block.
    pub header_comment: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            apply_transforms: true,
            emit_normals: true,
            emit_uvs: true,
            header_comment: true,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn apply_transforms(mut self, enabled: bool) -> Self {
        self.apply_transforms = enabled;
        self
    }

    pub fn emit_normals(mut self, enabled: bool) -> Self {
        self.emit_normals = enabled;
        self
    }

    pub fn emit_uvs(mut self, enabled: bool) -> Self {
        self.emit_uvs = enabled;
        self
    }

    pub fn header_comment(mut self, enabled: bool) -> Self {
        self.header_comment = enabled;
        self
    }

    /// Encoder configured from these options.
    pub fn encoder(&self) -> ObjEncoder {
        ObjEncoder::new()
            .with_precision(self.precision)
            .with_header_comment(self.header_comment)
    }
}

/// Decoded meshes of one file.
#[derive(Clone, Debug)]
pub struct Conversion {
    /// Container version from the header.
    pub version: u32,
    /// Meshes in source order; never empty.
    pub meshes: Vec<ReconstructedMesh>,
}

impl Conversion {
    /// Totals over all meshes.
    pub fn stats(&self) -> MeshStats {
        self.meshes.iter().fold(MeshStats::default(), |acc, m| MeshStats {
            vertices: acc.vertices + m.stats.vertices,
            polygons: acc.polygons + m.stats.polygons,
            triangles: acc.triangles + m.stats.triangles,
            degenerate_polygons: acc.degenerate_polygons + m.stats.degenerate_polygons,
        })
    }

    /// Serialize to OBJ text.
    pub fn to_obj(&self, options: &ConvertOptions) -> String {
        options.encoder().encode(&self.meshes, Some(self.version))
    }
}

/// Decode a legacy binary FBX buffer into world-space meshes.
///
/// Meshes are reconstructed in parallel and gathered in source order; the
/// first failure aborts the conversion.
#[tracing::instrument(skip_all, fields(len = data.len()))]
pub fn decode(data: &[u8], options: &ConvertOptions) -> Result<Conversion> {
    let doc = Document::from_bytes(data)?;
    decode_document(&doc, options)
}

/// Reconstruct the meshes of an already parsed document.
pub fn decode_document(doc: &Document, options: &ConvertOptions) -> Result<Conversion> {
    let sources = locate_meshes(doc, options.apply_transforms)?;

    let records = sources
        .iter()
        .map(|s| GeometryRecord::from_record(doc, s.record, options.emit_normals, options.emit_uvs))
        .collect::<Result<Vec<_>>>()?;

    let meshes: Vec<ReconstructedMesh> = sources
        .par_iter()
        .zip(records.par_iter())
        .map(|(source, record)| -> Result<ReconstructedMesh> {
            let mut mesh = reconstruct(record, &source.name, &source.transform)?;
            mesh.source = Some(source.record);
            Ok(mesh)
        })
        .collect::<Result<Vec<_>>>()?;

    let meshes: Vec<ReconstructedMesh> = meshes
        .into_iter()
        .filter(|m| {
            if m.is_empty() {
                tracing::warn!(mesh = %m.name, "mesh has no triangles; skipped");
            }
            !m.is_empty()
        })
        .collect();

    if meshes.is_empty() {
        return Err(Error::NoGeometryFound);
    }

    let conversion = Conversion { version: doc.version(), meshes };
    let totals = conversion.stats();
    tracing::info!(
        version = conversion.version,
        meshes = conversion.meshes.len(),
        vertices = totals.vertices,
        triangles = totals.triangles,
        "decoded legacy FBX"
    );
    Ok(conversion)
}

/// Convert a legacy binary FBX buffer to OBJ text with default options.
pub fn convert(data: &[u8]) -> Result<String> {
    convert_with(data, &ConvertOptions::default())
}

/// Convert a legacy binary FBX buffer to OBJ text.
pub fn convert_with(data: &[u8], options: &ConvertOptions) -> Result<String> {
    Ok(decode(data, options)?.to_obj(options))
}

/// Convert a file on disk to OBJ text.
pub fn convert_file(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<String> {
    let doc = Document::open(path)?;
    Ok(decode_document(&doc, options)?.to_obj(options))
}
