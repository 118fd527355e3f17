//! Wavefront OBJ text encoder.
//!
//! Each mesh is written as its own `o` object. Position lines are never
//! shared between meshes. Normal and UV lines are written once per triangle
//! corner, so faces index them with a running counter:
//!
//! ```text
//! o Cube
//! v 0.000000 0.000000 0.000000      one per mesh vertex
//! vt 0.000000 1.000000              one per corner, if the mesh has UVs
//! vn 0.000000 0.000000 1.000000     one per corner, if the mesh has normals
//! f 1/1/1 2/2/2 3/3/3               one per triangle, 1-based
//! ```

use std::fmt::Write;

use crate::geom::ReconstructedMesh;
use crate::util::{DVec2, DVec3};

/// Content type to declare when serving encoder output.
pub const OBJ_CONTENT_TYPE: &str = "model/obj";

/// Default decimal places for coordinates.
pub const DEFAULT_PRECISION: usize = 6;

/// Serializes reconstructed meshes to OBJ.
#[derive(Clone, Debug)]
pub struct ObjEncoder {
    precision: usize,
    header_comment: bool,
}

impl Default for ObjEncoder {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            header_comment: true,
        }
    }
}

/// 1-based line counters, global across the file.
#[derive(Default)]
struct Offsets {
    v: usize,
    vt: usize,
    vn: usize,
}

impl ObjEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimal places for every coordinate.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Emit the leading `#` comment block.
    pub fn with_header_comment(mut self, enabled: bool) -> Self {
        self.header_comment = enabled;
        self
    }

    /// Encode meshes into a new string.
    pub fn encode(&self, meshes: &[ReconstructedMesh], source_version: Option<u32>) -> String {
        let capacity: usize = meshes
            .iter()
            .map(|m| m.positions.len() * 40 + m.num_corners() * 40 + m.triangles.len() * 30)
            .sum();
        let mut out = String::with_capacity(capacity);
        // Writing into a String cannot fail.
        let _ = self.write(&mut out, meshes, source_version);
        out
    }

    /// Encode meshes into any text sink.
    pub fn write<W: Write>(&self, out: &mut W, meshes: &[ReconstructedMesh], source_version: Option<u32>) -> std::fmt::Result {
        if self.header_comment {
            writeln!(out, "# {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
            if let Some(version) = source_version {
                writeln!(out, "# Source: binary FBX {}", version)?;
            }
            writeln!(out, "# Meshes: {}", meshes.len())?;
        }

        let mut offsets = Offsets::default();
        for mesh in meshes {
            self.write_mesh(out, mesh, &offsets)?;
            offsets.v += mesh.positions.len();
            if mesh.has_uvs {
                offsets.vt += mesh.num_corners();
            }
            if mesh.has_normals {
                offsets.vn += mesh.num_corners();
            }
        }
        Ok(())
    }

    fn write_mesh<W: Write>(&self, out: &mut W, mesh: &ReconstructedMesh, base: &Offsets) -> std::fmt::Result {
        writeln!(out, "o {}", sanitize(&mesh.name))?;

        for &p in &mesh.positions {
            out.write_str("v")?;
            self.write_vec3(out, p)?;
            out.write_char('\n')?;
        }

        if mesh.has_uvs {
            for corner in mesh.triangles.iter().flat_map(|t| t.corners.iter()) {
                out.write_str("vt")?;
                self.write_vec2(out, corner.uv.unwrap_or(DVec2::ZERO))?;
                out.write_char('\n')?;
            }
        }

        if mesh.has_normals {
            for corner in mesh.triangles.iter().flat_map(|t| t.corners.iter()) {
                out.write_str("vn")?;
                self.write_vec3(out, corner.normal.unwrap_or(DVec3::ZERO))?;
                out.write_char('\n')?;
            }
        }

        for (t, triangle) in mesh.triangles.iter().enumerate() {
            out.write_char('f')?;
            for (k, corner) in triangle.corners.iter().enumerate() {
                let v = base.v + corner.vertex as usize + 1;
                let attr = 3 * t + k + 1;
                match (mesh.has_uvs, mesh.has_normals) {
                    (false, false) => write!(out, " {}", v)?,
                    (true, false) => write!(out, " {}/{}", v, base.vt + attr)?,
                    (false, true) => write!(out, " {}//{}", v, base.vn + attr)?,
                    (true, true) => write!(out, " {}/{}/{}", v, base.vt + attr, base.vn + attr)?,
                }
            }
            out.write_char('\n')?;
        }
        Ok(())
    }

    fn write_vec3<W: Write>(&self, out: &mut W, v: DVec3) -> std::fmt::Result {
        for c in v.to_array() {
            self.write_number(out, c)?;
        }
        Ok(())
    }

    fn write_vec2<W: Write>(&self, out: &mut W, v: DVec2) -> std::fmt::Result {
        for c in v.to_array() {
            self.write_number(out, c)?;
        }
        Ok(())
    }

    fn write_number<W: Write>(&self, out: &mut W, x: f64) -> std::fmt::Result {
        // -0.0 and tiny negatives would print as "-0.000000"
        let x = if x == 0.0 { 0.0 } else { x };
        let s = format!("{:.*}", self.precision, x);
        if s.starts_with('-') && s[1..].bytes().all(|b| b == b'0' || b == b'.') {
            write!(out, " {}", &s[1..])
        } else {
            write!(out, " {}", s)
        }
    }
}

/// Object names must be a single whitespace-free token.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "mesh".to_string()
    } else {
        cleaned
    }
}
