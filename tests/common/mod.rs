//! Builder for legacy binary FBX buffers used by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const MAGIC: &[u8] = b"Kaydara FBX Binary  \0\x1a\0";

/// How array payloads are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enc {
    Plain,
    Zlib,
}

/// One property value.
#[derive(Clone, Debug)]
pub enum Prop {
    I16(i16),
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Raw(Vec<u8>),
    I32s(Vec<i32>, Enc),
    I64s(Vec<i64>, Enc),
    F32s(Vec<f32>, Enc),
    F64s(Vec<f64>, Enc),
    /// A bare type tag with no payload.
    Tag(u8),
    /// Bytes written verbatim, tag included.
    Bytes(Vec<u8>),
}

pub fn s(v: &str) -> Prop {
    Prop::Str(v.to_string())
}

fn write_array<T>(out: &mut Vec<u8>, tag: u8, items: &[T], enc: Enc, put: impl Fn(&mut Vec<u8>, &T)) {
    let mut raw = Vec::new();
    for item in items {
        put(&mut raw, item);
    }
    out.push(tag);
    out.write_u32::<LittleEndian>(items.len() as u32).unwrap();
    match enc {
        Enc::Plain => {
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(raw.len() as u32).unwrap();
            out.extend_from_slice(&raw);
        }
        Enc::Zlib => {
            let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
            z.write_all(&raw).unwrap();
            let packed = z.finish().unwrap();
            out.write_u32::<LittleEndian>(1).unwrap();
            out.write_u32::<LittleEndian>(packed.len() as u32).unwrap();
            out.extend_from_slice(&packed);
        }
    }
}

impl Prop {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Prop::I16(v) => {
                out.push(b'Y');
                out.write_i16::<LittleEndian>(*v).unwrap();
            }
            Prop::Bool(v) => {
                out.push(b'C');
                out.push(*v as u8);
            }
            Prop::I32(v) => {
                out.push(b'I');
                out.write_i32::<LittleEndian>(*v).unwrap();
            }
            Prop::I64(v) => {
                out.push(b'L');
                out.write_i64::<LittleEndian>(*v).unwrap();
            }
            Prop::F32(v) => {
                out.push(b'F');
                out.write_f32::<LittleEndian>(*v).unwrap();
            }
            Prop::F64(v) => {
                out.push(b'D');
                out.write_f64::<LittleEndian>(*v).unwrap();
            }
            Prop::Str(v) => {
                out.push(b'S');
                out.write_u32::<LittleEndian>(v.len() as u32).unwrap();
                out.extend_from_slice(v.as_bytes());
            }
            Prop::Raw(v) => {
                out.push(b'R');
                out.write_u32::<LittleEndian>(v.len() as u32).unwrap();
                out.extend_from_slice(v);
            }
            Prop::I32s(v, enc) => write_array(out, b'i', v, *enc, |o, x| o.write_i32::<LittleEndian>(*x).unwrap()),
            Prop::I64s(v, enc) => write_array(out, b'l', v, *enc, |o, x| o.write_i64::<LittleEndian>(*x).unwrap()),
            Prop::F32s(v, enc) => write_array(out, b'f', v, *enc, |o, x| o.write_f32::<LittleEndian>(*x).unwrap()),
            Prop::F64s(v, enc) => write_array(out, b'd', v, *enc, |o, x| o.write_f64::<LittleEndian>(*x).unwrap()),
            Prop::Tag(t) => out.push(*t),
            Prop::Bytes(b) => out.extend_from_slice(b),
        }
    }
}

/// A record with properties and children.
#[derive(Clone, Debug)]
pub struct Rec {
    pub name: String,
    pub props: Vec<Prop>,
    pub children: Vec<Rec>,
}

impl Rec {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), props: Vec::new(), children: Vec::new() }
    }

    pub fn prop(mut self, p: Prop) -> Self {
        self.props.push(p);
        self
    }

    pub fn props(mut self, ps: impl IntoIterator<Item = Prop>) -> Self {
        self.props.extend(ps);
        self
    }

    pub fn child(mut self, c: Rec) -> Self {
        self.children.push(c);
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&[0u8; 12]);
        out.push(self.name.len() as u8);
        out.extend_from_slice(self.name.as_bytes());

        let props_start = out.len();
        for p in &self.props {
            p.write(out);
        }
        let props_len = (out.len() - props_start) as u32;

        for c in &self.children {
            c.write(out);
        }
        if !self.children.is_empty() {
            out.extend_from_slice(&[0u8; 13]);
        }

        let end = out.len() as u32;
        out[start..start + 4].copy_from_slice(&end.to_le_bytes());
        out[start + 4..start + 8].copy_from_slice(&(self.props.len() as u32).to_le_bytes());
        out[start + 8..start + 12].copy_from_slice(&props_len.to_le_bytes());
    }
}

/// Serialize a file: header, top-level records, sentinel and a dummy footer.
pub fn file(version: u32, roots: &[Rec]) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.write_u32::<LittleEndian>(version).unwrap();
    for r in roots {
        r.write(&mut out);
    }
    out.extend_from_slice(&[0u8; 13]);
    out.extend_from_slice(&[0xFA, 0xBC, 0xAB, 0x09, 0xD0, 0xC8, 0xD4, 0x66]);
    out.extend_from_slice(&[0u8; 16]);
    out
}

/// Header with trailing junk in place of records.
pub fn header_only(version: u32) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.write_u32::<LittleEndian>(version).unwrap();
    out.extend_from_slice(&[0xFF; 64]);
    out
}

/// A `LayerElementNormal` / `LayerElementUV` record.
pub fn layer(kind: &str, mapping: &str, reference: &str, data: Vec<f64>, indices: Option<Vec<i32>>) -> Rec {
    let (data_name, index_name) = match kind {
        "LayerElementNormal" => ("Normals", "NormalsIndex"),
        _ => ("UV", "UVIndex"),
    };
    let mut rec = Rec::new(kind)
        .prop(Prop::I32(0))
        .child(Rec::new("Version").prop(Prop::I32(101)))
        .child(Rec::new("Name").prop(s("")))
        .child(Rec::new("MappingInformationType").prop(s(mapping)))
        .child(Rec::new("ReferenceInformationType").prop(s(reference)))
        .child(Rec::new(data_name).prop(Prop::F64s(data, Enc::Plain)));
    if let Some(idx) = indices {
        rec = rec.child(Rec::new(index_name).prop(Prop::I32s(idx, Enc::Plain)));
    }
    rec
}

/// `Properties60` block with vector entries.
pub fn properties60(entries: &[(&str, [f64; 3])]) -> Rec {
    let mut rec = Rec::new("Properties60");
    for (name, v) in entries {
        rec = rec.child(Rec::new("Property").props([
            s(name),
            s("Vector3D"),
            s("A+"),
            Prop::F64(v[0]),
            Prop::F64(v[1]),
            Prop::F64(v[2]),
        ]));
    }
    rec
}

/// Mesh model in the 6.x layout: geometry arrays inside the `Model` record.
pub struct MeshModel {
    pub name: String,
    pub vertices: Vec<f64>,
    pub indices: Vec<i32>,
    pub enc: Enc,
    pub layers: Vec<Rec>,
    pub transform: Vec<(&'static str, [f64; 3])>,
}

impl MeshModel {
    pub fn new(name: &str, vertices: Vec<f64>, indices: Vec<i32>) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            indices,
            enc: Enc::Plain,
            layers: Vec::new(),
            transform: Vec::new(),
        }
    }

    pub fn compressed(mut self) -> Self {
        self.enc = Enc::Zlib;
        self
    }

    pub fn layer(mut self, l: Rec) -> Self {
        self.layers.push(l);
        self
    }

    pub fn with(mut self, name: &'static str, v: [f64; 3]) -> Self {
        self.transform.push((name, v));
        self
    }

    pub fn build(self) -> Rec {
        let mut rec = Rec::new("Model")
            .prop(s(&format!("Model::{}", self.name)))
            .prop(s("Mesh"))
            .child(Rec::new("Version").prop(Prop::I32(232)))
            .child(properties60(&self.transform))
            .child(Rec::new("Vertices").prop(Prop::F64s(self.vertices, self.enc)))
            .child(Rec::new("PolygonVertexIndex").prop(Prop::I32s(self.indices, self.enc)));
        for l in self.layers {
            rec = rec.child(l);
        }
        rec
    }
}

/// Transform-only model (no geometry).
pub fn null_model(name: &str, transform: &[(&str, [f64; 3])]) -> Rec {
    Rec::new("Model")
        .prop(s(&format!("Model::{}", name)))
        .prop(s("Null"))
        .child(Rec::new("Version").prop(Prop::I32(232)))
        .child(properties60(transform))
}

/// `Connections` with `OO` links from child to parent.
pub fn connections(links: &[(&str, &str)]) -> Rec {
    let mut rec = Rec::new("Connections");
    for (child, parent) in links {
        rec = rec.child(Rec::new("Connect").props([s("OO"), s(child), s(parent)]));
    }
    rec
}

/// Complete 6.1 document around the given objects.
pub fn document(objects: Vec<Rec>, extra: Vec<Rec>) -> Vec<u8> {
    let mut roots = vec![Rec::new("FBXHeaderExtension")
        .child(Rec::new("FBXHeaderVersion").prop(Prop::I32(1003)))
        .child(Rec::new("FBXVersion").prop(Prop::I32(6100)))];
    let mut objs = Rec::new("Objects");
    for o in objects {
        objs = objs.child(o);
    }
    roots.push(objs);
    roots.extend(extra);
    file(6100, &roots)
}

pub fn triangle() -> MeshModel {
    MeshModel::new("Tri", vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, !2])
}

pub fn quad() -> MeshModel {
    MeshModel::new(
        "Quad",
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
        vec![0, 1, 2, !3],
    )
}

pub fn cube() -> MeshModel {
    let vertices = vec![
        -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, //
        -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0,
    ];
    let indices = vec![
        0, 1, 3, !2, 2, 3, 5, !4, 4, 5, 7, !6, 6, 7, 1, !0, 1, 7, 5, !3, 6, 0, 2, !4,
    ];
    MeshModel::new("Cube", vertices, indices)
}

/// Lines of OBJ text starting with the given keyword.
pub fn lines<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    text.lines().filter(|l| l.split(' ').next() == Some(keyword)).collect()
}
