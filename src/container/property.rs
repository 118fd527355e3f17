//! Typed property values and the per-value decoder.
//!
//! Every record carries an ordered list of properties. Each property starts
//! with a one byte type tag:
//!
//! ```text
//! Y  i16        C  bool (1 byte)   I  i32      F  f32
//! D  f64        L  i64             S  string   R  raw bytes
//! i  [i32]      l  [i64]           f  [f32]    d  [f64]    b  [bool]
//! ```
//!
//! Strings and raw bytes are prefixed by a u32 length. Arrays are prefixed by
//! `count: u32, encoding: u32, compressed_len: u32`.

use std::borrow::Cow;
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::compression::inflate;
use super::cursor::ByteCursor;
use super::format::{ARRAY_ENCODING_RAW, ARRAY_ENCODING_ZLIB};
use crate::util::{Error, Result};

/// Storage of an array payload in the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayEncoding {
    /// Raw little-endian elements.
    Plain,
    /// Zlib stream of the given byte length.
    Zlib { compressed_len: u32 },
}

/// Typed elements of an array property.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
}

impl ArrayData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type tag as stored in the file.
    pub fn type_code(&self) -> char {
        match self {
            Self::I32(_) => 'i',
            Self::I64(_) => 'l',
            Self::F32(_) => 'f',
            Self::F64(_) => 'd',
            Self::Bool(_) => 'b',
        }
    }
}

/// An array property with its on-disk encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayProperty {
    pub data: ArrayData,
    pub encoding: ArrayEncoding,
}

impl ArrayProperty {
    /// Element count declared in the array header.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Compressed byte length, if the payload was zlib encoded.
    pub fn compressed_len(&self) -> Option<u32> {
        match self.encoding {
            ArrayEncoding::Plain => None,
            ArrayEncoding::Zlib { compressed_len } => Some(compressed_len),
        }
    }
}

/// A single property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Raw(Vec<u8>),
    Array(ArrayProperty),
}

impl Property {
    /// Type tag as stored in the file.
    pub fn type_code(&self) -> char {
        match self {
            Self::I16(_) => 'Y',
            Self::I32(_) => 'I',
            Self::I64(_) => 'L',
            Self::F32(_) => 'F',
            Self::F64(_) => 'D',
            Self::Bool(_) => 'C',
            Self::String(_) => 'S',
            Self::Raw(_) => 'R',
            Self::Array(a) => a.data.type_code(),
        }
    }

    /// Scalar numeric value widened to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::I16(v) => Some(v as f64),
            Self::I32(v) => Some(v as f64),
            Self::I64(v) => Some(v as f64),
            Self::F32(v) => Some(v as f64),
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar integer value widened to i64. Floats are not converted.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I16(v) => Some(v as i64),
            Self::I32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            Self::Bool(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayProperty> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Raw(b) => write!(f, "<{} bytes>", b.len()),
            Self::Array(a) => match a.encoding {
                ArrayEncoding::Plain => write!(f, "[{}; {}]", a.data.type_code(), a.count()),
                ArrayEncoding::Zlib { compressed_len } => write!(
                    f,
                    "[{}; {}] (zlib {} bytes)",
                    a.data.type_code(),
                    a.count(),
                    compressed_len
                ),
            },
        }
    }
}

/// Decodes properties of one record.
///
/// Errors carry the record name so a failure points at the offending node.
pub struct PropertyDecoder<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    node: &'c str,
}

impl<'c, 'a> PropertyDecoder<'c, 'a> {
    pub fn new(cursor: &'c mut ByteCursor<'a>, node: &'c str) -> Self {
        Self { cursor, node }
    }

    fn fail(&self, offset: usize, reason: impl Into<String>) -> Error {
        Error::property(self.node, offset, reason)
    }

    /// Decode exactly one property and advance the cursor past it.
    pub fn decode(&mut self) -> Result<Property> {
        let offset = self.cursor.pos();
        let tag = self.cursor.read_u8()?;
        let prop = match tag {
            b'Y' => Property::I16(self.cursor.read_i16()?),
            b'C' => Property::Bool(self.cursor.read_u8()? != 0),
            b'I' => Property::I32(self.cursor.read_i32()?),
            b'F' => Property::F32(self.cursor.read_f32()?),
            b'D' => Property::F64(self.cursor.read_f64()?),
            b'L' => Property::I64(self.cursor.read_i64()?),
            b'S' => {
                let len = self.cursor.read_u32()? as usize;
                let bytes = self.cursor.take(len)?;
                Property::String(String::from_utf8_lossy(bytes).into_owned())
            }
            b'R' => {
                let len = self.cursor.read_u32()? as usize;
                Property::Raw(self.cursor.take(len)?.to_vec())
            }
            b'i' | b'l' | b'f' | b'd' | b'b' => Property::Array(self.decode_array(tag, offset)?),
            other => {
                return Err(self.fail(offset, format!("unknown type tag 0x{:02x}", other)));
            }
        };
        Ok(prop)
    }

    fn decode_array(&mut self, tag: u8, offset: usize) -> Result<ArrayProperty> {
        let count = self.cursor.read_u32()? as usize;
        let encoding = self.cursor.read_u32()?;
        let stored_len = self.cursor.read_u32()?;

        let elem_size = match tag {
            b'i' | b'f' => 4,
            b'l' | b'd' => 8,
            _ => 1,
        };
        let byte_len = count
            .checked_mul(elem_size)
            .ok_or_else(|| self.fail(offset, format!("array of {} elements overflows", count)))?;

        let (bytes, encoding) = match encoding {
            ARRAY_ENCODING_RAW => {
                let raw = self.cursor.take(byte_len)?;
                (Cow::Borrowed(raw), ArrayEncoding::Plain)
            }
            ARRAY_ENCODING_ZLIB => {
                let compressed = self.cursor.take(stored_len as usize)?;
                let inflated = inflate(compressed, byte_len).map_err(|e| self.fail(offset, e.to_string()))?;
                (
                    Cow::Owned(inflated),
                    ArrayEncoding::Zlib { compressed_len: stored_len },
                )
            }
            other => {
                return Err(self.fail(offset, format!("unknown array encoding {}", other)));
            }
        };

        let data = match tag {
            b'i' => {
                let mut v = vec![0i32; count];
                LittleEndian::read_i32_into(&bytes, &mut v);
                ArrayData::I32(v)
            }
            b'l' => {
                let mut v = vec![0i64; count];
                LittleEndian::read_i64_into(&bytes, &mut v);
                ArrayData::I64(v)
            }
            b'f' => {
                let mut v = vec![0f32; count];
                LittleEndian::read_f32_into(&bytes, &mut v);
                ArrayData::F32(v)
            }
            b'd' => {
                let mut v = vec![0f64; count];
                LittleEndian::read_f64_into(&bytes, &mut v);
                ArrayData::F64(v)
            }
            _ => ArrayData::Bool(bytes.iter().map(|&b| b != 0).collect()),
        };

        Ok(ArrayProperty { data, encoding })
    }
}
