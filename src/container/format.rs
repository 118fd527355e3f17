//! Binary FBX container constants and header probing.

use std::ops::RangeInclusive;

/// Magic bytes at the start of a binary FBX file (includes the trailing NUL).
pub const FBX_MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \x00";

/// Two bytes following the magic in every binary file.
pub const MAGIC_TRAILER: [u8; 2] = [0x1A, 0x00];

/// Offset of the little-endian u32 version field.
pub const VERSION_OFFSET: usize = 23;

/// Size of the file header in bytes; the first record starts here.
pub const HEADER_SIZE: usize = 27;

/// Versions handled by this decoder. Everything else belongs to a modern loader.
pub const LEGACY_VERSIONS: RangeInclusive<u32> = 5000..=6999;

/// Record header size for 32-bit offset files:
/// end offset, property count, property list length (u32 each) + name length (u8).
pub const RECORD_HEADER_SIZE: usize = 13;

/// Size of the header preceding every array property payload.
pub const ARRAY_HEADER_SIZE: usize = 12;

/// Array payload stored as raw little-endian elements.
pub const ARRAY_ENCODING_RAW: u32 = 0;

/// Array payload stored as a zlib stream.
pub const ARRAY_ENCODING_ZLIB: u32 = 1;

/// Name of the record holding scene objects.
pub const OBJECTS_RECORD: &str = "Objects";

/// Name of the record holding object links.
pub const CONNECTIONS_RECORD: &str = "Connections";

/// Read the version from a binary FBX header without parsing records.
///
/// Returns `None` when the buffer does not start with the binary magic
/// (for example ASCII FBX or an unrelated file).
pub fn probe_version(data: &[u8]) -> Option<u32> {
    if data.len() < HEADER_SIZE || &data[..FBX_MAGIC.len()] != FBX_MAGIC {
        return None;
    }
    let v = &data[VERSION_OFFSET..VERSION_OFFSET + 4];
    Some(u32::from_le_bytes([v[0], v[1], v[2], v[3]]))
}

/// Check whether a version falls in the legacy range.
#[inline]
pub fn is_legacy_version(version: u32) -> bool {
    LEGACY_VERSIONS.contains(&version)
}
