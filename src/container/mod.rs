//! Legacy binary FBX container.
//!
//! Versions 5000-6999 use 32-bit record offsets. A file is a header followed
//! by a flat sequence of top-level records:
//!
//! ```text
//! +---------------------------+
//! | "Kaydara FBX Binary  \0"  |  21 bytes
//! | 0x1A 0x00                 |  2 bytes
//! | Version                   |  u32 LE
//! +---------------------------+
//! | Record                    |
//! |   end_offset      u32     |  absolute offset past the record
//! |   num_properties  u32     |
//! |   property_len    u32     |  bytes of the property list
//! |   name_len        u8      |
//! |   name                    |
//! |   properties ...          |
//! |   child records ...       |
//! |   [13 zero bytes]         |  closes a non-empty child list
//! +---------------------------+
//! | ... more records ...      |
//! | [13 zero bytes]           |
//! | footer (ignored)          |
//! +---------------------------+
//! ```

mod compression;
mod cursor;
mod format;
mod node;
mod property;
mod reader;

pub use compression::{inflate, InflateError, MAX_INFLATE_RATIO};
pub use cursor::ByteCursor;
pub use format::*;
pub use node::{Node, NodeId};
pub use property::{ArrayData, ArrayEncoding, ArrayProperty, Property, PropertyDecoder};
pub use reader::{Descendants, Document};
