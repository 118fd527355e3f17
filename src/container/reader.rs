//! Binary container reader.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::cursor::ByteCursor;
use super::format::*;
use super::node::{Node, NodeId};
use super::property::PropertyDecoder;
use crate::util::{Error, Result};

/// Parsed record header.
#[derive(Debug, Clone, Copy)]
struct RecordHeader {
    end_offset: u32,
    num_properties: u32,
    property_list_len: u32,
    name_len: u8,
}

impl RecordHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            end_offset: cursor.read_u32()?,
            num_properties: cursor.read_u32()?,
            property_list_len: cursor.read_u32()?,
            name_len: cursor.read_u8()?,
        })
    }

    /// The all-zero record that closes a child list.
    #[inline]
    fn is_sentinel(&self) -> bool {
        self.end_offset == 0
            && self.num_properties == 0
            && self.property_list_len == 0
            && self.name_len == 0
    }
}

/// A record whose children are still being read.
struct Frame {
    id: NodeId,
    end: usize,
}

/// Parsed legacy FBX document.
///
/// Records live in a flat arena; the file's top-level records are the
/// children of a virtual root returned by [`roots`](Self::roots).
#[derive(Debug, Clone)]
pub struct Document {
    version: u32,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Document {
    /// Memory-map and parse a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        if file.metadata()?.len() == 0 {
            return Err(Error::corrupt("empty file"));
        }

        // Safety: the file is opened read-only and the map is dropped before
        // returning; the parsed document owns all of its data.
        let mmap = unsafe { Mmap::map(&file) }?;
        Self::from_bytes(&mmap)
    }

    /// Parse a complete file image.
    #[tracing::instrument(skip_all, fields(len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let version = Self::parse_header(data)?;
        tracing::debug!(version, "legacy FBX header accepted");

        let mut doc = Self {
            version,
            nodes: Vec::new(),
            roots: Vec::new(),
        };
        doc.parse_records(data)?;
        tracing::debug!(records = doc.nodes.len(), top_level = doc.roots.len(), "record tree built");
        Ok(doc)
    }

    /// Validate magic and version.
    fn parse_header(data: &[u8]) -> Result<u32> {
        if data.len() < HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "file is {} bytes, header needs {}",
                data.len(),
                HEADER_SIZE
            )));
        }
        let version = probe_version(data).ok_or_else(|| Error::corrupt("missing binary FBX magic"))?;
        if !is_legacy_version(version) {
            return Err(Error::UnsupportedVersion(version));
        }
        Ok(version)
    }

    /// Read every record with an explicit frame stack.
    ///
    /// Child ids are attached to their parent as soon as the child header is
    /// read, so file order is preserved without recursion.
    fn parse_records(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = ByteCursor::new(data, HEADER_SIZE);
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let bound = match stack.last() {
                Some(frame) if cursor.pos() == frame.end => {
                    stack.pop();
                    continue;
                }
                Some(frame) => frame.end,
                // The footer after the last top-level record is not parsed.
                None if data.len() - cursor.pos() < RECORD_HEADER_SIZE => break,
                None => data.len(),
            };

            let start = cursor.pos();
            let mut window = ByteCursor::new(data, start);
            window.set_limit(bound)?;
            let header = RecordHeader::read(&mut window)?;

            if header.is_sentinel() {
                cursor = window;
                match stack.pop() {
                    Some(frame) if cursor.pos() != frame.end => {
                        return Err(Error::corrupt(format!(
                            "child list of '{}' closed at {} but record ends at {}",
                            self.nodes[frame.id.index()].name,
                            cursor.pos(),
                            frame.end
                        )));
                    }
                    Some(_) => continue,
                    None => break,
                }
            }

            let end = header.end_offset as usize;
            if end <= start || end > bound {
                return Err(Error::corrupt(format!(
                    "record at {} has end offset {} outside {}..={}",
                    start, end, start, bound
                )));
            }
            window.set_limit(end)?;

            let name = String::from_utf8_lossy(window.take(header.name_len as usize)?).into_owned();

            let props_start = window.pos();
            let props_end = props_start
                .checked_add(header.property_list_len as usize)
                .filter(|&e| e <= end)
                .ok_or_else(|| {
                    Error::corrupt(format!(
                        "property list of '{}' ({} bytes at {}) overruns record end {}",
                        name, header.property_list_len, props_start, end
                    ))
                })?;
            window.set_limit(props_end)?;

            let mut properties = Vec::with_capacity(header.num_properties.min(1024) as usize);
            {
                let mut decoder = PropertyDecoder::new(&mut window, &name);
                for _ in 0..header.num_properties {
                    properties.push(decoder.decode()?);
                }
            }
            if window.pos() != props_end {
                return Err(Error::corrupt(format!(
                    "property list of '{}' declared {} bytes, decoded {}",
                    name,
                    header.property_list_len,
                    window.pos() - props_start
                )));
            }

            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(Node {
                name,
                properties,
                children: Vec::new(),
                end_offset: end,
            });
            match stack.last() {
                Some(parent) => self.nodes[parent.id.index()].children.push(id),
                None => self.roots.push(id),
            }

            cursor = ByteCursor::new(data, props_end);
            stack.push(Frame { id, end });
        }

        Ok(())
    }

    /// File format version.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Top-level records in file order.
    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a record by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Children of a record, resolved.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes[id.index()]
            .children
            .iter()
            .map(move |&c| (c, &self.nodes[c.index()]))
    }

    /// First direct child with the given name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).find(|(_, n)| n.name == name).map(|(c, _)| c)
    }

    /// First top-level record with the given name.
    pub fn root(&self, name: &str) -> Option<NodeId> {
        self.roots.iter().copied().find(|&r| self.node(r).name == name)
    }

    /// Walk the subtree under `id` (excluding `id`) in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.node(id).children.clone();
        stack.reverse();
        Descendants { doc: self, stack }
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.node(id).children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Property;

    fn header(version: u32) -> Vec<u8> {
        let mut buf = FBX_MAGIC.to_vec();
        buf.extend_from_slice(&MAGIC_TRAILER);
        buf.extend_from_slice(&version.to_le_bytes());
        buf
    }

    /// Append a record; `body` writes properties and children.
    fn record(buf: &mut Vec<u8>, name: &str, props: &[Vec<u8>], children: impl FnOnce(&mut Vec<u8>)) {
        let start = buf.len();
        buf.extend_from_slice(&[0u8; 12]);
        buf.push(name.len() as u8);
        buf.extend_from_slice(name.as_bytes());
        let props_start = buf.len();
        for p in props {
            buf.extend_from_slice(p);
        }
        let props_len = (buf.len() - props_start) as u32;
        let before_children = buf.len();
        children(buf);
        if buf.len() != before_children {
            buf.extend_from_slice(&[0u8; RECORD_HEADER_SIZE]);
        }
        let end = buf.len() as u32;
        buf[start..start + 4].copy_from_slice(&end.to_le_bytes());
        buf[start + 4..start + 8].copy_from_slice(&(props.len() as u32).to_le_bytes());
        buf[start + 8..start + 12].copy_from_slice(&props_len.to_le_bytes());
    }

    fn int_prop(v: i32) -> Vec<u8> {
        let mut p = vec![b'I'];
        p.extend_from_slice(&v.to_le_bytes());
        p
    }

    fn sample() -> Vec<u8> {
        let mut buf = header(6100);
        record(&mut buf, "FBXHeaderExtension", &[], |b| {
            record(b, "FBXVersion", &[int_prop(6100)], |_| {});
        });
        record(&mut buf, "Objects", &[], |b| {
            record(b, "Model", &[int_prop(1)], |b| {
                record(b, "Version", &[int_prop(232)], |_| {});
            });
            record(b, "Model", &[int_prop(2)], |_| {});
        });
        buf.extend_from_slice(&[0u8; RECORD_HEADER_SIZE]);
        buf.extend_from_slice(&[0xAB; 40]); // footer
        buf
    }

    #[test]
    fn test_parse_tree() {
        let doc = Document::from_bytes(&sample()).unwrap();
        assert_eq!(doc.version(), 6100);
        assert_eq!(doc.roots().len(), 2);
        assert_eq!(doc.len(), 6);

        let objects = doc.root("Objects").unwrap();
        let models: Vec<_> = doc.children(objects).collect();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].1.properties, vec![Property::I32(1)]);
        assert_eq!(models[1].1.properties, vec![Property::I32(2)]);

        let version = doc.child(models[0].0, "Version").unwrap();
        assert_eq!(doc.node(version).properties, vec![Property::I32(232)]);

        let names: Vec<_> = doc.descendants(objects).map(|id| doc.node(id).name.as_str()).collect();
        assert_eq!(names, vec!["Model", "Version", "Model"]);
    }

    #[test]
    fn test_offsets_increase() {
        let doc = Document::from_bytes(&sample()).unwrap();
        let mut last = 0;
        for &r in doc.roots() {
            assert!(doc.node(r).end_offset > last);
            last = doc.node(r).end_offset;
        }
    }

    #[test]
    fn test_unsupported_version() {
        for version in [4000, 7100, 7400, 7500] {
            let mut buf = header(version);
            // garbage that would fail record parsing
            buf.extend_from_slice(&[0xFF; 64]);
            assert!(matches!(
                Document::from_bytes(&buf),
                Err(Error::UnsupportedVersion(v)) if v == version
            ));
        }
    }

    #[test]
    fn test_bad_magic() {
        let data = b"; FBX 6.1.0 project file\n; ----------------\n";
        assert!(matches!(Document::from_bytes(data), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn test_end_offset_out_of_bounds() {
        let mut buf = sample();
        let len = buf.len() as u32;
        // first record's end offset past the buffer
        buf[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&(len + 100).to_le_bytes());
        assert!(matches!(Document::from_bytes(&buf), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn test_end_offset_backwards() {
        let mut buf = sample();
        buf[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        assert!(matches!(Document::from_bytes(&buf), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn test_truncated() {
        let buf = sample();
        // cut in the middle of the Objects record
        let cut = &buf[..buf.len() - 60];
        assert!(matches!(Document::from_bytes(cut), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn test_property_length_mismatch() {
        let mut buf = header(6100);
        record(&mut buf, "Broken", &[int_prop(5)], |_| {});
        // claim one more property byte than was written
        let len_pos = HEADER_SIZE + 8;
        buf[len_pos..len_pos + 4].copy_from_slice(&6u32.to_le_bytes());
        assert!(matches!(Document::from_bytes(&buf), Err(Error::CorruptContainer(_))));
    }

    #[test]
    fn test_deep_nesting() {
        let mut buf = header(6100);
        fn nest(b: &mut Vec<u8>, depth: usize) {
            record(b, "N", &[], |b| {
                if depth > 0 {
                    nest(b, depth - 1);
                }
            });
        }
        nest(&mut buf, 200);
        let doc = Document::from_bytes(&buf).unwrap();
        assert_eq!(doc.len(), 201);
        assert_eq!(doc.descendants(doc.roots()[0]).count(), 200);
    }
}
