//! Binary snapshot format.
//!
//! All integers are little-endian.
//!
//! ```text
//! header   := magic "PTTA" | format u16 | kind u8 | schema_version u32 | node_count u32
//! node     := entity [u8; 16] | class u16 | field_count u16 | (key u16, body)*
//! body     := 0 kind u8 value            primitive
//!           | 1 0 | 1 1 address          pointer (unset | set)
//!           | 2 len u16 body*            array
//!           | 3 count u16 (key u16 body)* object
//! address  := entity [u8; 16] | path_len u8 | key u16 *
//! value    := bool u8 | i32 | i64 | f32 bits u32 | len u32 utf8 | len u32 bytes
//! ```
//!
//! A subgraph export (kind 1) appends the boundary table and the preserved
//! resources, i.e. boundary nodes whose class is a resource, in full:
//! `count u32 | (entity [u8; 16], class u16)* | resource_count u32 | node*`.
//!
//! Every length is checked against its width on encode; a value that does
//! not fit fails with [`EncodeError`] rather than writing a corrupt stream.
//!
//! Decoding is schema driven: fields missing from the stream keep their
//! schema defaults (older snapshots), fields unknown to the schema are
//! rejected. Pointer rules come from the schema, never from the stream.

use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

use crate::address::{Address, EntityId, FieldKey};
use crate::error::IntegrityError;
use crate::field::{ArrayField, Field, FieldVisitor, ObjectField, PointerField};
use crate::graph::Graph;
use crate::node::Node;
use crate::schema::{ClassId, FieldSchema, FieldType, SchemaRegistry};
use crate::value::{PrimitiveKind, Value};

/// File magic.
pub const MAGIC: [u8; 4] = *b"PTTA";

/// Current container format version.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 1 + 4 + 4;

const BODY_PRIMITIVE: u8 = 0;
const BODY_POINTER: u8 = 1;
const BODY_ARRAY: u8 = 2;
const BODY_OBJECT: u8 = 3;

/// What a snapshot contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// A complete graph.
    Project,
    /// An exported subgraph with its boundary table.
    Subgraph,
}

impl SnapshotKind {
    const fn tag(self) -> u8 {
        match self {
            SnapshotKind::Project => 0,
            SnapshotKind::Subgraph => 1,
        }
    }

    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SnapshotKind::Project),
            1 => Some(SnapshotKind::Subgraph),
            _ => None,
        }
    }
}

/// Decoded snapshot header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Container format version.
    pub format: u16,
    /// Snapshot kind.
    pub kind: SnapshotKind,
    /// Schema version the data was written with.
    pub schema_version: u32,
    /// Number of nodes.
    pub node_count: u32,
}

/// Errors raised while decoding a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The magic bytes do not match.
    #[error("not a partita snapshot (magic {0:?})")]
    BadMagic([u8; 4]),

    /// The container format is newer than this build understands.
    #[error("unsupported format version {0}")]
    UnsupportedFormat(u16),

    /// Unknown snapshot kind tag.
    #[error("unknown snapshot kind {0}")]
    UnknownKind(u8),

    /// The snapshot is of the other kind.
    #[error("expected a {expected:?} snapshot, found {found:?}")]
    WrongKind {
        /// Kind the caller asked for.
        expected: SnapshotKind,
        /// Kind in the header.
        found: SnapshotKind,
    },

    /// The data was written by a newer schema.
    #[error("schema version {found} is newer than supported version {supported}")]
    FutureSchema {
        /// Version in the snapshot.
        found: u32,
        /// Registry version.
        supported: u32,
    },

    /// The stream ended early.
    #[error("truncated snapshot: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required by the next read.
        needed: usize,
        /// Bytes left.
        remaining: usize,
    },

    /// Bytes left over after the last record.
    #[error("{0} trailing bytes after snapshot")]
    TrailingBytes(usize),

    /// The class id is not registered.
    #[error("unknown node class {0}")]
    UnknownClass(u16),

    /// A field key is not declared by the schema.
    #[error("class '{class}' has no field {key}")]
    UnknownField {
        /// Class name.
        class: &'static str,
        /// Unknown key.
        key: FieldKey,
    },

    /// A field body does not match its schema.
    #[error("field '{class}.{field}' does not match its schema")]
    FieldShape {
        /// Class name.
        class: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// An invalid enum tag.
    #[error("invalid {what} tag {tag}")]
    InvalidTag {
        /// What was being decoded.
        what: &'static str,
        /// Offending tag.
        tag: u8,
    },

    /// A string is not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// Two nodes share an id.
    #[error("node {0} appears twice")]
    DuplicateNode(EntityId),

    /// The decoded graph is not referentially integral.
    #[error("corrupt snapshot: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Errors raised while encoding a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A count or length does not fit its field in the format.
    #[error("{what} of {len} exceeds the format limit of {max}")]
    TooLong {
        /// What was being written.
        what: &'static str,
        /// Actual length.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },
}

fn checked<T: TryFrom<usize>>(what: &'static str, len: usize, max: usize) -> Result<T, EncodeError> {
    T::try_from(len).map_err(|_| EncodeError::TooLong { what, len, max })
}

fn len_u8(what: &'static str, len: usize) -> Result<u8, EncodeError> {
    checked(what, len, usize::from(u8::MAX))
}

fn len_u16(what: &'static str, len: usize) -> Result<u16, EncodeError> {
    checked(what, len, usize::from(u16::MAX))
}

fn len_u32(what: &'static str, len: usize) -> Result<u32, EncodeError> {
    checked(what, len, u32::MAX as usize)
}

/// Decoded nodes plus the boundary table of a subgraph export.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// Snapshot header.
    pub header: Header,
    /// Nodes in stream order.
    pub nodes: Vec<Node>,
    /// Referenced but not included nodes (subgraph only).
    pub boundary: Vec<(EntityId, ClassId)>,
    /// Boundary nodes of resource classes, carried with their data under
    /// their original ids (subgraph only).
    pub resources: Vec<Node>,
}

impl Graph {
    /// Serializes the full graph.
    pub fn to_binary(&self) -> Result<Vec<u8>, EncodeError> {
        encode(SnapshotKind::Project, self.schema_version(), self.nodes(), &[], &[])
    }

    /// Rebuilds a graph from [`to_binary`](Self::to_binary) output.
    ///
    /// Snapshots from older schema versions decode with missing fields at
    /// their defaults and keep their stored version; upgrading them is the
    /// migration engine's job.
    pub fn from_binary(bytes: &[u8], registry: Arc<SchemaRegistry>) -> Result<Graph, DecodeError> {
        let package = decode(bytes, &registry, SnapshotKind::Project)?;
        let graph = Graph::assemble(registry, package.header.schema_version, package.nodes)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "from_binary: {} nodes, schema v{}",
            graph.len(),
            graph.schema_version()
        );
        Ok(graph)
    }
}

/// Encodes nodes into a snapshot.
pub(crate) fn encode<'a>(
    kind: SnapshotKind,
    schema_version: u32,
    nodes: impl Iterator<Item = &'a Node>,
    boundary: &[(EntityId, ClassId)],
    resources: &[Node],
) -> Result<Vec<u8>, EncodeError> {
    let nodes: Vec<&Node> = nodes.collect();
    let mut out = BytesMut::with_capacity(HEADER_LEN + nodes.len() * 64);
    out.put_slice(&MAGIC);
    out.put_u16_le(FORMAT_VERSION);
    out.put_u8(kind.tag());
    out.put_u32_le(schema_version);
    out.put_u32_le(len_u32("node count", nodes.len())?);
    let mut encoder = Encoder { out: &mut out };
    for node in nodes {
        encoder.node(node)?;
    }
    if kind == SnapshotKind::Subgraph {
        encoder.out.put_u32_le(len_u32("boundary table", boundary.len())?);
        for (entity, class) in boundary {
            encoder.out.put_slice(&entity.to_bytes());
            encoder.out.put_u16_le(class.0);
        }
        encoder.out.put_u32_le(len_u32("resource count", resources.len())?);
        for node in resources {
            encoder.node(node)?;
        }
    }
    Ok(out.to_vec())
}

/// Reads only the header.
pub fn read_header(bytes: &[u8]) -> Result<Header, DecodeError> {
    let mut reader = Reader { buf: bytes };
    reader.header()
}

/// Decodes a snapshot of the expected kind against `registry`.
pub fn decode(bytes: &[u8], registry: &SchemaRegistry, expected: SnapshotKind) -> Result<Package, DecodeError> {
    let mut reader = Reader { buf: bytes };
    let header = reader.header()?;
    if header.kind != expected {
        return Err(DecodeError::WrongKind {
            expected,
            found: header.kind,
        });
    }
    if header.schema_version > registry.version() {
        return Err(DecodeError::FutureSchema {
            found: header.schema_version,
            supported: registry.version(),
        });
    }
    // Each node needs at least 20 bytes; cap the reservation by what is left.
    let mut nodes = Vec::with_capacity((header.node_count as usize).min(reader.remaining() / 20));
    for _ in 0..header.node_count {
        nodes.push(reader.node(registry)?);
    }
    let mut boundary = Vec::new();
    let mut resources: Vec<Node> = Vec::new();
    if header.kind == SnapshotKind::Subgraph {
        let count = reader.u32()?;
        for _ in 0..count {
            let entity = reader.entity()?;
            let class = ClassId(reader.u16()?);
            boundary.push((entity, class));
        }
        let count = reader.u32()?;
        for _ in 0..count {
            let node = reader.node(registry)?;
            if resources.iter().any(|r| r.id() == node.id()) {
                return Err(DecodeError::DuplicateNode(node.id()));
            }
            resources.push(node);
        }
    }
    if reader.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(reader.remaining()));
    }
    Ok(Package {
        header,
        nodes,
        boundary,
        resources,
    })
}

struct Encoder<'a> {
    out: &'a mut BytesMut,
}

impl Encoder<'_> {
    fn node(&mut self, node: &Node) -> Result<(), EncodeError> {
        self.out.put_slice(&node.id().to_bytes());
        self.out.put_u16_le(node.class().0);
        self.out.put_u16_le(len_u16("field count", node.fields().count())?);
        let base = node.address();
        for (key, field) in node.fields() {
            self.out.put_u16_le(key);
            field.accept(&base.append(key), self)?;
        }
        Ok(())
    }

    fn address(&mut self, address: &Address) -> Result<(), EncodeError> {
        self.out.put_slice(&address.entity().to_bytes());
        self.out.put_u8(len_u8("address depth", address.path().len())?);
        for key in address.path() {
            self.out.put_u16_le(*key);
        }
        Ok(())
    }

    fn blob(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.out.put_u32_le(len_u32("primitive length", bytes.len())?);
        self.out.put_slice(bytes);
        Ok(())
    }
}

impl FieldVisitor for Encoder<'_> {
    type Output = Result<(), EncodeError>;

    fn visit_primitive(&mut self, _address: &Address, value: &Value) -> Self::Output {
        self.out.put_u8(BODY_PRIMITIVE);
        self.out.put_u8(value.kind().tag());
        match value {
            Value::Bool(v) => self.out.put_u8(u8::from(*v)),
            Value::Int32(v) => self.out.put_i32_le(*v),
            Value::Int64(v) => self.out.put_i64_le(*v),
            Value::Float32(v) => self.out.put_u32_le(v.to_bits()),
            Value::String(v) => self.blob(v.as_bytes())?,
            Value::Bytes(v) => self.blob(v)?,
        }
        Ok(())
    }

    fn visit_pointer(&mut self, _address: &Address, pointer: &PointerField) -> Self::Output {
        self.out.put_u8(BODY_POINTER);
        match pointer.target() {
            Some(target) => {
                self.out.put_u8(1);
                self.address(target)
            }
            None => {
                self.out.put_u8(0);
                Ok(())
            }
        }
    }

    fn visit_array(&mut self, address: &Address, array: &ArrayField) -> Self::Output {
        self.out.put_u8(BODY_ARRAY);
        self.out.put_u16_le(len_u16("array length", array.len())?);
        for (index, element) in array.iter().enumerate() {
            // Bounded by the length check above.
            element.accept(&address.append(index as FieldKey), self)?;
        }
        Ok(())
    }

    fn visit_object(&mut self, address: &Address, object: &ObjectField) -> Self::Output {
        self.out.put_u8(BODY_OBJECT);
        self.out.put_u16_le(len_u16("object size", object.len())?);
        for (key, child) in object.iter() {
            self.out.put_u16_le(key);
            child.accept(&address.append(key), self)?;
        }
        Ok(())
    }
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl Reader<'_> {
    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, needed: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < needed {
            return Err(DecodeError::Truncated {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        self.need(2)?;
        Ok(self.buf.get_u16_le())
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        self.need(8)?;
        Ok(self.buf.get_i64_le())
    }

    fn blob(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.u32()? as usize;
        self.need(len)?;
        let mut out = vec![0; len];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    fn entity(&mut self) -> Result<EntityId, DecodeError> {
        self.need(16)?;
        let mut raw = [0u8; 16];
        self.buf.copy_to_slice(&mut raw);
        Ok(EntityId::from_bytes(raw))
    }

    fn address(&mut self) -> Result<Address, DecodeError> {
        let entity = self.entity()?;
        let len = self.u8()? as usize;
        let mut path = Vec::with_capacity(len);
        for _ in 0..len {
            path.push(self.u16()?);
        }
        Ok(Address::with_path(entity, &path))
    }

    fn header(&mut self) -> Result<Header, DecodeError> {
        self.need(HEADER_LEN)?;
        let mut magic = [0u8; 4];
        self.buf.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let format = self.u16()?;
        if format != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedFormat(format));
        }
        let kind_tag = self.u8()?;
        let kind = SnapshotKind::from_tag(kind_tag).ok_or(DecodeError::UnknownKind(kind_tag))?;
        let schema_version = self.u32()?;
        let node_count = self.u32()?;
        Ok(Header {
            format,
            kind,
            schema_version,
            node_count,
        })
    }

    fn node(&mut self, registry: &SchemaRegistry) -> Result<Node, DecodeError> {
        let id = self.entity()?;
        let class_id = self.u16()?;
        let class = registry
            .class(ClassId(class_id))
            .ok_or(DecodeError::UnknownClass(class_id))?;
        let mut fields = class.instantiate_fields();
        let count = self.u16()?;
        for _ in 0..count {
            let key = self.u16()?;
            let schema = class
                .fields
                .iter()
                .find(|f| f.key == key)
                .ok_or(DecodeError::UnknownField { class: class.name, key })?;
            let field = self.field(schema, class.name)?;
            fields.insert(key, field);
        }
        Ok(Node::from_parts(id, class.id, fields))
    }

    fn field(&mut self, schema: &FieldSchema, class: &'static str) -> Result<Field, DecodeError> {
        let shape = || DecodeError::FieldShape {
            class,
            field: schema.name,
        };
        let tag = self.u8()?;
        match (tag, &schema.ty) {
            (BODY_PRIMITIVE, FieldType::Primitive(default)) => {
                let kind_tag = self.u8()?;
                let kind = PrimitiveKind::from_tag(kind_tag).ok_or(DecodeError::InvalidTag {
                    what: "primitive kind",
                    tag: kind_tag,
                })?;
                if kind != default.kind() {
                    return Err(shape());
                }
                Ok(Field::Primitive(self.value(kind)?))
            }
            (BODY_POINTER, FieldType::Pointer(rule)) => {
                let target = match self.u8()? {
                    0 => None,
                    1 => Some(self.address()?),
                    other => {
                        return Err(DecodeError::InvalidTag {
                            what: "pointer",
                            tag: other,
                        });
                    }
                };
                Ok(Field::Pointer(PointerField::with_target(*rule, target)))
            }
            (BODY_ARRAY, FieldType::Array { element, .. }) => {
                let len = self.u16()?;
                let mut elements = Vec::with_capacity(usize::from(len).min(self.remaining()));
                for _ in 0..len {
                    elements.push(self.field(element, class)?);
                }
                Ok(Field::Array(ArrayField::from_elements(elements)))
            }
            (BODY_OBJECT, FieldType::Object(children)) => {
                let mut fields: std::collections::BTreeMap<FieldKey, Field> =
                    children.iter().map(|c| (c.key, c.instantiate())).collect();
                let count = self.u16()?;
                for _ in 0..count {
                    let key = self.u16()?;
                    let child = children
                        .iter()
                        .find(|c| c.key == key)
                        .ok_or(DecodeError::UnknownField { class, key })?;
                    fields.insert(key, self.field(child, class)?);
                }
                Ok(Field::Object(ObjectField::from_fields(fields)))
            }
            (BODY_PRIMITIVE..=BODY_OBJECT, _) => Err(shape()),
            (other, _) => Err(DecodeError::InvalidTag {
                what: "field body",
                tag: other,
            }),
        }
    }

    fn value(&mut self, kind: PrimitiveKind) -> Result<Value, DecodeError> {
        Ok(match kind {
            PrimitiveKind::Bool => Value::Bool(self.u8()? != 0),
            PrimitiveKind::Int32 => Value::Int32(self.i32()?),
            PrimitiveKind::Int64 => Value::Int64(self.i64()?),
            PrimitiveKind::Float32 => Value::Float32(f32::from_bits(self.u32()?)),
            PrimitiveKind::String => {
                Value::String(String::from_utf8(self.blob()?).map_err(|_| DecodeError::InvalidUtf8)?)
            }
            PrimitiveKind::Bytes => Value::Bytes(self.blob()?),
        })
    }
}
