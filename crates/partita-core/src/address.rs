//! Stable addressing for nodes and fields.
//!
//! Every node is identified by a 128-bit [`EntityId`]. Every field inside a
//! node is identified by an [`Address`]: the owning entity plus the path of
//! small integer [`FieldKey`]s leading to the field. Addresses are immutable
//! values; [`Address::append`] returns a new, longer address.
//!
//! # Ordering
//!
//! Addresses order lexicographically over `(entity, path)`. A node address
//! (empty path) therefore sorts directly before all of its field addresses,
//! and all descendants of any address form one contiguous run in a
//! `BTreeMap`/`BTreeSet`. The graph relies on this for range scans.
//!
//! ```rust
//! use partita_core::{Address, EntityId};
//!
//! let id = EntityId::from_u128(7);
//! let node = Address::compose(id);
//! let volume = node.append(3);
//! let nested = volume.append(1);
//!
//! assert!(node < volume && volume < nested);
//! assert!(nested.is_within(&node));
//! assert_eq!(node.path().len(), 0);
//! ```

use core::fmt;
use core::str::FromStr;

use smallvec::SmallVec;
use uuid::Uuid;

/// Key of a field within its parent node, object, or array.
///
/// Object and node fields use the keys declared by their schema; array
/// elements use their index.
pub type FieldKey = u16;

/// Path of field keys from a node down to a field.
pub type FieldPath = SmallVec<[FieldKey; 4]>;

/// Globally unique identifier of a node.
///
/// Generated ids are random (UUID v4) and never recycled within a process
/// run, so an id that was deleted can never be confused with a new node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds an identifier from a raw 128-bit value.
    ///
    /// Intended for tests and fixtures where deterministic ids are useful.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Builds an identifier from its 16-byte big-endian representation.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the 16-byte big-endian representation.
    pub const fn to_bytes(self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Returns the raw 128-bit value.
    pub const fn as_u128(self) -> u128 {
        self.0.as_u128()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Stable identifier of a node (empty path) or of a field within a node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    entity: EntityId,
    path: FieldPath,
}

impl Address {
    /// Address of the node itself.
    pub fn compose(entity: EntityId) -> Self {
        Self {
            entity,
            path: FieldPath::new(),
        }
    }

    /// Builds an address from an entity and an explicit field path.
    pub fn with_path(entity: EntityId, path: &[FieldKey]) -> Self {
        Self {
            entity,
            path: FieldPath::from_slice(path),
        }
    }

    /// Returns a new address one level deeper. The receiver is unchanged.
    #[must_use]
    pub fn append(&self, key: FieldKey) -> Self {
        let mut path = self.path.clone();
        path.push(key);
        Self {
            entity: self.entity,
            path,
        }
    }

    /// Owning entity.
    #[inline]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Field path below the entity (empty for node addresses).
    #[inline]
    pub fn path(&self) -> &[FieldKey] {
        &self.path
    }

    /// `true` when this address names a node rather than a field.
    #[inline]
    pub fn is_node(&self) -> bool {
        self.path.is_empty()
    }

    /// Address of the owning node.
    pub fn node(&self) -> Self {
        Self::compose(self.entity)
    }

    /// Parent address, or `None` for node addresses.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.path.split_last()?;
        Some(Self::with_path(self.entity, rest))
    }

    /// Last key of the path, or `None` for node addresses.
    pub fn last_key(&self) -> Option<FieldKey> {
        self.path.last().copied()
    }

    /// `true` if `self` equals `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &Address) -> bool {
        self.entity == ancestor.entity && self.path.starts_with(&ancestor.path)
    }

    /// Same path, different entity. Used when remapping copied subgraphs.
    pub fn with_entity(&self, entity: EntityId) -> Self {
        Self {
            entity,
            path: self.path.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)?;
        for key in &self.path {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl From<EntityId> for Address {
    fn from(entity: EntityId) -> Self {
        Self::compose(entity)
    }
}
