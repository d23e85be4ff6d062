use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{RepositoryError, Result};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;

/// Encode the object payload (everything after the loose-object header)
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Decode an object payload; the loose-object header has already been consumed
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    fn object_id(&self) -> Result<ObjectId> {
        Ok(hash(self.object_type(), &self.serialize()?))
    }
}

/// Compute an object id without storing anything
///
/// The digest covers `"<type> <byte-length>\0"` followed by the raw content.
pub fn hash(object_type: ObjectType, content: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(object_type.header(content.len()).as_bytes());
    hasher.update(content);

    let mut digest = [0u8; OBJECT_ID_LENGTH];
    digest.copy_from_slice(&hasher.finalize());
    ObjectId::from_bytes(digest)
}

/// Any decoded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
    Tag(Box<Tag>),
}

impl ObjectBox {
    pub fn decode(object_type: ObjectType, content: &[u8]) -> Result<Self> {
        Ok(match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(content)?)),
            ObjectType::Tree => ObjectBox::Tree(Box::new(Tree::deserialize(content)?)),
            ObjectType::Commit => ObjectBox::Commit(Box::new(Commit::deserialize(content)?)),
            ObjectType::Tag => ObjectBox::Tag(Box::new(Tag::deserialize(content)?)),
        })
    }

    pub fn encode(&self) -> Result<(ObjectType, Bytes)> {
        Ok((self.object_type(), self.inner().serialize()?))
    }

    pub fn object_type(&self) -> ObjectType {
        self.inner().object_type()
    }

    pub fn object_id(&self) -> Result<ObjectId> {
        self.inner().object_id()
    }

    pub fn display(&self) -> String {
        self.inner().display()
    }

    fn inner(&self) -> &dyn ObjectDyn {
        match self {
            ObjectBox::Blob(blob) => blob.as_ref(),
            ObjectBox::Tree(tree) => tree.as_ref(),
            ObjectBox::Commit(commit) => commit.as_ref(),
            ObjectBox::Tag(tag) => tag.as_ref(),
        }
    }

    pub fn into_commit(self) -> Option<Commit> {
        match self {
            ObjectBox::Commit(commit) => Some(*commit),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            ObjectBox::Tree(tree) => Some(*tree),
            _ => None,
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        match self {
            ObjectBox::Blob(blob) => Some(*blob),
            _ => None,
        }
    }

    pub fn into_tag(self) -> Option<Tag> {
        match self {
            ObjectBox::Tag(tag) => Some(*tag),
            _ => None,
        }
    }

    /// Fail with `TypeMismatch` unless this object has the expected type
    pub fn expect_type(self, oid: &ObjectId, expected: ObjectType) -> Result<Self> {
        let actual = self.object_type();
        if actual != expected {
            return Err(RepositoryError::TypeMismatch {
                oid: oid.to_string(),
                expected,
                actual,
            });
        }

        Ok(self)
    }
}

// object-safe view over the variants
trait ObjectDyn {
    fn object_type(&self) -> ObjectType;
    fn serialize(&self) -> Result<Bytes>;
    fn display(&self) -> String;
    fn object_id(&self) -> Result<ObjectId>;
}

impl<T: Object> ObjectDyn for T {
    fn object_type(&self) -> ObjectType {
        Object::object_type(self)
    }

    fn serialize(&self) -> Result<Bytes> {
        Packable::serialize(self)
    }

    fn display(&self) -> String {
        Object::display(self)
    }

    fn object_id(&self) -> Result<ObjectId> {
        Object::object_id(self)
    }
}
