//! Loose object store
//!
//! Objects live under `.git/objects/<xx>/<remaining-38-hex>` as zlib-compressed
//! `"<type> <size>\0<content>"`. Writes go to a temporary file in the target
//! directory and are published with a rename, so readers never observe a
//! partially written object and two writers of the same id converge.

use crate::artifacts::objects::OBJECT_ID_HEX_LENGTH;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, hash};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{IoContext, RepositoryError, Result};
use bytes::Bytes;
use fake::rand;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

// TODO: implement packfiles for better performance and storage efficiency
impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    /// Id the content would be stored under; nothing is written
    pub fn hash(object_type: ObjectType, content: &[u8]) -> ObjectId {
        hash(object_type, content)
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.object_path(object_id).is_file()
    }

    /// Store raw content under its id; storing existing content is a no-op
    pub fn put(&self, object_type: ObjectType, content: &[u8]) -> Result<ObjectId> {
        let object_id = hash(object_type, content);
        let object_path = self.object_path(&object_id);

        if object_path.exists() {
            trace!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| RepositoryError::not_found("object directory", object_path.display()))?;
        std::fs::create_dir_all(object_dir).io_context(|| {
            format!("unable to create object directory {}", object_dir.display())
        })?;

        let mut data = object_type.header(content.len()).into_bytes();
        data.extend_from_slice(content);
        self.write_object(&object_path, &data)?;

        debug!(oid = %object_id, kind = %object_type, size = content.len(), "stored object");
        Ok(object_id)
    }

    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        self.put(object.object_type(), &object.serialize()?)
    }

    /// Type and payload of a stored object
    pub fn get(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        let mut reader = Cursor::new(self.read_object(object_id)?);
        let (object_type, size) =
            ObjectType::parse_header(&mut reader).map_err(|error| error.for_object(object_id))?;

        let mut content = Vec::with_capacity(size);
        reader.read_to_end(&mut content)?;
        if content.len() != size {
            return Err(RepositoryError::CorruptObject {
                oid: object_id.to_string(),
                reason: format!(
                    "header declares {size} bytes but payload has {}",
                    content.len()
                ),
            });
        }

        Ok((object_type, Bytes::from(content)))
    }

    /// Object type without decoding the payload
    pub fn read_header(&self, object_id: &ObjectId) -> Result<ObjectType> {
        let file = std::fs::File::open(self.object_path(object_id))
            .map_err(|_| RepositoryError::not_found("object", object_id))?;
        let mut reader = std::io::BufReader::new(flate2::read::ZlibDecoder::new(file));
        let (object_type, _) =
            ObjectType::parse_header(&mut reader).map_err(|error| error.for_object(object_id))?;

        Ok(object_type)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> Result<ObjectBox> {
        let (object_type, content) = self.get(object_id)?;

        ObjectBox::decode(object_type, &content).map_err(|error| error.for_object(object_id))
    }

    /// Decode an object that must be of `expected` type
    pub fn parse_object_as(&self, object_id: &ObjectId, expected: ObjectType) -> Result<ObjectBox> {
        let (object_type, content) = self.get(object_id)?;
        if object_type != expected {
            return Err(RepositoryError::TypeMismatch {
                oid: object_id.to_string(),
                expected,
                actual: object_type,
            });
        }

        ObjectBox::decode(object_type, &content).map_err(|error| error.for_object(object_id))
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        self.parse_object_as(object_id, ObjectType::Commit)?
            .into_commit()
            .ok_or_else(|| RepositoryError::not_found("commit", object_id))
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> Result<Tree> {
        self.parse_object_as(object_id, ObjectType::Tree)?
            .into_tree()
            .ok_or_else(|| RepositoryError::not_found("tree", object_id))
    }

    fn read_object(&self, object_id: &ObjectId) -> Result<Bytes> {
        let object_path = self.object_path(object_id);

        let object_content = match std::fs::read(&object_path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::not_found("object", object_id));
            }
            Err(error) => {
                return Err(error).io_context(|| {
                    format!("unable to read object file {}", object_path.display())
                });
            }
        };

        Self::decompress(&object_content).map_err(|error| error.for_object(object_id))
    }

    fn write_object(&self, object_path: &Path, object_content: &[u8]) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| RepositoryError::not_found("object directory", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let written = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .and_then(|mut file| {
                file.write_all(&object_content)?;
                file.sync_all()
            })
            .and_then(|_| std::fs::rename(&temp_object_path, object_path));

        if written.is_err() {
            let _ = std::fs::remove_file(&temp_object_path);
        }

        written.io_context(|| format!("unable to write object file {}", object_path.display()))
    }

    fn compress(data: &[u8]) -> Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .io_context(|| "unable to compress object content")?;

        encoder
            .finish()
            .map(Bytes::from)
            .io_context(|| "unable to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .map_err(|error| RepositoryError::corrupt(format!("unable to inflate object: {error}")))?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// Find all objects whose id starts with the given hex prefix
    ///
    /// More than one match means the prefix is ambiguous.
    ///
    /// # Performance
    ///
    /// - For prefixes of 2+ characters, only searches the specific directory
    /// - For shorter prefixes, every fan-out directory is scanned
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if !ObjectId::is_hex_prefix(&prefix) {
            return Ok(Vec::new());
        }

        let dir_names = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        let mut matches = Vec::new();
        for dir_name in dir_names {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            let entries = std::fs::read_dir(&dir_path)
                .io_context(|| format!("unable to list {}", dir_path.display()))?;
            for entry in entries {
                let file_name = entry?.file_name();
                let full_oid = format!("{dir_name}{}", file_name.to_string_lossy());

                if full_oid.len() == OBJECT_ID_HEX_LENGTH
                    && full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::try_parse(&full_oid)
                {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }
}
