//! Git annotated tag object
//!
//! ## Format
//!
//! ```text
//! tag <size>\0
//! object <target-sha>
//! type <target-type>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```
//!
//! The `tagger` line is optional; old tags written without one must still decode.

use crate::artifacts::objects::commit::split_headers;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::errors::{RepositoryError, Result};
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Option<Signature>,
    message: String,
}

impl Tag {
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tagger(&self) -> Option<&Signature> {
        self.tagger.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("object {}", self.target),
            format!("type {}", self.target_type),
            format!("tag {}", self.name),
        ];
        if let Some(tagger) = &self.tagger {
            lines.push(format!("tagger {}", tagger.display()));
        }

        lines
    }
}

impl Packable for Tag {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = self.header_lines().join("\n");
        content.push_str("\n\n");
        content.push_str(&self.message);

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tag {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|error| RepositoryError::corrupt(format!("tag is not UTF-8: {error}")))?;

        let (headers, message) = split_headers(&content)?;
        let mut headers = headers.into_iter();

        let mut expect = |wanted: &str| match headers.next() {
            Some((key, value)) if key == wanted => Ok(value),
            _ => Err(RepositoryError::corrupt(format!(
                "tag is missing its {wanted} line"
            ))),
        };

        let target = ObjectId::try_parse(&expect("object")?)
            .map_err(|_| RepositoryError::corrupt("invalid target id in tag"))?;
        let target_type = ObjectType::try_from(expect("type")?.as_str())?;
        let name = expect("tag")?;

        let tagger = match headers.next() {
            Some((key, value)) if key == "tagger" => Some(Signature::try_from(value.as_str())?),
            Some((key, _)) => {
                return Err(RepositoryError::corrupt(format!(
                    "unexpected '{key}' header in tag"
                )));
            }
            None => None,
        };

        Ok(Tag::new(target, target_type, name, tagger, message))
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}
