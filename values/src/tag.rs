//! Predictor tags of the form `@username/name`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};

/// Canonical, lower-cased predictor tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
    username: String,
    name: String,
}

impl Tag {
    pub fn parse(tag: &str) -> ValueResult<Self> {
        let invalid = || ValueError::InvalidTag { tag: tag.to_string() };
        let rest = tag.trim().strip_prefix('@').ok_or_else(invalid)?;
        let (username, name) = rest.split_once('/').ok_or_else(invalid)?;
        if !is_valid_segment(username) || !is_valid_segment(name) {
            return Err(invalid());
        }
        Ok(Tag {
            username: username.to_ascii_lowercase(),
            name: name.to_ascii_lowercase(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.username, self.name)
    }
}

impl FromStr for Tag {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::parse(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = ValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Tag::parse(&s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}
