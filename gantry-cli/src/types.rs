//! Identifier parsing shared by the run and approval commands

use std::fmt;
use uuid::Uuid;

/// A full UUID, or a lowercase prefix expected to match exactly one ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    Full(Uuid),
    Prefix(String),
}

impl IdOrPrefix {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match Uuid::parse_str(input) {
            Ok(uuid) => Self::Full(uuid),
            Err(_) => Self::Prefix(input.to_ascii_lowercase()),
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Full(uuid) => Some(*uuid),
            Self::Prefix(_) => None,
        }
    }

    pub fn matches(&self, id: &Uuid) -> bool {
        match self {
            Self::Full(uuid) => uuid == id,
            Self::Prefix(prefix) => id.hyphenated().to_string().starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(uuid) => uuid.fmt(f),
            Self::Prefix(prefix) => f.write_str(prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(IdOrPrefix::parse(&id.to_string()), IdOrPrefix::Full(id));
        assert_eq!(IdOrPrefix::parse(&id.to_string()).as_uuid(), Some(id));
    }

    #[test]
    fn test_prefix_matching() {
        let id = Uuid::parse_str("5f0c6e1a-9a4b-4c1e-8d8e-3b1f2a7c9d00").unwrap();
        assert!(IdOrPrefix::parse(" 5F0C").matches(&id));
        assert!(IdOrPrefix::parse("5f0c6e1a-9a").matches(&id));
        assert!(!IdOrPrefix::parse("5f1").matches(&id));
        assert!(IdOrPrefix::Full(id).matches(&id));
        assert_eq!(IdOrPrefix::parse("5F0C").to_string(), "5f0c");
    }
}
