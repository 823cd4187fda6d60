//! Error types shared by the indexes, the persistence layer and the catalog.

use thiserror::Error;

/// Reasons a persisted line fails to parse into a [`Town`](crate::Town).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 5 colon-separated fields, found {0}")]
    FieldCount(usize),
    #[error("population {0:?} is not a non-negative integer")]
    Population(String),
    #[error("elevation {0:?} is not an integer")]
    Elevation(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("town {0:?} already exists")]
    DuplicateKey(String),
    #[error("town {0:?} not found")]
    NotFound(String),
    #[error("hash table is full ({capacity} slots)")]
    TableFull { capacity: usize },
    #[error("record arena has no ids left")]
    ArenaExhausted,
    #[error("hash table capacity must be at least 1")]
    InvalidCapacity,
    #[error("{field} exceeds {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error("{field} must not contain ':' or a line break")]
    InvalidField { field: &'static str },
    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: ParseError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CatalogError::TableFull { capacity: 10 };
        assert_eq!(err.to_string(), "hash table is full (10 slots)");

        let err = CatalogError::MalformedRecord {
            line: 3,
            source: ParseError::FieldCount(4),
        };
        assert_eq!(
            err.to_string(),
            "malformed record on line 3: expected 5 colon-separated fields, found 4"
        );

        let err = CatalogError::InvalidField { field: "district" };
        assert_eq!(err.to_string(), "district must not contain ':' or a line break");

        let err: CatalogError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
