/// Result alias used by every fallible engine entry point.
pub type EngineResult<T> = Result<T, EngineError>;

/// Contract violations. Expected constraint problems are reported as
/// [`crate::validate::ConstraintViolation`] data, never through this type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown layout mode: {0:?}")]
    UnknownLayoutMode(String),

    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("duplicate node id: {0:?}")]
    DuplicateNodeId(String),

    #[error("node {node:?} has a non-finite {field}")]
    NonFiniteValue { node: String, field: &'static str },

    #[error("invalid layout catalog: {0}")]
    InvalidCatalog(String),
}

impl EngineError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDescriptor(msg.into())
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::InvalidCatalog(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = EngineError::UnknownLayoutMode("carousel".to_string());
        assert_eq!(err.to_string(), "unknown layout mode: \"carousel\"");

        let err = EngineError::NonFiniteValue {
            node: "a".to_string(),
            field: "size",
        };
        assert_eq!(err.to_string(), "node \"a\" has a non-finite size");
    }

    #[test]
    fn helpers_build_expected_variants() {
        assert!(matches!(
            EngineError::malformed("x"),
            EngineError::MalformedDescriptor(msg) if msg == "x"
        ));
        assert!(matches!(
            EngineError::catalog("y"),
            EngineError::InvalidCatalog(msg) if msg == "y"
        ));
    }
}
