//! # Errors
//!
//! One error type for the whole crate. Local failures (bad type names,
//! unsupported operators, missing keys) are raised eagerly by the call that
//! detects them; remote faults are carried through unchanged as [`Fault`].

use crate::key::Key;

/// A fault reported by the remote object service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Fault {
    pub code: String,
    pub message: String,
}

impl Fault {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// True when the service rejected a read because the object does not exist.
    ///
    /// Transports use this to turn the fault into a `None` read result.
    pub fn is_object_not_found(&self) -> bool {
        self.message.starts_with("Unable to locate object")
    }
}

/// Errors raised by the mapping layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A type name is not in `CapitalizedWords` form.
    #[error("Invalid type name: '{0}'")]
    InvalidFormat(String),

    /// The expression builder was given an operator it does not know.
    #[error("Operator '{0}' is not supported")]
    UnsupportedOperator(String),

    /// Key resolution found no usable value.
    #[error("Key must not be null ({type_name})")]
    MissingKey { type_name: String },

    /// A compound foreign key and the key it is matched against have a
    /// different number of components.
    #[error("Foreign key '{foreign_key}' does not match key '{key}' of {type_name}")]
    KeyMismatch {
        type_name: String,
        foreign_key: String,
        key: Key,
    },

    /// `read_or_fail` found nothing.
    #[error("{type_name} [{key}] does not exist")]
    NotFound { type_name: String, key: Key },

    /// `first_or_fail` found nothing.
    #[error("No filtered results for type [{type_name}]")]
    NoResults { type_name: String },

    /// A key collection was indexed with a key it does not contain.
    #[error("The key '{0}' does not exist")]
    KeyNotFound(Key),

    /// A write was attempted on a key collection.
    #[error("Unable to modify key '{0}': key collection is immutable")]
    Immutable(Key),

    /// A builder that is not bound to a type was asked to execute.
    #[error("Builder is not bound to a type and cannot execute")]
    Detached,

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fault(#[from] Fault),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_not_found_fault() {
        let fault = Fault::new("soap:Server", "Unable to locate object: Job 12345");
        assert!(fault.is_object_not_found());

        let fault = Fault::new("soap:Server", "Transaction timed out");
        assert!(!fault.is_object_not_found());
    }

    #[test]
    fn test_messages() {
        let err = Error::NotFound {
            type_name: "SalesPerson".to_string(),
            key: Key::Int(5),
        };
        assert_eq!(err.to_string(), "SalesPerson [5] does not exist");

        let err = Error::KeyMismatch {
            type_name: "JobPart".to_string(),
            foreign_key: "job:jobPart".to_string(),
            key: Key::from("12345"),
        };
        assert_eq!(
            err.to_string(),
            "Foreign key 'job:jobPart' does not match key '12345' of JobPart"
        );

        let err = Error::UnsupportedOperator("~".to_string());
        assert_eq!(err.to_string(), "Operator '~' is not supported");
    }
}
