//! Error types for native type registration.

use thiserror::Error;

/// Errors raised while registering record and union types.
///
/// Type definitions are checked once, when the builder finishes, so a
/// malformed schema never reaches the resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Type name must not be empty")]
    EmptyTypeName,

    #[error("Empty field name in type '{ty}'")]
    EmptyFieldName { ty: String },

    #[error("Field '{field}' of '{ty}' has type void")]
    VoidField { ty: String, field: String },

    #[error("Duplicate field '{field}' in type '{ty}'")]
    DuplicateField { ty: String, field: String },

    #[error("Unknown field '{field}' in type '{ty}'")]
    UnknownField { ty: String, field: String },

    #[error("Field '{field}' of '{ty}' is not a union (or pointer to one)")]
    NotAUnion { ty: String, field: String },

    #[error("Discriminant '{field}' of '{ty}' is not a scalar")]
    NotAScalar { ty: String, field: String },

    #[error("Union '{ty}' has no arm named '{arm}'")]
    UnknownArm { ty: String, arm: String },

    #[error("Union '{ty}' maps discriminant {discriminant} twice")]
    DuplicateDiscriminant { ty: String, discriminant: i64 },
}
