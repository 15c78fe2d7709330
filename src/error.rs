use std::fmt::Display;

use serde::ser;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("field set `{name}` was not found on `{definition}`")]
    UnknownFieldSet { definition: String, name: String },
    #[error("could not resolve field `{field}` on {object}")]
    UnresolvedField { field: String, object: String },
    #[error("field `{field}` should resolve to {expected}")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },
    #[error("no serializer registered for shape `{0}`")]
    UnknownShape(String),
    #[error("shape `{0}` registered twice")]
    DuplicateShape(String),
    #[error("a global registry is already installed")]
    RegistryInstalled,
    #[error("Error serializing: {0}")]
    Serializing(String),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Serializing(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serializing(err.to_string())
    }
}
