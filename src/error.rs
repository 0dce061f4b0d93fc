use thiserror::Error;

use crate::options::TypeScriptVersion;

/// Errors that abort a plugin run.
///
/// Every variant is fatal for the whole request: the response carries the
/// rendered message and no files.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("protoc-gen-ts requires TypeScript {minimum} or above, but the target is {found}.")]
    UnsupportedTypeScript {
        minimum: TypeScriptVersion,
        found: TypeScriptVersion,
    },

    #[error("unresolved type `{type_name}` referenced from `{file}`")]
    UnresolvedType { type_name: String, file: String },

    #[error("`{file}` references `{dependency}` but does not import it")]
    MissingDependency { file: String, dependency: String },

    #[error("map entry `{0}` must declare a scalar `key` field and a `value` field")]
    MalformedMapEntry(String),

    #[error("invalid default value `{value}` for field `{field}`")]
    InvalidDefault { field: String, value: String },

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("invalid value `{value}` for option `{key}`")]
    InvalidOption { key: String, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
