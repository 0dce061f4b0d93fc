//! Parsing of the plugin parameter string passed by `protoc` (`--ts_opt=...`).

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::{Config, Error, Result};

/// The RPC client flavor generated for every service in a run.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Clients built on `@grpc/grpc-js` (or the deprecated `grpc` package).
    #[default]
    Node,
    /// Browser clients built on `grpc-web`.
    Web,
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Target> {
        match s {
            "node" => Ok(Target::Node),
            "web" => Ok(Target::Web),
            _ => Err(Error::InvalidOption {
                key: "target".to_owned(),
                value: s.to_owned(),
            }),
        }
    }
}

/// A `major.minor` TypeScript version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeScriptVersion {
    pub major: u32,
    pub minor: u32,
}

impl TypeScriptVersion {
    /// Oldest TypeScript release able to compile the generated code.
    pub const MINIMUM: TypeScriptVersion = TypeScriptVersion::new(4, 9);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_supported(&self) -> bool {
        *self >= Self::MINIMUM
    }
}

impl Default for TypeScriptVersion {
    fn default() -> Self {
        Self::new(5, 0)
    }
}

impl FromStr for TypeScriptVersion {
    type Err = Error;

    /// Accepts `5`, `5.2` and `5.2.3`; the patch component is ignored.
    fn from_str(s: &str) -> Result<TypeScriptVersion> {
        let invalid = || Error::InvalidOption {
            key: "ts_version".to_owned(),
            value: s.to_owned(),
        };

        let mut parts = s.split('.');
        let major = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(part) => part.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if let Some(patch) = parts.next() {
            patch.parse::<u32>().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(TypeScriptVersion::new(major, minor))
    }
}

impl fmt::Display for TypeScriptVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Config {
    /// Builds a configuration from the comma separated `key` / `key=value`
    /// parameter string.
    ///
    /// Unrecognized keys are rejected with [`Error::UnknownOption`].
    pub fn from_parameter(parameter: &str) -> Result<Config> {
        let mut config = Config::new();

        for token in parameter.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }

            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (token, None),
            };
            debug!("option: {key} = {value:?}");

            match key {
                "target" => {
                    config.target(required(key, value)?.parse()?);
                }
                "grpc_package" => {
                    config.grpc_package(required(key, value)?);
                }
                "ts_version" => {
                    config.ts_version(required(key, value)?.parse()?);
                }
                "no_namespace" => {
                    config.no_namespace(flag(key, value)?);
                }
                "no_grpc" => {
                    config.no_grpc(flag(key, value)?);
                }
                "unary_rpc_promise" => {
                    config.unary_rpc_promise(flag(key, value)?);
                }
                "json_names" => {
                    config.json_names(flag(key, value)?);
                }
                "explicit_override" => {
                    config.explicit_override(flag(key, value)?);
                }
                _ => return Err(Error::UnknownOption(key.to_owned())),
            }
        }

        Ok(config)
    }
}

fn required<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::InvalidOption {
            key: key.to_owned(),
            value: value.unwrap_or_default().to_owned(),
        }),
    }
}

/// A bare key enables a flag.
fn flag(key: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(value) => Err(Error::InvalidOption {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}
