use hyaux::{RegistryError, SchemaError};
use semver::{Version, VersionReq};
use strum::EnumIs;
use thiserror::Error;

use crate::node::NodeError;

#[derive(Debug, EnumIs, Error)]
pub enum IrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed IR payload: {0}")]
    Encoding(std::io::Error),

    #[error("Not an IR file: unexpected magic bytes {found:02x?}")]
    BadMagic { found: Vec<u8> },

    #[error("IR file format {found} is not supported by this reader (requires {required})")]
    IncompatibleVersion { found: Version, required: VersionReq },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration for '{file}': {source}")]
    ConfigWrite {
        source: toml::ser::Error,
        file: String,
    },
}

pub type IrResult<T> = Result<T, IrError>;
