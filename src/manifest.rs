use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Package descriptor. Only `version` is ever consumed; the rest of the
/// document is kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    fields: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("reading manifest at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing manifest at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest at {0} is not a JSON object")]
    NotAnObject(PathBuf),
    #[error("manifest missing required field: {0}")]
    MissingField(String),
    #[error("manifest field '{field}' must be a {expected}")]
    InvalidField { field: String, expected: &'static str },
}

impl Manifest {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// The `version` string that names the upload directory.
    pub fn version(&self) -> Result<&str, ManifestError> {
        match self.fields.get("version") {
            None => Err(ManifestError::MissingField("version".to_string())),
            Some(Value::String(version)) => Ok(version),
            Some(_) => Err(ManifestError::InvalidField {
                field: "version".to_string(),
                expected: "string",
            }),
        }
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(path, &data)
}

fn parse_manifest(path: &Path, data: &str) -> Result<Manifest, ManifestError> {
    let value: Value = serde_json::from_str(data).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Manifest::from_value(value).ok_or_else(|| ManifestError::NotAnObject(path.to_path_buf()))
}
