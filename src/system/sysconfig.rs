//! Site-local override files in sysconfig format
//!
//! ```text
//! ## Type: integer
//! SHM_COUNT_REF_VALUE="4096"
//! ```

use crate::error::{Result, SaptuneError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Assignment {
    value: String,
    line: usize,
}

/// Parsed `KEY="value"` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SysconfigFile {
    path: PathBuf,
    values: BTreeMap<String, Assignment>,
}

impl SysconfigFile {
    /// Load `path`; a missing file yields an empty document
    pub fn load_optional(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No override file at {:?}, using defaults", path);
                Ok(Self {
                    path: path.to_path_buf(),
                    values: BTreeMap::new(),
                })
            }
            Err(e) => Err(SaptuneError::io(path, e)),
        }
    }

    /// Parse content; `path` is only used for error reporting
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut values = BTreeMap::new();

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| SaptuneError::config_parse(path, line, "expected KEY=value"))?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(SaptuneError::config_parse(path, line, format!("invalid key {:?}", key)));
            }

            values.insert(
                key.to_string(),
                Assignment {
                    value: unquote(value.trim()).ok_or_else(|| {
                        SaptuneError::config_parse(path, line, "unterminated quote")
                    })?,
                    line,
                },
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Raw string value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|a| a.value.as_str())
    }

    /// Unsigned value, `default` when the key is absent or empty
    pub fn get_u64(&self, key: &str, default: u64) -> Result<u64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(a) if a.value.is_empty() => Ok(default),
            Some(a) => a.value.parse().map_err(|_| {
                SaptuneError::config_parse(
                    &self.path,
                    a.line,
                    format!("{} is not an unsigned integer: {:?}", key, a.value),
                )
            }),
        }
    }
}

fn unquote(value: &str) -> Option<String> {
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            return rest.strip_suffix(quote).map(String::from);
        }
    }
    Some(value.to_string())
}
