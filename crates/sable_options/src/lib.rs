//! sable_options: Compilation options.
//!
//! Options are read from a JSON document with camelCase keys. Every field is
//! optional; accessors apply the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Entry point name used when `entryPointName` is not set.
pub const DEFAULT_ENTRY_POINT: &str = "Main";

/// Options that shape a single compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilationOptions {
    /// Script compilations keep their top-level statements and may be
    /// chained onto a previous compilation.
    pub is_script: Option<bool>,
    pub ignore_accessibility: Option<bool>,
    /// Bind everything as if inside a low-level region.
    pub allow_low_level: Option<bool>,
    pub entry_point_name: Option<String>,
    /// Names of types supplied by referenced libraries.
    pub library_types: Option<Vec<String>>,
}

impl CompilationOptions {
    pub fn is_script(&self) -> bool {
        self.is_script.unwrap_or(false)
    }

    pub fn ignore_accessibility(&self) -> bool {
        self.ignore_accessibility.unwrap_or(false)
    }

    pub fn allow_low_level(&self) -> bool {
        self.allow_low_level.unwrap_or(false)
    }

    pub fn entry_point_name(&self) -> &str {
        self.entry_point_name.as_deref().unwrap_or(DEFAULT_ENTRY_POINT)
    }

    pub fn library_types(&self) -> &[String] {
        self.library_types.as_deref().unwrap_or(&[])
    }

    /// Check the values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(name) = &self.entry_point_name {
            let valid = name
                .chars()
                .next()
                .is_some_and(|first| first.is_alphabetic() || first == '_')
                && name.chars().all(|c| c.is_alphanumeric() || c == '_');
            if !valid {
                return Err(OptionsError::InvalidEntryPoint(name.clone()));
            }
        }
        if let Some(duplicate) = first_duplicate(self.library_types()) {
            return Err(OptionsError::DuplicateLibraryType(duplicate.to_string()));
        }
        Ok(())
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    names
        .iter()
        .enumerate()
        .find(|(index, name)| names[..*index].contains(name))
        .map(|(_, name)| name.as_str())
}

/// Errors produced while reading options.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("failed to read options file '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options document")]
    Parse(#[from] serde_json::Error),
    #[error("'{0}' is not a valid entry point name")]
    InvalidEntryPoint(String),
    #[error("library type '{0}' is listed more than once")]
    DuplicateLibraryType(String),
}

/// Parse and validate options from JSON text.
pub fn parse_options(json: &str) -> Result<CompilationOptions, OptionsError> {
    let options: CompilationOptions = serde_json::from_str(json)?;
    options.validate()?;
    Ok(options)
}

pub fn parse_options_file(path: &Path) -> Result<CompilationOptions, OptionsError> {
    let json = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_options(&json)
}
