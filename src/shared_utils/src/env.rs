//! Environment variable lookup with structured errors.

use std::{env, ffi::OsString, path::PathBuf};

use thiserror::Error;

/// Errors raised while reading environment variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// The variable is set but its value is not valid unicode.
    #[error("Environment variable {name} is not valid unicode: {value:?}")]
    NotUnicode {
        /// Variable name.
        name: String,
        /// Raw value as read from the OS.
        value: OsString,
    },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvError> {
    get_optional_env_var(name)?.ok_or_else(|| EnvError::Missing(name.to_string()))
}

/// Reads an environment variable that may legitimately be absent.
///
/// Unset and empty (after trimming) both map to `Ok(None)`; a value that is
/// not valid unicode is an error rather than being silently ignored.
pub fn get_optional_env_var(name: &str) -> Result<Option<String>, EnvError> {
    match env::var(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(value)) => Err(EnvError::NotUnicode {
            name: name.to_string(),
            value,
        }),
    }
}

/// Resolves a file path from an explicit value, falling back to an environment variable.
///
/// The explicit value always wins; the variable is only consulted when it is `None`.
pub fn path_from_arg_or_env(arg: Option<PathBuf>, name: &str) -> Result<Option<PathBuf>, EnvError> {
    match arg {
        Some(p) => Ok(Some(p)),
        None => Ok(get_optional_env_var(name)?.map(PathBuf::from)),
    }
}
