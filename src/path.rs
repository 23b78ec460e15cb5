//! Sia paths, upload file names and download paths.
//!
//! A Sia path is a `/`-separated path inside an upload.  It may not start with
//! a traversal sequence, contain empty or blank segments, or contain `.`/`..`
//! segments.  A single leading `/` is dropped.  Everything else, including
//! arbitrary UTF-8, is passed through untouched.

use chrono::Utc;
use thiserror::Error;

use crate::skylink::Skylink;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path cannot be empty")]
    Empty,
    #[error("Path cannot start with a traversal sequence")]
    Traversal,
    #[error("Path cannot contain an empty segment")]
    EmptySegment,
    #[error("Path cannot contain . or .. segments")]
    DotSegment,
    #[error("File name {0:?} can only contain alphanumeric characters, periods, underscores or hyphen-minus")]
    InvalidFileName(String),
    #[error("A non-default skylink must be supplied")]
    DefaultSkylink,
}

/// Validate a Sia path and return its normalised form.
pub fn validate(path: &str) -> Result<String, PathError> {
    if path.trim().is_empty() {
        return Err(PathError::Empty);
    }
    if path.starts_with("./") || path.starts_with("../") {
        return Err(PathError::Traversal);
    }

    let path = match path.strip_prefix('/') {
        Some(rest) if path.len() > 1 => rest,
        _ => path,
    };
    for segment in path.split('/') {
        if segment.trim().is_empty() {
            return Err(PathError::EmptySegment);
        }
        if segment == "." || segment == ".." {
            return Err(PathError::DotSegment);
        }
    }
    Ok(path.to_string())
}

/// Validate the `filename` an upload is registered under.  A blank name is
/// replaced with the current UTC time.
pub fn validate_file_name(name: &str) -> Result<String, PathError> {
    if name.trim().is_empty() {
        return Ok(Utc::now().format("%Y-%m-%d-%H-%M-%S").to_string());
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_');
    if !name.chars().all(allowed) {
        return Err(PathError::InvalidFileName(name.to_string()));
    }
    Ok(name.to_string())
}

/// Request path for downloading `skylink`, optionally a file inside it.
/// Any non-empty `path` adds the `/` separator, even when it is only slashes.
pub fn download_path(skylink: &Skylink, path: &str) -> Result<String, PathError> {
    if skylink.is_default() {
        return Err(PathError::DefaultSkylink);
    }
    if path.is_empty() {
        Ok(skylink.to_text())
    } else {
        Ok(format!("{skylink}/{}", path.trim_start_matches('/')))
    }
}
