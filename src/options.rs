//! Upload options and the query strings they produce.

use chrono::Utc;

use crate::path::{self, PathError};

/// Portal endpoint that accepts uploads.
pub const UPLOAD_ENDPOINT: &str = "/skynet/skyfile";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Compute the skylink without storing the content.
    pub dry_run: bool,
}

impl UploadOptions {
    fn push_params(&self, params: &mut Vec<(&'static str, String)>) {
        if self.dry_run {
            params.push(("dryrun", "true".to_string()));
        }
    }

    /// `""` for the defaults, otherwise `?key=value&...`.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        self.push_params(&mut params);
        build_query(&params)
    }
}

/// Options for uploads of several files under one skylink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiFileUploadOptions {
    pub base: UploadOptions,
    file_name: Option<String>,
    default_path: Option<String>,
    /// Serve the file listing instead of a default file.
    pub disable_default_path: bool,
}

impl MultiFileUploadOptions {
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, value: Option<&str>) -> Result<(), PathError> {
        self.file_name = value.map(path::validate).transpose()?;
        Ok(())
    }

    pub fn default_path(&self) -> Option<&str> {
        self.default_path.as_deref()
    }

    /// File served when the skylink is opened without a sub-path.
    pub fn set_default_path(&mut self, value: Option<&str>) -> Result<(), PathError> {
        self.default_path = value.map(path::validate).transpose()?;
        Ok(())
    }

    pub fn to_query_string(&self) -> String {
        let file_name = match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => Utc::now().format("%Y-%m-%d:%H-%M-%S").to_string(),
        };

        let mut params = vec![("filename", file_name)];
        if self.disable_default_path {
            params.push(("disabledefaultpath", "true".to_string()));
        } else if let Some(default_path) = self.default_path.as_deref().filter(|p| !p.is_empty()) {
            params.push(("defaultpath", default_path.to_string()));
        }
        self.base.push_params(&mut params);
        build_query(&params)
    }
}

/// Upload request path for `options`.  A configured file name must also pass
/// the upload file-name charset check.
pub fn upload_path(options: &MultiFileUploadOptions) -> Result<String, PathError> {
    if let Some(name) = options.file_name() {
        path::validate_file_name(name)?;
    }
    Ok(format!("{UPLOAD_ENDPOINT}{}", options.to_query_string()))
}

fn build_query(params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    format!("?{}", pairs.join("&"))
}
