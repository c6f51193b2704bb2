use std::fmt;
use std::path::Path;

use super::error::StorageError;
use super::hash::ContentHash;

const MAX_EXTENSION_LEN: usize = 8;

/// Public name of a stored image: `{sha256-hex}` or `{sha256-hex}.{ext}`.
///
/// The extension only carries the original file type for `Content-Type`
/// guessing; the blob itself is addressed by the hash alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobName {
    hash: ContentHash,
    extension: Option<String>,
}

impl BlobName {
    /// Build a name for a freshly stored upload, keeping the uploaded
    /// filename's extension when it is short and alphanumeric.
    pub fn new(hash: ContentHash, original_filename: Option<&str>) -> Self {
        let extension = original_filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| is_valid_extension(ext));
        Self { hash, extension }
    }

    /// Parse a name previously produced by [`BlobName::file_name`].
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let (hex, extension) = match s.split_once('.') {
            Some((hex, ext)) => {
                if !is_valid_extension(ext) {
                    return Err(StorageError::InvalidName(format!(
                        "unsupported extension '{ext}'"
                    )));
                }
                (hex, Some(ext.to_string()))
            }
            None => (s, None),
        };

        Ok(Self {
            hash: hex.parse()?,
            extension,
        })
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn file_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{ext}", self.hash),
            None => self.hash.to_string(),
        }
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

fn is_valid_extension(ext: &str) -> bool {
    !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
