//! Input resolution: validate a scan file before any pixel work starts.
//!
//! Existence, readability, file type, and magic bytes are all checked
//! eagerly here — a batch run should refuse a mistyped path or a mislabeled
//! file immediately, not twenty images in when the decoder finally trips
//! over it.

use crate::config::FileType;
use crate::error::CardSliceError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated input: the path exists, is readable, and its contents match
/// its declared type.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub file_type: FileType,
}

/// Validate an input path and detect its file type from the suffix.
///
/// PNG and PDF magic bytes are verified so a renamed JPEG fails here with a
/// clear message instead of deep inside the decoder. SVG has no reliable
/// magic (it may open with a BOM, XML declaration, or comment), so its
/// contents are only validated when the renderer parses them.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, CardSliceError> {
    let file_type = FileType::from_path(path)?;

    if !path.exists() {
        return Err(CardSliceError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CardSliceError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(CardSliceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let expected_magic: Option<&[u8; 4]> = match file_type {
        FileType::Png => Some(b"\x89PNG"),
        FileType::Pdf => Some(b"%PDF"),
        FileType::Svg => None,
    };
    if let Some(expected) = expected_magic {
        let mut magic = [0u8; 4];
        if file.read_exact(&mut magic).is_err() || &magic != expected {
            return Err(CardSliceError::InvalidFileContents {
                path: path.to_path_buf(),
                extension: format!("{file_type:?}").to_ascii_lowercase(),
                magic,
            });
        }
    }

    debug!("resolved input: {} ({:?})", path.display(), file_type);
    Ok(ResolvedInput {
        path: path.to_path_buf(),
        file_type,
    })
}
