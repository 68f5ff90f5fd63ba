use std::io::{Cursor, Read};

use crate::error::{codes, AppError};

/// The markup file chosen from a filing archive, decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub entry_name: String,
    pub text: String,
}

/// Zip archives start with a local file header (`PK\x03\x04`) or, when empty, an end record.
pub fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06")
}

/// Pick the first `.xml` entry by name and decode it lossily as UTF-8.
pub fn extract_first_markup(bytes: &[u8]) -> Result<ExtractedDocument, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        AppError::new(codes::ARCHIVE_INVALID, "Failed to open filing archive")
            .with_details(e.to_string())
    })?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.to_ascii_lowercase().ends_with(".xml"))
        .map(str::to_string)
        .collect();
    names.sort();
    let entry_name = names.into_iter().next().ok_or_else(|| {
        AppError::new(codes::ARCHIVE_NO_MARKUP, "Filing archive contains no XML document")
    })?;

    let mut raw = Vec::new();
    archive
        .by_name(&entry_name)
        .and_then(|mut f| f.read_to_end(&mut raw).map_err(zip::result::ZipError::from))
        .map_err(|e| {
            AppError::new(codes::ARCHIVE_INVALID, "Failed to read archive entry")
                .with_details(format!("entry={entry_name}; err={e}"))
        })?;

    log::debug!("extracted {entry_name} ({} bytes)", raw.len());
    Ok(ExtractedDocument {
        entry_name,
        text: String::from_utf8_lossy(&raw).into_owned(),
    })
}
