use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

/// DART receipt numbers are 14 ASCII digits (`YYYYMMDD` plus a serial).
pub const RCEPT_NO_LEN: usize = 14;

/// Reject anything that is not a well-formed receipt number.
///
/// The receipt number names files under the data directory, so this runs before any path is built.
pub fn validate_rcept_no(rcept_no: &str) -> Result<(), AppError> {
    if rcept_no.len() == RCEPT_NO_LEN && rcept_no.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }
    Err(
        AppError::new(codes::DART_INVALID_QUERY, "Receipt number must be 14 digits")
            .with_details(format!("rcept_no={rcept_no:?}")),
    )
}

/// One filing as listed by the disclosure source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisclosureItem {
    pub rcept_no: String,
    pub report_nm: String,
    /// YYYYMMDD
    pub rcept_dt: String,
}

/// Identity of a loaded document; the receipt number is the key everywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMeta {
    pub rcept_no: String,
    pub report_nm: String,
    pub viewer_url: String,
    pub text_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    pub sid: String,
    pub chunk_id: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportItem {
    pub label: String,
    pub question: String,
    pub answer: String,
    /// `S#` labels named on the answer's citation line, if any.
    #[serde(default)]
    pub cited: Vec<String>,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedPaths {
    pub json: String,
    pub md: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub rcept_no: String,
    pub report_name: String,
    pub viewer: String,
    /// RFC3339, UTC.
    pub generated_at: String,
    pub items: Vec<ReportItem>,
    pub saved: SavedPaths,
}

/// What a caller needs to re-serve a generated report without touching the filesystem again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportPayload {
    pub report: Report,
    pub json_text: String,
    pub md_text: String,
}

impl ReportPayload {
    pub fn json_filename(&self) -> Option<&str> {
        file_name(&self.report.saved.json)
    }

    pub fn md_filename(&self) -> Option<&str> {
        file_name(&self.report.saved.md)
    }
}

fn file_name(path: &str) -> Option<&str> {
    std::path::Path::new(path).file_name().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_numbers_are_fourteen_digits() {
        assert!(validate_rcept_no("20251127000739").is_ok());
        for bad in [
            "",
            "2025112700073",
            "202511270007390",
            "../../escaped",
            "2025112700073a",
            "２０２５１１２７０００７３９",
        ] {
            let err = validate_rcept_no(bad).expect_err(bad);
            assert_eq!(err.code, codes::DART_INVALID_QUERY);
        }
    }
}
