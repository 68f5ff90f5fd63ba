use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by the core, the agent crate and the CLI.
///
/// `code` is a stable upper-snake identifier (see [`codes`]); `details` carries
/// free-form context such as paths or upstream messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(d) = self.details.as_deref() {
            write!(f, " ({d})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const CONFIG_READ_FAILED: &str = "CONFIG_READ_FAILED";
    pub const CONFIG_MISSING_CREDENTIAL: &str = "CONFIG_MISSING_CREDENTIAL";

    pub const DOC_TEXT_NOT_FOUND: &str = "DOC_TEXT_NOT_FOUND";
    pub const DOC_NOT_LOADED: &str = "DOC_NOT_LOADED";

    pub const STORE_WRITE_FAILED: &str = "STORE_WRITE_FAILED";
    pub const STORE_READ_FAILED: &str = "STORE_READ_FAILED";

    pub const ARCHIVE_INVALID: &str = "ARCHIVE_INVALID";
    pub const ARCHIVE_NO_MARKUP: &str = "ARCHIVE_NO_MARKUP";

    pub const CORP_CODE_TABLE_INVALID: &str = "CORP_CODE_TABLE_INVALID";
    pub const CORP_CODE_NOT_FOUND: &str = "CORP_CODE_NOT_FOUND";

    pub const REPORT_ENCODE_FAILED: &str = "REPORT_ENCODE_FAILED";
    pub const REPORT_WRITE_FAILED: &str = "REPORT_WRITE_FAILED";

    pub const LLM_REQUEST_FAILED: &str = "LLM_REQUEST_FAILED";
    pub const LLM_EMPTY_RESPONSE: &str = "LLM_EMPTY_RESPONSE";

    pub const DART_INVALID_QUERY: &str = "DART_INVALID_QUERY";
    pub const DART_REQUEST_FAILED: &str = "DART_REQUEST_FAILED";
    pub const DART_API_STATUS: &str = "DART_API_STATUS";
    pub const DART_DOCUMENT_NOT_ARCHIVE: &str = "DART_DOCUMENT_NOT_ARCHIVE";
    pub const DART_ARCHIVE_TOO_LARGE: &str = "DART_ARCHIVE_TOO_LARGE";

    pub const CLI_INPUT_FAILED: &str = "CLI_INPUT_FAILED";
    pub const CLI_OUTPUT_FAILED: &str = "CLI_OUTPUT_FAILED";
}
