use fqa_core::domain::DisclosureItem;
use fqa_core::error::AppError;

pub mod dart;

/// Filing search and download.
pub trait DisclosureSource {
    /// Filings of `corp_code` received between the two `YYYYMMDD` dates, as the provider orders them.
    fn search(
        &self,
        corp_code: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DisclosureItem>, AppError>;

    /// Raw archive bytes for one filing.
    fn fetch_document(&self, rcept_no: &str) -> Result<Vec<u8>, AppError>;

    /// Raw archive bytes of the company code table.
    fn fetch_corp_codes(&self) -> Result<Vec<u8>, AppError>;
}
