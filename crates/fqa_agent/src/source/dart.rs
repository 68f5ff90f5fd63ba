//! OpenDART client: `list.json`, `document.xml` and `corpCode.xml`.

use std::io::Read;
use std::time::Duration;

use fqa_core::config::DartConfig;
use fqa_core::domain::{validate_rcept_no, DisclosureItem};
use fqa_core::error::{codes, AppError};
use fqa_core::ingest::archive::looks_like_zip;
use serde::Deserialize;
use time::macros::format_description;
use time::Date;

use super::DisclosureSource;

pub const STATUS_OK: &str = "000";
pub const STATUS_NO_DATA: &str = "013";
const STATUS_RATE_LIMITED: &str = "020";

const MAX_ARCHIVE_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct DartClient {
    base_url: String,
    api_key: String,
    page_count: u32,
    timeout: Duration,
}

impl std::fmt::Debug for DartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DartClient")
            .field("base_url", &self.base_url)
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Vec<ListEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ListEntry {
    rcept_no: String,
    report_nm: String,
    rcept_dt: String,
}

/// `YYYYMMDD`, and a real calendar date.
pub fn validate_date(s: &str) -> Result<(), AppError> {
    let fmt = format_description!("[year][month][day]");
    let ok = s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) && Date::parse(s, &fmt).is_ok();
    if ok {
        Ok(())
    } else {
        Err(
            AppError::new(codes::DART_INVALID_QUERY, "Dates must be YYYYMMDD")
                .with_details(format!("value={s}")),
        )
    }
}

/// Decode a `list.json` body. "No data" is an empty result, any other non-OK status an error.
pub fn parse_list_json(body: &str) -> Result<Vec<DisclosureItem>, AppError> {
    let resp: ListResponse = serde_json::from_str(body).map_err(|e| {
        AppError::new(codes::DART_REQUEST_FAILED, "Failed to decode disclosure list")
            .with_details(e.to_string())
    })?;

    match resp.status.as_str() {
        STATUS_OK => Ok(resp
            .list
            .into_iter()
            .map(|e| DisclosureItem {
                rcept_no: e.rcept_no,
                report_nm: e.report_nm.trim().to_string(),
                rcept_dt: e.rcept_dt,
            })
            .collect()),
        STATUS_NO_DATA => Ok(Vec::new()),
        status => Err(
            AppError::new(codes::DART_API_STATUS, "Disclosure API returned an error status")
                .with_details(format!("status={status}; message={}", resp.message))
                .with_retryable(status == STATUS_RATE_LIMITED),
        ),
    }
}

impl DartClient {
    pub fn from_config(cfg: &DartConfig, api_key: &str) -> Result<Self, AppError> {
        let base_url = cfg.base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(
                AppError::new(codes::CONFIG_INVALID, "dart.base_url must be an http(s) URL")
                    .with_details(format!("base_url={base_url}")),
            );
        }
        if api_key.trim().is_empty() {
            return Err(AppError::new(
                codes::CONFIG_MISSING_CREDENTIAL,
                "DART API key is empty",
            ));
        }
        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            page_count: cfg.page_count,
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }

    fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<ureq::Response, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut req = ureq::get(&url)
            .timeout(self.timeout)
            .query("crtfc_key", &self.api_key);
        for (k, v) in params {
            req = req.query(k, v);
        }
        log::debug!("GET {url} {params:?}");

        match req.call() {
            Ok(r) => Ok(r),
            Err(ureq::Error::Status(status, _)) => Err(
                AppError::new(codes::DART_REQUEST_FAILED, "Disclosure API request failed")
                    .with_details(format!("endpoint={endpoint}; status={status}"))
                    .with_retryable(status == 429 || status >= 500),
            ),
            Err(e) => Err(
                AppError::new(codes::DART_REQUEST_FAILED, "Failed to reach disclosure API")
                    .with_details(format!("endpoint={endpoint}; err={e}"))
                    .with_retryable(true),
            ),
        }
    }

    /// Archive endpoints answer errors with a small XML body instead of a zip.
    fn get_archive(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, AppError> {
        let resp = self.get(endpoint, params)?;
        let bytes = read_capped(resp.into_reader(), MAX_ARCHIVE_BYTES)
            .map_err(|e| {
                let details = match e.details.as_deref() {
                    Some(d) => format!("endpoint={endpoint}; {d}"),
                    None => format!("endpoint={endpoint}"),
                };
                e.with_details(details)
            })?;

        if !looks_like_zip(&bytes) {
            let head: String = String::from_utf8_lossy(&bytes).chars().take(300).collect();
            return Err(AppError::new(
                codes::DART_DOCUMENT_NOT_ARCHIVE,
                "Disclosure API did not return an archive",
            )
            .with_details(format!("endpoint={endpoint}; body={head}")));
        }
        log::info!("downloaded {endpoint}: {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// Read a download body, failing instead of truncating once it exceeds `limit` bytes.
pub fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| {
            AppError::new(codes::DART_REQUEST_FAILED, "Failed to read archive download")
                .with_details(e.to_string())
                .with_retryable(true)
        })?;
    if bytes.len() as u64 > limit {
        return Err(AppError::new(
            codes::DART_ARCHIVE_TOO_LARGE,
            format!("Archive download exceeds {limit} bytes"),
        ));
    }
    Ok(bytes)
}

impl DisclosureSource for DartClient {
    fn search(
        &self,
        corp_code: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DisclosureItem>, AppError> {
        validate_date(start_date)?;
        validate_date(end_date)?;
        if start_date > end_date {
            return Err(
                AppError::new(codes::DART_INVALID_QUERY, "Start date is after end date")
                    .with_details(format!("start={start_date}; end={end_date}")),
            );
        }

        let page_count = self.page_count.to_string();
        let resp = self.get(
            "list.json",
            &[
                ("corp_code", corp_code),
                ("bgn_de", start_date),
                ("end_de", end_date),
                ("page_count", page_count.as_str()),
            ],
        )?;
        let body = resp.into_string().map_err(|e| {
            AppError::new(codes::DART_REQUEST_FAILED, "Failed to read disclosure list")
                .with_details(e.to_string())
                .with_retryable(true)
        })?;
        let items = parse_list_json(&body)?;
        log::info!("found {} filings for corp_code={corp_code}", items.len());
        Ok(items)
    }

    fn fetch_document(&self, rcept_no: &str) -> Result<Vec<u8>, AppError> {
        validate_rcept_no(rcept_no)?;
        self.get_archive("document.xml", &[("rcept_no", rcept_no)])
    }

    fn fetch_corp_codes(&self) -> Result<Vec<u8>, AppError> {
        self.get_archive("corpCode.xml", &[])
    }
}
