//! Company name → corp code lookup table (OpenDART `CORPCODE.xml`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpCode {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    #[serde(alias = "\u{feff}corp_code")]
    pub corp_code: String,
    pub corp_name: String,
    #[serde(default)]
    pub stock_code: String,
    #[serde(default)]
    pub modify_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpCodeTable {
    rows: Vec<CorpCode>,
}

/// Corp codes are fixed 8-digit strings; CSV round-trips can lose the leading zeros.
pub fn pad_corp_code(code: &str) -> String {
    let code = code.trim();
    if !code.is_empty() && code.len() < 8 && code.bytes().all(|b| b.is_ascii_digit()) {
        format!("{code:0>8}")
    } else {
        code.to_string()
    }
}

impl CorpCodeTable {
    pub fn new(rows: Vec<CorpCode>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.corp_code = pad_corp_code(&r.corp_code);
                r.corp_name = r.corp_name.trim().to_string();
                r
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[CorpCode] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse `<result><list><corp_code/>..</list>..</result>`.
    pub fn from_corpcode_xml(xml: &str) -> Result<Self, AppError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut rows = Vec::new();
        let mut current: Option<CorpCode> = None;
        let mut field: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if name == "list" {
                        current = Some(CorpCode::default());
                    } else if current.is_some() {
                        field = Some(name);
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(row), Some(f)) = (current.as_mut(), field.as_deref()) {
                        let value = t.unescape().map_err(|e| {
                            AppError::new(
                                codes::CORP_CODE_TABLE_INVALID,
                                "Failed to decode corp code XML text",
                            )
                            .with_details(e.to_string())
                        })?;
                        let value = value.trim().to_string();
                        match f {
                            "corp_code" => row.corp_code = value,
                            "corp_name" => row.corp_name = value,
                            "stock_code" => row.stock_code = value,
                            "modify_date" => row.modify_date = value,
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"list" {
                        if let Some(row) = current.take() {
                            rows.push(row);
                        }
                    }
                    field = None;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(AppError::new(
                        codes::CORP_CODE_TABLE_INVALID,
                        "Failed to parse corp code XML",
                    )
                    .with_details(format!(
                        "pos={}; err={}",
                        reader.buffer_position(),
                        e
                    )))
                }
            }
        }

        Ok(Self::new(rows))
    }

    pub fn from_csv_reader<R: Read>(input: R) -> Result<Self, AppError> {
        let mut rdr = csv::Reader::from_reader(input);
        let mut rows = Vec::new();
        for (i, rec) in rdr.deserialize::<CorpCode>().enumerate() {
            let row = rec.map_err(|e| {
                AppError::new(codes::CORP_CODE_TABLE_INVALID, "Failed to decode corp code CSV row")
                    .with_details(format!("row={}; err={}", i + 1, e))
            })?;
            rows.push(row);
        }
        Ok(Self::new(rows))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(
                codes::CORP_CODE_TABLE_INVALID,
                "Corp code table not found; download it first",
            )
            .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_string(&self) -> Result<String, AppError> {
        let mut w = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            w.serialize(row).map_err(|e| {
                AppError::new(codes::CORP_CODE_TABLE_INVALID, "Failed to encode corp code CSV")
                    .with_details(e.to_string())
            })?;
        }
        let bytes = w.into_inner().map_err(|e| {
            AppError::new(codes::CORP_CODE_TABLE_INVALID, "Failed to flush corp code CSV")
                .with_details(e.to_string())
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Exact name match first, otherwise the first row whose name contains `corp_name`.
    pub fn find(&self, corp_name: &str) -> Result<&CorpCode, AppError> {
        let needle = corp_name.trim();
        if needle.is_empty() {
            return Err(AppError::new(codes::CORP_CODE_NOT_FOUND, "Company name is empty"));
        }
        self.rows
            .iter()
            .find(|r| r.corp_name == needle)
            .or_else(|| self.rows.iter().find(|r| r.corp_name.contains(needle)))
            .ok_or_else(|| {
                AppError::new(
                    codes::CORP_CODE_NOT_FOUND,
                    "Company name not found in corp code table",
                )
                .with_details(format!("corp_name={needle}"))
            })
    }
}
