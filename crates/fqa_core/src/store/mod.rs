use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::validate_rcept_no;
use crate::error::{codes, AppError};

/// File layout under the data directory.
///
/// ```text
/// {root}/corp_codes/corp_codes.csv
/// {root}/disclosures/{rcept_no}_{report_nm}.zip
/// {root}/clean/{rcept_no}.txt
/// {root}/reports/
/// ```
///
/// Every per-filing path is keyed by a validated receipt number, so nothing lands outside `root`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn corp_codes_dir(&self) -> PathBuf {
        self.root.join("corp_codes")
    }

    fn disclosures_dir(&self) -> PathBuf {
        self.root.join("disclosures")
    }

    fn clean_dir(&self) -> PathBuf {
        self.root.join("clean")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    pub fn corp_codes_path(&self) -> PathBuf {
        self.corp_codes_dir().join("corp_codes.csv")
    }

    pub fn archive_path(&self, rcept_no: &str, report_nm: &str) -> Result<PathBuf, AppError> {
        validate_rcept_no(rcept_no)?;
        Ok(self
            .disclosures_dir()
            .join(format!("{}_{}.zip", rcept_no, sanitize_file_component(report_nm))))
    }

    pub fn text_path(&self, rcept_no: &str) -> Result<PathBuf, AppError> {
        validate_rcept_no(rcept_no)?;
        Ok(self.clean_dir().join(format!("{rcept_no}.txt")))
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [
            self.corp_codes_dir(),
            self.disclosures_dir(),
            self.clean_dir(),
            self.reports_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| {
                AppError::new(codes::STORE_WRITE_FAILED, "Failed to create data directory")
                    .with_details(format!("path={}; err={}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn save_archive(
        &self,
        rcept_no: &str,
        report_nm: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        let path = self.archive_path(rcept_no, report_nm)?;
        self.ensure_dirs()?;
        write_atomic(&path, bytes)?;
        Ok(path)
    }

    pub fn save_text(&self, rcept_no: &str, text: &str) -> Result<PathBuf, AppError> {
        let path = self.text_path(rcept_no)?;
        self.ensure_dirs()?;
        write_atomic(&path, text.as_bytes())?;
        Ok(path)
    }

    pub fn has_text(&self, rcept_no: &str) -> bool {
        self.text_path(rcept_no).is_ok_and(|p| p.is_file())
    }

    pub fn read_text(&self, rcept_no: &str) -> Result<String, AppError> {
        read_text_lossy(&self.text_path(rcept_no)?)
    }

    pub fn save_corp_codes_csv(&self, csv_text: &str) -> Result<PathBuf, AppError> {
        self.ensure_dirs()?;
        let path = self.corp_codes_path();
        write_atomic(&path, csv_text.as_bytes())?;
        Ok(path)
    }
}

/// Read a document text file, replacing undecodable bytes.
pub fn read_text_lossy(path: &Path) -> Result<String, AppError> {
    if !path.is_file() {
        return Err(
            AppError::new(codes::DOC_TEXT_NOT_FOUND, "Document text file not found")
                .with_details(format!("path={}", path.display())),
        );
    }
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(codes::STORE_READ_FAILED, "Failed to read document text")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| {
        AppError::new(codes::STORE_WRITE_FAILED, "Failed to write file")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new(codes::STORE_WRITE_FAILED, "Failed to finalize file write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}

fn sanitize_file_component(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::open(dir.path().to_path_buf());

        let err = store.read_text("20250101000001").expect_err("missing");
        assert_eq!(err.code, codes::DOC_TEXT_NOT_FOUND);

        let path = store.save_text("20250101000001", "Ⅰ. 개요").expect("save");
        assert!(path.ends_with("clean/20250101000001.txt"));
        assert!(store.has_text("20250101000001"));
        assert_eq!(store.read_text("20250101000001").expect("read"), "Ⅰ. 개요");
    }

    #[test]
    fn lossy_read_replaces_invalid_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.txt");
        fs::write(&path, [0xEC, 0xB4, b'o', b'k', 0xFF]).expect("write");
        let text = read_text_lossy(&path).expect("read");
        assert!(text.contains("ok"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn archive_name_is_filesystem_safe() {
        let store = DocumentStore::open(PathBuf::from("data"));
        let p = store
            .archive_path("20251127000739", "증권발행실적보고서/정정")
            .expect("path");
        assert_eq!(
            p,
            PathBuf::from("data/disclosures/20251127000739_증권발행실적보고서_정정.zip")
        );
    }

    #[test]
    fn traversal_receipt_numbers_never_touch_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("data");
        let store = DocumentStore::open(root.clone());

        for bad in ["../../escaped", "..", "2025/1127000739", ""] {
            let err = store.save_text(bad, "x").expect_err("save");
            assert_eq!(err.code, codes::DART_INVALID_QUERY);
            let err = store.save_archive(bad, "보고서", b"PK").expect_err("archive");
            assert_eq!(err.code, codes::DART_INVALID_QUERY);
            let err = store.read_text(bad).expect_err("read");
            assert_eq!(err.code, codes::DART_INVALID_QUERY);
            assert!(!store.has_text(bad));
        }
        assert!(!root.exists());
        assert!(!dir.path().join("escaped.txt").exists());
    }
}
