use std::sync::Arc;

use fqa_agent::agent::generate_report;
use fqa_agent::draft::{answer_question, AskAnswer};
use fqa_agent::llm::Llm;
use fqa_agent::source::DisclosureSource;
use fqa_core::config::AppConfig;
use fqa_core::domain::{validate_rcept_no, DisclosureItem, DocumentMeta, ReportPayload};
use fqa_core::error::{codes, AppError};
use fqa_core::ingest::archive::extract_first_markup;
use fqa_core::ingest::corp_codes::CorpCodeTable;
use fqa_core::ingest::markup::extract_text;
use fqa_core::session::{CacheStats, DocumentIndexCache, IndexedDocument};
use fqa_core::store::DocumentStore;
use time::OffsetDateTime;

#[derive(Debug, serde::Serialize)]
pub struct CorpCodesResponse {
    pub path: String,
    pub rows: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct SearchResponse {
    pub corp_code: String,
    pub corp_name: String,
    pub items: Vec<DisclosureItem>,
}

#[derive(Debug, serde::Serialize)]
pub struct LoadResponse {
    pub rcept_no: String,
    pub report_nm: String,
    pub viewer_url: String,
    pub text_path: String,
    pub chunks: usize,
    /// False when the text was already in the local store.
    pub downloaded: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionStatus {
    pub current: Option<String>,
    pub cache: CacheStats,
}

/// Session state for one process: the loaded documents and which one questions go to.
pub struct Service {
    config: AppConfig,
    store: DocumentStore,
    cache: DocumentIndexCache,
    llm: Option<Box<dyn Llm>>,
    source: Option<Box<dyn DisclosureSource>>,
    current: Option<String>,
}

impl Service {
    pub fn new(config: AppConfig) -> Self {
        let store = DocumentStore::open(config.data_dir.clone());
        Self {
            config,
            store,
            cache: DocumentIndexCache::new(),
            llm: None,
            source: None,
            current: None,
        }
    }

    pub fn with_llm(mut self, llm: Box<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_source(mut self, source: Box<dyn DisclosureSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn llm(&self) -> Result<&dyn Llm, AppError> {
        self.llm.as_deref().ok_or_else(|| {
            AppError::new(
                codes::CONFIG_MISSING_CREDENTIAL,
                "Language model is not configured; set OPENAI_API_KEY",
            )
        })
    }

    fn source(&self) -> Result<&dyn DisclosureSource, AppError> {
        self.source.as_deref().ok_or_else(|| {
            AppError::new(
                codes::CONFIG_MISSING_CREDENTIAL,
                "Disclosure source is not configured; set DART_API_KEY",
            )
        })
    }

    /// Download the company code table and persist it as CSV.
    pub fn corp_codes(&self) -> Result<CorpCodesResponse, AppError> {
        let bytes = self.source()?.fetch_corp_codes()?;
        let xml = extract_first_markup(&bytes)?;
        let table = CorpCodeTable::from_corpcode_xml(&xml.text)?;
        let path = self.store.save_corp_codes_csv(&table.to_csv_string()?)?;
        log::info!("saved {} corp codes to {}", table.len(), path.display());
        Ok(CorpCodesResponse {
            path: path.to_string_lossy().to_string(),
            rows: table.len(),
        })
    }

    pub fn search(
        &self,
        corp_name: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<SearchResponse, AppError> {
        let table = CorpCodeTable::from_csv_path(&self.store.corp_codes_path())?;
        let corp = table.find(corp_name)?;
        let items = self.source()?.search(&corp.corp_code, start_date, end_date)?;
        Ok(SearchResponse {
            corp_code: corp.corp_code.clone(),
            corp_name: corp.corp_name.clone(),
            items,
        })
    }

    /// Make a filing the current document, downloading it only when its text is not stored yet.
    pub fn load(&mut self, rcept_no: &str, report_nm: &str) -> Result<LoadResponse, AppError> {
        let rcept_no = rcept_no.trim();
        validate_rcept_no(rcept_no)?;

        let downloaded = !self.store.has_text(rcept_no);
        if downloaded {
            let bytes = self.source()?.fetch_document(rcept_no)?;
            self.store.save_archive(rcept_no, report_nm, &bytes)?;
            let markup = extract_first_markup(&bytes)?;
            let text = extract_text(&markup.text);
            log::info!(
                "extracted text: rcept_no={} entry={} chars={}",
                rcept_no,
                markup.entry_name,
                text.chars().count()
            );
            self.store.save_text(rcept_no, &text)?;
        }

        let text = self.store.read_text(rcept_no)?;
        let meta = DocumentMeta {
            rcept_no: rcept_no.to_string(),
            report_nm: report_nm.to_string(),
            viewer_url: self.config.dart.viewer_url(rcept_no),
            text_path: self.store.text_path(rcept_no)?.to_string_lossy().to_string(),
        };
        let doc = self
            .cache
            .get_or_build(meta, &text, self.config.chunking);
        self.current = Some(rcept_no.to_string());

        Ok(LoadResponse {
            rcept_no: doc.meta.rcept_no.clone(),
            report_nm: doc.meta.report_nm.clone(),
            viewer_url: doc.meta.viewer_url.clone(),
            text_path: doc.meta.text_path.clone(),
            chunks: doc.chunks.len(),
            downloaded,
        })
    }

    fn current_document(&self) -> Result<Arc<IndexedDocument>, AppError> {
        let not_loaded = || {
            AppError::new(
                codes::DOC_NOT_LOADED,
                "No document is loaded; search for a filing and load it first",
            )
        };
        let rcept_no = self.current.as_deref().ok_or_else(not_loaded)?;
        self.cache
            .get(rcept_no)
            .ok_or_else(|| not_loaded().with_details(format!("rcept_no={rcept_no}")))
    }

    pub fn ask(&self, question: &str, top_k: Option<usize>) -> Result<AskAnswer, AppError> {
        let doc = self.current_document()?;
        let k = top_k.unwrap_or(self.config.retrieval.top_k).max(1);
        answer_question(&doc, self.llm()?, question, k)
    }

    pub fn report(&self) -> Result<ReportPayload, AppError> {
        self.report_at(OffsetDateTime::now_utc())
    }

    pub fn report_at(&self, generated_at: OffsetDateTime) -> Result<ReportPayload, AppError> {
        let doc = self.current_document()?;
        generate_report(
            &doc,
            self.llm()?,
            &self.store.reports_dir(),
            self.config.retrieval.top_k,
            generated_at,
        )
    }

    /// Drop a document's cached index; the next load rebuilds it from the stored text.
    pub fn unload(&mut self, rcept_no: &str) -> bool {
        if self.current.as_deref() == Some(rcept_no) {
            self.current = None;
        }
        self.cache.invalidate(rcept_no)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            current: self.current.clone(),
            cache: self.cache.stats(),
        }
    }
}
