//! Fixed-question report generation for one indexed filing.

use std::path::Path;

use fqa_core::config::ChunkingConfig;
use fqa_core::domain::{DocumentMeta, ReportItem, ReportPayload};
use fqa_core::error::AppError;
use fqa_core::report::{persist_report, ReportDraft};
use fqa_core::session::IndexedDocument;
use fqa_core::store::read_text_lossy;
use time::OffsetDateTime;

use crate::draft::answer_question;
use crate::llm::Llm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuestion {
    pub label: &'static str,
    pub question: &'static str,
}

/// Asked in this order; the order is also the section order of the report.
pub const REPORT_QUESTIONS: &[ReportQuestion] = &[
    ReportQuestion {
        label: "총발행금액",
        question: "총발행금액은 얼마야?",
    },
    ReportQuestion {
        label: "상환기일",
        question: "상환기일은 언제야?",
    },
    ReportQuestion {
        label: "신용평가등급",
        question: "신용평가기관별 신용평가등급을 정리해줘.",
    },
    ReportQuestion {
        label: "인수기관",
        question: "인수기관은 어디야?",
    },
];

/// Run [`REPORT_QUESTIONS`] against `doc` and persist the JSON and Markdown forms.
pub fn generate_report(
    doc: &IndexedDocument,
    llm: &dyn Llm,
    reports_dir: &Path,
    k: usize,
    generated_at: OffsetDateTime,
) -> Result<ReportPayload, AppError> {
    generate_report_with(REPORT_QUESTIONS, doc, llm, reports_dir, k, generated_at)
}

/// Every answer is gathered before anything is written. The first failed model
/// call aborts the run and leaves `reports_dir` untouched.
pub fn generate_report_with(
    questions: &[ReportQuestion],
    doc: &IndexedDocument,
    llm: &dyn Llm,
    reports_dir: &Path,
    k: usize,
    generated_at: OffsetDateTime,
) -> Result<ReportPayload, AppError> {
    let mut items: Vec<ReportItem> = Vec::with_capacity(questions.len());
    for q in questions {
        let ans = answer_question(doc, llm, q.question, k)?;
        items.push(ReportItem {
            label: q.label.to_string(),
            question: q.question.to_string(),
            answer: ans.answer,
            cited: ans.cited,
            sources: ans.sources,
        });
    }

    persist_report(
        reports_dir,
        ReportDraft {
            rcept_no: doc.meta.rcept_no.clone(),
            report_name: doc.meta.report_nm.clone(),
            viewer: doc.meta.viewer_url.clone(),
            items,
        },
        generated_at,
    )
}

/// Read `meta.text_path`, chunk and index it, then generate the report.
pub fn generate_report_from_text_file(
    meta: DocumentMeta,
    chunking: ChunkingConfig,
    llm: &dyn Llm,
    reports_dir: &Path,
    k: usize,
    generated_at: OffsetDateTime,
) -> Result<ReportPayload, AppError> {
    let text = read_text_lossy(Path::new(&meta.text_path))?;
    let doc = IndexedDocument::build(meta, &text, chunking);
    generate_report(&doc, llm, reports_dir, k, generated_at)
}
