use std::cell::RefCell;
use std::fs;

use fqa_agent::agent::{generate_report, generate_report_from_text_file, REPORT_QUESTIONS};
use fqa_agent::llm::Llm;
use fqa_core::config::ChunkingConfig;
use fqa_core::domain::DocumentMeta;
use fqa_core::error::{codes, AppError};
use fqa_core::session::IndexedDocument;
use pretty_assertions::assert_eq;
use time::macros::datetime;

const FILING: &str = "증권발행실적보고서\n\
Ⅰ. 발행 개요\n총 발행금액은 100,000,000,000원이다.\n\
Ⅱ. 상환 조건\n상환 기일은 2028년 11월 27일이다.\n\
Ⅲ. 신용평가\n한국기업평가 AA+, 나이스신용평가 AA+ 신용평가 등급을 받았다.\n\
Ⅳ. 인수\n인수 기관은 대신증권이다.";

/// Records every prompt and answers with a citation to the first source.
struct RecordingLlm {
    prompts: RefCell<Vec<String>>,
}

impl Llm for RecordingLlm {
    fn complete(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(format!(
            "Answer:\n- 답변 {}\nEvidence:\n- [S1] chunk_id=0: 인용\nCitations: [S1]",
            self.prompts.borrow().len()
        ))
    }
}

/// Succeeds `ok_calls` times, then fails.
struct FailingLlm {
    ok_calls: usize,
    calls: RefCell<usize>,
}

impl Llm for FailingLlm {
    fn complete(&self, _prompt: &str) -> Result<String, AppError> {
        let mut calls = self.calls.borrow_mut();
        *calls += 1;
        if *calls > self.ok_calls {
            return Err(AppError::new(codes::LLM_REQUEST_FAILED, "mock outage").with_retryable(true));
        }
        Ok("Answer:\n- ok\nCitations: [S1]".to_string())
    }
}

fn meta(text_path: &str) -> DocumentMeta {
    DocumentMeta {
        rcept_no: "20251127000739".to_string(),
        report_nm: "증권발행실적보고서".to_string(),
        viewer_url: "https://dart.fss.or.kr/dsaf001/main.do?rcpNo=20251127000739".to_string(),
        text_path: text_path.to_string(),
    }
}

#[test]
fn report_asks_every_question_in_order_and_persists_both_forms() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = IndexedDocument::build(meta("unused"), FILING, ChunkingConfig::default());
    let llm = RecordingLlm {
        prompts: RefCell::new(Vec::new()),
    };

    let payload = generate_report(
        &doc,
        &llm,
        &dir.path().join("reports"),
        3,
        datetime!(2026-02-01 09:30:00 UTC),
    )
    .expect("report");

    let prompts = llm.prompts.borrow();
    assert_eq!(prompts.len(), REPORT_QUESTIONS.len());
    for (prompt, q) in prompts.iter().zip(REPORT_QUESTIONS) {
        assert!(prompt.contains(q.question));
    }

    let labels: Vec<&str> = payload.report.items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["총발행금액", "상환기일", "신용평가등급", "인수기관"]);
    for item in &payload.report.items {
        assert_eq!(item.sources.len(), 3);
        assert_eq!(item.sources[0].sid, "S1");
        assert_eq!(item.cited, vec!["S1".to_string()]);
    }
    // Each keyword lives in its own section chunk, which must rank first.
    let top: Vec<usize> = payload
        .report
        .items
        .iter()
        .map(|i| i.sources[0].chunk_id)
        .collect();
    assert_eq!(top, vec![1, 2, 3, 4]);

    assert_eq!(payload.report.viewer, doc.meta.viewer_url);
    assert_eq!(
        payload.json_filename(),
        Some("20251127000739_report_20260201_093000.json")
    );
    assert_eq!(fs::read_to_string(&payload.report.saved.md).expect("md"), payload.md_text);
    assert!(payload.md_text.contains("## 인수기관"));
    assert!(payload.md_text.contains("- 답변 4"));
}

#[test]
fn failed_answer_aborts_without_writing_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let reports = dir.path().join("reports");
    let doc = IndexedDocument::build(meta("unused"), FILING, ChunkingConfig::default());
    let llm = FailingLlm {
        ok_calls: 2,
        calls: RefCell::new(0),
    };

    let err = generate_report(&doc, &llm, &reports, 3, datetime!(2026-02-01 09:30:00 UTC))
        .expect_err("should abort");
    assert_eq!(err.code, codes::LLM_REQUEST_FAILED);
    assert!(err.retryable);
    assert_eq!(*llm.calls.borrow(), 3);
    assert!(!reports.exists());
}

#[test]
fn report_from_text_file_reads_stored_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let text_path = dir.path().join("20251127000739.txt");
    fs::write(&text_path, FILING).expect("write");
    let llm = RecordingLlm {
        prompts: RefCell::new(Vec::new()),
    };

    let payload = generate_report_from_text_file(
        meta(&text_path.to_string_lossy()),
        ChunkingConfig::default(),
        &llm,
        &dir.path().join("reports"),
        2,
        datetime!(2026-02-01 09:30:00 UTC),
    )
    .expect("report");
    assert_eq!(payload.report.items.len(), 4);
    assert!(payload.report.items.iter().all(|i| i.sources.len() == 2));
}

#[test]
fn report_from_missing_text_file_fails_before_any_model_call() {
    let dir = tempfile::tempdir().expect("tempdir");
    let llm = FailingLlm {
        ok_calls: 0,
        calls: RefCell::new(0),
    };
    let err = generate_report_from_text_file(
        meta(&dir.path().join("missing.txt").to_string_lossy()),
        ChunkingConfig::default(),
        &llm,
        dir.path(),
        3,
        datetime!(2026-02-01 09:30:00 UTC),
    )
    .expect_err("missing");
    assert_eq!(err.code, codes::DOC_TEXT_NOT_FOUND);
    assert_eq!(*llm.calls.borrow(), 0);
}
