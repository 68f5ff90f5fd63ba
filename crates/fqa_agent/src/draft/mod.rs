use fqa_core::domain::SourceRef;
use fqa_core::error::AppError;
use fqa_core::retrieve::{source_label, Evidence};
use fqa_core::session::IndexedDocument;
use serde::{Deserialize, Serialize};

use crate::guardrails::cited_source_labels;
use crate::llm::Llm;

mod prompts;

pub use prompts::{build_prompt, evidence_blocks, NOT_FOUND_PHRASE};

/// One grounded answer together with the evidence it was given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskAnswer {
    pub rcept_no: String,
    pub question: String,
    pub answer: String,
    pub cited: Vec<String>,
    pub sources: Vec<SourceRef>,
    pub evidence: Vec<Evidence>,
}

/// `S#` labelled references in rank order.
pub fn source_refs(evidence: &[Evidence]) -> Vec<SourceRef> {
    evidence
        .iter()
        .enumerate()
        .map(|(i, ev)| SourceRef {
            sid: source_label(i + 1),
            chunk_id: ev.chunk_id,
            score: ev.score,
        })
        .collect()
}

/// Retrieve, prompt and complete for a single question. Model failures propagate unchanged.
pub fn answer_question(
    doc: &IndexedDocument,
    llm: &dyn Llm,
    question: &str,
    k: usize,
) -> Result<AskAnswer, AppError> {
    let evidence = doc.retrieve(question, k);
    let prompt = build_prompt(question, &evidence);
    let answer = llm.complete(&prompt)?;
    let cited = cited_source_labels(&answer);

    log::info!(
        "answered: rcept_no={} evidence={} cited={:?}",
        doc.meta.rcept_no,
        evidence.len(),
        cited
    );

    Ok(AskAnswer {
        rcept_no: doc.meta.rcept_no.clone(),
        question: question.to_string(),
        answer,
        cited,
        sources: source_refs(&evidence),
        evidence,
    })
}
