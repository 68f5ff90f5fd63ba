use fqa_core::retrieve::{source_label, Evidence};

/// Phrase the model must use when the evidence does not hold the answer.
pub const NOT_FOUND_PHRASE: &str = "문서에서 확인되지 않음";

/// `[S1] (chunk_id=.., score=..)` header followed by the chunk text, one block per evidence.
pub fn evidence_blocks(evidence: &[Evidence]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, ev)| {
            format!(
                "[{}] (chunk_id={}, score={:.4})\n{}\n",
                source_label(i + 1),
                ev.chunk_id,
                ev.score,
                ev.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(question: &str, evidence: &[Evidence]) -> String {
    let scope = match evidence.len() {
        0 => "아래 근거".to_string(),
        n => format!("아래 [S1]~[{}] 근거", source_label(n)),
    };
    let blocks = if evidence.is_empty() {
        "(제공된 근거 없음)".to_string()
    } else {
        evidence_blocks(evidence)
    };

    format!(
        r#"너는 공시 문서 기반 Q&A 어시스턴트다.

규칙(예외 없음):
1) {scope} 안에 있는 내용만 사용해 답한다.
2) 근거에 없는 내용은 추측하지 말고 "{NOT_FOUND_PHRASE}"이라고 쓴다.
3) 숫자/날짜/기관명/금액은 근거에 적힌 그대로 옮긴다.
4) 정의/상식/배경 설명 같은 일반론은 덧붙이지 않는다.
5) 마지막 줄에 사용한 근거를 "Citations: [S?]" 형식으로 적는다. 예: Citations: [S2], [S3]

출력 형식(그대로 지킬 것):
Answer:
- (한 줄 요약)
Evidence:
- [S?] chunk_id=숫자: (근거에서 핵심 문장 1줄 인용)
Citations: [S?]

질문:
{question}

근거:
{blocks}"#
    )
    .trim()
    .to_string()
}
