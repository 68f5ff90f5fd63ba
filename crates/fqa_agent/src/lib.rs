pub mod agent;
pub mod draft;
pub mod guardrails;
pub mod llm;
pub mod source;
