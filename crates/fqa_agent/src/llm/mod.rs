use fqa_core::error::AppError;

/// Text completion capability. Model choice and decoding parameters belong to the implementation.
pub trait Llm {
    fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

pub mod openai_llm;
