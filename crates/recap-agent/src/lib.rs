pub mod openai;
pub mod pipeline;
pub mod provider;
pub mod runtime;
pub mod tier;
pub mod tokenizer;
