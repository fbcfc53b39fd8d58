//! code2doc - Prepend LLM-generated documentation to source files
//!
//! Walks a source tree, asks a language model (Azure OpenAI, OpenAI-compatible
//! gateways, or a local Ollama server) to describe each matching file, and
//! splices the answer back in as a leading `/* ... */` block. Generated text is
//! cached by a fingerprint of the file content so unchanged files are free on
//! the next run.

pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod util;
