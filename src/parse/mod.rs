pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod options;
pub mod source;

pub use backend::TensorlakeBackend;
pub use client::{Chunk, ParseResult, ParseStatus, TensorlakeClient};
pub use config::TensorlakeConfig;
pub use error::{JobError, OptionsError};
pub use options::{
    ChunkingStrategy, DocumentParserOptions, EnrichmentOptions, ParsingOptions, TableOutputMode,
    TableParsingFormat,
};
pub use source::{DocumentKind, DocumentSource};
