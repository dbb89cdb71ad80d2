//! Language model provider implementations for the campus advisor.
//!
//! All providers implement the `advisor_core::Provider` trait.
//! The router builds the configured provider from `AppConfig`.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, build_named, is_local};
