//! Upload course images, store them in Cloud Storage and have Gemini on
//! Vertex AI write alt text and a long description for each one.

pub mod auth;
pub mod config;
pub mod gate;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod storage;
mod ui;
pub mod web;

pub use config::Config;
pub use pipeline::{Analyzer, BatchReport};
