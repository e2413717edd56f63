//! Report generation.

pub mod generator;

pub use generator::{format_crore, format_percent, generate_json_report, generate_markdown_report};
