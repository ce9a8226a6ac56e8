//! Artifact templates, one module per kind
//!
//! Each module exposes `render(&TemplateContext) -> Vec<(file_name, contents)>`.
//! File names are relative to the artifact's own directory.

pub mod agent;
pub mod room;
pub mod tool;

/// Output of a template: file name within the artifact directory, and contents.
pub type TemplateFiles = Vec<(String, String)>;
