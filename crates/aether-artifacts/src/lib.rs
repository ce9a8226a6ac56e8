//! Aether Artifacts - templating and writing of generated code artifacts
//!
//! Each artifact kind is a self-contained template module in src/templates/.
//! To add a kind: add a `ThoughtKind` variant, a template module, and an arm
//! in `Templater::render`.

pub mod error;
pub mod naming;
pub mod templater;
pub mod templates;
pub mod writer;

pub use error::{ArtifactError, WriteFailure};
pub use templater::{ArtifactFile, RenderedArtifact, Templater};
pub use writer::{ArtifactWriter, WrittenArtifact};
