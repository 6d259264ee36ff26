// ABOUTME: Manifest rendering from `{{placeholder}}` templates.
// ABOUTME: Documents are written under the state directory while they are applied.

mod document;
mod renderer;
mod store;

pub use document::{ManifestDocument, Placeholders, TemplateSet};
pub use renderer::{ManifestRenderer, RenderError};
pub use store::ManifestStore;
