// ABOUTME: Validated domain types shared by every preview component.
// ABOUTME: PR numbers, namespace names, application names, repository slugs, image refs.

mod app_name;
mod image_ref;
mod namespace;
mod pr_number;
mod repo_slug;

pub use app_name::{AppName, AppNameError};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use namespace::{NamespaceName, NamespaceNameError};
pub use pr_number::{PrNumber, PrNumberError};
pub use repo_slug::{RepoSlug, RepoSlugError};
