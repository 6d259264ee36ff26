// ABOUTME: Pure `{{key}}` substitution over named templates.
// ABOUTME: Values are HTML/XML-unescaped before they are inserted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::document::{ManifestDocument, Placeholders};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("static regex")
});

/// Errors from rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("failed to read template {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
enum TemplateSource {
    Directory(PathBuf),
    Inline(BTreeMap<String, String>),
}

/// Renders manifests from a template directory (or an in-memory set).
#[derive(Debug, Clone)]
pub struct ManifestRenderer {
    source: TemplateSource,
}

impl ManifestRenderer {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: TemplateSource::Directory(dir.into()),
        }
    }

    pub fn from_templates<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source: TemplateSource::Inline(
                templates
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn load(&self, template_id: &str) -> Result<String, RenderError> {
        match &self.source {
            TemplateSource::Inline(templates) => templates
                .get(template_id)
                .cloned()
                .ok_or_else(|| RenderError::TemplateNotFound(template_id.to_string())),
            TemplateSource::Directory(dir) => {
                if !is_plain_name(template_id) {
                    return Err(RenderError::TemplateNotFound(template_id.to_string()));
                }
                let path = dir.join(template_id);
                match std::fs::read_to_string(&path) {
                    Ok(text) => Ok(text),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(RenderError::TemplateNotFound(template_id.to_string()))
                    }
                    Err(source) => Err(RenderError::Read { path, source }),
                }
            }
        }
    }

    /// Render `template_id` with `data`.
    ///
    /// Placeholders with no value in `data` are left as they are.
    pub fn render(
        &self,
        template_id: &str,
        data: &Placeholders,
    ) -> Result<ManifestDocument, RenderError> {
        let template = self.load(template_id)?;
        let content = substitute(&template, data.values());
        Ok(ManifestDocument {
            template_id: template_id.to_string(),
            namespace: data.namespace().clone(),
            pr_number: data.namespace().pr_number(),
            content,
        })
    }
}

/// Template ids are file names inside the template directory, never paths.
fn is_plain_name(id: &str) -> bool {
    let path = Path::new(id);
    !id.is_empty() && path.file_name().is_some_and(|name| name == path.as_os_str())
}

fn substitute(template: &str, values: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => html_escape::decode_html_entities(value).into_owned(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
