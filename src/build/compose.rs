// ABOUTME: Multi-service (compose) descriptor parsing.
// ABOUTME: Keeps declaration order and derives the image name compose generates per service.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// File names recognised as multi-service descriptors, in priority order.
pub const DESCRIPTOR_NAMES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("failed to read descriptor: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("descriptor declares no services")]
    NoServices,

    #[error("service {0} declares neither `build` nor `image`")]
    NothingToRun(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBuild {
    Context(String),
    Detailed {
        #[serde(default)]
        context: Option<String>,
        #[serde(default)]
        dockerfile: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(default)]
    build: Option<RawBuild>,
    #[serde(default)]
    image: Option<String>,
}

/// One declared service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeService {
    pub name: String,
    /// Resolved build context, when the service is built.
    pub build_context: Option<PathBuf>,
    pub dockerfile: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ComposeFile {
    path: PathBuf,
    project: String,
    services: Vec<ComposeService>,
}

impl ComposeFile {
    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, ComposeError> {
        let root: Mapping = serde_yaml::from_str(text)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let project = root
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                dir.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .map(|name| normalize_project(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "default".to_string());

        let declared = match root.get("services") {
            Some(Value::Mapping(services)) => services.clone(),
            _ => return Err(ComposeError::NoServices),
        };

        let mut services = Vec::with_capacity(declared.len());
        for (key, value) in declared {
            let Some(name) = key.as_str().map(str::to_string) else {
                continue;
            };
            let raw: RawService = if value.is_null() {
                RawService {
                    build: None,
                    image: None,
                }
            } else {
                serde_yaml::from_value(value)?
            };

            let (build_context, dockerfile) = match raw.build {
                Some(RawBuild::Context(context)) => (Some(dir.join(context)), None),
                Some(RawBuild::Detailed {
                    context,
                    dockerfile,
                }) => (
                    Some(dir.join(context.as_deref().unwrap_or("."))),
                    dockerfile,
                ),
                None => (None, None),
            };

            if build_context.is_none() && raw.image.is_none() {
                return Err(ComposeError::NothingToRun(name));
            }

            services.push(ComposeService {
                name,
                build_context,
                dockerfile,
                image: raw.image,
            });
        }

        if services.is_empty() {
            return Err(ComposeError::NoServices);
        }

        Ok(Self {
            path: path.to_path_buf(),
            project,
            services,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Services in declaration order.
    pub fn services(&self) -> &[ComposeService] {
        &self.services
    }

    /// Name of the image `compose build` produces for a service.
    pub fn generated_image(&self, service: &ComposeService) -> String {
        match &service.image {
            Some(image) => image.clone(),
            None => format!("{}-{}", self.project, service.name),
        }
    }
}

/// Compose project names are lowercase alphanumerics, `-` and `_`.
fn normalize_project(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect::<String>()
        .trim_start_matches(['-', '_'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(dir: &str, text: &str) -> ComposeFile {
        ComposeFile::parse(&Path::new(dir).join("docker-compose.yml"), text).unwrap()
    }

    #[test]
    fn keeps_declaration_order() {
        let file = parse(
            "/src/My Shop",
            "services:\n  web:\n    build: ./web\n  api:\n    build: ./api\n  db:\n    image: postgres:16\n",
        );
        let names: Vec<_> = file.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["web", "api", "db"]);
        assert_eq!(file.project(), "myshop");
    }

    #[test]
    fn generated_image_prefers_declared_image() {
        let file = parse(
            "/src/shop",
            "name: Store\nservices:\n  web:\n    build:\n      context: ..\n      dockerfile: web/Dockerfile\n  api:\n    build: .\n    image: acme/api:dev\n",
        );
        let web = &file.services()[0];
        assert_eq!(file.generated_image(web), "store-web");
        assert_eq!(web.build_context.as_deref(), Some(Path::new("/src/shop/..")));
        assert_eq!(web.dockerfile.as_deref(), Some("web/Dockerfile"));
        assert_eq!(file.generated_image(&file.services()[1]), "acme/api:dev");
    }

    #[test]
    fn rejects_services_without_build_or_image() {
        let err = ComposeFile::parse(
            Path::new("/x/compose.yml"),
            "services:\n  worker: {}\n",
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::NothingToRun(name) if name == "worker"));
    }

    #[test]
    fn rejects_missing_services() {
        let err = ComposeFile::parse(Path::new("/x/compose.yml"), "version: '3'\n").unwrap_err();
        assert!(matches!(err, ComposeError::NoServices));
    }
}
