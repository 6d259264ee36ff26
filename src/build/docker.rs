// ABOUTME: docker CLI implementation of ImageOps.
// ABOUTME: Builds run under the long build timeout, everything else under the command timeout.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::error::ImageError;
use super::ops::ImageOps;
use crate::config::ToolCommand;
use crate::process::{self, CommandOutput, CommandSpec};
use crate::types::ImageRef;

#[derive(Debug, Clone)]
pub struct DockerCli {
    docker: ToolCommand,
    compose: ToolCommand,
    build_timeout: Duration,
    command_timeout: Duration,
}

impl DockerCli {
    pub fn new(
        docker: ToolCommand,
        compose: ToolCommand,
        build_timeout: Duration,
        command_timeout: Duration,
    ) -> Self {
        Self {
            docker,
            compose,
            build_timeout,
            command_timeout,
        }
    }

    async fn run(
        &self,
        spec: CommandSpec,
        timeout: Duration,
        on_failure: fn(String) -> ImageError,
    ) -> Result<CommandOutput, ImageError> {
        let output = process::run(&spec, timeout).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(on_failure(format!("{spec}: {}", output.diagnostic())))
        }
    }
}

fn classify_remove_failure(message: String) -> ImageError {
    if message.contains("No such image") {
        ImageError::NotFound(message)
    } else {
        ImageError::Runtime(message)
    }
}

#[async_trait]
impl ImageOps for DockerCli {
    async fn build_image(
        &self,
        context: &Path,
        dockerfile: Option<&Path>,
        tag: &ImageRef,
    ) -> Result<(), ImageError> {
        let mut spec = CommandSpec::tool(&self.docker)
            .args(["build", "-t"])
            .arg(tag.to_string());
        if let Some(file) = dockerfile {
            spec = spec.arg("-f").arg(file.to_string_lossy());
        }
        let spec = spec.arg(context.to_string_lossy());
        self.run(spec, self.build_timeout, ImageError::BuildFailed)
            .await?;
        Ok(())
    }

    async fn compose_build(&self, descriptor: &Path, service: &str) -> Result<(), ImageError> {
        let mut spec = CommandSpec::tool(&self.compose)
            .arg("-f")
            .arg(descriptor.to_string_lossy())
            .args(["build", service]);
        if let Some(dir) = descriptor.parent() {
            spec = spec.current_dir(dir);
        }
        self.run(spec, self.build_timeout, ImageError::BuildFailed)
            .await?;
        Ok(())
    }

    async fn tag_image(&self, source: &str, target: &ImageRef) -> Result<(), ImageError> {
        let spec = CommandSpec::tool(&self.docker)
            .args(["tag", source])
            .arg(target.to_string());
        self.run(spec, self.command_timeout, ImageError::PushFailed)
            .await?;
        Ok(())
    }

    async fn push_image(&self, image: &ImageRef) -> Result<(), ImageError> {
        let spec = CommandSpec::tool(&self.docker)
            .arg("push")
            .arg(image.to_string());
        self.run(spec, self.build_timeout, ImageError::PushFailed)
            .await?;
        Ok(())
    }

    async fn list_images(&self, prefix: &str) -> Result<Vec<ImageRef>, ImageError> {
        let spec = CommandSpec::tool(&self.docker).args([
            "image",
            "ls",
            "--format",
            "{{.Repository}}:{{.Tag}}",
        ]);
        let output = self
            .run(spec, self.command_timeout, ImageError::Runtime)
            .await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with(prefix) && !line.ends_with(":<none>"))
            .filter_map(|line| ImageRef::parse(line).ok())
            .collect())
    }

    async fn remove_image(&self, image: &ImageRef) -> Result<(), ImageError> {
        let spec = CommandSpec::tool(&self.docker)
            .arg("rmi")
            .arg(image.to_string());
        self.run(spec, self.command_timeout, classify_remove_failure)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in `docker` that runs `body` as a shell script.
    fn fake_docker(dir: &Path, body: &str) -> DockerCli {
        let path = dir.join("docker");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let docker = ToolCommand::new(&path.to_string_lossy());
        DockerCli::new(
            docker.clone(),
            docker,
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn list_keeps_tagged_images_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(
            dir.path(),
            "printf 'ghcr.io/acme/shop:pr-4\\nghcr.io/acme/shop:<none>\\nnginx:1.27\\n'",
        );

        let images = docker.list_images("ghcr.io/acme/").await.unwrap();
        let names: Vec<_> = images.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["ghcr.io/acme/shop:pr-4"]);
    }

    #[tokio::test]
    async fn missing_image_on_remove_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(
            dir.path(),
            "echo 'Error: No such image: ghcr.io/acme/shop:pr-4' >&2; exit 1",
        );
        let image = ImageRef::parse("ghcr.io/acme/shop:pr-4").unwrap();

        let err = docker.remove_image(&image).await.unwrap_err();
        assert!(matches!(err, ImageError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn failed_build_carries_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(dir.path(), "echo 'failed to solve: step 2/4' >&2; exit 1");
        let image = ImageRef::parse("ghcr.io/acme/shop:pr-4").unwrap();

        let err = docker
            .build_image(dir.path(), None, &image)
            .await
            .unwrap_err();
        match err {
            ImageError::BuildFailed(message) => assert!(message.contains("step 2/4")),
            other => panic!("expected BuildFailed, got {other:?}"),
        }
    }
}
