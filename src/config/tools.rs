// ABOUTME: External tool command lines (kubectl, docker, compose, tunnel, git, lsof, kill).
// ABOUTME: Each accepts either a single string or an argv list in YAML.

use nonempty::NonEmpty;
use serde::Deserialize;

/// A program plus any leading arguments, e.g. `docker compose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand(NonEmpty<String>);

impl ToolCommand {
    pub fn new(program: &str) -> Self {
        Self::parse(program).unwrap_or_else(|| Self(NonEmpty::new(program.to_string())))
    }

    /// Split on whitespace; `None` for a blank string.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        NonEmpty::from_vec(parts).map(Self)
    }

    pub fn program(&self) -> &str {
        self.0.first()
    }

    pub fn leading_args(&self) -> &[String] {
        self.0.tail()
    }
}

impl<'de> Deserialize<'de> for ToolCommand {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Line(String),
            Argv(Vec<String>),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Line(line) => ToolCommand::parse(&line),
            Raw::Argv(argv) => NonEmpty::from_vec(argv).map(ToolCommand),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("tool command cannot be empty"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub kubectl: ToolCommand,
    pub docker: ToolCommand,
    pub compose: ToolCommand,
    /// Cluster-provided tunnel, run in the background.
    pub tunnel: ToolCommand,
    pub git: ToolCommand,
    pub lsof: ToolCommand,
    pub kill: ToolCommand,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            kubectl: ToolCommand::new("kubectl"),
            docker: ToolCommand::new("docker"),
            compose: ToolCommand::new("docker compose"),
            tunnel: ToolCommand::new("minikube tunnel"),
            git: ToolCommand::new("git"),
            lsof: ToolCommand::new("lsof"),
            kill: ToolCommand::new("kill"),
        }
    }
}
