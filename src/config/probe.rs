// ABOUTME: Reachability probe configuration.
// ABOUTME: Ordered resolution strategies and the HTTP path to request.

use nonempty::{NonEmpty, nonempty};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    TunnelForward,
    NodePortLocalhost,
    NodeIp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    #[serde(deserialize_with = "super::deserialize::strategies")]
    pub strategies: NonEmpty<StrategyKind>,
    pub path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            strategies: nonempty![
                StrategyKind::TunnelForward,
                StrategyKind::NodePortLocalhost,
                StrategyKind::NodeIp
            ],
            path: "/".to_string(),
        }
    }
}
