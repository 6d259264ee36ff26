// ABOUTME: Bounds for every blocking wait.
// ABOUTME: Parsed with humantime (e.g. `90s`, `20m`).

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Short CLI calls: kubectl get/apply/delete, docker tag, git.
    #[serde(with = "humantime_serde")]
    pub command: Duration,
    /// Image builds, pushes and clones.
    #[serde(with = "humantime_serde")]
    pub build: Duration,
    /// Deployment rollout wait.
    #[serde(with = "humantime_serde")]
    pub readiness: Duration,
    /// How long the tunnel must stay up to count as started.
    #[serde(with = "humantime_serde")]
    pub tunnel_settle: Duration,
    /// How long a port-forward has to start accepting connections.
    #[serde(with = "humantime_serde")]
    pub forward: Duration,
    #[serde(with = "humantime_serde")]
    pub http_probe: Duration,
    #[serde(with = "humantime_serde")]
    pub tcp_probe: Duration,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(120),
            build: Duration::from_secs(20 * 60),
            readiness: Duration::from_secs(60),
            tunnel_settle: Duration::from_secs(3),
            forward: Duration::from_secs(10),
            http_probe: Duration::from_secs(5),
            tcp_probe: Duration::from_secs(3),
        }
    }
}
