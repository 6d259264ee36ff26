// ABOUTME: Runs the resolution strategies in order and verifies the URLs they produce.
// ABOUTME: Never fails: an unreachable service is reported, not raised.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use super::check::{ProbeSignal, check_url};
use super::strategy::{ResolveContext, ResolveStrategy, strategies_for};
use super::tunnel::TunnelOps;
use crate::cluster::ClusterOps;
use crate::config::{ProbeConfig, StrategyKind, TimeoutsConfig};
use crate::diagnostics::{Diagnostics, Warning};
use crate::ports::LocalPortCounter;
use crate::types::NamespaceName;

/// The service to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub namespace: NamespaceName,
    pub service_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    /// Best URL found: the first reachable one, else the first produced.
    pub url: Option<Url>,
    pub reachable: bool,
    pub signal: ProbeSignal,
    /// Strategy that produced `url`.
    pub strategy: Option<StrategyKind>,
}

impl ProbeOutcome {
    fn unresolved() -> Self {
        Self {
            url: None,
            reachable: false,
            signal: ProbeSignal::Unreachable,
            strategy: None,
        }
    }
}

pub struct ReachabilityProbe {
    strategies: Vec<Box<dyn ResolveStrategy>>,
    path: String,
    http_timeout: Duration,
    tcp_timeout: Duration,
}

impl std::fmt::Debug for ReachabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<_> = self.strategies.iter().map(|s| s.kind()).collect();
        f.debug_struct("ReachabilityProbe")
            .field("strategies", &kinds)
            .field("path", &self.path)
            .finish()
    }
}

impl ReachabilityProbe {
    pub fn new(
        strategies: Vec<Box<dyn ResolveStrategy>>,
        path: impl Into<String>,
        http_timeout: Duration,
        tcp_timeout: Duration,
    ) -> Self {
        Self {
            strategies,
            path: path.into(),
            http_timeout,
            tcp_timeout,
        }
    }

    pub fn from_config(probe: &ProbeConfig, timeouts: &TimeoutsConfig) -> Self {
        Self::new(
            strategies_for(probe.strategies.iter()),
            probe.path.clone(),
            timeouts.http_probe,
            timeouts.tcp_probe,
        )
    }

    /// Resolve and verify a URL for `target`.
    ///
    /// Strategies run in order until one produces a URL that answers. A URL
    /// that does not answer is kept as the fallback result while later
    /// strategies are tried.
    pub async fn probe(
        &self,
        cluster: &dyn ClusterOps,
        tunnel: &dyn TunnelOps,
        local_ports: &LocalPortCounter,
        target: &ProbeTarget,
    ) -> (ProbeOutcome, Diagnostics) {
        let mut ctx = ResolveContext::new(cluster, tunnel, local_ports);
        let mut fallback: Option<ProbeOutcome> = None;

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let Some(url) = strategy.try_resolve(target, &mut ctx).await else {
                tracing::debug!(strategy = ?kind, service = %target.service_name, "strategy produced no URL");
                continue;
            };

            let signal = check_url(&url, &self.path, self.http_timeout, self.tcp_timeout).await;
            tracing::info!(strategy = ?kind, url = %url, signal = ?signal, "probed service");

            let outcome = ProbeOutcome {
                reachable: signal.is_reachable(),
                url: Some(url),
                signal,
                strategy: Some(kind),
            };
            if outcome.reachable {
                return (outcome, ctx.diagnostics);
            }
            fallback.get_or_insert(outcome);
        }

        let outcome = fallback.unwrap_or_else(ProbeOutcome::unresolved);
        let message = match &outcome.url {
            Some(url) => format!("service {} did not answer at {url}", target.service_name),
            None => format!("no URL could be resolved for service {}", target.service_name),
        };
        ctx.diagnostics.warn(Warning::unreachable(message));
        (outcome, ctx.diagnostics)
    }
}
