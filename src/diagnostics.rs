// ABOUTME: Diagnostics accumulator for non-fatal warnings while creating a preview.
// ABOUTME: Recovered conditions are collected here and returned with the result.

use serde::Serialize;

/// Collects non-fatal warnings during preview operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Move every warning from `other` into this accumulator without re-logging.
    pub fn absorb(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected while creating a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a readiness warning (timeout or failed rollout check).
    pub fn readiness(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ReadinessTimeout, message)
    }

    /// Create a tunnel start warning.
    pub fn tunnel(message: impl Into<String>) -> Self {
        Self::new(WarningKind::TunnelFailed, message)
    }

    /// Create a port-forward warning.
    pub fn forward(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ForwardFailed, message)
    }

    /// Create a warning for a strategy that could not build a URL.
    pub fn resolve(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ResolveFailed, message)
    }

    /// Create an unreachable-service warning.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ProbeUnreachable, message)
    }
}

/// Categories of warnings that can occur while creating a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Deployment did not report ready in time.
    ReadinessTimeout,
    /// Service tunnel process did not start.
    TunnelFailed,
    /// Local port-forward could not be established.
    ForwardFailed,
    /// A reachability strategy could not determine an address.
    ResolveFailed,
    /// No resolved URL answered.
    ProbeUnreachable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::readiness("deployment/shop not ready after 60s"));
        diag.warn(Warning::tunnel("minikube tunnel exited"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn absorb_keeps_order() {
        let mut first = Diagnostics::default();
        first.warn(Warning::forward("a"));
        let mut second = Diagnostics::default();
        second.warn(Warning::unreachable("b"));

        first.absorb(second);
        let kinds: Vec<_> = first.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(kinds, [WarningKind::ForwardFailed, WarningKind::ProbeUnreachable]);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::readiness("x").kind, WarningKind::ReadinessTimeout);
        assert_eq!(Warning::resolve("x").kind, WarningKind::ResolveFailed);
    }
}
