// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates the registry namespace and the non-empty strategy list.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::probe::StrategyKind;

pub fn registry_namespace<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let trimmed = s.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(serde::de::Error::custom("registry_namespace cannot be empty"));
    }
    if has_tag(trimmed) || trimmed.contains('@') {
        return Err(serde::de::Error::custom(
            "registry_namespace must not contain a tag or digest",
        ));
    }
    Ok(trimmed.to_string())
}

/// `host:5000` alone is a registry with a port; a colon in any later
/// segment is an image tag.
fn has_tag(namespace: &str) -> bool {
    match namespace.rsplit_once('/') {
        Some((_, last)) => last.contains(':'),
        None => namespace
            .split_once(':')
            .is_some_and(|(_, port)| !port.chars().all(|c| c.is_ascii_digit())),
    }
}

pub fn strategies<'de, D>(deserializer: D) -> Result<NonEmpty<StrategyKind>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<StrategyKind> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one probe strategy is required"))
}
