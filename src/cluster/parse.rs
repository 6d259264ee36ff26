// ABOUTME: Parsing of kubectl JSON output and error messages.
// ABOUTME: Maps stderr text onto ClusterError variants.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::error::ClusterError;
use super::traits::ServicePorts;

static PORT_ALLOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Invalid value:\s*(\d+):\s*)?provided port is already allocated")
        .expect("static regex")
});

static ALREADY_EXISTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(AlreadyExists\)|already exists").expect("static regex"));

static NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(NotFound\)|not found").expect("static regex"));

/// Classify a failed kubectl invocation by its diagnostic output.
pub fn classify_failure(diagnostic: &str) -> ClusterError {
    let message = diagnostic.trim().to_string();

    if let Some(caps) = PORT_ALLOCATED.captures(&message) {
        let port = caps.get(1).and_then(|m| m.as_str().parse().ok());
        return ClusterError::PortAllocated { port, message };
    }
    if ALREADY_EXISTS.is_match(&message) {
        return ClusterError::AlreadyExists(message);
    }
    if NOT_FOUND.is_match(&message) {
        return ClusterError::NotFound(message);
    }
    ClusterError::Command(message)
}

// =============================================================================
// JSON shapes (only the fields we read)
// =============================================================================

#[derive(Deserialize)]
struct List<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct Metadata {
    name: String,
}

#[derive(Deserialize)]
struct Namespace {
    metadata: Metadata,
}

#[derive(Deserialize)]
struct Service {
    #[serde(default)]
    spec: ServiceSpec,
}

#[derive(Deserialize, Default)]
struct ServiceSpec {
    #[serde(default)]
    ports: Vec<ServicePort>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    port: u16,
    #[serde(default)]
    node_port: Option<u16>,
}

#[derive(Deserialize)]
struct Node {
    #[serde(default)]
    status: NodeStatus,
}

#[derive(Deserialize, Default)]
struct NodeStatus {
    #[serde(default)]
    addresses: Vec<NodeAddress>,
}

#[derive(Deserialize)]
struct NodeAddress {
    #[serde(rename = "type")]
    kind: String,
    address: String,
}

fn parse_json<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, ClusterError> {
    serde_json::from_str(json).map_err(|e| ClusterError::Parse(e.to_string()))
}

pub fn namespace_names(json: &str) -> Result<Vec<String>, ClusterError> {
    let list: List<Namespace> = parse_json(json)?;
    Ok(list.items.into_iter().map(|ns| ns.metadata.name).collect())
}

pub fn node_ports(json: &str) -> Result<BTreeSet<u16>, ClusterError> {
    let list: List<Service> = parse_json(json)?;
    Ok(list
        .items
        .iter()
        .flat_map(|svc| svc.spec.ports.iter())
        .filter_map(|p| p.node_port)
        .collect())
}

pub fn service_ports(json: &str) -> Result<ServicePorts, ClusterError> {
    let service: Service = parse_json(json)?;
    let first = service
        .spec
        .ports
        .first()
        .ok_or_else(|| ClusterError::Parse("service declares no ports".to_string()))?;
    Ok(ServicePorts {
        port: first.port,
        node_port: first.node_port,
    })
}

pub fn node_address(json: &str) -> Result<String, ClusterError> {
    let list: List<Node> = parse_json(json)?;
    let node = list
        .items
        .first()
        .ok_or_else(|| ClusterError::NotFound("cluster has no nodes".to_string()))?;
    node.status
        .addresses
        .iter()
        .find(|a| a.kind == "InternalIP")
        .map(|a| a.address.clone())
        .ok_or_else(|| ClusterError::Parse("node has no InternalIP address".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_conflict_carries_the_port() {
        let err = classify_failure(
            "The Service \"service-7\" is invalid: spec.ports[0].nodePort: Invalid value: 30035: provided port is already allocated",
        );
        match err {
            ClusterError::PortAllocated { port, .. } => assert_eq!(port, Some(30035)),
            other => panic!("expected PortAllocated, got {other:?}"),
        }
    }

    #[test]
    fn port_conflict_without_port_number() {
        let err = classify_failure("provided port is already allocated");
        assert!(matches!(err, ClusterError::PortAllocated { port: None, .. }));
    }

    #[test]
    fn classifies_exists_and_not_found() {
        let exists = classify_failure(
            "Error from server (AlreadyExists): namespaces \"pr-42\" already exists",
        );
        assert!(exists.is_already_exists());

        let missing =
            classify_failure("Error from server (NotFound): namespaces \"pr-9\" not found");
        assert!(matches!(missing, ClusterError::NotFound(_)));

        let other = classify_failure("error: You must be logged in to the server (Unauthorized)");
        assert!(matches!(other, ClusterError::Command(_)));
    }

    #[test]
    fn collects_node_ports_across_services() {
        let json = r#"{"items":[
            {"spec":{"ports":[{"port":80,"nodePort":30010},{"port":443,"nodePort":30011}]}},
            {"spec":{"ports":[{"port":5432}]}},
            {"spec":{}}
        ]}"#;
        let ports = node_ports(json).unwrap();
        assert_eq!(ports.into_iter().collect::<Vec<_>>(), vec![30010, 30011]);
    }

    #[test]
    fn reads_first_service_port() {
        let json = r#"{"spec":{"ports":[{"port":8080,"nodePort":31005,"protocol":"TCP"}]}}"#;
        assert_eq!(
            service_ports(json).unwrap(),
            ServicePorts {
                port: 8080,
                node_port: Some(31005)
            }
        );
        assert!(service_ports(r#"{"spec":{"ports":[]}}"#).is_err());
    }

    #[test]
    fn picks_internal_ip() {
        let json = r#"{"items":[{"status":{"addresses":[
            {"type":"Hostname","address":"minikube"},
            {"type":"InternalIP","address":"192.168.49.2"}
        ]}}]}"#;
        assert_eq!(node_address(json).unwrap(), "192.168.49.2");
        assert!(node_address(r#"{"items":[]}"#).is_err());
    }

    #[test]
    fn lists_namespace_names() {
        let json = r#"{"items":[{"metadata":{"name":"default"}},{"metadata":{"name":"pr-4"}}]}"#;
        assert_eq!(namespace_names(json).unwrap(), vec!["default", "pr-4"]);
    }
}
