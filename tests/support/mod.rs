// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes for the cluster, image, tunnel, process and source backends.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use ephemera::build::{ImageError, ImageOps};
use ephemera::cluster::{ClusterError, NamespaceOps, NodeOps, ObjectOps, ServiceOps, ServicePorts};
use ephemera::config::Config;
use ephemera::probe::{TunnelError, TunnelOps};
use ephemera::source::{RepositorySnapshot, SourceControl, SourceError};
use ephemera::teardown::{ProcessError, ProcessOps};
use ephemera::types::{ImageRef, NamespaceName, PrNumber, RepoSlug};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("ephemera=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn pr(n: u64) -> PrNumber {
    PrNumber::new(n).unwrap()
}

pub fn ns(name: &str) -> NamespaceName {
    NamespaceName::parse(name).unwrap()
}

/// Config rooted in a temporary directory, with short probe timeouts and
/// node-ip as the only probe strategy.
pub fn test_config(root: &Path) -> Config {
    let yaml = format!(
        r#"
registry_namespace: registry.test/previews
domain: preview.test
workspace_dir: {root}/repos
templates_dir: {root}/templates
state_dir: {root}/state
timeouts:
  readiness: 1s
  http_probe: 500ms
  tcp_probe: 300ms
probe:
  strategies: [node-ip]
"#,
        root = root.display()
    );
    Config::from_yaml(&yaml).unwrap()
}

/// Copy the shipped manifest templates into `dir`.
pub fn install_templates(dir: &Path) {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    std::fs::create_dir_all(dir).unwrap();
    for entry in std::fs::read_dir(source).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.join(entry.file_name())).unwrap();
    }
}

/// Accept connections on a random local port and answer every request with
/// `status`. Returns the port.
pub async fn http_server(status: u16) -> u16 {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response =
                    format!("HTTP/1.1 {status} Test\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    });
    port
}

// =============================================================================
// Cluster
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollout {
    Ready,
    Timeout,
}

/// An applied object as the cluster saw it.
#[derive(Debug, Clone)]
pub struct AppliedManifest {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub content: String,
}

#[derive(Debug, Default)]
struct ClusterState {
    namespaces: BTreeSet<String>,
    fail_create: Option<String>,
    allocated: BTreeSet<u16>,
    /// Allocated but not reported by `allocated_node_ports`, as if another
    /// client grabbed them between listing and applying.
    hidden: BTreeSet<u16>,
    applied: Vec<AppliedManifest>,
    node_ports: BTreeMap<(String, String), u16>,
    service_overrides: BTreeMap<String, ServicePorts>,
    rollout: Option<Rollout>,
    fail_apply_kind: Option<String>,
    deleted: Vec<String>,
    fail_delete: BTreeSet<String>,
    create_attempts: Vec<String>,
}

#[derive(Debug)]
pub struct FakeCluster {
    state: Mutex<ClusterState>,
    node_address: String,
    yield_after_port_listing: bool,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            state: Mutex::new(ClusterState::default()),
            node_address: "127.0.0.1".to_string(),
            yield_after_port_listing: false,
        }
    }
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespaces<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.state
            .lock()
            .namespaces
            .extend(names.into_iter().map(String::from));
        self
    }

    pub fn with_allocated(self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.state.lock().allocated.extend(ports);
        self
    }

    pub fn with_hidden_allocations(self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.state.lock().hidden.extend(ports);
        self
    }

    /// Suspend after listing node ports, like a real kubectl round trip.
    pub fn yielding_port_listing(mut self) -> Self {
        self.yield_after_port_listing = true;
        self
    }

    pub fn with_rollout(self, rollout: Rollout) -> Self {
        self.state.lock().rollout = Some(rollout);
        self
    }

    pub fn failing_create(self, message: &str) -> Self {
        self.state.lock().fail_create = Some(message.to_string());
        self
    }

    pub fn failing_apply(self, kind: &str) -> Self {
        self.state.lock().fail_apply_kind = Some(kind.to_string());
        self
    }

    pub fn failing_delete(self, namespace: &str) -> Self {
        self.state.lock().fail_delete.insert(namespace.to_string());
        self
    }

    /// Answer `service_ports` for `service` with fixed values.
    pub fn with_service_ports(self, service: &str, port: u16, node_port: Option<u16>) -> Self {
        self.state
            .lock()
            .service_overrides
            .insert(service.to_string(), ServicePorts { port, node_port });
        self
    }

    pub fn namespaces(&self) -> BTreeSet<String> {
        self.state.lock().namespaces.clone()
    }

    pub fn create_attempts(&self) -> Vec<String> {
        self.state.lock().create_attempts.clone()
    }

    pub fn applied(&self) -> Vec<AppliedManifest> {
        self.state.lock().applied.clone()
    }

    pub fn applied_kinds(&self) -> Vec<String> {
        self.applied().into_iter().map(|m| m.kind).collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().deleted.clone()
    }

    pub fn node_port_of(&self, namespace: &str, service: &str) -> Option<u16> {
        self.state
            .lock()
            .node_ports
            .get(&(namespace.to_string(), service.to_string()))
            .copied()
    }
}

fn manifest_field<'a>(doc: &'a serde_yaml::Value, path: &[&str]) -> Option<&'a serde_yaml::Value> {
    path.iter().try_fold(doc, |value, key| value.get(*key))
}

#[async_trait]
impl NamespaceOps for FakeCluster {
    async fn create_namespace(&self, name: &NamespaceName) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        state.create_attempts.push(name.to_string());
        if let Some(message) = &state.fail_create {
            return Err(ClusterError::Command(message.clone()));
        }
        if !state.namespaces.insert(name.to_string()) {
            return Err(ClusterError::AlreadyExists(format!(
                "namespaces \"{name}\" already exists"
            )));
        }
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        Ok(self.state.lock().namespaces.iter().cloned().collect())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        if state.fail_delete.contains(name) {
            return Err(ClusterError::Command(format!("cannot delete {name}")));
        }
        if !state.namespaces.remove(name) {
            return Err(ClusterError::NotFound(name.to_string()));
        }
        state.deleted.push(name.to_string());
        Ok(())
    }
}

#[async_trait]
impl ObjectOps for FakeCluster {
    async fn apply_manifest(&self, path: &Path) -> Result<(), ClusterError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClusterError::Command(format!("cannot read {}: {e}", path.display())))?;
        let doc: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| ClusterError::Parse(e.to_string()))?;

        let text = |path: &[&str]| {
            manifest_field(&doc, path)
                .and_then(serde_yaml::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let kind = text(&["kind"]);
        let name = text(&["metadata", "name"]);
        let namespace = text(&["metadata", "namespace"]);

        let mut state = self.state.lock();
        if state.fail_apply_kind.as_deref() == Some(kind.as_str()) {
            return Err(ClusterError::Command(format!("admission webhook denied {kind}")));
        }

        if kind == "Service" {
            let node_port = manifest_field(&doc, &["spec", "ports"])
                .and_then(|ports| ports.get(0))
                .and_then(|port| port.get("nodePort"))
                .and_then(serde_yaml::Value::as_u64)
                .and_then(|p| u16::try_from(p).ok());
            if let Some(port) = node_port {
                if state.hidden.remove(&port) || state.allocated.contains(&port) {
                    state.allocated.insert(port);
                    return Err(ClusterError::PortAllocated {
                        port: Some(port),
                        message: format!(
                            "Service \"{name}\" is invalid: spec.ports[0].nodePort: Invalid value: {port}: provided port is already allocated"
                        ),
                    });
                }
                state.allocated.insert(port);
                state
                    .node_ports
                    .insert((namespace.clone(), name.clone()), port);
            }
        }

        state.applied.push(AppliedManifest {
            kind,
            name,
            namespace,
            content,
        });
        Ok(())
    }

    async fn wait_for_rollout(
        &self,
        _namespace: &NamespaceName,
        deployment: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        match self.state.lock().rollout.unwrap_or(Rollout::Ready) {
            Rollout::Ready => Ok(()),
            Rollout::Timeout => Err(ClusterError::Timeout {
                timeout,
                message: format!("deployment {deployment} rollout"),
            }),
        }
    }
}

#[async_trait]
impl ServiceOps for FakeCluster {
    async fn allocated_node_ports(&self) -> Result<BTreeSet<u16>, ClusterError> {
        let allocated = self.state.lock().allocated.clone();
        if self.yield_after_port_listing {
            tokio::task::yield_now().await;
        }
        Ok(allocated)
    }

    async fn service_ports(
        &self,
        namespace: &NamespaceName,
        service: &str,
    ) -> Result<ServicePorts, ClusterError> {
        let state = self.state.lock();
        if let Some(ports) = state.service_overrides.get(service) {
            return Ok(*ports);
        }
        state
            .node_ports
            .get(&(namespace.to_string(), service.to_string()))
            .map(|node_port| ServicePorts {
                port: 80,
                node_port: Some(*node_port),
            })
            .ok_or_else(|| ClusterError::NotFound(format!("service {service}")))
    }
}

#[async_trait]
impl NodeOps for FakeCluster {
    async fn node_address(&self) -> Result<String, ClusterError> {
        Ok(self.node_address.clone())
    }
}

// =============================================================================
// Images
// =============================================================================

#[derive(Debug, Default)]
pub struct FakeImages {
    calls: Mutex<Vec<String>>,
    local: Mutex<Vec<ImageRef>>,
    fail_build: bool,
    fail_push: bool,
    fail_remove: BTreeSet<String>,
}

impl FakeImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_build() -> Self {
        Self {
            fail_build: true,
            ..Self::default()
        }
    }

    pub fn failing_push() -> Self {
        Self {
            fail_push: true,
            ..Self::default()
        }
    }

    pub fn with_local<'a>(self, images: impl IntoIterator<Item = &'a str>) -> Self {
        self.local
            .lock()
            .extend(images.into_iter().map(|i| ImageRef::parse(i).unwrap()));
        self
    }

    pub fn failing_remove(mut self, image: &str) -> Self {
        self.fail_remove.insert(image.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn local(&self) -> Vec<String> {
        self.local.lock().iter().map(ToString::to_string).collect()
    }
}

#[async_trait]
impl ImageOps for FakeImages {
    async fn build_image(
        &self,
        context: &Path,
        dockerfile: Option<&Path>,
        tag: &ImageRef,
    ) -> Result<(), ImageError> {
        let file = dockerfile
            .map(|f| format!(" -f {}", f.display()))
            .unwrap_or_default();
        self.calls
            .lock()
            .push(format!("build {tag}{file} {}", context.display()));
        if self.fail_build {
            return Err(ImageError::BuildFailed("step 3/7 failed".to_string()));
        }
        self.local.lock().push(tag.clone());
        Ok(())
    }

    async fn compose_build(&self, _descriptor: &Path, service: &str) -> Result<(), ImageError> {
        self.calls.lock().push(format!("compose-build {service}"));
        if self.fail_build {
            return Err(ImageError::BuildFailed(format!("service {service} failed")));
        }
        Ok(())
    }

    async fn tag_image(&self, source: &str, target: &ImageRef) -> Result<(), ImageError> {
        self.calls.lock().push(format!("tag {source} {target}"));
        self.local.lock().push(target.clone());
        Ok(())
    }

    async fn push_image(&self, image: &ImageRef) -> Result<(), ImageError> {
        self.calls.lock().push(format!("push {image}"));
        if self.fail_push {
            return Err(ImageError::PushFailed("denied: requested access".to_string()));
        }
        Ok(())
    }

    async fn list_images(&self, prefix: &str) -> Result<Vec<ImageRef>, ImageError> {
        Ok(self
            .local
            .lock()
            .iter()
            .filter(|i| i.repository().starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn remove_image(&self, image: &ImageRef) -> Result<(), ImageError> {
        if self.fail_remove.contains(&image.to_string()) {
            return Err(ImageError::Runtime(format!(
                "conflict: unable to remove {image}: image is in use"
            )));
        }
        self.calls.lock().push(format!("rmi {image}"));
        self.local.lock().retain(|i| i != image);
        Ok(())
    }
}

// =============================================================================
// Tunnel
// =============================================================================

#[derive(Debug, Default)]
pub struct FakeTunnel {
    fail_tunnel: bool,
    fail_forward: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTunnel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_tunnel() -> Self {
        Self {
            fail_tunnel: true,
            ..Self::default()
        }
    }

    pub fn failing_forward() -> Self {
        Self {
            fail_forward: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TunnelOps for FakeTunnel {
    async fn start_tunnel(&self, namespace: &NamespaceName) -> Result<(), TunnelError> {
        self.calls.lock().push(format!("tunnel {namespace}"));
        if self.fail_tunnel {
            return Err(TunnelError::FailedToStart(
                "minikube not running".to_string(),
            ));
        }
        Ok(())
    }

    async fn forward(
        &self,
        namespace: &NamespaceName,
        service: &str,
        local_port: u16,
        remote_port: u16,
    ) -> Result<(), TunnelError> {
        self.calls.lock().push(format!(
            "forward {namespace}/{service} {local_port}:{remote_port}"
        ));
        if self.fail_forward {
            return Err(TunnelError::ForwardFailed {
                service: service.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Processes
// =============================================================================

#[derive(Debug, Default)]
pub struct FakeProcesses {
    listeners: Mutex<BTreeMap<u16, Vec<u32>>>,
    running: Mutex<BTreeSet<u32>>,
    terminated: Mutex<Vec<u32>>,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(self, port: u16, pid: u32) -> Self {
        self.listeners.lock().entry(port).or_default().push(pid);
        self.running.lock().insert(pid);
        self
    }

    pub fn with_running(self, pid: u32) -> Self {
        self.running.lock().insert(pid);
        self
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().clone()
    }
}

#[async_trait]
impl ProcessOps for FakeProcesses {
    async fn listening_pids(&self, port: u16) -> Result<Vec<u32>, ProcessError> {
        Ok(self
            .listeners
            .lock()
            .get(&port)
            .cloned()
            .unwrap_or_default())
    }

    async fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        if !self.running.lock().remove(&pid) {
            return Err(ProcessError::NotRunning(pid));
        }
        self.terminated.lock().push(pid);
        Ok(())
    }
}

// =============================================================================
// Source control
// =============================================================================

#[derive(Debug)]
pub struct FakeSource {
    root: PathBuf,
    fail: bool,
    checkouts: Mutex<Vec<(PathBuf, PrNumber)>>,
    credentials: Mutex<Vec<Option<String>>>,
}

impl FakeSource {
    /// Serves the directory `root` as the checkout of every repository.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fail: false,
            checkouts: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail: true,
            ..Self::new("/nonexistent")
        }
    }

    pub fn checkouts(&self) -> Vec<(PathBuf, PrNumber)> {
        self.checkouts.lock().clone()
    }

    pub fn credentials(&self) -> Vec<Option<String>> {
        self.credentials.lock().clone()
    }
}

#[async_trait]
impl SourceControl for FakeSource {
    async fn fetch_snapshot(
        &self,
        repo_url: &str,
        credential: Option<&str>,
    ) -> Result<RepositorySnapshot, SourceError> {
        self.credentials.lock().push(credential.map(String::from));
        if self.fail {
            return Err(SourceError::Git {
                operation: "clone".to_string(),
                message: "repository not found".to_string(),
            });
        }
        Ok(RepositorySnapshot {
            repository: RepoSlug::from_url(repo_url)?,
            default_branch: "main".to_string(),
            local_root: self.root.clone(),
        })
    }

    async fn checkout_pr(&self, local_root: &Path, pr: PrNumber) -> Result<(), SourceError> {
        self.checkouts.lock().push((local_root.to_path_buf(), pr));
        Ok(())
    }
}

/// Write `files` (path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}
