// ABOUTME: URL resolution strategies, tried in configured order.
// ABOUTME: Each yields a URL or None; shared facts (tunnel state, service ports) live in the context.

use async_trait::async_trait;
use url::Url;

use super::reachability::ProbeTarget;
use super::tunnel::TunnelOps;
use crate::cluster::{ClusterOps, ServicePorts};
use crate::config::StrategyKind;
use crate::diagnostics::{Diagnostics, Warning};
use crate::ports::LocalPortCounter;

/// Whether the service tunnel has been started for this probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    NotAttempted,
    Started,
    FailedToStart,
}

/// Everything strategies share during one probe.
pub struct ResolveContext<'a> {
    pub cluster: &'a dyn ClusterOps,
    pub tunnel: &'a dyn TunnelOps,
    pub local_ports: &'a LocalPortCounter,
    pub tunnel_state: TunnelState,
    pub diagnostics: Diagnostics,
    service_ports: Option<ServicePorts>,
    node_address: Option<String>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        cluster: &'a dyn ClusterOps,
        tunnel: &'a dyn TunnelOps,
        local_ports: &'a LocalPortCounter,
    ) -> Self {
        Self {
            cluster,
            tunnel,
            local_ports,
            tunnel_state: TunnelState::NotAttempted,
            diagnostics: Diagnostics::default(),
            service_ports: None,
            node_address: None,
        }
    }

    /// The service's ports, looked up once per probe.
    pub async fn service_ports(&mut self, target: &ProbeTarget) -> Option<ServicePorts> {
        if self.service_ports.is_none() {
            match self
                .cluster
                .service_ports(&target.namespace, &target.service_name)
                .await
            {
                Ok(ports) => self.service_ports = Some(ports),
                Err(e) => {
                    self.diagnostics.warn(Warning::resolve(format!(
                        "could not read ports of service {}: {e}",
                        target.service_name
                    )));
                }
            }
        }
        self.service_ports
    }

    async fn node_port(&mut self, target: &ProbeTarget) -> Option<u16> {
        let node_port = self.service_ports(target).await?.node_port;
        if node_port.is_none() {
            self.diagnostics.warn(Warning::resolve(format!(
                "service {} exposes no node port",
                target.service_name
            )));
        }
        node_port
    }

    async fn node_address(&mut self) -> Option<String> {
        if self.node_address.is_none() {
            match self.cluster.node_address().await {
                Ok(address) => self.node_address = Some(address),
                Err(e) => {
                    self.diagnostics
                        .warn(Warning::resolve(format!("could not resolve node address: {e}")));
                }
            }
        }
        self.node_address.clone()
    }
}

fn http_url(host: &str, port: u16) -> Option<Url> {
    Url::parse(&format!("http://{host}:{port}")).ok()
}

/// One way of producing a URL for a service.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn try_resolve(
        &self,
        target: &ProbeTarget,
        ctx: &mut ResolveContext<'_>,
    ) -> Option<Url>;
}

/// Start the tunnel, then port-forward a local port to the service port.
#[derive(Debug, Default)]
pub struct TunnelForward;

#[async_trait]
impl ResolveStrategy for TunnelForward {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TunnelForward
    }

    async fn try_resolve(
        &self,
        target: &ProbeTarget,
        ctx: &mut ResolveContext<'_>,
    ) -> Option<Url> {
        if ctx.tunnel_state == TunnelState::NotAttempted {
            match ctx.tunnel.start_tunnel(&target.namespace).await {
                Ok(()) => ctx.tunnel_state = TunnelState::Started,
                Err(e) => {
                    ctx.tunnel_state = TunnelState::FailedToStart;
                    ctx.diagnostics.warn(Warning::tunnel(e.to_string()));
                    return None;
                }
            }
        }
        if ctx.tunnel_state != TunnelState::Started {
            return None;
        }

        let remote_port = ctx.service_ports(target).await?.port;
        let local_port = ctx.local_ports.next_port();
        match ctx
            .tunnel
            .forward(&target.namespace, &target.service_name, local_port, remote_port)
            .await
        {
            Ok(()) => http_url("127.0.0.1", local_port),
            Err(e) => {
                ctx.diagnostics.warn(Warning::forward(e.to_string()));
                None
            }
        }
    }
}

/// The node port on localhost. Only meaningful once the tunnel is up.
#[derive(Debug, Default)]
pub struct NodePortLocalhost;

#[async_trait]
impl ResolveStrategy for NodePortLocalhost {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NodePortLocalhost
    }

    async fn try_resolve(
        &self,
        target: &ProbeTarget,
        ctx: &mut ResolveContext<'_>,
    ) -> Option<Url> {
        if ctx.tunnel_state != TunnelState::Started {
            return None;
        }
        let node_port = ctx.node_port(target).await?;
        http_url("127.0.0.1", node_port)
    }
}

/// The node's internal address with the node port.
#[derive(Debug, Default)]
pub struct NodeIp;

#[async_trait]
impl ResolveStrategy for NodeIp {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NodeIp
    }

    async fn try_resolve(
        &self,
        target: &ProbeTarget,
        ctx: &mut ResolveContext<'_>,
    ) -> Option<Url> {
        let node_port = ctx.node_port(target).await?;
        let address = ctx.node_address().await?;
        http_url(&address, node_port)
    }
}

/// Strategy objects in the configured order.
pub fn strategies_for<'a, I>(kinds: I) -> Vec<Box<dyn ResolveStrategy>>
where
    I: IntoIterator<Item = &'a StrategyKind>,
{
    kinds
        .into_iter()
        .map(|kind| -> Box<dyn ResolveStrategy> {
            match kind {
                StrategyKind::TunnelForward => Box::new(TunnelForward),
                StrategyKind::NodePortLocalhost => Box::new(NodePortLocalhost),
                StrategyKind::NodeIp => Box::new(NodeIp),
            }
        })
        .collect()
}
