// ABOUTME: Service reachability: resolve a usable URL through ordered strategies, then verify it.
// ABOUTME: Tunnel + port-forward, node port on localhost, node IP + node port.

mod check;
mod reachability;
mod strategy;
mod tunnel;

pub use check::{ProbeSignal, check_url};
pub use reachability::{ProbeOutcome, ProbeTarget, ReachabilityProbe};
pub use strategy::{
    NodeIp, NodePortLocalhost, ResolveContext, ResolveStrategy, TunnelForward, TunnelState,
    strategies_for,
};
pub use tunnel::{CliTunnel, TunnelError, TunnelOps};
