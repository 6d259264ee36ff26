// ABOUTME: Node-port ranges and local forward port range.
// ABOUTME: Defaults keep generic, frontend and backend seeds in disjoint bands.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    pub generic_base: u16,
    pub frontend_base: u16,
    pub backend_base: u16,
    /// Multiplier for `pr mod 100`.
    pub pr_stride: u16,
    /// Multiplier for the namespace suffix.
    pub suffix_stride: u16,
    /// Largest namespace suffix teardown considers when enumerating seeds.
    pub max_suffix: u32,
    /// Ports tried past the seed before reporting exhaustion.
    pub max_probe_attempts: u16,
    /// Highest port the cluster accepts as a node port.
    pub node_port_max: u16,
    /// How many times a service apply is retried after a port conflict.
    pub conflict_retries: u32,
    pub forward_base: u16,
    pub forward_span: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            generic_base: 30000,
            frontend_base: 31000,
            backend_base: 32000,
            pr_stride: 5,
            suffix_stride: 1,
            max_suffix: 9,
            max_probe_attempts: 50,
            node_port_max: 32767,
            conflict_retries: 1,
            forward_base: 18000,
            forward_span: 1000,
        }
    }
}
