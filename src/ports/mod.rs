// ABOUTME: Node-port allocation for preview services and local forward ports.
// ABOUTME: Deterministic seeds with linear probing against the cluster's allocated ports.

mod allocator;
mod forward;

pub use allocator::{PortAllocation, PortAllocator, PortError, ServiceKind};
pub use forward::LocalPortCounter;
