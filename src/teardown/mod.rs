// ABOUTME: Reclaims every resource a PR's previews created.
// ABOUTME: Namespaces, images, local processes and state files, each step independent.

mod coordinator;
mod processes;
mod report;

pub use coordinator::TeardownCoordinator;
pub use processes::{LsofProcesses, ProcessError, ProcessOps};
pub use report::{TeardownFailure, TeardownReport, TeardownStatus, TeardownStep, TerminatedProcess};
