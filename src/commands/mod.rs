// ABOUTME: Command module aggregator for the ephemera CLI.
// ABOUTME: Re-exports plan, create, and delete command handlers.

mod create;
mod delete;
mod plan;

pub use create::create;
pub use delete::delete;
pub use plan::plan;
