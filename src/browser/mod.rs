//! Browser automation module
//!
//! Defines the browser and screenshot collaborators and ships an
//! implementation backed by the agent-browser CLI.

mod executor;
mod screenshot;
mod traits;

pub use executor::AgentBrowser;
pub use screenshot::InlineScreenshotter;
pub use traits::{Browser, Screenshotter};
