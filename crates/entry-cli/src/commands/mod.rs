//! CLI command implementations.
//!
//! - [`enter`] - Attach to a container shell (or follow its output)

pub mod enter;

pub use enter::{EnterCommand, EnterStatus};
