//! Fatal error taxonomy.
//!
//! Only startup-level failures live here; per-item failures inside a run
//! are carried as strings in the sweep report and never abort the loop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("profile error: {0}")]
    Profile(String),

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("listing enumeration failed: {0}")]
    Enumerate(String),
}
