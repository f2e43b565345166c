pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod sweep;
pub mod theme;

pub use error::Error;
pub use sweep::{Item, ListingSource, SweepReport};
