pub mod config;
pub mod error;
pub mod events;
pub mod snapshot;
pub mod state;
