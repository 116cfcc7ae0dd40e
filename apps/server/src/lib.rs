pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;
mod domain_events;
mod main_lib;

pub use main_lib::{build_state, build_state_with, init_tracing, AppState};
