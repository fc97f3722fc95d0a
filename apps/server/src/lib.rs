pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
mod main_lib;

pub use main_lib::{build_state, build_state_with_worker, init_tracing, AppState};
