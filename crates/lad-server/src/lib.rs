//! Landing-site derivation server: session store, debounced pipeline and
//! elevation lookups behind a small REST API.

pub mod api;
pub mod cache;
pub mod config;
pub mod elevation;
pub mod loops;
pub mod pipeline;
pub mod state;
