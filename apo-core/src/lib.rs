pub mod agent;
pub mod config;
pub mod filter;
pub mod model;
pub mod reducer;
pub mod source;
pub mod state;
