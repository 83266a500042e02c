//! Core traits for the client back-reference and resource actions.

mod actions;
mod client;

pub use actions::ResourceActions;
pub use client::ApiClient;
