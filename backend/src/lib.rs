//! Plant leaf disease classification server.

#[cfg(feature = "torch")]
pub mod architecture;
pub mod config;
pub mod error;
pub mod inference;
pub mod preprocess;
pub mod routes;
pub mod state;
