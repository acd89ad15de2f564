//! Webhook server for dockhook.
//!
//! Receives GitHub push and release events, authenticates them per
//! repository and hands matching ones to the deployer.

pub mod error;
pub mod routes;
pub mod signature;
pub mod startup;
pub mod state;

pub use state::AppState;
