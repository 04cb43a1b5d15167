//! API module for the PRMS client
//!
//! Transport, response envelopes and the backend's endpoint table.

pub mod client;
pub mod envelope;
pub mod routes;

pub use client::ApiClient;
pub use envelope::{Ack, ApiResponse, Payload, DATA};
