//! Inbound adapters that translate external traffic into domain service calls
//! while keeping framework details at the edge.
//!
//! - [`http`]: the REST API under `/api/v1` and the health probes
//! - [`ws`]: the `/ws` notification relay

pub mod http;
pub mod ws;
