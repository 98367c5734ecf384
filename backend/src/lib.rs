//! Podium NIRD backend library.
//!
//! Hexagonal layout: [`domain`] holds the gamification engine and its ports,
//! [`inbound`] adapts HTTP and WebSocket traffic onto the driving ports, and
//! [`outbound`] implements the driven ports against PostgreSQL and the
//! credential primitives.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
