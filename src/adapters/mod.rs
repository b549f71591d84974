// Adapters layer: concrete implementations of the domain ports against
// external systems (platform HTTP API, claim persistence).

pub mod http_api;
pub mod json_claims;
pub mod memory;
