//! Synthesis gateway implementations

pub mod http;

pub use http::HttpSynthesisGateway;
