//! Networking
//!
//! This module holds the registry of known peers, the HTTP client used to
//! fetch peer chains during consensus, and the HTTP server exposing the
//! engine to clients and other nodes.

pub mod client;
pub mod node;
pub mod server;

pub use client::{chain_url, HttpPeerClient};
pub use node::NodeRegistry;
pub use server::{read_request, route, write_response, Request, Response, Server};
