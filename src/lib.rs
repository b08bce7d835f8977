// Library root module for route-resolver
// This file defines the public API and module structure of the road
// network route resolver and its map session client
//
// Numan Thabit 2025 Nov

pub mod config;
pub mod control;
pub mod errors;
pub mod metrics;
pub mod network;
pub mod router;
pub mod session;
pub mod transport;
