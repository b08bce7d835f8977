// Error types and error handling module
// This file defines the error types shared by the resolver service
// and the map session client
//
// Numan Thabit 2025 Nov

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("network io error: {0}")]
    NetworkIo(String),
    #[error("network format error: {0}")]
    NetworkFormat(String),
    #[error("path search failed: {0}")]
    Search(String),
}

/// Failure kinds surfaced by the map session transport
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("request aborted")]
    Aborted,
    #[error("route task panicked")]
    Panicked,
}
