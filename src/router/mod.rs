// Router module - route resolution plane
// This file wires the resolver, its request/response types and the
// HTTP API that exposes them
//
// Numan Thabit 2025 Nov

pub mod resolver;
pub mod routes;

#[allow(clippy::module_inception)]
pub mod router;

pub use resolver::{ResolverStats, RouteResolver};
pub use router::{create_api_router, ApiState};
pub use routes::{NoRouteReason, ResolvedRoute, RouteOutcome, RouteRequest};
