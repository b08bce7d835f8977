// Transport module
// Sources of routes and network documents for a map session
//
// Numan Thabit 2025 Nov

pub mod http;

use crate::errors::FetchError;
use crate::network::{FeatureCollection, GeoPoint};
use crate::router::RouteRequest;
use futures::future::BoxFuture;

pub use http::RouteClient;

/// Where a map session gets its data from. Futures are `'static` so they can
/// run as detached tasks.
pub trait RouteSource: Send + Sync + 'static {
    fn route(&self, req: RouteRequest) -> BoxFuture<'static, Result<Vec<GeoPoint>, FetchError>>;

    fn network(&self) -> BoxFuture<'static, Result<FeatureCollection, FetchError>>;
}
