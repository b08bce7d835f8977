// HTTP transport layer implementation
// This file implements the client used by a map session to fetch the
// road network document and request routes from the resolver
//
// Numan Thabit 2025 Nov

use crate::errors::FetchError;
use crate::network::{FeatureCollection, GeoPoint};
use crate::router::RouteRequest;
use crate::transport::RouteSource;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use url::Url;

#[derive(Debug, Clone)]
pub struct RouteClient {
    http: Client,
    base: Url,
}

impl RouteClient {
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let base = base
            .parse()
            .map_err(|e| FetchError::Transport(format!("{base} is not a valid url: {e}")))?;
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// `/api/route?startLat=..&startLon=..&endLat=..&endLon=..`
    pub fn route_url(&self, req: &RouteRequest) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join("/api/route")
            .map_err(|e| FetchError::Transport(format!("error joining url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("startLat", &req.start.lat.to_string())
            .append_pair("startLon", &req.start.lon.to_string())
            .append_pair("endLat", &req.end.lat.to_string())
            .append_pair("endLon", &req.end.lon.to_string());
        Ok(url)
    }

    pub async fn fetch_route(&self, req: &RouteRequest) -> Result<Vec<GeoPoint>, FetchError> {
        let url = self.route_url(req)?;
        let pairs: Vec<[f64; 2]> = self.get_json(url).await?;
        pairs
            .into_iter()
            .map(|p| GeoPoint::from_pair(p).map_err(|e| FetchError::Decode(e.to_string())))
            .collect()
    }

    pub async fn fetch_network(&self) -> Result<FeatureCollection, FetchError> {
        let url = self
            .base
            .join("/export.geojson")
            .map_err(|e| FetchError::Transport(format!("error joining url: {e}")))?;
        let resp = self.send(url).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("read body: {e}")))?;
        FeatureCollection::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        self.send(url)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("json parse: {e}")))
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("send: {e}")))?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        Ok(resp)
    }
}

impl RouteSource for RouteClient {
    fn route(&self, req: RouteRequest) -> BoxFuture<'static, Result<Vec<GeoPoint>, FetchError>> {
        let client = self.clone();
        async move { client.fetch_route(&req).await }.boxed()
    }

    fn network(&self) -> BoxFuture<'static, Result<FeatureCollection, FetchError>> {
        let client = self.clone();
        async move { client.fetch_network().await }.boxed()
    }
}
