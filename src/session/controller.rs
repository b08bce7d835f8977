// Map session controller
// Owns the pairing state and the view, runs one task per dispatched pair
// and applies completions in order of relevance rather than arrival
//
// Numan Thabit 2025 Nov

use crate::errors::FetchError;
use crate::network::GeoPoint;
use crate::router::RouteRequest;
use crate::session::pairing::{ClickOutcome, InFlight, Pairing, RequestId};
use crate::session::view::{LayerId, RouteView};
use crate::transport::RouteSource;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type TaskResult = (RequestId, Result<Vec<GeoPoint>, FetchError>);

/// What happened to the pair that was resolving
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Drawn {
        id: RequestId,
        request: RouteRequest,
        /// `None` when the resolver found no route and the map was only cleared
        layer: Option<LayerId>,
        points: usize,
    },
    /// The request failed; it is handed back so it can be retried
    Failed {
        id: RequestId,
        request: RouteRequest,
        error: FetchError,
    },
}

pub struct MapController<S: RouteSource> {
    source: Arc<S>,
    pairing: Pairing,
    view: RouteView,
    current: Option<(RequestId, JoinHandle<()>)>,
    tx: mpsc::UnboundedSender<TaskResult>,
    rx: mpsc::UnboundedReceiver<TaskResult>,
}

impl<S: RouteSource> MapController<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            pairing: Pairing::new(),
            view: RouteView::new(),
            current: None,
            tx,
            rx,
        }
    }

    pub fn view(&self) -> &RouteView {
        &self.view
    }

    pub fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    /// Fetch and show the road network. On failure the map keeps its tiles
    /// and whatever else it already shows.
    pub async fn load_base_layer(&mut self) -> Result<(), FetchError> {
        match self.source.network().await {
            Ok(collection) => {
                let layer = self.view.set_base_layer(&collection);
                info!(
                    layer = layer.0,
                    features = collection.features.len(),
                    "base network layer loaded"
                );
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "failed to load base network layer");
                Err(err)
            }
        }
    }

    pub fn click(&mut self, point: GeoPoint) -> ClickOutcome {
        self.view.add_marker(point);
        let outcome = self.pairing.click(point);
        if let ClickOutcome::Dispatch {
            in_flight,
            superseded,
        } = outcome
        {
            self.dispatch(in_flight, superseded);
        } else {
            debug!(point = %point, "point buffered");
        }
        outcome
    }

    /// Request a route again, typically one returned by `Completion::Failed`
    pub fn retry(&mut self, request: RouteRequest) -> ClickOutcome {
        let outcome = self.pairing.reissue(request);
        if let ClickOutcome::Dispatch {
            in_flight,
            superseded,
        } = outcome
        {
            self.dispatch(in_flight, superseded);
        }
        outcome
    }

    /// Wait for the pair currently resolving and apply its result. Returns
    /// `None` when nothing is in flight. Results of superseded pairs are dropped.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            self.pairing.in_flight()?;
            let (id, result) = self.rx.recv().await?;
            let Some(request) = self.pairing.complete(id) else {
                debug!(id = id.0, "dropping stale route result");
                continue;
            };
            self.current = None;

            return Some(match result {
                Ok(points) => {
                    let count = points.len();
                    let layer = self.view.show_route(points);
                    info!(id = id.0, points = count, "route drawn");
                    Completion::Drawn {
                        id,
                        request,
                        layer,
                        points: count,
                    }
                }
                Err(error) => {
                    error!(
                        id = id.0,
                        start = %request.start,
                        end = %request.end,
                        error = %error,
                        "route request failed"
                    );
                    Completion::Failed { id, request, error }
                }
            });
        }
    }

    fn dispatch(&mut self, in_flight: InFlight, superseded: Option<RequestId>) {
        if let Some((old, handle)) = self.current.take() {
            if Some(old) == superseded {
                debug!(superseded = old.0, by = in_flight.id.0, "aborting superseded route request");
            }
            handle.abort();
        }

        info!(
            id = in_flight.id.0,
            start = %in_flight.request.start,
            end = %in_flight.request.end,
            "requesting route"
        );
        let fut = self.source.route(in_flight.request);
        let tx = self.tx.clone();
        let id = in_flight.id;
        let handle = tokio::spawn(async move {
            // a panicking source still produces a result
            let result = AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .unwrap_or(Err(FetchError::Panicked));
            // receiver lives as long as the controller
            let _ = tx.send((id, result));
        });
        self.current = Some((id, handle));
    }
}

impl<S: RouteSource> Drop for MapController<S> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.current.take() {
            handle.abort();
        }
    }
}
