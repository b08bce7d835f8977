use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use route_resolver::config::AppConfig;
use route_resolver::control::AdmissionControl;
use route_resolver::metrics;
use route_resolver::network::RoadNetwork;
use route_resolver::router::{create_api_router, ApiState, RouteResolver};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal resolver error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration")?;
    config.log();

    let network = RoadNetwork::load_or_sample(&config.network_path, config.sample_network_fallback)
        .await
        .with_context(|| format!("load road network {}", config.network_path.display()))?;
    if network.is_empty() {
        warn!("road network has no nodes; every route will be empty");
    }
    metrics::NETWORK_NODES.set(network.node_count() as i64);
    metrics::NETWORK_EDGES.set(network.edge_count() as i64);

    let resolver = Arc::new(RouteResolver::new(
        Arc::new(network),
        config.snap_tolerance_km(),
        config.distance_cache_capacity,
    ));
    let admission = AdmissionControl::new(config.max_inflight, config.rate_per_sec);

    let app = App {
        config: Arc::new(config),
        resolver,
        admission,
    };

    app.run().await
}

struct App {
    config: Arc<AppConfig>,
    resolver: Arc<RouteResolver>,
    admission: AdmissionControl,
}

impl App {
    async fn run(self) -> Result<()> {
        let state = ApiState::new(
            self.resolver.clone(),
            self.admission.clone(),
            self.config.network_path.clone(),
        );
        let api_router = create_api_router(state);

        let listener = tokio::net::TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("bind {}", self.config.listen_addr))?;
        info!(
            address = %self.config.listen_addr,
            nodes = self.resolver.network().node_count(),
            edges = self.resolver.network().edge_count(),
            "route resolver online"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, api_router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let mut ticker = tokio::time::interval(self.config.heartbeat());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.resolver.stats().await;
                    info!(
                        route_requests = stats.route_requests,
                        routes_found = stats.routes_found,
                        routes_missing = stats.routes_missing,
                        distance_queries = stats.distance_queries,
                        cache_hits = stats.cache_hits,
                        cache_entries = stats.cache_entries,
                        inflight = self.admission.inflight(),
                        "resolver heartbeat"
                    );
                }
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "ctrl_c listener error");
                    }
                    info!("Shutdown signal received, draining connections");
                    break;
                }
                res = &mut server => {
                    res.context("join HTTP server task")?
                        .context("HTTP server error")?;
                    return Err(anyhow!("HTTP server exited unexpectedly"));
                }
            }
        }

        let _ = shutdown_tx.send(());
        server
            .await
            .context("join HTTP server task")?
            .context("HTTP server error")?;
        debug!("HTTP server stopped");
        Ok(())
    }
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,tower_http=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
