use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

#[derive(Debug)]
struct Exposition {
    status: Mutex<StatusCode>,
    body: Mutex<String>,
    delay: Mutex<Duration>,
    hits: AtomicUsize,
}

/// Local HTTP server answering `GET /metrics` with a fixed status and body.
///
/// Stops when dropped.
#[derive(Debug)]
pub struct MetricsServer {
    url: Url,
    state: Arc<Exposition>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MetricsServer {
    pub async fn start(status: StatusCode, body: impl Into<String>) -> Result<Self> {
        let state = Arc::new(Exposition {
            status: Mutex::new(status),
            body: Mutex::new(body.into()),
            delay: Mutex::new(Duration::ZERO),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/metrics", get(serve_metrics))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await;
        });

        Ok(Self {
            url: Url::parse(&format!("http://{address}/metrics"))?,
            state,
            shutdown: Some(shutdown),
        })
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.state.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    pub fn set_body(&self, body: impl Into<String>) {
        *self.state.body.lock().unwrap_or_else(|e| e.into_inner()) = body.into();
    }

    /// Delays every following response.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }
}

impl Drop for MetricsServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn serve_metrics(State(state): State<Arc<Exposition>>) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let delay = *state.delay.lock().unwrap_or_else(|e| e.into_inner());
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let status = *state.status.lock().unwrap_or_else(|e| e.into_inner());
    let body = state.body.lock().unwrap_or_else(|e| e.into_inner()).clone();
    (status, body)
}
