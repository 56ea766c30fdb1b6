//! Listener that routes every request of the page through the offline worker.

use std::{io::Read, sync::Mutex};

use anyhow::anyhow;
use log::{info, warn};
use rouille::{Request, Response};
use url::Url;

use crate::{
    config::OfflineConfig,
    http::RunningServer,
    offline::{
        cache::CacheStorage,
        fetch::Fetcher,
        types::{FetchRequest, FetchResponse},
        worker::OfflineWorker,
    },
};

/// Headers rouille computes itself.
const SKIPPED_HEADERS: &[&str] = &["content-length", "transfer-encoding", "connection"];

pub struct OfflineProxy<C, F> {
    worker: Mutex<OfflineWorker<C, F>>,
    pub config: OfflineConfig,
}

impl<C: CacheStorage, F: Fetcher> OfflineProxy<C, F> {
    pub fn new(worker: OfflineWorker<C, F>, config: OfflineConfig) -> Self {
        Self {
            worker: Mutex::new(worker),
            config,
        }
    }

    fn handle_request(&self, request: &Request) -> Response {
        info!("OFFLINE {} {}", request.method(), request.raw_url());

        let mut worker = match self.worker.lock() {
            Ok(worker) => worker,
            Err(e) => {
                return Response::text(format!("offline worker unavailable: {e}"))
                    .with_status_code(500);
            }
        };

        let fetch = match Self::to_fetch_request(request, worker.origin()) {
            Ok(fetch) => fetch,
            Err(e) => return Response::text(e.to_string()).with_status_code(400),
        };

        match worker.handle_fetch(&fetch) {
            Ok(response) => Self::to_response(response),
            Err(e) => {
                warn!("{} {} failed: {e}", fetch.method, fetch.url);
                Response::text(e.to_string()).with_status_code(502)
            }
        }
    }

    fn to_fetch_request(request: &Request, origin: &Url) -> anyhow::Result<FetchRequest> {
        let url = origin
            .join(request.raw_url())
            .map_err(|e| anyhow!("cannot map {} onto {origin}: {e}", request.raw_url()))?;

        let headers = request
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let mut body = Vec::new();
        if let Some(mut data) = request.data() {
            data.read_to_end(&mut body)?;
        }

        Ok(FetchRequest {
            method: request.method().to_string(),
            url,
            headers,
            body,
        })
    }

    fn to_response(response: FetchResponse) -> Response {
        let content_type = response
            .header("Content-Type")
            .unwrap_or("application/octet-stream")
            .to_string();
        let mut out = Response::from_data(content_type, response.body).with_status_code(response.status);
        for (name, value) in response.headers {
            let lower = name.to_ascii_lowercase();
            if lower == "content-type" || SKIPPED_HEADERS.contains(&lower.as_str()) {
                continue;
            }
            out = out.with_additional_header(name, value);
        }
        out
    }
}

impl<C, F> OfflineProxy<C, F>
where
    C: CacheStorage + Send + 'static,
    F: Fetcher + Send + 'static,
{
    /// Registers the worker and, when that succeeds, starts serving.
    ///
    /// A failed registration is logged and the proxy is not started; the
    /// page server is unaffected.
    pub fn register_and_spawn(
        mut worker: OfflineWorker<C, F>,
        config: OfflineConfig,
    ) -> Option<RunningServer> {
        if let Err(e) = worker.register() {
            warn!("offline worker registration failed: {e}");
            return None;
        }

        let addr = format!("{}:{}", config.bind_addr, config.port);
        let version = worker.version().to_string();
        let proxy = Self::new(worker, config);
        match rouille::Server::new(addr.as_str(), move |request| proxy.handle_request(request)) {
            Ok(server) => {
                info!("offline proxy running at http://{addr} with cache {version}");
                Some(RunningServer::from(server.stoppable()))
            }
            Err(e) => {
                warn!("offline proxy could not bind {addr}: {e}");
                None
            }
        }
    }
}
