use std::time::Duration;

use log::debug;
use url::{Origin, Url};

use crate::offline::{
    error::CacheError,
    types::{FetchRequest, FetchResponse, ResponseKind},
};

/// Network access used by the worker on cache misses.
pub trait Fetcher {
    /// Fails only when no response could be obtained at all.
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CacheError>;
}

const HOP_BY_HOP: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "accept-encoding",
    "keep-alive",
    "upgrade",
];

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    scope: Origin,
}

impl HttpFetcher {
    /// `scope` is the page origin; answers from other origins are classified as cross origin.
    pub fn new(scope: &Url) -> Result<Self, CacheError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CacheError::Network(e.to_string()))?;
        Ok(Self {
            client,
            scope: scope.origin(),
        })
    }

    fn classify(&self, requested: &Url, answered: &Url) -> ResponseKind {
        if requested != answered {
            ResponseKind::Redirected
        } else if requested.origin() != self.scope {
            ResponseKind::Cors
        } else {
            ResponseKind::Basic
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| CacheError::Network(format!("bad method {}: {e}", request.method)))?;

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            if !HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str()) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .map_err(|e| CacheError::Network(e.to_string()))?;

        let answered = Url::parse(response.url().as_str()).map_err(|source| {
            CacheError::InvalidUrl {
                url: response.url().to_string(),
                source,
            }
        })?;
        let kind = self.classify(&request.url, &answered);
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| CacheError::Network(e.to_string()))?
            .to_vec();

        debug!("FETCH {} {} -> {status} ({kind:?})", request.method, request.url);
        Ok(FetchResponse {
            status,
            kind,
            headers,
            body,
        })
    }
}
