use log::{debug, info, warn};
use serde::Serialize;
use url::Url;

use crate::{
    config::OfflineConfig,
    offline::{
        cache::CacheStorage,
        error::CacheError,
        fetch::Fetcher,
        types::{FetchRequest, FetchResponse, RequestKey},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker never controls requests.
    Redundant,
}

/// Cache-first request interceptor backed by one versioned cache.
pub struct OfflineWorker<C, F> {
    version: String,
    origin: Url,
    precache: Vec<String>,
    caches: C,
    fetcher: F,
    state: WorkerState,
    skip_waiting: bool,
}

impl<C: CacheStorage, F: Fetcher> OfflineWorker<C, F> {
    pub fn new(config: &OfflineConfig, origin: Url, caches: C, fetcher: F) -> Self {
        Self {
            version: config.version_name.clone(),
            origin,
            precache: config.precache.clone(),
            caches,
            fetcher,
            state: WorkerState::Parsed,
            skip_waiting: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Whether install asked to replace a waiting worker right away.
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting
    }

    /// Populates the versioned cache with the precache list.
    ///
    /// Nothing is stored unless every resource answered with a success status.
    pub fn install(&mut self) -> Result<(), CacheError> {
        self.state = WorkerState::Installing;
        match self.populate() {
            Ok(count) => {
                info!("installed offline cache {} with {count} resources", self.version);
                self.skip_waiting = true;
                self.state = WorkerState::Installed;
                Ok(())
            }
            Err(e) => {
                self.state = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    fn populate(&mut self) -> Result<usize, CacheError> {
        let mut entries = Vec::with_capacity(self.precache.len());
        for resource in &self.precache {
            let url = self
                .origin
                .join(resource)
                .map_err(|source| CacheError::InvalidUrl {
                    url: resource.clone(),
                    source,
                })?;
            let request = FetchRequest::get(url);
            let response = self.fetcher.fetch(&request)?;
            if !response.is_ok() {
                return Err(CacheError::BadStatus {
                    url: request.url.to_string(),
                    status: response.status,
                });
            }
            entries.push((RequestKey::from(&request), response));
        }

        self.caches.open(&self.version)?;
        self.caches.put_all(&self.version, &entries)?;
        Ok(entries.len())
    }

    /// Deletes every cache but the current version. Returns the deleted names.
    pub fn activate(&mut self) -> Result<Vec<String>, CacheError> {
        self.state = WorkerState::Activating;
        let mut deleted = Vec::new();
        for name in self.caches.keys()? {
            if name != self.version {
                self.caches.delete(&name)?;
                info!("deleted stale offline cache {name}");
                deleted.push(name);
            }
        }
        self.state = WorkerState::Activated;
        Ok(deleted)
    }

    /// Install followed by activation. Failures leave the worker unused.
    pub fn register(&mut self) -> Result<(), CacheError> {
        self.install()?;
        if self.skip_waiting {
            self.activate()?;
        }
        Ok(())
    }

    /// Answers a request: cached copy, else network, else the offline placeholder.
    ///
    /// Before activation requests go straight to the network.
    pub fn handle_fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
        if self.state != WorkerState::Activated {
            return self.fetcher.fetch(request);
        }
        Ok(self.intercept(request))
    }

    fn intercept(&mut self, request: &FetchRequest) -> FetchResponse {
        let key = RequestKey::from(request);

        match self.caches.lookup(&self.version, &key) {
            Ok(Some(cached)) => {
                debug!("cache hit {} {}", key.method, key.url);
                return cached;
            }
            Ok(None) => debug!("cache miss {} {}", key.method, key.url),
            Err(e) => warn!("cache lookup for {} failed, going to network: {e}", key.url),
        }

        match self.fetcher.fetch(request) {
            Ok(response) => {
                if request.is_get() && response.is_cacheable() {
                    if let Err(e) = self.caches.put(&self.version, &key, &response) {
                        warn!("could not cache {}: {e}", key.url);
                    }
                }
                response
            }
            Err(e) => {
                warn!("{} unavailable, serving offline placeholder: {e}", key.url);
                FetchResponse::offline_placeholder()
            }
        }
    }

    pub fn caches(&self) -> &C {
        &self.caches
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        cell::RefCell,
        collections::HashMap,
        rc::Rc,
    };

    use rusqlite::Connection;

    use super::*;
    use crate::{
        offline::{
            cache::SqliteCacheStorage,
            types::{OFFLINE_BODY, ResponseKind},
        },
        storage::schema,
    };

    /// Network double answering from a table. Unknown urls behave as offline.
    #[derive(Clone, Default)]
    pub struct ScriptedFetcher {
        pub responses: Rc<RefCell<HashMap<String, FetchResponse>>>,
        pub calls: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedFetcher {
        pub fn serve(&self, url: &str, status: u16, kind: ResponseKind, body: &str) {
            self.responses.borrow_mut().insert(
                url.to_string(),
                FetchResponse {
                    status,
                    kind,
                    headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
                    body: body.as_bytes().to_vec(),
                },
            );
        }

        pub fn go_offline(&self) {
            self.responses.borrow_mut().clear();
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Fetcher for ScriptedFetcher {
        fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
            let url = request.url.to_string();
            self.calls.borrow_mut().push(url.clone());
            self.responses
                .borrow()
                .get(&url)
                .cloned()
                .ok_or_else(|| CacheError::Network(format!("{url} unreachable")))
        }
    }

    const ORIGIN: &str = "http://127.0.0.1:8080/";

    fn config(version: &str) -> OfflineConfig {
        OfflineConfig {
            version_name: version.to_string(),
            precache: vec!["/".to_string(), "/styles.css".to_string()],
            ..Default::default()
        }
    }

    fn setup_caches() -> SqliteCacheStorage {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        SqliteCacheStorage::new(conn)
    }

    fn online_fetcher() -> ScriptedFetcher {
        let fetcher = ScriptedFetcher::default();
        fetcher.serve(ORIGIN, 200, ResponseKind::Basic, "shell");
        fetcher.serve(
            "http://127.0.0.1:8080/styles.css",
            200,
            ResponseKind::Basic,
            "css",
        );
        fetcher
    }

    fn setup_worker(
        version: &str,
        caches: SqliteCacheStorage,
        fetcher: ScriptedFetcher,
    ) -> OfflineWorker<SqliteCacheStorage, ScriptedFetcher> {
        OfflineWorker::new(&config(version), Url::parse(ORIGIN).unwrap(), caches, fetcher)
    }

    fn get(path: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
    }

    #[test]
    fn install_precaches_everything_and_skips_waiting() -> anyhow::Result<()> {
        let mut worker = setup_worker("v1", setup_caches(), online_fetcher());
        worker.install()?;

        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(worker.skips_waiting());
        let cached = worker.caches().lookup("v1", &RequestKey::from(&get("/styles.css")))?;
        assert_eq!(cached.unwrap().body, b"css");
        Ok(())
    }

    #[test]
    fn install_is_all_or_nothing() -> anyhow::Result<()> {
        let fetcher = online_fetcher();
        fetcher.serve(
            "http://127.0.0.1:8080/styles.css",
            404,
            ResponseKind::Basic,
            "missing",
        );
        let mut worker = setup_worker("v1", setup_caches(), fetcher);

        let err = worker.install().unwrap_err();
        assert!(matches!(err, CacheError::BadStatus { status: 404, .. }));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(worker.caches().keys()?.is_empty());
        assert_eq!(worker.caches().lookup("v1", &RequestKey::from(&get("/")))?, None);
        Ok(())
    }

    #[test]
    fn register_failure_leaves_requests_on_network() {
        let fetcher = ScriptedFetcher::default();
        let mut worker = setup_worker("v1", setup_caches(), fetcher.clone());

        assert!(worker.register().is_err());

        fetcher.serve(
            "http://127.0.0.1:8080/data.json",
            200,
            ResponseKind::Basic,
            "{}",
        );
        let response = worker.handle_fetch(&get("/data.json")).unwrap();
        assert_eq!(response.body, b"{}");
        assert!(worker.caches().keys().unwrap().is_empty());
    }

    #[test]
    fn cache_hit_skips_network() -> anyhow::Result<()> {
        let fetcher = online_fetcher();
        let mut worker = setup_worker("v1", setup_caches(), fetcher.clone());
        worker.register()?;
        let calls_after_install = fetcher.call_count();

        let response = worker.handle_fetch(&get("/styles.css"))?;

        assert_eq!(response.body, b"css");
        assert_eq!(fetcher.call_count(), calls_after_install);
        Ok(())
    }

    #[test]
    fn miss_with_200_is_returned_and_stored() -> anyhow::Result<()> {
        let fetcher = online_fetcher();
        let mut worker = setup_worker("v1", setup_caches(), fetcher.clone());
        worker.register()?;
        fetcher.serve(
            "http://127.0.0.1:8080/script.js",
            200,
            ResponseKind::Basic,
            "js",
        );

        let response = worker.handle_fetch(&get("/script.js"))?;
        assert_eq!(response.body, b"js");

        fetcher.go_offline();
        let again = worker.handle_fetch(&get("/script.js"))?;
        assert_eq!(again.body, b"js");
        Ok(())
    }

    #[test]
    fn indirect_or_failed_responses_are_not_stored() -> anyhow::Result<()> {
        let fetcher = online_fetcher();
        let mut worker = setup_worker("v1", setup_caches(), fetcher.clone());
        worker.register()?;
        fetcher.serve(
            "http://127.0.0.1:8080/moved",
            200,
            ResponseKind::Redirected,
            "elsewhere",
        );
        fetcher.serve("http://127.0.0.1:8080/gone", 404, ResponseKind::Basic, "nope");

        assert_eq!(worker.handle_fetch(&get("/moved"))?.body, b"elsewhere");
        let missing = worker.handle_fetch(&get("/gone"))?;
        assert_eq!(missing.status, 404);

        for path in ["/moved", "/gone"] {
            assert_eq!(worker.caches().lookup("v1", &RequestKey::from(&get(path)))?, None);
        }
        Ok(())
    }

    #[test]
    fn non_get_requests_are_not_stored() -> anyhow::Result<()> {
        let fetcher = online_fetcher();
        let mut worker = setup_worker("v1", setup_caches(), fetcher.clone());
        worker.register()?;
        fetcher.serve("http://127.0.0.1:8080/tracks", 200, ResponseKind::Basic, "[]");

        let mut post = get("/tracks");
        post.method = "POST".to_string();
        worker.handle_fetch(&post)?;

        assert_eq!(worker.caches().lookup("v1", &RequestKey::from(&post))?, None);
        Ok(())
    }

    #[test]
    fn miss_while_offline_yields_placeholder() -> anyhow::Result<()> {
        let fetcher = online_fetcher();
        let mut worker = setup_worker("v1", setup_caches(), fetcher.clone());
        worker.register()?;
        fetcher.go_offline();

        let response = worker.handle_fetch(&get("/never-seen.png"))?;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, OFFLINE_BODY.as_bytes());
        Ok(())
    }

    #[test]
    fn activation_drops_other_versions() -> anyhow::Result<()> {
        let mut caches = setup_caches();
        caches.open("v1")?;
        caches.open("unrelated")?;

        let mut worker = setup_worker("v2", caches, online_fetcher());
        worker.install()?;
        let deleted = worker.activate()?;

        assert_eq!(deleted, vec!["v1".to_string(), "unrelated".to_string()]);
        assert_eq!(worker.caches().keys()?, vec!["v2".to_string()]);
        assert_eq!(worker.state(), WorkerState::Activated);
        Ok(())
    }
}
