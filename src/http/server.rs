use anyhow::anyhow;
use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use url::Url;

use crate::{
    app::Deck,
    catalog::{confirm::AssumeYes, media::MediaLibrary, store::Removal},
    config::HttpConfig,
    domain::{
        id::TrackId,
        track::{MediaSource, NewTrack, TrackRecord},
    },
    http::{RunningServer, error::ApiError, page},
    playback::{controller::WidgetView, rate::PlaybackRate},
    request::song_request_url,
    storage::slot::SqliteSlot,
};

pub struct HttpServer {
    deck: Arc<Mutex<Deck<SqliteSlot>>>,
    pub config: HttpConfig,
    request_phone: String,
    media: MediaLibrary,
}

impl HttpServer {
    pub fn new(
        deck: Deck<SqliteSlot>,
        config: HttpConfig,
        request_phone: String,
        media: MediaLibrary,
    ) -> Self {
        Self {
            deck: Arc::new(Mutex::new(deck)),
            config,
            request_phone,
            media,
        }
    }

    /// Binds the listener and serves on a background thread.
    pub fn spawn(self) -> anyhow::Result<RunningServer> {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        let server = rouille::Server::new(addr.as_str(), move |request| {
            self.handle_request(request)
        })
        .map_err(|e| anyhow!("failed to bind page server to {addr}: {e}"))?;
        Ok(RunningServer::from(server.stoppable()))
    }

    pub(crate) fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = match (request.method(), request.url().as_str()) {
            ("GET", "/") | ("GET", "/index.html") => Response::html(page::INDEX),
            ("GET", "/styles.css") => {
                Response::from_data("text/css; charset=utf-8", page::STYLES)
            }
            ("GET", "/script.js") => {
                Response::from_data("application/javascript; charset=utf-8", page::SCRIPT)
            }
            _ => self.route_api(request),
        };

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn route_api(&self, request: &Request) -> Response {
        rouille::router!(request,
            (GET) (/tracks) => {
                self.handle_list(request)
            },
            (POST) (/tracks) => {
                Self::respond(self.add_track(request))
            },
            (POST) (/tracks/state) => {
                self.handle_state(request)
            },
            (DELETE) (/tracks/{id: String}) => {
                Self::respond(self.delete_track(&id, request))
            },
            (POST) (/tracks/{id: String}/toggle) => {
                Self::respond(self.toggle_play(&id))
            },
            (POST) (/tracks/{id: String}/ended) => {
                Self::respond(self.ended(&id))
            },
            (POST) (/tracks/{id: String}/speed) => {
                Self::respond(self.set_speed(&id, request))
            },
            (GET) (/tracks/{id: String}/audio) => {
                Self::respond(self.serve_resource(&id, Resource::Stream))
            },
            (GET) (/tracks/{id: String}/download) => {
                Self::respond(self.serve_resource(&id, Resource::Download))
            },
            (GET) (/tracks/{id: String}/document) => {
                Self::respond(self.serve_resource(&id, Resource::Document))
            },
            (GET) (/request) => {
                Self::respond(self.song_request(request))
            },
            _ => Response::empty_404()
        )
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        match result {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Deck<SqliteSlot>>, ApiError> {
        self.deck
            .lock()
            .map_err(|e| ApiError::Internal(format!("could not access deck under lock: {e}")))
    }

    fn parse_id(id: &str) -> Result<TrackId, ApiError> {
        id.parse()
            .map_err(|_| ApiError::BadRequest("invalid track id".into()))
    }

    /// Cards and widget state for the shell. Answered to POST only, so the
    /// offline cache never stores it.
    fn handle_state(&self, request: &Request) -> Response {
        let query = request.get_param("q").unwrap_or_default();
        let deck = match self.lock() {
            Ok(deck) => deck,
            Err(e) => return e.into_response(),
        };
        let tracks = deck.catalog().search(&query);
        Response::json(&DeckState {
            count: tracks.len(),
            cards: page::render_cards(&tracks, |t| deck.playback().view(t.id)),
            widgets: deck.widgets(),
        })
    }

    fn handle_list(&self, request: &Request) -> Response {
        let query = request.get_param("q").unwrap_or_default();
        let deck = match self.lock() {
            Ok(deck) => deck,
            Err(e) => return e.into_response(),
        };
        let body = deck
            .catalog()
            .search(&query)
            .into_iter()
            .map(|track| TrackResponse {
                track: track.clone(),
                widget: deck.playback().view(track.id),
            })
            .collect::<Vec<_>>();
        Response::json(&body)
    }

    /// Accepts urls only. Local files enter the catalog through the media library.
    fn add_track(&self, request: &Request) -> Result<Response, ApiError> {
        let new: NewTrack = rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid track json: {e}")))?;
        let sources = [&new.audio, &new.download, &new.document];
        if sources
            .into_iter()
            .flatten()
            .any(|source| matches!(source, MediaSource::File(_)))
        {
            return Err(ApiError::BadRequest(
                "local file paths cannot be added over http, use a url".into(),
            ));
        }
        let record = self.lock()?.add(new)?;
        Ok(Response::json(&record).with_status_code(201))
    }

    /// Deleting requires `confirm=yes`; the page asks the user before sending it.
    fn delete_track(&self, id: &str, request: &Request) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let confirmed = request
            .get_param("confirm")
            .is_some_and(|c| c.eq_ignore_ascii_case("yes"));

        let mut deck = self.lock()?;
        if deck.catalog().get(id).is_none() {
            return Err(ApiError::NotFound(format!("track {id} not found")));
        }
        if !confirmed {
            return Err(ApiError::Conflict(
                "deleting a track requires confirm=yes".into(),
            ));
        }

        match deck.remove(id, &mut AssumeYes)? {
            Removal::Removed(track) => Ok(Response::json(&track)),
            Removal::NotFound | Removal::Declined => {
                Err(ApiError::NotFound(format!("track {id} not found")))
            }
        }
    }

    fn toggle_play(&self, id: &str) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let mut deck = self.lock()?;
        deck.toggle_play(id)?;
        Ok(Response::json(&deck.widgets()))
    }

    fn ended(&self, id: &str) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let mut deck = self.lock()?;
        deck.ended(id)?;
        Ok(Response::json(&deck.widgets()))
    }

    fn set_speed(&self, id: &str, request: &Request) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let rate: PlaybackRate = request
            .get_param("rate")
            .ok_or_else(|| ApiError::BadRequest("missing rate".into()))?
            .parse()?;
        let mut deck = self.lock()?;
        deck.set_rate(id, rate)?;
        Ok(Response::json(&deck.widgets()))
    }

    fn serve_resource(&self, id: &str, resource: Resource) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let track = self
            .lock()?
            .catalog()
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("track {id} not found")))?;

        let (locator, filename) = match resource {
            Resource::Stream => (Some(track.audio_url.clone()), track.audio_filename()),
            Resource::Download => (Some(track.mp3_url.clone()), track.audio_filename()),
            Resource::Document => (track.document_url.clone(), track.document_filename()),
        };
        let locator = locator
            .ok_or_else(|| ApiError::NotFound(format!("track {id} has no document")))?;

        let response = self.serve_locator(&locator, &filename)?;
        Ok(match resource {
            Resource::Stream => response,
            Resource::Download | Resource::Document => {
                response.with_content_disposition_attachment(&filename)
            }
        })
    }

    /// Files of the media library are streamed, remote locators are redirected.
    /// Any other local path is treated as missing.
    fn serve_locator(&self, locator: &str, filename: &str) -> Result<Response, ApiError> {
        let url = Url::parse(locator)
            .map_err(|e| ApiError::Internal(format!("stored locator is invalid: {e}")))?;
        if url.scheme() != "file" {
            return Ok(Response::redirect_302(url.to_string()));
        }

        let unavailable = || ApiError::NotFound(format!("{filename} is not available"));
        let path = url.to_file_path().map_err(|_| unavailable())?;
        let Some(path) = self.media.resolve(&path) else {
            log::warn!("refusing to serve {} outside the media library", path.display());
            return Err(unavailable());
        };
        let file = std::fs::File::open(&path).map_err(|_| unavailable())?;
        log::debug!(
            "SERVE {} -> {}",
            path.to_string_lossy(),
            Self::mime_for_path(&path)
        );

        Ok(Response::from_file(Self::mime_for_path(&path), file))
    }

    fn mime_for_path(path: &Path) -> String {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy())
            .map(|s| s.to_lowercase());
        let default = || {
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string()
        };
        ext.and_then(|ext| Self::mime_from_ext(ext.as_str()))
            .unwrap_or_else(default)
    }

    /// Map file extension (without dot) to proper MIME type for browser playback.
    /// Returns None if the extension is not recognized.
    pub fn mime_from_ext(ext: &str) -> Option<String> {
        match ext {
            "m4a" => Some("audio/x-m4a".to_string()), // Safari iOS compatible
            "aac" => Some("audio/aac".to_string()),
            "mp3" => Some("audio/mpeg".to_string()),
            "wav" => Some("audio/wav".to_string()),
            "ogg" => Some("audio/ogg".to_string()),
            "flac" => Some("audio/flac".to_string()),
            "pdf" => Some("application/pdf".to_string()),
            _ => None,
        }
    }

    fn song_request(&self, request: &Request) -> Result<Response, ApiError> {
        let song = request.get_param("song").unwrap_or_default();
        let description = request.get_param("description").unwrap_or_default();
        let url = song_request_url(&self.request_phone, &song, &description)?;
        info!("handing off song request for \"{}\"", song.trim());
        Ok(Response::redirect_303(url.to_string()))
    }
}

enum Resource {
    /// Inline audio for the player.
    Stream,
    Download,
    Document,
}

#[derive(Serialize, Deserialize)]
struct TrackResponse {
    #[serde(flatten)]
    track: TrackRecord,
    widget: Option<WidgetView>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct DeckState {
    pub count: usize,
    pub cards: String,
    pub widgets: Vec<WidgetView>,
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
