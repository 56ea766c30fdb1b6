use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, warn};
use std::{io, path::PathBuf};
use url::Url;

use crate::{
    app::Deck,
    catalog::{
        confirm::{AssumeYes, Confirmation, Prompt},
        error::CatalogError,
        media::MediaLibrary,
        store::{CatalogStore, Removal},
    },
    config::{self, Config},
    domain::{
        id::TrackId,
        track::{MediaSource, NewTrack},
    },
    http::{proxy::OfflineProxy, server::HttpServer},
    offline::{cache::SqliteCacheStorage, fetch::HttpFetcher, worker::OfflineWorker},
    request::song_request_url,
    storage::{db, db::millis_to_local_time, slot::SqliteSlot},
};

#[derive(Parser)]
#[command(name = "coverdeck")]
#[command(version = "0.1")]
#[command(about = "Cover song player with offline support")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List songs, optionally filtered by title or artist
    List {
        /// Search term
        query: Option<String>,
    },
    /// Add a song
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        artist: String,
        /// Audio file path or url
        #[arg(long)]
        audio: String,
        /// Download file path or url, defaults to the audio
        #[arg(long)]
        download: Option<String>,
        /// Document file path or url
        #[arg(long)]
        document: Option<String>,
    },
    /// Delete a song
    Remove {
        id: TrackId,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Print a prefilled song request link
    Request {
        #[arg(short, long)]
        song: String,
        #[arg(short, long)]
        description: String,
    },
    /// Show offline caches
    Cache,
    /// Run the page server and the offline proxy
    Serve,
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = execute(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

/// Interprets an argument as a url when it has a scheme, else as a file path.
fn media_source(arg: &str) -> MediaSource {
    match Url::parse(arg) {
        // single letter schemes are windows drive letters
        Ok(url) if url.scheme().len() > 1 => MediaSource::Url(arg.to_string()),
        _ => MediaSource::File(PathBuf::from(arg)),
    }
}

/// Local files are copied into the media library, urls are kept as given.
fn import_source(media: &MediaLibrary, arg: &str) -> Result<MediaSource, CatalogError> {
    match media_source(arg) {
        MediaSource::File(path) => Ok(MediaSource::File(media.import(&path)?)),
        url => Ok(url),
    }
}

fn open_deck(cfg: &Config) -> anyhow::Result<Deck<SqliteSlot>> {
    let conn = db::open(&cfg.database).context("Failed to open catalog storage")?;
    let store = CatalogStore::load(SqliteSlot::new(conn), cfg.catalog.storage_key.clone());
    Ok(Deck::new(store))
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::Config::load(&cli.config.to_string_lossy())?;

    match cli.command {
        Commands::List { query } => {
            let deck = open_deck(&cfg)?;
            let tracks = deck.catalog().search(query.as_deref().unwrap_or_default());

            println!("{} songs", tracks.len());
            for track in tracks {
                println!("[{}] {} - {}", track.id, track.title, track.display_artist());
                println!("    audio:    {}", track.audio_url);
                if track.mp3_url != track.audio_url {
                    println!("    download: {}", track.mp3_url);
                }
                if let Some(doc) = &track.document_url {
                    println!("    document: {doc}");
                }
            }
        }

        Commands::Add {
            title,
            artist,
            audio,
            download,
            document,
        } => {
            let mut deck = open_deck(&cfg)?;
            let media = MediaLibrary::new(cfg.catalog.media_dir.clone());
            let import = |arg: &str| import_source(&media, arg);
            let record = deck.add(NewTrack {
                title,
                artist,
                audio: Some(import(&audio)?),
                download: download.as_deref().map(import).transpose()?,
                document: document.as_deref().map(import).transpose()?,
            })?;
            println!("Song added successfully! id {}", record.id);
        }

        Commands::Remove { id, yes } => {
            let mut deck = open_deck(&cfg)?;
            let stdin = io::stdin();
            let mut prompt = Prompt::new(stdin.lock(), io::stdout());
            let mut assume_yes = AssumeYes;
            let confirmation: &mut dyn Confirmation = if yes {
                &mut assume_yes
            } else {
                &mut prompt
            };

            match deck.remove(id, confirmation)? {
                Removal::Removed(track) => println!("Song deleted successfully: {}", track.title),
                Removal::NotFound => println!("No song with id {id}"),
                Removal::Declined => println!("Nothing deleted"),
            }
        }

        Commands::Request { song, description } => {
            let url = song_request_url(&cfg.request.phone, &song, &description)?;
            println!("Open this link to send your request:\n{url}");
        }

        Commands::Cache => {
            let conn = db::open(&cfg.database).context("Failed to open cache storage")?;
            let caches = SqliteCacheStorage::new(conn).summary()?;
            if caches.is_empty() {
                println!("No offline caches");
            }
            for cache in caches {
                let marker = if cache.name == cfg.offline.version_name {
                    " (current)"
                } else {
                    ""
                };
                match cache.last_stored_at.map(millis_to_local_time).transpose()? {
                    Some(at) => println!(
                        "{}{marker}: {} entries, last stored {at}",
                        cache.name, cache.entries
                    ),
                    None => println!("{}{marker}: empty", cache.name),
                }
            }
        }

        Commands::Serve => {
            let deck = open_deck(&cfg)?;
            let origin = Url::parse(&cfg.http.origin()).context("Invalid http bind address")?;
            let media = MediaLibrary::new(cfg.catalog.media_dir.clone());
            let page = HttpServer::new(deck, cfg.http.clone(), cfg.request.phone.clone(), media);
            let page = page.spawn()?;
            println!("HTTP server running at {origin}");

            let offline = if cfg.offline.enabled {
                start_offline(&cfg, origin)
            } else {
                None
            };

            page.join();
            if let Some(offline) = offline {
                offline.stop();
            }
        }
    }

    Ok(())
}

/// Failures here only cost offline support.
fn start_offline(cfg: &Config, origin: Url) -> Option<crate::http::RunningServer> {
    let caches = match db::open(&cfg.database) {
        Ok(conn) => SqliteCacheStorage::new(conn),
        Err(e) => {
            warn!("offline cache storage unavailable: {e}");
            return None;
        }
    };
    let fetcher = match HttpFetcher::new(&origin) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            warn!("offline fetcher unavailable: {e}");
            return None;
        }
    };
    let worker = OfflineWorker::new(&cfg.offline, origin, caches, fetcher);
    OfflineProxy::register_and_spawn(worker, cfg.offline.clone())
}
