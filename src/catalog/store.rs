use log::{info, warn};
use url::Url;

use crate::{
    catalog::{
        confirm::Confirmation,
        error::{CatalogError, ValidationError},
        seed::seed_tracks,
    },
    domain::{
        id::TrackId,
        track::{MediaSource, NewTrack, TrackRecord},
    },
    storage::{error::StorageError, slot::KeyValueSlot},
};

/// Outcome of a confirmed delete.
#[derive(Debug, PartialEq, Eq)]
pub enum Removal {
    Removed(TrackRecord),
    NotFound,
    Declined,
}

/// Ordered list of tracks mirrored to a single persistence slot.
///
/// Every mutation rewrites the whole serialized list.
pub struct CatalogStore<S: KeyValueSlot> {
    slot: S,
    key: String,
    tracks: Vec<TrackRecord>,
}

impl<S: KeyValueSlot> CatalogStore<S> {
    /// Reads the persisted list, falling back to the seed list when the slot
    /// is empty, unreadable or corrupt. Never fails.
    pub fn load(slot: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let persisted = match slot.read(&key) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<TrackRecord>>(&json) {
                Ok(tracks) => Some(tracks),
                Err(e) => {
                    warn!("catalog slot '{key}' is corrupt, starting from seed data: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("could not read catalog slot '{key}', starting from seed data: {e}");
                None
            }
        };

        let mut store = Self {
            slot,
            key,
            tracks: Vec::new(),
        };

        match persisted {
            Some(tracks) => store.tracks = tracks,
            None => {
                store.tracks = seed_tracks();
                if let Err(e) = store.save() {
                    warn!("could not persist seed catalog: {e}");
                }
            }
        }
        store
    }

    pub fn list(&self) -> &[TrackRecord] {
        &self.tracks
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackRecord> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Validates the input, assigns a fresh id, appends and persists.
    pub fn add(&mut self, new: NewTrack) -> Result<TrackRecord, CatalogError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }
        let audio = new.audio.as_ref().ok_or(ValidationError::MissingAudio)?;

        let audio_url = locator_for(audio)?;
        let mp3_url = locator_for(new.download.as_ref().unwrap_or(audio))?;
        let document_url = new.document.as_ref().map(locator_for).transpose()?;

        let id = TrackId::next_after(self.tracks.iter().map(|t| &t.id))
            .ok_or(CatalogError::IdsExhausted)?;
        let record = TrackRecord {
            id,
            title: title.to_string(),
            artist: new.artist.trim().to_string(),
            audio_url,
            mp3_url,
            document_url,
        };

        self.tracks.push(record.clone());
        if let Err(e) = self.save() {
            self.tracks.pop();
            return Err(e.into());
        }

        info!("added track {} \"{}\"", record.id, record.title);
        Ok(record)
    }

    /// Removes the first track with `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: TrackId) -> Result<Option<TrackRecord>, CatalogError> {
        let Some(index) = self.tracks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };

        let removed = self.tracks.remove(index);
        if let Err(e) = self.save() {
            self.tracks.insert(index, removed);
            return Err(e.into());
        }

        info!("removed track {} \"{}\"", removed.id, removed.title);
        Ok(Some(removed))
    }

    /// Like [`Self::remove`], guarded by an explicit confirmation.
    pub fn remove_confirmed(
        &mut self,
        id: TrackId,
        confirmation: &mut dyn Confirmation,
    ) -> Result<Removal, CatalogError> {
        let Some(track) = self.get(id) else {
            return Ok(Removal::NotFound);
        };
        if !confirmation.confirm_delete(track) {
            return Ok(Removal::Declined);
        }
        Ok(match self.remove(id)? {
            Some(track) => Removal::Removed(track),
            None => Removal::NotFound,
        })
    }

    /// Tracks whose title or displayed artist contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<&TrackRecord> {
        let term = term.trim().to_lowercase();
        self.tracks
            .iter()
            .filter(|t| {
                term.is_empty()
                    || t.title.to_lowercase().contains(&term)
                    || t.display_artist().to_lowercase().contains(&term)
            })
            .collect()
    }

    fn save(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.tracks)?;
        self.slot.write(&self.key, &json)
    }
}

/// Produces a fresh playable locator for a picked resource.
fn locator_for(source: &MediaSource) -> Result<String, ValidationError> {
    match source {
        MediaSource::File(path) => {
            let unreadable = || ValidationError::UnreadableFile(path.clone());
            let canonical = std::fs::canonicalize(path).map_err(|_| unreadable())?;
            if !canonical.is_file() {
                return Err(unreadable());
            }
            Url::from_file_path(&canonical)
                .map(String::from)
                .map_err(|_| unreadable())
        }
        MediaSource::Url(raw) => Url::parse(raw.trim())
            .map(String::from)
            .map_err(|_| ValidationError::InvalidUrl(raw.clone())),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, fs};

    use rusqlite::Connection;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        catalog::confirm::AssumeYes,
        storage::{schema, slot::SqliteSlot},
    };

    const KEY: &str = "songs";

    fn setup_slot() -> SqliteSlot {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        SqliteSlot::new(conn)
    }

    fn setup_store() -> CatalogStore<SqliteSlot> {
        CatalogStore::load(setup_slot(), KEY)
    }

    fn blob(name: &str) -> Option<MediaSource> {
        Some(MediaSource::Url(format!("blob:http://localhost/{name}")))
    }

    fn valid_track(title: &str) -> NewTrack {
        NewTrack {
            title: title.to_string(),
            audio: blob(title),
            ..Default::default()
        }
    }

    /// Reopens the same slot, as a page reload would.
    fn reload(store: CatalogStore<SqliteSlot>) -> CatalogStore<SqliteSlot> {
        CatalogStore::load(store.slot, KEY)
    }

    #[test]
    fn load_empty_slot_seeds_and_persists() -> anyhow::Result<()> {
        let store = setup_store();
        assert_eq!(store.list(), seed_tracks().as_slice());

        let persisted = store.slot.read(KEY)?.expect("seed was persisted");
        let parsed: Vec<TrackRecord> = serde_json::from_str(&persisted)?;
        assert_eq!(parsed, seed_tracks());
        Ok(())
    }

    #[test]
    fn load_corrupt_slot_falls_back_to_seed() -> anyhow::Result<()> {
        let mut slot = setup_slot();
        slot.write(KEY, "{ not json")?;

        let store = CatalogStore::load(slot, KEY);
        assert_eq!(store.list(), seed_tracks().as_slice());
        Ok(())
    }

    #[test]
    fn load_reads_persisted_list_in_camel_case() -> anyhow::Result<()> {
        let mut slot = setup_slot();
        slot.write(
            KEY,
            r#"[{"id":7,"title":"Mine","artist":"","audioUrl":"a","mp3Url":"b","documentUrl":null}]"#,
        )?;

        let store = CatalogStore::load(slot, KEY);
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].id, TrackId(7));
        assert_eq!(store.list()[0].mp3_url, "b");
        assert_eq!(store.list()[0].document_url, None);
        Ok(())
    }

    #[test]
    fn add_appends_with_unique_id() -> anyhow::Result<()> {
        let mut store = setup_store();
        let before: HashSet<_> = store.list().iter().map(|t| t.id).collect();

        let record = store.add(NewTrack {
            title: "Test".to_string(),
            artist: String::new(),
            audio: blob("test"),
            download: None,
            document: None,
        })?;

        assert_eq!(store.list().len(), before.len() + 1);
        assert!(!before.contains(&record.id));
        assert_eq!(store.list().last(), Some(&record));
        assert_eq!(record.audio_url, "blob:http://localhost/test");
        assert_eq!(record.mp3_url, record.audio_url);
        assert_eq!(record.document_url, None);
        Ok(())
    }

    #[test]
    fn add_fails_once_ids_are_exhausted() -> anyhow::Result<()> {
        let mut slot = setup_slot();
        slot.write(
            KEY,
            &format!(r#"[{{"id":{},"title":"Last","audioUrl":"a","mp3Url":"a"}}]"#, i64::MAX),
        )?;
        let mut store = CatalogStore::load(slot, KEY);
        let before = store.list().to_vec();

        let err = store.add(valid_track("One too many")).unwrap_err();
        assert!(matches!(err, CatalogError::IdsExhausted));
        assert_eq!(store.list(), before.as_slice());

        let store = reload(store);
        assert_eq!(store.list(), before.as_slice());
        Ok(())
    }

    #[test]
    fn rapid_adds_get_distinct_ids() -> anyhow::Result<()> {
        let mut store = setup_store();
        let ids = (0..20)
            .map(|i| store.add(valid_track(&format!("song {i}"))).map(|t| t.id))
            .collect::<Result<HashSet<_>, _>>()?;
        assert_eq!(ids.len(), 20);
        Ok(())
    }

    #[test]
    fn add_trims_title_and_artist() -> anyhow::Result<()> {
        let mut store = setup_store();
        let record = store.add(NewTrack {
            title: "  Spaced  ".to_string(),
            artist: " Someone ".to_string(),
            audio: blob("x"),
            ..Default::default()
        })?;
        assert_eq!(record.title, "Spaced");
        assert_eq!(record.artist, "Someone");
        Ok(())
    }

    #[test]
    fn add_rejects_missing_title_without_mutation() {
        let mut store = setup_store();
        let before = store.list().to_vec();

        let err = store
            .add(NewTrack {
                title: "   ".to_string(),
                audio: blob("x"),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::MissingTitle)
        ));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn add_rejects_missing_audio_without_mutation() {
        let mut store = setup_store();
        let before = store.list().to_vec();

        let err = store
            .add(NewTrack {
                title: "No audio".to_string(),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::MissingAudio)
        ));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn add_rejects_missing_file() {
        let mut store = setup_store();
        let err = store
            .add(NewTrack {
                title: "Ghost".to_string(),
                audio: Some(MediaSource::File("/no/such/file.mp3".into())),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::UnreadableFile(_))
        ));
    }

    #[test]
    fn add_local_files_yields_file_locators() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let audio = dir.path().join("song.mp3");
        let doc = dir.path().join("lyrics.pdf");
        fs::write(&audio, b"x")?;
        fs::write(&doc, b"%PDF")?;

        let mut store = setup_store();
        let record = store.add(NewTrack {
            title: "Local".to_string(),
            audio: Some(MediaSource::File(audio)),
            document: Some(MediaSource::File(doc)),
            ..Default::default()
        })?;

        assert!(record.audio_url.starts_with("file://"));
        assert!(record.audio_url.ends_with("song.mp3"));
        assert_eq!(record.mp3_url, record.audio_url);
        assert!(record.document_url.unwrap().ends_with("lyrics.pdf"));
        Ok(())
    }

    #[test]
    fn download_locator_can_differ_from_audio() -> anyhow::Result<()> {
        let mut store = setup_store();
        let record = store.add(NewTrack {
            title: "Two formats".to_string(),
            audio: blob("stream.ogg"),
            download: blob("download.mp3"),
            ..Default::default()
        })?;
        assert_ne!(record.audio_url, record.mp3_url);
        assert!(record.mp3_url.ends_with("download.mp3"));
        Ok(())
    }

    #[test]
    fn remove_missing_id_is_noop() -> anyhow::Result<()> {
        let mut store = setup_store();
        let before = store.list().to_vec();

        assert_eq!(store.remove(TrackId(999))?, None);
        assert_eq!(store.list(), before.as_slice());
        Ok(())
    }

    #[test]
    fn add_then_remove_restores_length_across_reload() -> anyhow::Result<()> {
        let mut store = setup_store();
        let initial = store.list().len();

        let record = store.add(valid_track("Test"))?;
        let mut store = reload(store);
        assert_eq!(store.list().len(), initial + 1);

        assert_eq!(store.remove(record.id)?, Some(record));
        let store = reload(store);
        assert_eq!(store.list().len(), initial);
        Ok(())
    }

    #[test]
    fn order_is_stable_across_reloads() -> anyhow::Result<()> {
        let mut store = setup_store();
        store.add(valid_track("c"))?;
        store.add(valid_track("a"))?;
        store.add(valid_track("b"))?;
        let before = store.list().to_vec();

        let store = reload(store);
        assert_eq!(store.list(), before.as_slice());
        Ok(())
    }

    #[test]
    fn serialized_list_round_trips() -> anyhow::Result<()> {
        let mut store = setup_store();
        store.add(NewTrack {
            title: "With doc".to_string(),
            audio: blob("a"),
            document: blob("d"),
            ..Default::default()
        })?;

        let json = serde_json::to_string(store.list())?;
        let back: Vec<TrackRecord> = serde_json::from_str(&json)?;
        assert_eq!(back, store.list());
        Ok(())
    }

    #[test]
    fn remove_confirmed_respects_decline() -> anyhow::Result<()> {
        let mut store = setup_store();
        let before = store.list().to_vec();

        struct Decline;
        impl Confirmation for Decline {
            fn confirm_delete(&mut self, _track: &TrackRecord) -> bool {
                false
            }
        }

        assert_eq!(
            store.remove_confirmed(TrackId(1), &mut Decline)?,
            Removal::Declined
        );
        assert_eq!(store.list(), before.as_slice());

        assert_eq!(
            store.remove_confirmed(TrackId(999), &mut AssumeYes)?,
            Removal::NotFound
        );

        let removed = store.remove_confirmed(TrackId(1), &mut AssumeYes)?;
        assert!(matches!(removed, Removal::Removed(t) if t.id == TrackId(1)));
        assert_eq!(store.list().len(), before.len() - 1);
        Ok(())
    }

    #[test]
    fn search_matches_title_or_displayed_artist() -> anyhow::Result<()> {
        let mut store = setup_store();
        store.add(valid_track("Anonymous Tune"))?;

        let titles = |hits: Vec<&TrackRecord>| {
            hits.into_iter()
                .map(|t| t.title.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(titles(store.search("perfect")), vec!["Perfect Cover"]);
        assert_eq!(store.search("LAKI").len(), 2);
        assert_eq!(titles(store.search("unknown")), vec!["Anonymous Tune"]);
        assert_eq!(store.search("").len(), 3);
        assert!(store.search("zzz").is_empty());
        Ok(())
    }
}
