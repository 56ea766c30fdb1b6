//! Catalog and playback wired together the way the page uses them.

use crate::{
    catalog::{
        confirm::Confirmation,
        error::CatalogError,
        store::{CatalogStore, Removal},
    },
    domain::{
        id::TrackId,
        track::{NewTrack, TrackRecord},
    },
    playback::{
        controller::{PlaybackController, WidgetState, WidgetView},
        error::PlaybackError,
        rate::PlaybackRate,
        session::SessionAudio,
    },
    storage::slot::KeyValueSlot,
};

pub struct Deck<S: KeyValueSlot> {
    catalog: CatalogStore<S>,
    playback: PlaybackController<SessionAudio>,
}

impl<S: KeyValueSlot> Deck<S> {
    pub fn new(catalog: CatalogStore<S>) -> Self {
        let mut deck = Self {
            catalog,
            playback: PlaybackController::new(),
        };
        deck.render();
        deck
    }

    /// One widget per listed track.
    fn render(&mut self) {
        self.playback
            .sync(self.catalog.list(), |t| SessionAudio::new(t.audio_url.clone()));
    }

    pub fn catalog(&self) -> &CatalogStore<S> {
        &self.catalog
    }

    pub fn playback(&self) -> &PlaybackController<SessionAudio> {
        &self.playback
    }

    pub fn add(&mut self, new: NewTrack) -> Result<TrackRecord, CatalogError> {
        let record = self.catalog.add(new)?;
        self.render();
        Ok(record)
    }

    pub fn remove(
        &mut self,
        id: TrackId,
        confirmation: &mut dyn Confirmation,
    ) -> Result<Removal, CatalogError> {
        let removal = self.catalog.remove_confirmed(id, confirmation)?;
        if matches!(removal, Removal::Removed(_)) {
            self.render();
        }
        Ok(removal)
    }

    pub fn toggle_play(&mut self, id: TrackId) -> Result<WidgetState, PlaybackError> {
        self.playback.toggle_play(id)
    }

    pub fn ended(&mut self, id: TrackId) -> Result<(), PlaybackError> {
        self.playback.on_ended(id)
    }

    pub fn set_rate(&mut self, id: TrackId, rate: PlaybackRate) -> Result<(), PlaybackError> {
        self.playback.set_rate(id, rate)
    }

    pub fn widgets(&self) -> Vec<WidgetView> {
        self.playback.views()
    }
}
