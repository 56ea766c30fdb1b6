use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{domain::id::TrackId, domain::track::TrackRecord};

use super::{error::PlaybackError, rate::PlaybackRate};

/// What a track widget exposes to the controller.
pub trait AudioHandle {
    /// Begins or resumes playback at the current rate.
    fn start(&mut self) -> Result<(), PlaybackError>;

    /// Pauses playback. Must be idempotent.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    /// Applies to the running playback and to any later start.
    fn set_rate(&mut self, rate: PlaybackRate);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    Stopped,
    Playing,
}

/// Play/pause button face shown on a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayIndicator {
    Play,
    Pause,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetView {
    pub id: TrackId,
    pub state: WidgetState,
    pub indicator: PlayIndicator,
    pub rate: PlaybackRate,
}

struct Widget<H> {
    handle: H,
    indicator: PlayIndicator,
    rate: PlaybackRate,
}

impl<H: AudioHandle> Widget<H> {
    fn halt(&mut self) {
        self.handle.stop();
        self.indicator = PlayIndicator::Play;
    }

    fn state(&self) -> WidgetState {
        if self.handle.is_playing() {
            WidgetState::Playing
        } else {
            WidgetState::Stopped
        }
    }
}

/// Owns every widget's audio handle and keeps at most one of them playing.
pub struct PlaybackController<H> {
    widgets: BTreeMap<TrackId, Widget<H>>,
    current: Option<TrackId>,
}

impl<H> Default for PlaybackController<H> {
    fn default() -> Self {
        Self {
            widgets: BTreeMap::new(),
            current: None,
        }
    }
}

impl<H: AudioHandle> PlaybackController<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a widget. An already registered widget keeps its handle.
    pub fn attach(&mut self, id: TrackId, handle: H) -> bool {
        if self.widgets.contains_key(&id) {
            return false;
        }
        self.widgets.insert(
            id,
            Widget {
                handle,
                indicator: PlayIndicator::Play,
                rate: PlaybackRate::default(),
            },
        );
        true
    }

    /// Drops a widget, stopping it first.
    pub fn detach(&mut self, id: TrackId) {
        if let Some(mut widget) = self.widgets.remove(&id) {
            widget.halt();
        }
        if self.current == Some(id) {
            self.current = None;
        }
    }

    /// Makes the widget set match `tracks`: new tracks get a handle from
    /// `make_handle`, widgets of tracks no longer listed are detached.
    pub fn sync<'a>(
        &mut self,
        tracks: impl IntoIterator<Item = &'a TrackRecord>,
        mut make_handle: impl FnMut(&TrackRecord) -> H,
    ) {
        let mut listed = Vec::new();
        for track in tracks {
            listed.push(track.id);
            if !self.widgets.contains_key(&track.id) {
                self.attach(track.id, make_handle(track));
            }
        }

        let stale = self
            .widgets
            .keys()
            .filter(|id| !listed.contains(id))
            .copied()
            .collect::<Vec<_>>();
        for id in stale {
            debug!("detaching widget of removed track {id}");
            self.detach(id);
        }
    }

    /// Play/pause for one widget.
    ///
    /// Any other widget that is playing is stopped before the target is
    /// looked at, so two widgets never play at once.
    pub fn toggle_play(&mut self, id: TrackId) -> Result<WidgetState, PlaybackError> {
        if !self.widgets.contains_key(&id) {
            return Err(PlaybackError::UnknownWidget(id));
        }

        if let Some(previous) = self.current.filter(|c| *c != id) {
            if let Some(widget) = self.widgets.get_mut(&previous) {
                widget.halt();
            }
            self.current = None;
        }
        for (other, widget) in self.widgets.iter_mut() {
            if *other != id && widget.handle.is_playing() {
                warn!("widget {other} was playing without being current, stopping it");
                widget.halt();
            }
        }

        let widget = self
            .widgets
            .get_mut(&id)
            .ok_or(PlaybackError::UnknownWidget(id))?;

        if widget.handle.is_playing() {
            widget.halt();
            self.current = None;
            return Ok(WidgetState::Stopped);
        }

        match widget.handle.start() {
            Ok(()) => {
                widget.indicator = PlayIndicator::Pause;
                self.current = Some(id);
                Ok(WidgetState::Playing)
            }
            Err(e) => {
                widget.indicator = PlayIndicator::Play;
                self.current = None;
                Err(e)
            }
        }
    }

    /// The media of `id` reached its end. The current pointer is left alone.
    pub fn on_ended(&mut self, id: TrackId) -> Result<(), PlaybackError> {
        let widget = self
            .widgets
            .get_mut(&id)
            .ok_or(PlaybackError::UnknownWidget(id))?;
        widget.halt();
        Ok(())
    }

    pub fn set_rate(&mut self, id: TrackId, rate: PlaybackRate) -> Result<(), PlaybackError> {
        let widget = self
            .widgets
            .get_mut(&id)
            .ok_or(PlaybackError::UnknownWidget(id))?;
        widget.rate = rate;
        widget.handle.set_rate(rate);
        Ok(())
    }

    /// Track of the last started widget, if it was not stopped through the controller.
    pub fn current(&self) -> Option<TrackId> {
        self.current
    }

    pub fn playing(&self) -> Vec<TrackId> {
        self.widgets
            .iter()
            .filter(|(_, w)| w.handle.is_playing())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn view(&self, id: TrackId) -> Option<WidgetView> {
        self.widgets.get(&id).map(|w| WidgetView {
            id,
            state: w.state(),
            indicator: w.indicator,
            rate: w.rate,
        })
    }

    pub fn views(&self) -> Vec<WidgetView> {
        self.widgets
            .keys()
            .filter_map(|id| self.view(*id))
            .collect()
    }

    pub fn handle(&self, id: TrackId) -> Option<&H> {
        self.widgets.get(&id).map(|w| &w.handle)
    }
}
