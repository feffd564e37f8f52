//! Audio playback capability and the action grammar bound to it.
//!
//! Media decoding lives behind the [`AudioBackend`] trait; this module owns
//! everything above it: the [`Soundboard`] track registry, the
//! [`PlaybackAction`] grammar that gives meaning to the mapping table's
//! opaque action strings, and [`PlaybackHandler`], the
//! [`ActionHandler`](crate::dispatch::ActionHandler) that drives playback
//! from the dispatch loop.
//!
//! At most one track plays at a time; starting a track stops whatever is
//! currently busy first.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::dispatch::ActionHandler;

/// Handler-level playback failures. Logged by the consumer, never fatal to
/// the dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("track file {path} does not exist")]
    MissingFile { path: PathBuf },

    #[error("unknown track id {id}")]
    UnknownTrack { id: String },

    #[error("unrecognized action string {action:?}")]
    UnknownAction { action: String },
}

/// The playback capability consumed by the [`Soundboard`].
///
/// Implementations own decoding and output; they are expected to be cheap
/// to call from the listener thread (start playback, do not block on it).
pub trait AudioBackend: Send {
    fn play(&mut self, path: &Path);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    /// Whether the backend is actively producing output right now.
    fn is_busy(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum PlayState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Backend that tracks playback state without producing sound.
///
/// The test and demo implementation; swap in a real backend for output.
#[derive(Debug, Default)]
pub struct NullBackend {
    state: PlayState,
}

impl AudioBackend for NullBackend {
    fn play(&mut self, path: &Path) {
        log::debug!("null backend: play {}", path.display());
        self.state = PlayState::Playing;
    }

    fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == PlayState::Paused {
            self.state = PlayState::Playing;
        }
    }

    fn stop(&mut self) {
        self.state = PlayState::Idle;
    }

    fn is_busy(&self) -> bool {
        self.state == PlayState::Playing
    }
}

/// Track registry over an [`AudioBackend`].
///
/// Tracks are registered by id and kept in insertion order for display.
pub struct Soundboard {
    backend: Box<dyn AudioBackend>,
    tracks: IndexMap<String, PathBuf>,
    current: Option<String>,
}

impl Soundboard {
    pub fn new(backend: impl AudioBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            tracks: IndexMap::new(),
            current: None,
        }
    }

    /// Register (or re-register) a track file under `id`.
    ///
    /// The file must exist at registration time so a bad path is caught
    /// when the user loads it, not when a key fires.
    pub fn load_track(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<(), AudioError> {
        let path = path.into();
        if !path.exists() {
            return Err(AudioError::MissingFile { path });
        }
        log::info!("track loaded: {id} -> {}", path.display());
        self.tracks.insert(id.to_string(), path);
        Ok(())
    }

    /// Start the given track, stopping any currently busy playback first.
    pub fn play_track(&mut self, id: &str) -> Result<(), AudioError> {
        let path = self
            .tracks
            .get(id)
            .cloned()
            .ok_or_else(|| AudioError::UnknownTrack { id: id.to_string() })?;

        if self.backend.is_busy() {
            self.backend.stop();
        }
        self.backend.play(&path);
        self.current = Some(id.to_string());
        log::info!("playing track {id}");
        Ok(())
    }

    /// Pause whatever is currently busy; no-op otherwise.
    pub fn pause_track(&mut self) {
        if self.backend.is_busy() {
            self.backend.pause();
            log::info!("track paused");
        }
    }

    /// Resume paused playback; no-op when nothing is paused.
    pub fn resume_track(&mut self) {
        self.backend.resume();
    }

    /// Stop playback entirely and forget the current track.
    pub fn stop_all(&mut self) {
        self.backend.stop();
        self.current = None;
        log::info!("all tracks stopped");
    }

    /// True when `id` is the current track and the backend is busy.
    pub fn is_playing(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id) && self.backend.is_busy()
    }

    /// Display projection of the registry, in insertion order.
    pub fn tracks(&self) -> Vec<(String, PathBuf)> {
        self.tracks
            .iter()
            .map(|(id, path)| (id.clone(), path.clone()))
            .collect()
    }
}

/// Parsed form of the action strings this capability understands.
///
/// The grammar is the contract between mapping-table content and playback:
/// `play_track:<id>`, `pause`, `resume`, `stop_all`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackAction {
    Play(String),
    Pause,
    Resume,
    StopAll,
}

impl FromStr for PlaybackAction {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("play_track:") {
            if !id.is_empty() {
                return Ok(PlaybackAction::Play(id.to_string()));
            }
        }
        match s {
            "pause" => Ok(PlaybackAction::Pause),
            "resume" => Ok(PlaybackAction::Resume),
            "stop_all" => Ok(PlaybackAction::StopAll),
            _ => Err(AudioError::UnknownAction {
                action: s.to_string(),
            }),
        }
    }
}

/// Drives a [`Soundboard`] from resolved key events.
pub struct PlaybackHandler {
    board: Soundboard,
}

impl PlaybackHandler {
    pub fn new(board: Soundboard) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &Soundboard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Soundboard {
        &mut self.board
    }
}

impl ActionHandler for PlaybackHandler {
    fn on_action(&mut self, key: &str, action: &str) {
        let parsed = match action.parse::<PlaybackAction>() {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("key {key}: {e}");
                return;
            }
        };

        let result = match parsed {
            PlaybackAction::Play(id) => self.board.play_track(&id),
            PlaybackAction::Pause => {
                self.board.pause_track();
                Ok(())
            }
            PlaybackAction::Resume => {
                self.board.resume_track();
                Ok(())
            }
            PlaybackAction::StopAll => {
                self.board.stop_all();
                Ok(())
            }
        };

        if let Err(e) = result {
            log::error!("key {key}: {e}");
        }
    }
}
