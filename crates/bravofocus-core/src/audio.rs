//! Completion chime.
//!
//! Playback is best effort: [`Chime::ring`] never fails, it falls back to a
//! plain notification when the sound cannot be played.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

/// Shown when the chime could not be played.
pub const COMPLETION_MESSAGE: &str = "Timer completed!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundChoice {
    #[default]
    Basic,
    Ding,
    Success,
    Victory,
}

impl SoundChoice {
    pub const ALL: [SoundChoice; 4] = [
        SoundChoice::Basic,
        SoundChoice::Ding,
        SoundChoice::Success,
        SoundChoice::Victory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundChoice::Basic => "basic",
            SoundChoice::Ding => "ding",
            SoundChoice::Success => "success",
            SoundChoice::Victory => "victory",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SoundChoice::Basic => "Basic",
            SoundChoice::Ding => "Ding",
            SoundChoice::Success => "Success",
            SoundChoice::Victory => "Victory",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SoundChoice::Basic => "alarm.mp3",
            SoundChoice::Ding => "ding.mp3",
            SoundChoice::Success => "success.mp3",
            SoundChoice::Victory => "victory.mp3",
        }
    }

    pub fn resolve(self, asset_dir: &Path) -> SoundAsset {
        SoundAsset {
            choice: self,
            path: asset_dir.join(self.file_name()),
        }
    }
}

impl std::fmt::Display for SoundChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundChoice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundChoice::ALL
            .into_iter()
            .find(|sound| sound.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "sound".into(),
                message: format!("expected one of basic, ding, success, victory; got '{s}'"),
            })
    }
}

/// A playable sound file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundAsset {
    pub choice: SoundChoice,
    pub path: PathBuf,
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Sound file not found: {0}")]
    MissingAsset(PathBuf),

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio playback is disabled")]
    Disabled,
}

pub trait AudioPlayer {
    fn play(&mut self, asset: &SoundAsset) -> Result<(), PlaybackError>;
}

/// Plays sounds through an external program (`afplay`, `paplay`, ...).
///
/// The player runs in the background and is reaped by a helper thread; only
/// a failure to launch it is reported.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&mut self, asset: &SoundAsset) -> Result<(), PlaybackError> {
        if !asset.path.is_file() {
            return Err(PlaybackError::MissingAsset(asset.path.clone()));
        }
        let mut child = Command::new(&self.program)
            .arg(&asset.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                tracing::debug!(error = %e, "failed to reap sound player");
            }
        });
        Ok(())
    }
}

/// Player used when audio is turned off in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutedPlayer;

impl AudioPlayer for MutedPlayer {
    fn play(&mut self, _asset: &SoundAsset) -> Result<(), PlaybackError> {
        Err(PlaybackError::Disabled)
    }
}

impl<A: AudioPlayer + ?Sized> AudioPlayer for Box<A> {
    fn play(&mut self, asset: &SoundAsset) -> Result<(), PlaybackError> {
        (**self).play(asset)
    }
}

/// Non-blocking, user-visible message.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

impl<F: FnMut(&str)> Notifier for F {
    fn notify(&mut self, message: &str) {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChimeOutcome {
    Played,
    Notified,
}

pub struct Chime<A, N> {
    player: A,
    notifier: N,
}

impl<A: AudioPlayer, N: Notifier> Chime<A, N> {
    pub fn new(player: A, notifier: N) -> Self {
        Self { player, notifier }
    }

    /// Play the completion sound, or show [`COMPLETION_MESSAGE`] instead.
    pub fn ring(&mut self, asset: &SoundAsset) -> ChimeOutcome {
        match self.player.play(asset) {
            Ok(()) => ChimeOutcome::Played,
            Err(e) => {
                tracing::warn!(error = %e, sound = %asset.choice, "completion sound failed");
                self.notifier.notify(COMPLETION_MESSAGE);
                ChimeOutcome::Notified
            }
        }
    }

    /// Preview a sound. Failures are only logged.
    pub fn test(&mut self, asset: &SoundAsset) -> bool {
        match self.player.play(asset) {
            Ok(()) => true,
            Err(e) => {
                tracing::info!(error = %e, sound = %asset.choice, "sound test failed");
                false
            }
        }
    }
}
