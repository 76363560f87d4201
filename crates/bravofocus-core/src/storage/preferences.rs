//! User preferences kept in the key/value store.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{keys, read_parsed, KeyValueStore};
use crate::audio::SoundChoice;
use crate::error::{StorageError, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Blue,
    Green,
    Purple,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Blue, Theme::Green, Theme::Purple];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Blue => "blue",
            Theme::Green => "green",
            Theme::Purple => "purple",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "theme".into(),
                message: format!("expected one of blue, green, purple; got '{s}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub sound: SoundChoice,
}

impl Preferences {
    /// Absent or unrecognised values fall back to the defaults.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            theme: read_parsed(store, keys::THEME).unwrap_or_default(),
            sound: read_parsed(store, keys::SOUND).unwrap_or_default(),
        }
    }

    pub fn set_theme<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        theme: Theme,
    ) -> Result<(), StorageError> {
        store.set(keys::THEME, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn set_sound<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        sound: SoundChoice,
    ) -> Result<(), StorageError> {
        store.set(keys::SOUND, sound.as_str())?;
        self.sound = sound;
        Ok(())
    }
}
