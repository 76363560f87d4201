pub mod config;
pub mod prefs;
pub mod progress;
pub mod timer;

use bravofocus_core::{AudioPlayer, CommandPlayer, Config, MutedPlayer};

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The configured sound player, or a muted one when audio is off.
pub(crate) fn audio_player(config: &Config) -> Box<dyn AudioPlayer> {
    if config.audio.enabled {
        Box::new(CommandPlayer::new(config.audio.player.as_str()))
    } else {
        Box::new(MutedPlayer)
    }
}
