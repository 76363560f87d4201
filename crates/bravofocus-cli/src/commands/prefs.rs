use bravofocus_core::{Chime, Config, Database, Preferences, SoundChoice, Theme};
use clap::Subcommand;
use serde_json::json;

use super::{audio_player, print_json};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print theme and sound
    Get,
    /// Set the colour theme (blue, green, purple)
    Theme { value: String },
    /// Set the completion sound (basic, ding, success, victory)
    Sound { value: String },
    /// Play the selected completion sound once
    TestSound,
}

pub fn run(action: PrefsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let mut prefs = Preferences::load(&db);

    match action {
        PrefsAction::Get => {
            print_json(&json!({
                "theme": prefs.theme,
                "sound": prefs.sound,
                "sound_label": prefs.sound.label(),
                "themes": Theme::ALL,
                "sounds": SoundChoice::ALL,
            }))?;
        }
        PrefsAction::Theme { value } => {
            prefs.set_theme(&mut db, value.parse()?)?;
            println!("ok");
        }
        PrefsAction::Sound { value } => {
            prefs.set_sound(&mut db, value.parse()?)?;
            println!("ok");
        }
        PrefsAction::TestSound => {
            let mut chime = Chime::new(audio_player(config), |_: &str| {});
            let played = chime.test(&prefs.sound.resolve(&config.asset_dir()));
            print_json(&json!({ "sound": prefs.sound, "played": played }))?;
        }
    }
    Ok(())
}
