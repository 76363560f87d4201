use bravofocus_core::{Database, ProgressionState, ProgressionTracker, RandomPicker};
use chrono::Local;
use clap::Subcommand;
use serde_json::json;

use super::print_json;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Experience, level and sticker collection
    Show,
    /// Minutes studied today
    Today,
    /// Minutes studied per day
    History,
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProgressAction::Show => {
            let state = ProgressionState::load(&db);
            print_json(&json!({
                "experience": state.experience(),
                "level": state.level(),
                "exp_into_level": state.exp_into_level(),
                "exp_to_next_level": state.exp_to_next_level(),
                "stickers": state.stickers(),
            }))?;
        }
        ProgressAction::Today => {
            let tracker = ProgressionTracker::new(db, RandomPicker);
            let today = Local::now().date_naive();
            print_json(&json!({
                "date": today,
                "minutes": tracker.study_minutes(today),
            }))?;
        }
        ProgressAction::History => {
            let tracker = ProgressionTracker::new(db, RandomPicker);
            let days: Vec<_> = tracker
                .study_history()?
                .into_iter()
                .map(|(date, minutes)| json!({ "date": date, "minutes": minutes }))
                .collect();
            print_json(&days)?;
        }
    }
    Ok(())
}
