//! Replay scripts: a recorded sequence of field events.
//!
//! ```yaml
//! steps:
//!   - { step: options, options: { strict: true, country: gb } }
//!   - { step: assign, text: "10 Down" }
//!   - { step: settle }
//!   - { step: blur }
//!   - { step: wait, ms: 150 }
//! ```

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use geofield_engine::{FieldSession, HeadlessWidget};
use geofield_types::{AutocompleteOptions, Msg, SelectedPlace};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Programmatic assignment of the bound value; `null` clears it.
    Assign {
        #[serde(default)]
        text: Option<String>,
    },
    /// The user edits the text.
    Type { text: String },
    /// Pick a dropdown entry. The widget shows `display`, falling back to the place's address or name.
    Select {
        place: SelectedPlace,
        #[serde(default)]
        display: Option<String>,
    },
    /// Press enter on free text.
    Enter { text: String },
    Blur,
    /// Deliver completions for `ms` milliseconds.
    Wait { ms: u64 },
    Options {
        #[serde(default)]
        options: Option<AutocompleteOptions>,
    },
    Required { value: bool },
    Settle,
    Detach,
}

pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let content = fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parse script {}", path.display()))
}

/// Run every step, then drain whatever is still pending.
pub async fn run_script(session: &mut FieldSession<HeadlessWidget>, script: &ReplayScript) {
    for (index, step) in script.steps.iter().enumerate() {
        debug!(index, ?step, "replaying step");
        match step.clone() {
            Step::Assign { text } => {
                session.dispatch(Msg::ModelAssigned(text));
            }
            Step::Type { text } => {
                session.dispatch(Msg::InputChanged(text));
            }
            Step::Select { place, display } => {
                let display = display
                    .or_else(|| place.formatted_address.clone())
                    .unwrap_or_else(|| place.name.clone());
                session.select_place(place, display);
            }
            Step::Enter { text } => {
                session.press_enter(text);
            }
            Step::Blur => {
                session.dispatch(Msg::FocusLost);
            }
            Step::Wait { ms } => {
                session.run_for(Duration::from_millis(ms)).await;
            }
            Step::Options { options } => {
                session.dispatch(Msg::OptionsChanged(options));
            }
            Step::Required { value } => {
                session.dispatch(Msg::RequiredAttributeChanged(value));
            }
            Step::Settle => {
                session.settle().await;
            }
            Step::Detach => {
                session.detach();
            }
        }
    }
    session.settle().await;
}
