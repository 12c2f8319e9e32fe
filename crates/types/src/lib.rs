//! Shared type definitions for the geofield workspace.
//!
//! Holds the configuration shape, the provider's place records, and the
//! message/effect vocabulary the autocomplete field speaks with its host.

use std::time::Duration;

use serde::Serialize;

pub mod options;
pub mod place;

pub use options::{AutocompleteOptions, ComponentRestrictions, LatLng, LatLngBounds, OptionsError, SUPPORTED_PLACE_TYPES};
pub use place::{
    AddressComponent, DetailsResponse, LookupStatus, PlaceDetails, Prediction, PredictionQuery, PredictionResponse, ResolvedPlace, SelectedPlace,
};

/// Validity key reported to the host's validation surface.
pub const INVALID_ADDRESS_KEY: &str = "invalidAddress";

/// Token identifying one resolver invocation. Later invocations carry larger values.
pub type Generation = u64;

/// Messages that drive an autocomplete field.
///
/// Host events (keystrokes, programmatic assignment, focus, widget
/// selections) and completions of previously requested effects all enter the
/// field through this enum.
#[derive(Debug, Clone)]
pub enum Msg {
    /// New options supplied by the host. `None` clears every filter.
    OptionsChanged(Option<AutocompleteOptions>),
    /// The field's `required` attribute changed; read on the next options apply.
    RequiredAttributeChanged(bool),
    /// The bound value was set programmatically.
    ModelAssigned(Option<String>),
    /// The user edited the text.
    InputChanged(String),
    /// The provider widget rewrote the displayed text without touching the model.
    DisplayRewritten(String),
    /// The provider widget reported a selection; the field reads it from the widget.
    PlaceChanged,
    /// Completion of [`Effect::FetchPredictions`].
    PredictionsReceived { generation: Generation, response: PredictionResponse },
    /// Completion of [`Effect::FetchDetails`].
    DetailsReceived { generation: Generation, response: DetailsResponse },
    /// The field lost focus.
    FocusLost,
    /// Completion of [`Effect::ScheduleRevert`].
    RevertTimerElapsed { token: u64 },
    /// The field is being torn down.
    Detach,
}

/// Side effects requested by the field, and notifications of its outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Issue a "get predictions" request and answer with [`Msg::PredictionsReceived`].
    FetchPredictions { generation: Generation, query: PredictionQuery },
    /// Issue a "get details" request and answer with [`Msg::DetailsReceived`].
    FetchDetails { generation: Generation, place_id: String },
    /// Answer with [`Msg::RevertTimerElapsed`] after `delay`.
    ScheduleRevert {
        token: u64,
        #[serde(with = "duration_millis")]
        delay: Duration,
    },
    /// The bound value was written by a commit path.
    ModelCommitted { text: String },
    /// The details output changed.
    DetailsChanged { details: Option<ResolvedPlace> },
    /// The `invalidAddress` flag flipped.
    ValidityChanged { valid: bool },
    /// The displayed text was rewritten by the focus-revert guard.
    DisplayReverted { text: String },
    /// A resolver invocation ran its completion.
    ResolutionCompleted { generation: Generation },
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(delay.as_millis() as u64)
    }
}
