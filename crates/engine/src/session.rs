//! Session shell: runs a field's effects against a provider.
//!
//! The field itself is a pure state machine. A [`FieldSession`] turns its
//! request effects into Tokio tasks, collects them in a `FuturesUnordered`,
//! and feeds each completion back into the field in arrival order. Staleness
//! is decided by the field, not here.
//!
//! All methods must be called from within a Tokio runtime.

use std::{sync::Arc, time::Duration};

use futures_util::{StreamExt, stream::FuturesUnordered};
use geofield_types::{DetailsResponse, Effect, LookupStatus, Msg, PredictionResponse, SelectedPlace};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    field::{AutocompleteField, FieldState},
    provider::PlacesService,
    widget::{HeadlessWidget, PlaceWidget},
};

pub struct FieldSession<W: PlaceWidget> {
    field: AutocompleteField<W>,
    places: Arc<dyn PlacesService>,
    pending: FuturesUnordered<JoinHandle<Msg>>,
    trace: Option<Vec<Effect>>,
}

impl<W: PlaceWidget> FieldSession<W> {
    pub fn new(field: AutocompleteField<W>, places: Arc<dyn PlacesService>) -> Self {
        Self {
            field,
            places,
            pending: FuturesUnordered::new(),
            trace: None,
        }
    }

    /// Record every effect the field produces, for inspection through [`trace`](Self::trace).
    pub fn with_trace(mut self) -> Self {
        self.trace.get_or_insert_with(Vec::new);
        self
    }

    pub fn field(&self) -> &AutocompleteField<W> {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut AutocompleteField<W> {
        &mut self.field
    }

    pub fn state(&self) -> FieldState {
        self.field.state()
    }

    /// Effects recorded since tracing was enabled or last drained. Empty when tracing is off.
    pub fn trace(&self) -> &[Effect] {
        self.trace.as_deref().unwrap_or_default()
    }

    /// Drain the recorded effects, keeping tracing enabled.
    pub fn take_trace(&mut self) -> Vec<Effect> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hand a message to the field and start any work it requests.
    pub fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let effects = self.field.handle_message(msg);
        for effect in &effects {
            self.spawn_effect(effect);
        }
        if let Some(trace) = &mut self.trace {
            trace.extend(effects.iter().cloned());
        }
        effects
    }

    fn spawn_effect(&mut self, effect: &Effect) {
        match effect {
            Effect::FetchPredictions { generation, query } => {
                let places = Arc::clone(&self.places);
                let generation = *generation;
                let query = query.clone();
                self.pending.push(tokio::spawn(async move {
                    let response = places.get_place_predictions(&query).await.unwrap_or_else(|error| {
                        warn!(generation, %error, "predictions request failed");
                        PredictionResponse::empty(LookupStatus::UnknownError)
                    });
                    Msg::PredictionsReceived { generation, response }
                }));
            }
            Effect::FetchDetails { generation, place_id } => {
                let places = Arc::clone(&self.places);
                let generation = *generation;
                let place_id = place_id.clone();
                self.pending.push(tokio::spawn(async move {
                    let response = places.get_details(&place_id).await.unwrap_or_else(|error| {
                        warn!(generation, %error, "details request failed");
                        DetailsResponse {
                            status: LookupStatus::UnknownError,
                            result: None,
                        }
                    });
                    Msg::DetailsReceived { generation, response }
                }));
            }
            Effect::ScheduleRevert { token, delay } => {
                let token = *token;
                let delay = *delay;
                self.pending.push(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    Msg::RevertTimerElapsed { token }
                }));
            }
            _ => {}
        }
    }

    /// Wait for the next pending task and dispatch its result. `None` when nothing is pending.
    pub async fn step(&mut self) -> Option<Vec<Effect>> {
        match self.pending.next().await? {
            Ok(msg) => Some(self.dispatch(msg)),
            Err(error) => {
                debug!(%error, "pending task ended without a result");
                Some(Vec::new())
            }
        }
    }

    /// Drain all pending work, including work started by completions.
    pub async fn settle(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Some(step_effects) = self.step().await {
            effects.extend(step_effects);
        }
        effects
    }

    /// Dispatch completions that arrive within `duration`, then return.
    pub async fn run_for(&mut self, duration: Duration) -> Vec<Effect> {
        let deadline = tokio::time::Instant::now() + duration;
        let mut effects = Vec::new();
        loop {
            if self.pending.is_empty() {
                tokio::time::sleep_until(deadline).await;
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                Some(step_effects) = self.step() => effects.extend(step_effects),
            }
        }
        effects
    }

    /// Abort in-flight requests and timers, then detach the field.
    pub fn detach(&mut self) -> Vec<Effect> {
        let aborted = self.pending.len();
        for handle in self.pending.iter() {
            handle.abort();
        }
        self.pending = FuturesUnordered::new();
        debug!(aborted, "session detached");
        self.dispatch(Msg::Detach)
    }
}

impl FieldSession<HeadlessWidget> {
    /// Simulate picking `place` from the dropdown: the widget rewrites the input to `display` first.
    pub fn select_place(&mut self, place: SelectedPlace, display: impl Into<String>) -> Vec<Effect> {
        let mut effects = self.dispatch(Msg::DisplayRewritten(display.into()));
        self.field.widget_mut().highlight(place);
        effects.extend(self.dispatch(Msg::PlaceChanged));
        effects
    }

    /// Simulate pressing Enter with `text` in the input and no dropdown entry highlighted.
    pub fn press_enter(&mut self, text: impl Into<String>) -> Vec<Effect> {
        let text = text.into();
        let mut effects = self.dispatch(Msg::DisplayRewritten(text.clone()));
        self.field.widget_mut().highlight(SelectedPlace::from_name(text));
        effects.extend(self.dispatch(Msg::PlaceChanged));
        effects
    }
}
