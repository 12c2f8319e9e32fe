//! Prediction resolution.
//!
//! Turns raw text into a committed place in one or two provider round trips:
//! predictions first, then details for the top candidate in strict mode.
//! Each invocation gets a new generation; responses carrying an older
//! generation are dropped, so the latest request always wins regardless of
//! the order in which responses arrive.

use geofield_types::{DetailsResponse, Effect, Generation, LookupStatus, PlaceDetails, PredictionQuery, PredictionResponse};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingPredictions,
    AwaitingDetails,
}

#[derive(Debug, Clone)]
struct PendingResolution {
    generation: Generation,
    input: String,
    stage: Stage,
}

/// Outcome of feeding a provider response into the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverStep {
    /// Response belongs to a superseded or retired invocation.
    Stale,
    /// No candidates; the resolved place must be cleared.
    NoCandidates { generation: Generation },
    /// Strict mode: the details request to issue next.
    Continue(Effect),
    /// Non-strict mode: accept the top candidate's description.
    Accepted { generation: Generation, description: String },
    /// Strict mode: details lookup succeeded.
    Resolved { generation: Generation, details: PlaceDetails },
    /// Details lookup returned a non-OK status. Nothing is committed and no completion runs.
    Stalled { generation: Generation, status: LookupStatus },
}

#[derive(Debug, Default)]
pub struct PredictionResolver {
    latest: Generation,
    pending: Option<PendingResolution>,
}

impl PredictionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_generation(&self) -> Generation {
        self.latest
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a resolution for `input`, superseding any in-flight one.
    ///
    /// Returns the predictions request to issue, or `None` for empty input.
    pub fn begin(&mut self, input: &str) -> Option<Effect> {
        if input.is_empty() {
            return None;
        }
        self.latest += 1;
        let generation = self.latest;
        if let Some(previous) = self.pending.replace(PendingResolution {
            generation,
            input: input.to_string(),
            stage: Stage::AwaitingPredictions,
        }) {
            debug!(
                superseded = previous.generation,
                generation, "resolution superseded before completion"
            );
        }
        debug!(generation, input = %input, "resolution started");
        Some(Effect::FetchPredictions {
            generation,
            query: PredictionQuery::for_input(input),
        })
    }

    /// Drop the in-flight resolution; its responses will be treated as stale.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(generation = pending.generation, "resolution cancelled");
        }
    }

    fn take_if_current(&mut self, generation: Generation, stage: Stage) -> Option<PendingResolution> {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation && pending.stage == stage);
        if is_current {
            return self.pending.take();
        }
        debug!(generation, latest = self.latest, ?stage, "dropping stale provider response");
        None
    }

    /// Feed a predictions response. `strict` is read at arrival time.
    pub fn on_predictions(&mut self, generation: Generation, response: PredictionResponse, strict: bool) -> ResolverStep {
        let Some(mut pending) = self.take_if_current(generation, Stage::AwaitingPredictions) else {
            return ResolverStep::Stale;
        };
        let Some(top) = response.top() else {
            debug!(generation, input = %pending.input, status = %response.status, "no predictions");
            return ResolverStep::NoCandidates { generation };
        };

        if strict {
            let place_id = top.place_id.clone();
            debug!(generation, place_id = %place_id, "requesting place details");
            pending.stage = Stage::AwaitingDetails;
            self.pending = Some(pending);
            return ResolverStep::Continue(Effect::FetchDetails { generation, place_id });
        }

        ResolverStep::Accepted {
            generation,
            description: top.description.clone(),
        }
    }

    /// Feed a details response.
    pub fn on_details(&mut self, generation: Generation, response: DetailsResponse) -> ResolverStep {
        let Some(pending) = self.take_if_current(generation, Stage::AwaitingDetails) else {
            return ResolverStep::Stale;
        };
        match response {
            DetailsResponse {
                status: LookupStatus::Ok,
                result: Some(details),
            } => ResolverStep::Resolved { generation, details },
            DetailsResponse { status, .. } => {
                warn!(generation, input = %pending.input, %status, "details lookup failed; resolution abandoned");
                ResolverStep::Stalled { generation, status }
            }
        }
    }
}
