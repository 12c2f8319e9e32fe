//! The autocomplete field state machine.
//!
//! [`AutocompleteField`] owns the provider widget and reconciles keystrokes,
//! programmatic assignments, widget selections and provider responses into a
//! single `(text, resolved place, validity)` view. It never performs I/O: every
//! request is returned as an [`Effect`] and its result comes back as a [`Msg`].

use geofield_types::{AutocompleteOptions, Effect, Generation, Msg, ResolvedPlace};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    guard::{DEFERRED_REVERT_DELAY, RevertAction, RevertGuard, RevertTiming},
    options::{ResolutionMode, apply_options},
    resolver::{PredictionResolver, ResolverStep},
    selection::{SelectionOutcome, classify_selection},
    validity::ValidityTracker,
    watcher::{ModelChangeWatcher, WatchDecision},
    widget::PlaceWidget,
};

/// Snapshot of the field as the host sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    /// Bound model value.
    pub text: Option<String>,
    /// Text currently displayed in the input.
    pub display: String,
    /// The "details" output.
    pub resolved: Option<ResolvedPlace>,
    pub valid: bool,
    pub required: bool,
    /// Validation errors keyed as the host's form layer expects them.
    pub errors: IndexMap<String, bool>,
}

#[derive(Debug)]
pub struct AutocompleteField<W: PlaceWidget> {
    widget: W,
    mode: ResolutionMode,
    required_attribute: bool,
    applied_options: Option<Option<AutocompleteOptions>>,
    model: Option<String>,
    display: String,
    resolved: Option<ResolvedPlace>,
    validity: ValidityTracker,
    watcher: ModelChangeWatcher,
    resolver: PredictionResolver,
    guard: RevertGuard,
    attached: bool,
}

impl<W: PlaceWidget> AutocompleteField<W> {
    /// Attach a field to its widget. The widget lives as long as the field and is never replaced.
    pub fn attach(widget: W, required_attribute: bool) -> Self {
        debug!(required = required_attribute, "autocomplete field attached");
        Self {
            widget,
            mode: ResolutionMode {
                required: required_attribute,
                ..ResolutionMode::default()
            },
            required_attribute,
            applied_options: None,
            model: None,
            display: String::new(),
            resolved: None,
            validity: ValidityTracker::new(),
            watcher: ModelChangeWatcher::new(),
            resolver: PredictionResolver::new(),
            guard: RevertGuard::new(),
            attached: true,
        }
    }

    pub fn state(&self) -> FieldState {
        FieldState {
            text: self.model.clone(),
            display: self.display.clone(),
            resolved: self.resolved.clone(),
            valid: self.validity.is_valid(),
            required: self.mode.required,
            errors: self.validity.errors(),
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn guard(&self) -> &RevertGuard {
        &self.guard
    }

    pub fn validity(&self) -> &ValidityTracker {
        &self.validity
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_resolving(&self) -> bool {
        self.resolver.is_pending()
    }

    /// Process one message and return the effects it produced, in order.
    pub fn handle_message(&mut self, msg: Msg) -> Vec<Effect> {
        if !self.attached {
            debug!(?msg, "message ignored; field detached");
            return Vec::new();
        }
        let mut effects = Vec::new();
        match msg {
            Msg::OptionsChanged(options) => self.handle_options_changed(options),
            Msg::RequiredAttributeChanged(required) => self.required_attribute = required,
            Msg::ModelAssigned(value) => {
                self.display = value.clone().unwrap_or_default();
                self.model_changed(value, &mut effects);
            }
            Msg::InputChanged(text) => {
                self.display = text.clone();
                self.model_changed(Some(text), &mut effects);
            }
            Msg::DisplayRewritten(text) => self.display = text,
            Msg::PlaceChanged => self.handle_place_changed(&mut effects),
            Msg::PredictionsReceived { generation, response } => {
                let step = self.resolver.on_predictions(generation, response, self.mode.strict);
                self.apply_resolver_step(step, &mut effects);
            }
            Msg::DetailsReceived { generation, response } => {
                let step = self.resolver.on_details(generation, response);
                self.apply_resolver_step(step, &mut effects);
            }
            Msg::FocusLost => match self.guard.on_focus_lost() {
                Some(RevertAction::Rewrite(text)) => self.revert_display(text, &mut effects),
                Some(RevertAction::Schedule { token, delay }) => effects.push(Effect::ScheduleRevert { token, delay }),
                None => {}
            },
            Msg::RevertTimerElapsed { token } => {
                if let Some(text) = self.guard.on_timer(token) {
                    self.revert_display(text, &mut effects);
                }
            }
            Msg::Detach => self.detach(),
        }
        effects
    }

    fn handle_options_changed(&mut self, options: Option<AutocompleteOptions>) {
        if self.applied_options.as_ref() == Some(&options) {
            debug!("options unchanged; skipping apply");
            return;
        }
        self.mode = apply_options(&mut self.widget, options.as_ref(), self.required_attribute);
        self.applied_options = Some(options);
    }

    /// A host-driven change supersedes any in-flight resolution and the focus guard before it is classified.
    /// Re-sending the current value is not a change.
    fn model_changed(&mut self, value: Option<String>, effects: &mut Vec<Effect>) {
        if value == self.model {
            debug!("model value unchanged; ignoring");
            return;
        }
        self.guard.disarm();
        self.resolver.cancel();
        let decision = self.watcher.observe(value.as_deref(), self.mode.required);
        self.model = value;
        match decision {
            WatchDecision::NoOp => {}
            WatchDecision::Resolve(text) => effects.extend(self.resolver.begin(&text)),
            WatchDecision::Invalidate => effects.extend(self.validity.set(false)),
        }
    }

    fn handle_place_changed(&mut self, effects: &mut Vec<Effect>) {
        let selected = self.widget.selected_place();
        match classify_selection(selected, &self.display, self.mode.watch_enter) {
            SelectionOutcome::Ignored => {}
            SelectionOutcome::Commit(details) => {
                info!(place_id = %details.place_id, "structured selection committed");
                self.resolver.cancel();
                self.guard.disarm();
                self.set_resolved(Some(ResolvedPlace::Full(details)), effects);
                let displayed = self.display.clone();
                self.commit_model(displayed, effects);
                effects.extend(self.validity.set(true));
            }
            SelectionOutcome::Resolve(text) => {
                self.guard.disarm();
                effects.extend(self.resolver.begin(&text));
            }
        }
    }

    fn apply_resolver_step(&mut self, step: ResolverStep, effects: &mut Vec<Effect>) {
        match step {
            ResolverStep::Stale | ResolverStep::Stalled { .. } => {}
            ResolverStep::Continue(effect) => effects.push(effect),
            ResolverStep::NoCandidates { generation } => {
                self.set_resolved(None, effects);
                effects.push(Effect::ResolutionCompleted { generation });
            }
            ResolverStep::Accepted { generation, description } => {
                info!(generation, description = %description, "prediction accepted");
                self.commit_text(description.clone(), effects);
                self.set_resolved(Some(ResolvedPlace::Lightweight {
                    description: description.clone(),
                }), effects);
                self.guard.arm(description, RevertTiming::Deferred(DEFERRED_REVERT_DELAY));
                self.complete(generation, effects);
            }
            ResolverStep::Resolved { generation, details } => {
                info!(generation, place_id = %details.place_id, "place details resolved");
                let formatted_address = details.formatted_address.clone();
                self.commit_text(formatted_address.clone(), effects);
                self.set_resolved(Some(ResolvedPlace::Full(details)), effects);
                self.guard.arm(formatted_address, RevertTiming::Immediate);
                self.complete(generation, effects);
            }
        }
    }

    /// Completion of a committing resolution: the address is valid again.
    fn complete(&mut self, generation: Generation, effects: &mut Vec<Effect>) {
        effects.extend(self.validity.set(true));
        effects.push(Effect::ResolutionCompleted { generation });
    }

    fn set_resolved(&mut self, resolved: Option<ResolvedPlace>, effects: &mut Vec<Effect>) {
        self.resolved = resolved.clone();
        effects.push(Effect::DetailsChanged { details: resolved });
    }

    /// Write both the model and the displayed text.
    fn commit_text(&mut self, text: String, effects: &mut Vec<Effect>) {
        self.display = text.clone();
        self.commit_model(text, effects);
    }

    fn commit_model(&mut self, text: String, effects: &mut Vec<Effect>) {
        self.watcher.record_commit(&text);
        self.model = Some(text.clone());
        effects.push(Effect::ModelCommitted { text });
    }

    fn revert_display(&mut self, text: String, effects: &mut Vec<Effect>) {
        debug!(text = %text, "restoring resolved text after focus loss");
        self.display = text.clone();
        effects.push(Effect::DisplayReverted { text });
    }

    fn detach(&mut self) {
        self.guard.disarm();
        self.resolver.cancel();
        self.attached = false;
        debug!("autocomplete field detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::HeadlessWidget;
    use geofield_types::{AddressComponent, DetailsResponse, LookupStatus, PlaceDetails, Prediction, PredictionResponse, SelectedPlace};

    fn field(required: bool) -> AutocompleteField<HeadlessWidget> {
        AutocompleteField::attach(HeadlessWidget::new(), required)
    }

    fn predictions(description: &str, place_id: &str) -> PredictionResponse {
        PredictionResponse {
            status: LookupStatus::Ok,
            predictions: Some(vec![Prediction {
                description: description.into(),
                place_id: place_id.into(),
            }]),
        }
    }

    fn downing_street() -> PlaceDetails {
        PlaceDetails {
            formatted_address: "10 Downing Street, London".into(),
            address_components: vec![AddressComponent {
                long_name: "London".into(),
                short_name: "London".into(),
                types: vec!["postal_town".into()],
            }],
            place_id: "p1".into(),
            raw: serde_json::json!({"name": "10 Downing Street"}),
        }
    }

    fn fetch_count(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| matches!(effect, Effect::FetchPredictions { .. }))
            .count()
    }

    #[test]
    fn structured_selection_marks_valid_without_resolving() {
        let mut field = field(true);
        field.handle_message(Msg::InputChanged("Toronto".into()));
        field.handle_message(Msg::InputChanged("Toront".into()));
        assert!(!field.state().valid);

        field.handle_message(Msg::DisplayRewritten("Toronto, ON, Canada".into()));
        field.widget_mut().highlight(SelectedPlace {
            name: "Toronto".into(),
            address_components: Some(Vec::new()),
            place_id: Some("t1".into()),
            ..Default::default()
        });
        let effects = field.handle_message(Msg::PlaceChanged);

        assert_eq!(fetch_count(&effects), 0);
        assert!(!field.is_resolving());
        let state = field.state();
        assert!(state.valid);
        assert_eq!(state.text.as_deref(), Some("Toronto, ON, Canada"));
        assert!(matches!(state.resolved, Some(ResolvedPlace::Full(ref details)) if details.place_id == "t1"));
    }

    #[test]
    fn optional_field_short_edits_never_change_validity() {
        let mut field = field(false);
        for text in ["a", "", "b", "x", ""] {
            let effects = field.handle_message(Msg::InputChanged(text.into()));
            assert!(effects.is_empty());
            assert!(field.state().valid);
        }
    }

    #[test]
    fn required_field_deletion_invalidates() {
        let mut field = field(true);
        field.handle_message(Msg::InputChanged("Ma".into()));
        field.handle_message(Msg::InputChanged("Mad".into()));
        assert!(field.state().valid);
        let effects = field.handle_message(Msg::InputChanged("Ma".into()));
        assert_eq!(effects, vec![Effect::ValidityChanged { valid: false }]);
        assert_eq!(field.state().errors.get(geofield_types::INVALID_ADDRESS_KEY), Some(&true));

        // Growing text never restores validity on its own.
        field.handle_message(Msg::InputChanged("Madrid, Spain".into()));
        assert!(!field.state().valid);
    }

    #[test]
    fn first_assignment_resolves_exactly_once() {
        let mut field = field(false);
        let effects = field.handle_message(Msg::ModelAssigned(Some("Lisbon".into())));
        assert_eq!(fetch_count(&effects), 1);
        assert_eq!(field.state().display, "Lisbon");
        let effects = field.handle_message(Msg::ModelAssigned(Some("Porto".into())));
        assert_eq!(fetch_count(&effects), 0);
    }

    #[test]
    fn strict_resolution_commits_details_and_arms_guard() {
        let mut field = field(false);
        field.handle_message(Msg::OptionsChanged(Some(AutocompleteOptions {
            strict: true,
            country: Some("gb".into()),
            ..Default::default()
        })));
        field.handle_message(Msg::ModelAssigned(Some("10 Down".into())));
        let effects = field.handle_message(Msg::PredictionsReceived {
            generation: 1,
            response: predictions("10 Downing Street, London, UK", "p1"),
        });
        assert_eq!(
            effects,
            vec![Effect::FetchDetails {
                generation: 1,
                place_id: "p1".into(),
            }]
        );

        let effects = field.handle_message(Msg::DetailsReceived {
            generation: 1,
            response: DetailsResponse {
                status: LookupStatus::Ok,
                result: Some(downing_street()),
            },
        });
        assert!(effects.contains(&Effect::ResolutionCompleted { generation: 1 }));
        let state = field.state();
        assert_eq!(state.display, "10 Downing Street, London");
        assert_eq!(state.text.as_deref(), Some("10 Downing Street, London"));
        assert_eq!(state.resolved, Some(ResolvedPlace::Full(downing_street())));
        assert!(state.valid);
        assert_eq!(field.guard().armed().map(|armed| armed.timing), Some(RevertTiming::Immediate));

        // The widget puts the typed text back; focus loss restores the address.
        field.handle_message(Msg::DisplayRewritten("10 Down".into()));
        let effects = field.handle_message(Msg::FocusLost);
        assert_eq!(
            effects,
            vec![Effect::DisplayReverted {
                text: "10 Downing Street, London".into(),
            }]
        );
        assert_eq!(field.state().display, "10 Downing Street, London");
        assert!(field.handle_message(Msg::FocusLost).is_empty());
    }

    #[test]
    fn details_failure_stalls_without_completion() {
        let mut field = field(true);
        field.handle_message(Msg::OptionsChanged(Some(AutocompleteOptions {
            strict: true,
            ..Default::default()
        })));
        field.handle_message(Msg::ModelAssigned(Some("Nowhere".into())));
        field.handle_message(Msg::PredictionsReceived {
            generation: 1,
            response: predictions("Nowhere Lane", "n1"),
        });
        let before = field.state();
        let effects = field.handle_message(Msg::DetailsReceived {
            generation: 1,
            response: DetailsResponse {
                status: LookupStatus::OverQueryLimit,
                result: None,
            },
        });
        assert!(effects.is_empty());
        assert_eq!(field.state(), before);
        assert!(!field.guard().is_armed());
    }

    #[test]
    fn empty_predictions_clear_details_and_leave_validity() {
        let mut field = field(true);
        field.handle_message(Msg::ModelAssigned(Some("Qwzx".into())));
        field.handle_message(Msg::InputChanged("Qwz".into()));
        assert!(!field.state().valid);

        field.handle_message(Msg::OptionsChanged(Some(AutocompleteOptions {
            watch_enter: true,
            ..Default::default()
        })));
        field.widget_mut().highlight(SelectedPlace::from_name("Qwz"));
        let effects = field.handle_message(Msg::PlaceChanged);
        let Some(Effect::FetchPredictions { generation, .. }) = effects.first().cloned() else {
            panic!("expected a predictions request");
        };
        let effects = field.handle_message(Msg::PredictionsReceived {
            generation,
            response: PredictionResponse::empty(LookupStatus::ZeroResults),
        });
        assert_eq!(
            effects,
            vec![
                Effect::DetailsChanged { details: None },
                Effect::ResolutionCompleted { generation },
            ]
        );
        let state = field.state();
        assert_eq!(state.text.as_deref(), Some("Qwz"));
        assert!(!state.valid);
        assert_eq!(state.resolved, None);
    }

    #[test]
    fn user_edit_disarms_guard() {
        let mut field = field(false);
        field.handle_message(Msg::ModelAssigned(Some("Vienna".into())));
        field.handle_message(Msg::PredictionsReceived {
            generation: 1,
            response: predictions("Vienna, Austria", "v1"),
        });
        assert!(field.guard().is_armed());
        field.handle_message(Msg::InputChanged("Vienna, Austri".into()));
        assert!(!field.guard().is_armed());
        assert!(field.handle_message(Msg::FocusLost).is_empty());
    }

    fn resolved_lisbon() -> AutocompleteField<HeadlessWidget> {
        let mut field = field(false);
        field.handle_message(Msg::ModelAssigned(Some("Lisbon".into())));
        field.handle_message(Msg::PredictionsReceived {
            generation: 1,
            response: predictions("Lisbon, Portugal", "l1"),
        });
        assert!(field.guard().is_armed());
        field
    }

    #[test]
    fn structured_selection_replaces_armed_guard() {
        let mut field = resolved_lisbon();
        field.handle_message(Msg::DisplayRewritten("Porto, Portugal".into()));
        field.widget_mut().highlight(SelectedPlace {
            name: "Porto".into(),
            address_components: Some(Vec::new()),
            place_id: Some("o1".into()),
            ..Default::default()
        });
        field.handle_message(Msg::PlaceChanged);

        assert!(!field.guard().is_armed());
        assert!(field.handle_message(Msg::FocusLost).is_empty());
        let state = field.state();
        assert_eq!(state.text.as_deref(), Some("Porto, Portugal"));
        assert_eq!(state.display, "Porto, Portugal");
    }

    #[test]
    fn programmatic_assignment_disarms_guard() {
        let mut field = resolved_lisbon();
        field.handle_message(Msg::ModelAssigned(Some("Madrid, Spain".into())));

        assert!(field.handle_message(Msg::FocusLost).is_empty());
        let state = field.state();
        assert_eq!(state.text.as_deref(), Some("Madrid, Spain"));
        assert_eq!(state.display, "Madrid, Spain");
    }

    #[test]
    fn unchanged_assignment_keeps_resolution_and_guard() {
        let mut field = field(false);
        field.handle_message(Msg::ModelAssigned(Some("Lisbon".into())));
        assert!(field.handle_message(Msg::ModelAssigned(Some("Lisbon".into()))).is_empty());
        assert!(field.is_resolving());

        let effects = field.handle_message(Msg::PredictionsReceived {
            generation: 1,
            response: predictions("Lisbon, Portugal", "l1"),
        });
        assert!(effects.contains(&Effect::ResolutionCompleted { generation: 1 }));

        // The host echoing the committed value back must not drop the guard.
        field.handle_message(Msg::ModelAssigned(Some("Lisbon, Portugal".into())));
        assert!(field.guard().is_armed());
    }

    #[test]
    fn options_are_reapplied_only_on_change() {
        let mut field = field(true);
        let options = Some(AutocompleteOptions {
            country: Some("ca".into()),
            ..Default::default()
        });
        field.handle_message(Msg::OptionsChanged(options.clone()));
        assert!(field.state().required);

        field.handle_message(Msg::RequiredAttributeChanged(false));
        field.handle_message(Msg::OptionsChanged(options));
        assert!(field.state().required, "identical options must not trigger a re-apply");

        field.handle_message(Msg::OptionsChanged(None));
        assert!(!field.state().required);
        assert_eq!(field.widget().filters().component_restrictions, None);
    }

    #[test]
    fn detached_field_ignores_messages() {
        let mut field = field(false);
        field.handle_message(Msg::ModelAssigned(Some("Seoul".into())));
        field.handle_message(Msg::Detach);
        assert!(!field.is_attached());
        let effects = field.handle_message(Msg::PredictionsReceived {
            generation: 1,
            response: predictions("Seoul, South Korea", "s1"),
        });
        assert!(effects.is_empty());
        assert_eq!(field.state().resolved, None);
    }
}
