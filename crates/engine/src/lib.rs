//! # Geofield Engine
//!
//! Binds a single text field to a place-search provider and keeps the field's
//! text, resolved place and validity consistent while keystrokes, dropdown
//! selections and provider responses arrive in any order.
//!
//! ## Architecture
//!
//! - **`field`**: [`AutocompleteField`], the message-driven state machine
//! - **`options`**: applies [`AutocompleteOptions`](geofield_types::AutocompleteOptions) to the widget
//! - **`watcher`**: classifies model changes (resolve, invalidate, nothing)
//! - **`resolver`**: prediction/details resolution with generation tokens
//! - **`selection`**: interprets the widget's "place changed" event
//! - **`guard`**: single-slot focus-revert guard
//! - **`validity`**: the `invalidAddress` flag
//! - **`widget`**: the provider widget seam and a headless implementation
//! - **`provider`**: asynchronous lookups (fixture, Google, null)
//! - **`session`**: runs field effects on Tokio
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use geofield_engine::{AutocompleteField, FieldSession, HeadlessWidget, NullPlacesService};
//! use geofield_types::Msg;
//!
//! let field = AutocompleteField::attach(HeadlessWidget::new(), true);
//! let mut session = FieldSession::new(field, Arc::new(NullPlacesService));
//! session.dispatch(Msg::ModelAssigned(Some("10 Downing Street".into())));
//! session.settle().await;
//! println!("{:?}", session.state());
//! ```

pub mod field;
pub mod guard;
pub mod options;
pub mod provider;
pub mod resolver;
pub mod selection;
pub mod session;
pub mod validity;
pub mod watcher;
pub mod widget;

pub use field::{AutocompleteField, FieldState};
pub use guard::{DEFERRED_REVERT_DELAY, RevertGuard, RevertTiming};
pub use options::{ResolutionMode, apply_options};
pub use provider::{GooglePlacesService, NullPlacesService, PlacesError, PlacesFixture, PlacesService, StaticPlacesService};
pub use session::FieldSession;
pub use validity::ValidityTracker;
pub use watcher::{ModelChangeWatcher, WatchDecision, WatchState};
pub use widget::{HeadlessWidget, PlaceWidget, WidgetFilters};
