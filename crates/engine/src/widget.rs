//! Provider widget seam.
//!
//! The dropdown widget is owned by the field that created it. The engine only
//! mutates its filters and reads the current selection; rendering stays with
//! the host.

use std::fmt::Debug;

use geofield_types::{ComponentRestrictions, LatLngBounds, SelectedPlace};
use serde::Serialize;

/// Operations the engine needs from the provider's autocomplete widget.
pub trait PlaceWidget: Debug {
    /// Restrict predictions to the given place types. An empty list clears the restriction.
    fn set_types(&mut self, types: Vec<String>);
    /// Bias predictions towards `bounds`, or clear the bias with `None`.
    fn set_bounds(&mut self, bounds: Option<LatLngBounds>);
    /// Restrict predictions to a country, or clear the restriction with `None`.
    fn set_component_restrictions(&mut self, restrictions: Option<ComponentRestrictions>);
    /// The result the widget currently reports as selected.
    fn selected_place(&self) -> Option<SelectedPlace>;
}

/// Filter state held by a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WidgetFilters {
    pub types: Vec<String>,
    pub bounds: Option<LatLngBounds>,
    pub component_restrictions: Option<ComponentRestrictions>,
}

/// Widget without a UI. Records filters and lets the host push the highlighted result.
///
/// Used by the CLI and by tests; a graphical host supplies its own
/// [`PlaceWidget`] backed by the real dropdown.
#[derive(Debug, Default)]
pub struct HeadlessWidget {
    filters: WidgetFilters,
    selected: Option<SelectedPlace>,
}

impl HeadlessWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &WidgetFilters {
        &self.filters
    }

    /// Make `place` the result reported by the next selection event.
    pub fn highlight(&mut self, place: SelectedPlace) {
        self.selected = Some(place);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

impl PlaceWidget for HeadlessWidget {
    fn set_types(&mut self, types: Vec<String>) {
        self.filters.types = types;
    }

    fn set_bounds(&mut self, bounds: Option<LatLngBounds>) {
        self.filters.bounds = bounds;
    }

    fn set_component_restrictions(&mut self, restrictions: Option<ComponentRestrictions>) {
        self.filters.component_restrictions = restrictions;
    }

    fn selected_place(&self) -> Option<SelectedPlace> {
        self.selected.clone()
    }
}
