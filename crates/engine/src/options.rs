//! Applies [`AutocompleteOptions`] to a field's widget.

use geofield_types::AutocompleteOptions;
use tracing::{debug, warn};

use crate::widget::PlaceWidget;

/// Behaviour switches derived from the last applied options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionMode {
    /// Resolve committed text through a details lookup.
    pub strict: bool,
    /// Resolve unstructured selections (enter keypress) through predictions.
    pub watch_enter: bool,
    /// The field's required attribute at apply time.
    pub required: bool,
}

/// Push `options` into the widget's filters and derive the resolution mode.
///
/// Every filter is written on each call, so absent values clear whatever a
/// previous apply set and repeated calls with the same input leave the widget
/// in the same state. Invalid options are logged and still applied; the
/// provider decides how to treat them.
pub fn apply_options<W>(widget: &mut W, options: Option<&AutocompleteOptions>, required_attribute: bool) -> ResolutionMode
where
    W: PlaceWidget + ?Sized,
{
    let Some(options) = options else {
        widget.set_types(Vec::new());
        widget.set_bounds(None);
        widget.set_component_restrictions(None);
        debug!(required = required_attribute, "options cleared");
        return ResolutionMode {
            required: required_attribute,
            ..ResolutionMode::default()
        };
    };

    if let Err(error) = options.validate() {
        warn!(%error, "applying invalid autocomplete options");
    }

    widget.set_types(options.type_list());
    widget.set_bounds(options.bounds);
    widget.set_component_restrictions(options.component_restrictions());

    let mode = ResolutionMode {
        strict: options.strict,
        watch_enter: options.watch_enter,
        required: required_attribute,
    };
    debug!(
        types = ?options.types,
        country = ?options.country,
        has_bounds = options.bounds.is_some(),
        strict = mode.strict,
        watch_enter = mode.watch_enter,
        required = mode.required,
        "options applied"
    );
    mode
}
