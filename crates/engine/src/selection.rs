//! Handling of the widget's "place changed" event.

use geofield_types::{PlaceDetails, SelectedPlace};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Nothing to do.
    Ignored,
    /// Structured result picked from the dropdown: commit it as-is.
    Commit(PlaceDetails),
    /// Free text submitted with watch-enter enabled: resolve it.
    Resolve(String),
}

/// Decide what a selection event means. `displayed` is the text currently shown in the field.
pub fn classify_selection(selected: Option<SelectedPlace>, displayed: &str, watch_enter: bool) -> SelectionOutcome {
    let Some(selected) = selected else {
        debug!("place changed without a selected result");
        return SelectionOutcome::Ignored;
    };
    if selected.is_structured() {
        return SelectionOutcome::Commit(selected.into_details(displayed));
    }
    if watch_enter {
        return SelectionOutcome::Resolve(selected.name);
    }
    debug!(name = %selected.name, "unstructured selection ignored; watch-enter disabled");
    SelectionOutcome::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofield_types::AddressComponent;

    fn toronto() -> SelectedPlace {
        SelectedPlace {
            name: "Toronto".into(),
            formatted_address: Some("Toronto, ON, Canada".into()),
            address_components: Some(vec![AddressComponent {
                long_name: "Toronto".into(),
                short_name: "Toronto".into(),
                types: vec!["locality".into()],
            }]),
            place_id: Some("t1".into()),
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn structured_selection_commits_regardless_of_watch_enter() {
        for watch_enter in [false, true] {
            let outcome = classify_selection(Some(toronto()), "Toronto, ON, Canada", watch_enter);
            let SelectionOutcome::Commit(details) = outcome else {
                panic!("expected a commit");
            };
            assert_eq!(details.place_id, "t1");
        }
    }

    #[test]
    fn unstructured_selection_depends_on_watch_enter() {
        let typed = SelectedPlace::from_name("Toron");
        assert_eq!(
            classify_selection(Some(typed.clone()), "Toron", true),
            SelectionOutcome::Resolve("Toron".into())
        );
        assert_eq!(classify_selection(Some(typed), "Toron", false), SelectionOutcome::Ignored);
        assert_eq!(classify_selection(None, "Toron", true), SelectionOutcome::Ignored);
    }
}
