//! Overlay marker configuration

use serde::Deserialize;

/// How painted overlay markers are tagged in the document tree.
///
/// The defaults mirror a `<mark class="annotation-highlight"
/// data-annotation-id="..." title="...">` wrapper; hosts with different
/// markup conventions override the names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Element tag used for markers.
    pub marker_tag: String,
    /// CSS class applied to every marker.
    pub class_name: String,
    /// Attribute carrying the annotation id.
    pub id_attribute: String,
    /// Attribute carrying the note as hover text.
    pub note_attribute: String,
    /// Hover text used when the note is empty.
    pub empty_note_hint: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            marker_tag: "mark".to_string(),
            class_name: "annotation-highlight".to_string(),
            id_attribute: "data-annotation-id".to_string(),
            note_attribute: "title".to_string(),
            empty_note_hint: "Click to view annotation".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_overrides_fill_defaults() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"marker_tag": "span"}"#).unwrap();
        assert_eq!(config.marker_tag, "span");
        assert_eq!(config.id_attribute, "data-annotation-id");
    }
}
