use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Note {
    pub id: i64,
    pub title: String,

    /// Markdown source. Backend allows null; treat it as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,

    /// Server-authoritative ISO-8601 timestamps. Never fabricated locally.
    pub created_at: String,
    pub updated_at: String,

    #[serde(default)]
    pub tags: Vec<Tag>,

    pub is_favorite: bool,
    pub is_trashed: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update body for `PATCH /notes/{id}/`.
///
/// Unset fields are omitted from the JSON body so the backend only touches
/// the fields the caller intends to change.
#[derive(Serialize, Clone, Debug, Default)]
pub(crate) struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_trashed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
}

/// Sidebar filter over the note collection.
///
/// Filtering selects which notes are visible; it never reorders them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub(crate) enum NoteFilter {
    #[default]
    #[strum(serialize = "Notes")]
    All,
    #[strum(serialize = "Favorites")]
    Favorites,
    #[strum(serialize = "Trash")]
    Trashed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_deserializes_from_backend_json() {
        // Contract based on the backend NoteSerializer field list.
        let json = r##"{
            "id": 7,
            "title": "Reading list",
            "content": "# Books\n",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T11:30:00Z",
            "tags": [{"id": 1, "name": "books"}],
            "is_favorite": true,
            "is_trashed": false
        }"##;
        let note: Note = serde_json::from_str(json).expect("note should parse");
        assert_eq!(note.id, 7);
        assert_eq!(note.tags.len(), 1);
        assert_eq!(note.tags[0].name, "books");
        assert!(note.is_favorite);
        assert!(!note.is_trashed);
    }

    #[test]
    fn note_tolerates_null_content_and_missing_tags() {
        let json = r#"{
            "id": 1,
            "title": "t",
            "content": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "is_favorite": false,
            "is_trashed": false
        }"#;
        let note: Note = serde_json::from_str(json).expect("note should parse");
        assert_eq!(note.content, "");
        assert!(note.tags.is_empty());
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = NotePatch {
            is_favorite: Some(true),
            ..Default::default()
        };
        let v = serde_json::to_value(patch).expect("should serialize");
        let obj = v.as_object().expect("object");
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["is_favorite"], true);
    }

    #[test]
    fn patch_with_tag_ids_serializes_array() {
        let patch = NotePatch {
            tag_ids: Some(vec![3, 5]),
            ..Default::default()
        };
        let v = serde_json::to_value(patch).expect("should serialize");
        assert_eq!(v["tag_ids"], serde_json::json!([3, 5]));
    }

    #[test]
    fn filter_labels() {
        assert_eq!(NoteFilter::All.to_string(), "Notes");
        assert_eq!(NoteFilter::Favorites.to_string(), "Favorites");
        assert_eq!(NoteFilter::Trashed.to_string(), "Trash");
    }
}
