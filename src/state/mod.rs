pub(crate) mod note_store;
pub(crate) mod note_sync;

use crate::api::ApiClient;
use crate::models::{Note, NoteFilter, Tag};
use leptos::prelude::*;

/// Single source of truth for the session.
///
/// The `notes` vector is the authoritative ordered collection; everything
/// the UI renders is derived from it on the fly (see
/// `note_store::visible_notes`), never copied into component state.
#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Ordered note collection, as of the last fetch or successful reorder.
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,

    /// The note open in the editor, if any.
    pub active_note_id: RwSignal<Option<i64>>,

    pub search_query: RwSignal<String>,
    pub filter: RwSignal<NoteFilter>,

    /// Tag catalog, loaded once per session.
    pub tags: RwSignal<Vec<Tag>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            active_note_id: RwSignal::new(None),
            search_query: RwSignal::new(String::new()),
            filter: RwSignal::new(NoteFilter::All),
            tags: RwSignal::new(vec![]),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
