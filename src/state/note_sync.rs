use crate::api::{ApiError, ApiErrorKind};
use crate::models::NotePatch;
use crate::state::note_store::{
    apply_edit, apply_tags, draft_is_flushable, find_note, move_note, reconcile_note, remove_note,
    restore_order, set_favorite, set_trashed, toggle_favorite, toggle_trashed,
    trash_clears_selection, FetchSequencer,
};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

const SEARCH_DEBOUNCE_MS: i32 = 300;
const AUTOSAVE_DEBOUNCE_MS: i32 = 1000;

/// Unsent title/content edits for the active note. Held by the controller
/// until the autosave timer fires; switching notes drops it unsent.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EditorDraft {
    pub note_id: i64,
    pub title: String,
    pub content: String,
}

/// Optimistic sync controller for the note collection.
///
/// Responsibilities:
/// - debounced search fetches, stale responses discarded by issuance order
/// - per-note debounced autosave of title/content
/// - immediate optimistic mutations (favorite/trash/tags) with rollback
/// - serialized drag reorder with full rollback on failure
///
/// Non-responsibilities:
/// - view state (which pane is focused, editor mode, etc.)
///
/// Failures are never retried automatically: they are logged, surfaced via
/// `notes_error`, and recovery is left to user re-action.
#[derive(Clone)]
pub(crate) struct NoteSyncController {
    app_state: AppContext,

    /// Pending debounce timer handles. One per scope, never stacked.
    search_timer: Arc<Mutex<Option<i32>>>,
    autosave_timer: Arc<Mutex<Option<i32>>>,

    /// Last-write-wins guard for search responses.
    search_seq: Arc<Mutex<FetchSequencer>>,

    /// Unsaved edits for the active note.
    editor_draft: RwSignal<Option<EditorDraft>>,

    /// At most one reorder request in flight per collection.
    reorder_in_flight: RwSignal<bool>,
}

impl NoteSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self {
            app_state,
            search_timer: Arc::new(Mutex::new(None)),
            autosave_timer: Arc::new(Mutex::new(None)),
            search_seq: Arc::new(Mutex::new(FetchSequencer::default())),
            editor_draft: RwSignal::new(None),
            reorder_in_flight: RwSignal::new(false),
        }
    }

    fn authed_client(&self) -> Option<crate::api::ApiClient> {
        let client = self.app_state.0.api_client.get_untracked();
        if client.is_authenticated() {
            Some(client)
        } else {
            None
        }
    }

    /// Central failure path: log, surface, and on an auth failure clear the
    /// session and route to login so no further gateway calls are attempted.
    fn report_failure(&self, e: &ApiError) {
        web_sys::console::error_1(&format!("sync error: {e}").into());
        self.app_state.0.notes_error.set(Some(e.to_string()));

        if e.kind == ApiErrorKind::Unauthorized {
            self.app_state.0.api_client.update(|c| c.clear_session());
            if let Some(win) = web_sys::window() {
                let _ = win.location().set_href("/login");
            }
        }
    }

    fn clear_timer(slot: &Arc<Mutex<Option<i32>>>) {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Ok(mut slot) = slot.lock() {
            if let Some(tid) = slot.take() {
                let _ = win.clear_timeout_with_handle(tid);
            }
        }
    }

    fn schedule(slot: &Arc<Mutex<Option<i32>>>, delay_ms: i32, f: impl FnOnce() + 'static) {
        let Some(win) = web_sys::window() else {
            return;
        };

        Self::clear_timer(slot);

        let cb = wasm_bindgen::closure::Closure::once_into_js(f);
        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                delay_ms,
            )
            .unwrap_or(0);

        if let Ok(mut slot) = slot.lock() {
            *slot = Some(tid);
        }
    }

    /// Cancels both pending debounce timers. In-flight requests are left to
    /// complete; their results are discarded by the sequence guard instead.
    pub fn cancel_pending(&self) {
        Self::clear_timer(&self.search_timer);
        Self::clear_timer(&self.autosave_timer);
    }

    // --- search ---------------------------------------------------------

    /// Keystroke entry point: restarts the debounce timer, so only the final
    /// query of a burst reaches the network.
    pub fn on_search_changed(&self, query: String) {
        self.app_state.0.search_query.set(query);

        let s2 = self.clone();
        Self::schedule(&self.search_timer, SEARCH_DEBOUNCE_MS, move || {
            s2.load_notes_now();
        });
    }

    /// Issues the fetch for the current query. The incoming list replaces the
    /// collection wholesale; that replacement is already the reconciliation
    /// step, so no optimism is involved.
    pub fn load_notes_now(&self) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let query = self.app_state.0.search_query.get_untracked();
        let ticket = match self.search_seq.lock() {
            Ok(mut seq) => seq.issue(),
            Err(_) => return,
        };

        self.app_state.0.notes_loading.set(true);
        self.app_state.0.notes_error.set(None);

        let s2 = self.clone();
        spawn_local(async move {
            // Failures go through the same sequence gate as successes: a
            // stale fetch that fails late must not disturb a newer one.
            let outcome = client.search_notes(&query).await;
            let apply = s2
                .search_seq
                .lock()
                .map(|mut seq| seq.try_apply(ticket))
                .unwrap_or(false);
            if !apply {
                return;
            }

            s2.app_state.0.notes_loading.set(false);
            match outcome {
                Ok(fetched) => {
                    s2.app_state.0.notes.set(fetched);
                    s2.app_state.0.notes_error.set(None);
                }
                Err(e) => s2.report_failure(&e),
            }
        });
    }

    pub fn load_tags(&self) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.get_tags().await {
                Ok(tags) => s2.app_state.0.tags.set(tags),
                Err(e) => s2.report_failure(&e),
            }
        });
    }

    // --- selection & autosave -------------------------------------------

    /// Switching the active note cancels any pending autosave without
    /// flushing it: edits that never reached their debounce deadline are
    /// discarded, and the newly selected note starts clean.
    pub fn set_active_note(&self, id: Option<i64>) {
        Self::clear_timer(&self.autosave_timer);
        self.editor_draft.set(None);
        self.app_state.0.active_note_id.set(id);
    }

    /// Title/content keystroke entry point. Restarts the autosave timer; at
    /// most one timer is pending regardless of how fast events arrive.
    pub fn on_editor_input(&self, note_id: i64, title: String, content: String) {
        self.editor_draft.set(Some(EditorDraft {
            note_id,
            title,
            content,
        }));

        let s2 = self.clone();
        Self::schedule(&self.autosave_timer, AUTOSAVE_DEBOUNCE_MS, move || {
            s2.flush_autosave(note_id);
        });
    }

    /// Debounce deadline: persist the draft if it still belongs to the
    /// active note and actually differs from the last persisted state.
    fn flush_autosave(&self, note_id: i64) {
        let Some(draft) = self.editor_draft.get_untracked() else {
            return;
        };

        let notes = self.app_state.0.notes.get_untracked();
        let active = self.app_state.0.active_note_id.get_untracked();
        if !draft_is_flushable(
            &notes,
            active,
            draft.note_id,
            note_id,
            &draft.title,
            &draft.content,
        ) {
            return;
        }

        let Some(client) = self.authed_client() else {
            return;
        };

        // Optimistic: the outgoing fields land in the store immediately.
        self.app_state.0.notes.update(|notes| {
            apply_edit(notes, note_id, &draft.title, &draft.content);
        });

        let patch = NotePatch {
            title: Some(draft.title),
            content: Some(draft.content),
            ..Default::default()
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.patch_note(note_id, &patch).await {
                Ok(server) => {
                    s2.app_state.0.notes.update(|notes| {
                        reconcile_note(notes, server);
                    });
                }
                // A failed autosave stays optimistic: rolling back would
                // throw away the user's words.
                Err(e) => s2.report_failure(&e),
            }
        });
    }

    // --- optimistic toggles ---------------------------------------------

    pub fn toggle_favorite(&self, note_id: i64) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let mut prior = None;
        self.app_state.0.notes.update(|notes| {
            prior = toggle_favorite(notes, note_id);
        });
        let Some(prior) = prior else {
            return;
        };

        let patch = NotePatch {
            is_favorite: Some(!prior),
            ..Default::default()
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.patch_note(note_id, &patch).await {
                Ok(server) => {
                    s2.app_state.0.notes.update(|notes| reconcile_note(notes, server));
                }
                Err(e) => {
                    s2.app_state
                        .0
                        .notes
                        .update(|notes| set_favorite(notes, note_id, prior));
                    s2.report_failure(&e);
                }
            }
        });
    }

    /// Trash/restore toggle. The selection is cleared only once the server
    /// confirms the trashing, so a failed persist leaves both the flag and
    /// the selection exactly as they were.
    pub fn toggle_trashed(&self, note_id: i64) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let mut prior = None;
        self.app_state.0.notes.update(|notes| {
            prior = toggle_trashed(notes, note_id);
        });
        let Some(prior) = prior else {
            return;
        };

        let patch = NotePatch {
            is_trashed: Some(!prior),
            ..Default::default()
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.patch_note(note_id, &patch).await {
                Ok(server) => {
                    s2.app_state.0.notes.update(|notes| reconcile_note(notes, server));
                    let active = s2.app_state.0.active_note_id.get_untracked();
                    if trash_clears_selection(!prior, active, note_id) {
                        s2.set_active_note(None);
                    }
                }
                Err(e) => {
                    s2.app_state
                        .0
                        .notes
                        .update(|notes| set_trashed(notes, note_id, prior));
                    s2.report_failure(&e);
                }
            }
        });
    }

    pub fn set_note_tags(&self, note_id: i64, tag_ids: Vec<i64>) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let prior_tags =
            find_note(&self.app_state.0.notes.get_untracked(), note_id).map(|n| n.tags);
        let Some(prior_tags) = prior_tags else {
            return;
        };

        let catalog = self.app_state.0.tags.get_untracked();
        self.app_state.0.notes.update(|notes| {
            apply_tags(notes, note_id, &tag_ids, &catalog);
        });

        let patch = NotePatch {
            tag_ids: Some(tag_ids),
            ..Default::default()
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.patch_note(note_id, &patch).await {
                Ok(server) => {
                    s2.app_state.0.notes.update(|notes| reconcile_note(notes, server));
                }
                Err(e) => {
                    s2.app_state.0.notes.update(|notes| {
                        if let Some(n) = notes.iter_mut().find(|n| n.id == note_id) {
                            n.tags = prior_tags;
                        }
                    });
                    s2.report_failure(&e);
                }
            }
        });
    }

    // --- create / delete ------------------------------------------------

    /// Creation is not optimistic: no client-side placeholder id ever enters
    /// the collection. The confirmed note is prepended and selected.
    pub fn create_note(&self) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.create_note("Untitled note", "").await {
                Ok(note) => {
                    let id = note.id;
                    s2.app_state.0.notes.update(|notes| notes.insert(0, note));
                    s2.set_active_note(Some(id));
                }
                Err(e) => s2.report_failure(&e),
            }
        });
    }

    /// Permanent deletion from the trash view. Commit-on-confirm, like
    /// creation: the card only disappears once the server acknowledged.
    pub fn delete_note_forever(&self, note_id: i64) {
        let Some(client) = self.authed_client() else {
            return;
        };

        let s2 = self.clone();
        spawn_local(async move {
            match client.delete_note(note_id).await {
                Ok(()) => {
                    s2.app_state.0.notes.update(|notes| remove_note(notes, note_id));
                    if s2.app_state.0.active_note_id.get_untracked() == Some(note_id) {
                        s2.set_active_note(None);
                    }
                }
                Err(e) => s2.report_failure(&e),
            }
        });
    }

    // --- reorder ---------------------------------------------------------

    /// Drag completion over the full collection (indices are collection
    /// indices, not filtered-view indices). Applies the single-element move
    /// optimistically, then reconciles; failure restores the exact pre-drag
    /// order while keeping any fields that reconciled in the meantime.
    /// Reorder requests are serialized: a drag landing while one is
    /// unresolved is refused before any mutation.
    pub fn reorder(&self, from: usize, to: usize) {
        let Some(client) = self.authed_client() else {
            return;
        };

        if self.reorder_in_flight.get_untracked() {
            web_sys::console::warn_1(&"reorder ignored: previous reorder unresolved".into());
            return;
        }

        let pre_drag: Vec<i64> = self
            .app_state
            .0
            .notes
            .get_untracked()
            .iter()
            .map(|n| n.id)
            .collect();
        self.app_state.0.notes.update(|notes| move_note(notes, from, to));

        let ordered_ids: Vec<i64> = self
            .app_state
            .0
            .notes
            .get_untracked()
            .iter()
            .map(|n| n.id)
            .collect();
        if ordered_ids == pre_drag {
            return;
        }

        self.reorder_in_flight.set(true);

        let s2 = self.clone();
        spawn_local(async move {
            match client.reorder_notes(&ordered_ids).await {
                Ok(()) => {}
                Err(e) => {
                    // Order-only rollback: the drag is undone in full, but a
                    // reconcile that landed mid-flight is not thrown away.
                    s2.app_state
                        .0
                        .notes
                        .update(|notes| restore_order(notes, &pre_drag));
                    s2.report_failure(&e);
                }
            }
            s2.reorder_in_flight.set(false);
        });
    }
}
