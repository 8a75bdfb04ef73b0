//! Pure mutation primitives for the note collection.
//!
//! The collection itself lives in `AppState` signals; every function here
//! takes the backing `Vec<Note>` so the optimistic/reconcile/rollback
//! contracts stay testable without a DOM or a network.

use crate::models::{Note, NoteFilter, Tag};

/// Single-element move: remove at `from`, insert at `to`. This is the drag
/// permutation, deliberately not a pairwise swap. Out-of-range indices and
/// no-op moves leave the collection untouched.
pub(crate) fn move_note(notes: &mut Vec<Note>, from: usize, to: usize) {
    if from == to || from >= notes.len() || to >= notes.len() {
        return;
    }
    let note = notes.remove(from);
    notes.insert(to, note);
}

/// Replaces a note with the authoritative server copy, preserving its
/// position in the manual order.
pub(crate) fn reconcile_note(notes: &mut [Note], server: Note) {
    if let Some(slot) = notes.iter_mut().find(|n| n.id == server.id) {
        *slot = server;
    }
}

/// Optimistically applies outgoing title/content before the patch request
/// is issued. Timestamps are left alone; the server copy supplies them on
/// reconcile.
pub(crate) fn apply_edit(notes: &mut [Note], id: i64, title: &str, content: &str) {
    if let Some(n) = notes.iter_mut().find(|n| n.id == id) {
        n.title = title.to_string();
        n.content = content.to_string();
    }
}

/// Optimistically flips `is_favorite`, returning the prior value so a failed
/// persist can roll it back with `set_favorite`.
pub(crate) fn toggle_favorite(notes: &mut [Note], id: i64) -> Option<bool> {
    let n = notes.iter_mut().find(|n| n.id == id)?;
    let prior = n.is_favorite;
    n.is_favorite = !prior;
    Some(prior)
}

pub(crate) fn set_favorite(notes: &mut [Note], id: i64, value: bool) {
    if let Some(n) = notes.iter_mut().find(|n| n.id == id) {
        n.is_favorite = value;
    }
}

/// Optimistically flips `is_trashed`, returning the prior value.
pub(crate) fn toggle_trashed(notes: &mut [Note], id: i64) -> Option<bool> {
    let n = notes.iter_mut().find(|n| n.id == id)?;
    let prior = n.is_trashed;
    n.is_trashed = !prior;
    Some(prior)
}

pub(crate) fn set_trashed(notes: &mut [Note], id: i64, value: bool) {
    if let Some(n) = notes.iter_mut().find(|n| n.id == id) {
        n.is_trashed = value;
    }
}

/// Optimistically replaces a note's tag set from the already-loaded tag
/// catalog, keeping the catalog's order for ids the catalog knows about.
pub(crate) fn apply_tags(notes: &mut [Note], id: i64, tag_ids: &[i64], catalog: &[Tag]) {
    if let Some(n) = notes.iter_mut().find(|n| n.id == id) {
        n.tags = catalog
            .iter()
            .filter(|t| tag_ids.contains(&t.id))
            .cloned()
            .collect();
    }
}

pub(crate) fn remove_note(notes: &mut Vec<Note>, id: i64) {
    notes.retain(|n| n.id != id);
}

/// Restores a failed drag's pre-move id order without discarding field
/// updates that reconciled while the request was in flight. Ids unknown to
/// the pre-drag order (notes created meanwhile) keep their relative order
/// after the known ones.
pub(crate) fn restore_order(notes: &mut [Note], ordered_ids: &[i64]) {
    notes.sort_by_key(|n| {
        ordered_ids
            .iter()
            .position(|id| *id == n.id)
            .unwrap_or(usize::MAX)
    });
}

/// Trashing the open note closes the editor, but only once the server has
/// confirmed it; restoring never touches the selection.
pub(crate) fn trash_clears_selection(
    was_trashing: bool,
    active_id: Option<i64>,
    note_id: i64,
) -> bool {
    was_trashing && active_id == Some(note_id)
}

/// Whether a pending draft may still be sent when its timer fires: it must
/// belong to the note the timer was armed for, that note must still be the
/// active one, and the draft must differ from the persisted copy.
pub(crate) fn draft_is_flushable(
    notes: &[Note],
    active_id: Option<i64>,
    draft_note_id: i64,
    fired_note_id: i64,
    title: &str,
    content: &str,
) -> bool {
    if draft_note_id != fired_note_id || active_id != Some(fired_note_id) {
        return false;
    }
    match notes.iter().find(|n| n.id == fired_note_id) {
        Some(persisted) => edit_is_dirty(persisted, title, content),
        None => false,
    }
}

/// Derived view: which notes the current filter shows, in collection order.
///
/// Favorite and trashed are independent flags, but the favorites view never
/// shows trashed notes and the default view hides them too.
pub(crate) fn visible_notes(notes: &[Note], filter: NoteFilter) -> Vec<Note> {
    notes
        .iter()
        .filter(|n| match filter {
            NoteFilter::All => !n.is_trashed,
            NoteFilter::Favorites => n.is_favorite && !n.is_trashed,
            NoteFilter::Trashed => n.is_trashed,
        })
        .cloned()
        .collect()
}

pub(crate) fn find_note(notes: &[Note], id: i64) -> Option<Note> {
    notes.iter().find(|n| n.id == id).cloned()
}

/// Skip the autosave network call when nothing actually changed since the
/// last persisted state.
pub(crate) fn edit_is_dirty(persisted: &Note, title: &str, content: &str) -> bool {
    persisted.title != title || persisted.content != content
}

/// Orders concurrent fetches by issuance, not completion.
///
/// Each fetch takes a ticket from `issue`; a completed response is applied
/// only if no response from a later ticket has been applied already. An old
/// in-flight fetch can therefore land while a newer one is pending, but can
/// never overwrite the newer one's result.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FetchSequencer {
    issued: u64,
    applied: u64,
}

impl FetchSequencer {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn try_apply(&mut self, ticket: u64) -> bool {
        if ticket > self.applied {
            self.applied = ticket;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: i64, title: &str) -> Note {
        Note {
            id,
            title: title.to_string(),
            content: String::new(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            tags: vec![],
            is_favorite: false,
            is_trashed: false,
        }
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn move_is_single_element_not_swap() {
        let mut notes = vec![note(1, "A"), note(2, "B"), note(3, "C"), note(4, "D")];
        move_note(&mut notes, 0, 2);
        assert_eq!(titles(&notes), vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn move_backwards() {
        let mut notes = vec![note(1, "A"), note(2, "B"), note(3, "C"), note(4, "D")];
        move_note(&mut notes, 3, 1);
        assert_eq!(titles(&notes), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn move_out_of_range_or_noop_changes_nothing() {
        let mut notes = vec![note(1, "A"), note(2, "B")];
        move_note(&mut notes, 1, 1);
        move_note(&mut notes, 5, 0);
        move_note(&mut notes, 0, 5);
        assert_eq!(titles(&notes), vec!["A", "B"]);
    }

    #[test]
    fn reorder_failure_restores_exact_pre_drag_order() {
        let mut notes = vec![note(1, "A"), note(2, "B"), note(3, "C")];
        let pre_drag: Vec<i64> = notes.iter().map(|n| n.id).collect();
        move_note(&mut notes, 0, 2);
        assert_eq!(titles(&notes), vec!["B", "C", "A"]);

        restore_order(&mut notes, &pre_drag);
        assert_eq!(titles(&notes), vec!["A", "B", "C"]);
    }

    #[test]
    fn reorder_rollback_keeps_fields_reconciled_in_flight() {
        let mut notes = vec![note(1, "A"), note(2, "B"), note(3, "C")];
        let pre_drag: Vec<i64> = notes.iter().map(|n| n.id).collect();
        move_note(&mut notes, 0, 2);

        // An autosave confirms for B while the reorder request is pending.
        let mut server = note(2, "B (saved)");
        server.updated_at = "2024-06-01T09:00:00Z".to_string();
        reconcile_note(&mut notes, server);

        restore_order(&mut notes, &pre_drag);
        assert_eq!(titles(&notes), vec!["A", "B (saved)", "C"]);
        assert_eq!(notes[1].updated_at, "2024-06-01T09:00:00Z");
    }

    #[test]
    fn restore_order_leaves_unknown_ids_after_known_ones() {
        let mut notes = vec![note(9, "new"), note(2, "B"), note(1, "A")];
        restore_order(&mut notes, &[1, 2]);
        assert_eq!(titles(&notes), vec!["A", "B", "new"]);
    }

    #[test]
    fn trash_clears_selection_only_on_confirmed_trash_of_active_note() {
        // Confirmed trash of the open note closes the editor.
        assert!(trash_clears_selection(true, Some(1), 1));
        // Restoring never does, even for the open note.
        assert!(!trash_clears_selection(false, Some(1), 1));
        // Trashing a note that is not open leaves the selection alone.
        assert!(!trash_clears_selection(true, Some(2), 1));
        assert!(!trash_clears_selection(true, None, 1));
    }

    #[test]
    fn draft_for_switched_away_note_is_not_sent() {
        let notes = vec![note(1, "A"), note(2, "B")];
        // The timer for note 1 fires after the user opened note 2.
        assert!(!draft_is_flushable(
            &notes,
            Some(2),
            1,
            1,
            "A edited",
            "body"
        ));
        // Note 2 itself is unaffected: its own dirty draft still flushes.
        assert!(draft_is_flushable(&notes, Some(2), 2, 2, "B edited", ""));
    }

    #[test]
    fn draft_flush_requires_matching_note_and_dirty_content() {
        let notes = vec![note(1, "A")];
        // Stale timer armed for a different note than the draft holds.
        assert!(!draft_is_flushable(&notes, Some(1), 2, 1, "x", "y"));
        // Unchanged title and content never reach the network.
        assert!(!draft_is_flushable(&notes, Some(1), 1, 1, "A", ""));
        // The note vanished from the collection.
        assert!(!draft_is_flushable(&notes, Some(99), 99, 99, "x", "y"));
    }

    #[test]
    fn favorite_toggle_and_rollback() {
        let mut notes = vec![note(1, "A")];
        let prior = toggle_favorite(&mut notes, 1).expect("note exists");
        assert!(!prior);
        assert!(notes[0].is_favorite);

        set_favorite(&mut notes, 1, prior);
        assert!(!notes[0].is_favorite);
    }

    #[test]
    fn trash_toggle_rollback_restores_flag() {
        let mut notes = vec![note(1, "A")];
        notes[0].is_trashed = true;
        let prior = toggle_trashed(&mut notes, 1).expect("note exists");
        assert!(prior);
        assert!(!notes[0].is_trashed);

        set_trashed(&mut notes, 1, prior);
        assert!(notes[0].is_trashed);
    }

    #[test]
    fn toggle_missing_note_is_none() {
        let mut notes = vec![note(1, "A")];
        assert!(toggle_favorite(&mut notes, 99).is_none());
        assert!(toggle_trashed(&mut notes, 99).is_none());
    }

    #[test]
    fn reconcile_keeps_position_and_takes_server_fields() {
        let mut notes = vec![note(1, "A"), note(2, "B")];
        let mut server = note(2, "B (saved)");
        server.updated_at = "2024-06-01T09:00:00Z".to_string();
        reconcile_note(&mut notes, server);
        assert_eq!(titles(&notes), vec!["A", "B (saved)"]);
        assert_eq!(notes[1].updated_at, "2024-06-01T09:00:00Z");
    }

    #[test]
    fn apply_edit_leaves_timestamps_alone() {
        let mut notes = vec![note(1, "A")];
        apply_edit(&mut notes, 1, "A2", "body");
        assert_eq!(notes[0].title, "A2");
        assert_eq!(notes[0].content, "body");
        assert_eq!(notes[0].updated_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn apply_tags_uses_catalog_order() {
        let catalog = vec![
            Tag {
                id: 1,
                name: "a".to_string(),
            },
            Tag {
                id: 2,
                name: "b".to_string(),
            },
        ];
        let mut notes = vec![note(1, "A")];
        apply_tags(&mut notes, 1, &[2, 1], &catalog);
        let names: Vec<_> = notes[0].tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn visible_notes_filters_per_view() {
        let mut a = note(1, "A");
        a.is_favorite = true;
        let mut b = note(2, "B");
        b.is_favorite = true;
        b.is_trashed = true;
        let c = note(3, "C");
        let notes = vec![a, b, c];

        assert_eq!(titles(&visible_notes(&notes, NoteFilter::All)), vec!["A", "C"]);
        // Favorites never shows trashed notes, favorite flag or not.
        assert_eq!(
            titles(&visible_notes(&notes, NoteFilter::Favorites)),
            vec!["A"]
        );
        assert_eq!(
            titles(&visible_notes(&notes, NoteFilter::Trashed)),
            vec!["B"]
        );
    }

    #[test]
    fn dirty_check_skips_redundant_saves() {
        let n = note(1, "A");
        assert!(!edit_is_dirty(&n, "A", ""));
        assert!(edit_is_dirty(&n, "A", "x"));
        assert!(edit_is_dirty(&n, "B", ""));
    }

    #[test]
    fn sequencer_discards_stale_completion() {
        let mut seq = FetchSequencer::default();
        let first = seq.issue();
        let second = seq.issue();

        // Newest completes first and is applied.
        assert!(seq.try_apply(second));
        // The older fetch completes later; its result must be discarded.
        assert!(!seq.try_apply(first));
    }

    #[test]
    fn sequencer_gates_failures_like_successes() {
        // A fetch that fails late is still a response of its ticket: once a
        // newer fetch has applied, the stale failure must be dropped instead
        // of flipping loading state or planting an error banner.
        let mut seq = FetchSequencer::default();
        let failing = seq.issue();
        let newer = seq.issue();

        assert!(seq.try_apply(newer));
        assert!(!seq.try_apply(failing));

        // If the failure lands before the newer response, it applies, and
        // the newer success still supersedes it.
        let mut seq = FetchSequencer::default();
        let failing = seq.issue();
        let newer = seq.issue();
        assert!(seq.try_apply(failing));
        assert!(seq.try_apply(newer));
    }

    #[test]
    fn sequencer_converges_to_newest_issuance() {
        let mut seq = FetchSequencer::default();
        let first = seq.issue();
        let second = seq.issue();

        // Completion in issuance order applies both, ending on the newest.
        assert!(seq.try_apply(first));
        assert!(seq.try_apply(second));
        assert!(!seq.try_apply(first));
    }

    #[test]
    fn remove_note_drops_only_the_target() {
        let mut notes = vec![note(1, "A"), note(2, "B")];
        remove_note(&mut notes, 1);
        assert_eq!(titles(&notes), vec!["B"]);
    }
}
