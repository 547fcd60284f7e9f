// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bounded list of critique notes that drops random entries when it would
/// overflow.
///
/// Random eviction is intentional: it keeps the reviewer loop from anchoring
/// on stale notes while still letting a few survive across many rounds, which
/// gives the scaffolding a lossy form of long-term guidance.
pub struct NotesState {
    max_size: usize,
    notes: Vec<String>,
    rng: StdRng,
}

/// Serializable snapshot of a [`NotesState`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotesSnapshot {
    pub max_size: usize,
    pub notes: Vec<String>,
}

impl NotesState {
    /// Create an empty state.  `max_size` must be positive.
    pub fn new(max_size: usize) -> Self {
        Self::with_rng(max_size, StdRng::from_entropy())
    }

    /// Create an empty state with a deterministic eviction order.
    pub fn with_seed(max_size: usize, seed: u64) -> Self {
        Self::with_rng(max_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_size: usize, rng: StdRng) -> Self {
        assert!(max_size > 0, "max_size must be positive");
        Self { max_size, notes: Vec::new(), rng }
    }

    /// Append `new_notes`, evicting random existing notes if necessary.
    ///
    /// If the batch alone exceeds the capacity only its trailing `max_size`
    /// entries are kept.  When the combined length would overflow, exactly
    /// `overflow` existing notes are removed, chosen uniformly at random
    /// without replacement; the relative order of the survivors is preserved
    /// and the new batch occupies the tail.  Empty strings are dropped before
    /// any sizing.
    pub fn add_batch(&mut self, new_notes: Vec<String>) {
        let mut incoming: Vec<String> =
            new_notes.into_iter().filter(|n| !n.is_empty()).collect();
        if incoming.len() > self.max_size {
            incoming.drain(..incoming.len() - self.max_size);
        }

        let overflow = (self.notes.len() + incoming.len()).saturating_sub(self.max_size);
        if overflow > 0 {
            let mut evict: Vec<usize> =
                rand::seq::index::sample(&mut self.rng, self.notes.len(), overflow).into_vec();
            // Remove from the back so earlier indices stay valid.
            evict.sort_unstable_by(|a, b| b.cmp(a));
            let evicted: Vec<String> = evict.iter().map(|&i| self.notes.remove(i)).collect();
            debug!("evicted {overflow} random note(s): {evicted:?}");
        }

        self.notes.extend(incoming);
        debug!("notes at {}/{}", self.notes.len(), self.max_size);
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Return notes as a 1-based numbered list, or `(none)` when empty.
    /// No trailing newline.
    pub fn format(&self) -> String {
        if self.notes.is_empty() {
            return "(none)".to_string();
        }
        self.notes
            .iter()
            .enumerate()
            .map(|(i, note)| format!("{}. {note}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn snapshot(&self) -> NotesSnapshot {
        NotesSnapshot { max_size: self.max_size, notes: self.notes.clone() }
    }

    /// Replace contents from a snapshot.  The eviction RNG is kept.
    pub fn restore(&mut self, snapshot: NotesSnapshot) {
        assert!(snapshot.max_size > 0, "max_size must be positive");
        self.max_size = snapshot.max_size;
        self.notes = snapshot.notes;
    }

    pub fn from_snapshot(snapshot: NotesSnapshot) -> Self {
        let mut state = Self::new(snapshot.max_size);
        state.restore(snapshot);
        state
    }
}

impl std::fmt::Debug for NotesState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesState")
            .field("max_size", &self.max_size)
            .field("notes", &self.notes.len())
            .finish()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ── Basic mutation ────────────────────────────────────────────────────────

    #[test]
    fn add_batch_appends_in_order() {
        let mut state = NotesState::with_seed(5, 1);
        state.add_batch(strings(&["a", "b"]));
        assert_eq!(state.notes(), &["a", "b"]);
    }

    #[test]
    fn add_empty_batch_is_a_no_op() {
        let mut state = NotesState::with_seed(3, 1);
        state.add_batch(strings(&["a"]));
        state.add_batch(vec![]);
        assert_eq!(state.notes(), &["a"]);
    }

    #[test]
    fn empty_strings_are_dropped() {
        let mut state = NotesState::with_seed(5, 1);
        state.add_batch(strings(&["a", "", "b"]));
        assert_eq!(state.notes(), &["a", "b"]);
    }

    #[test]
    fn clear_empties_the_state() {
        let mut state = NotesState::with_seed(3, 1);
        state.add_batch(strings(&["a", "b"]));
        state.clear();
        assert!(state.is_empty());
    }

    // ── Eviction ──────────────────────────────────────────────────────────────

    #[test]
    fn oversized_batch_keeps_trailing_entries() {
        let mut state = NotesState::with_seed(3, 1);
        state.add_batch(strings(&["1", "2", "3", "4", "5"]));
        assert_eq!(state.notes(), &["3", "4", "5"]);
    }

    #[test]
    fn overflow_evicts_exactly_enough_old_notes() {
        // S4 from the scenario list: max 3, notes [a,b,c], add [d,e].
        let mut state = NotesState::with_seed(3, 42);
        state.add_batch(strings(&["a", "b", "c"]));
        state.add_batch(strings(&["d", "e"]));

        assert_eq!(state.len(), 3);
        assert_eq!(&state.notes()[1..], &["d", "e"], "new notes occupy the tail");
        let survivor = &state.notes()[0];
        assert!(
            ["a", "b", "c"].contains(&survivor.as_str()),
            "survivor must be one of the old notes, got {survivor}"
        );
    }

    #[test]
    fn survivors_keep_their_relative_order() {
        // Evict exactly one from a full state many times; the remaining old
        // notes must always appear in their original relative order.
        for seed in 0..20 {
            let mut state = NotesState::with_seed(4, seed);
            state.add_batch(strings(&["a", "b", "c", "d"]));
            state.add_batch(strings(&["x"]));
            let old: Vec<&String> =
                state.notes().iter().filter(|n| *n != "x").collect();
            assert_eq!(old.len(), 3);
            let mut sorted = old.clone();
            sorted.sort();
            // a < b < c < d lexicographically, so order-preservation means
            // the filtered survivors are already sorted.
            assert_eq!(old, sorted, "seed {seed}: survivor order was disturbed");
            assert_eq!(state.notes().last().unwrap(), "x");
        }
    }

    #[test]
    fn length_never_exceeds_max_size() {
        // Property 1: arbitrary batch sequence, bound holds after every call.
        let mut state = NotesState::with_seed(7, 9);
        for round in 0..50 {
            let batch: Vec<String> =
                (0..(round % 11)).map(|i| format!("note-{round}-{i}")).collect();
            state.add_batch(batch);
            assert!(state.len() <= 7, "round {round}: len {} > 7", state.len());
        }
    }

    #[test]
    fn eviction_count_matches_overflow_formula() {
        // Property 2: evicted = max(0, min(len(b), max) + prev_len - max).
        let max = 6usize;
        let mut state = NotesState::with_seed(max, 3);
        for round in 0..40usize {
            let prev: Vec<String> = state.notes().to_vec();
            let batch: Vec<String> =
                (0..(round * 3 % 9)).map(|i| format!("n{round}-{i}")).collect();
            let expected_evicted =
                (batch.len().min(max) + prev.len()).saturating_sub(max);
            state.add_batch(batch.clone());
            let survivors = state
                .notes()
                .iter()
                .filter(|n| prev.contains(n))
                .count();
            assert_eq!(
                prev.len() - survivors,
                expected_evicted,
                "round {round}: wrong eviction count"
            );
        }
    }

    #[test]
    fn tail_equals_trailing_suffix_of_batch() {
        // Property 3.
        let max = 5usize;
        let mut state = NotesState::with_seed(max, 11);
        state.add_batch(strings(&["p", "q", "r"]));
        let batch = strings(&["s", "t", "u", "v", "w", "x", "y"]);
        state.add_batch(batch.clone());
        let kept = batch.len().min(max);
        assert_eq!(
            &state.notes()[state.len() - kept..],
            &batch[batch.len() - kept..]
        );
    }

    #[test]
    fn same_seed_gives_same_evictions() {
        let run = |seed: u64| {
            let mut state = NotesState::with_seed(4, seed);
            state.add_batch(strings(&["a", "b", "c", "d"]));
            state.add_batch(strings(&["e", "f"]));
            state.notes().to_vec()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn duplicate_notes_are_not_deduplicated() {
        let mut state = NotesState::with_seed(5, 1);
        state.add_batch(strings(&["same", "same"]));
        state.add_batch(strings(&["same"]));
        assert_eq!(state.len(), 3);
    }

    // ── Formatting ────────────────────────────────────────────────────────────

    #[test]
    fn format_empty_is_none_token() {
        let state = NotesState::with_seed(3, 1);
        assert_eq!(state.format(), "(none)");
    }

    #[test]
    fn format_numbers_from_one_without_trailing_newline() {
        let mut state = NotesState::with_seed(3, 1);
        state.add_batch(strings(&["first", "second"]));
        assert_eq!(state.format(), "1. first\n2. second");
    }

    #[test]
    fn format_is_deterministic() {
        // Property 4.
        let mut state = NotesState::with_seed(3, 1);
        state.add_batch(strings(&["x", "y"]));
        assert_eq!(state.format(), state.format());
    }

    // ── Snapshot ──────────────────────────────────────────────────────────────

    #[test]
    fn snapshot_round_trip_preserves_contents() {
        // Property 8.
        let mut state = NotesState::with_seed(4, 5);
        state.add_batch(strings(&["a", "b", "c"]));
        let snap = state.snapshot();
        let restored = NotesState::from_snapshot(snap.clone());
        assert_eq!(restored.snapshot(), snap);
        assert_eq!(restored.max_size(), 4);
        assert_eq!(restored.notes(), state.notes());
    }

    #[test]
    fn snapshot_serialises_to_json_and_back() {
        let snap = NotesSnapshot { max_size: 17, notes: strings(&["one", "two"]) };
        let json = serde_json::to_string(&snap).unwrap();
        let back: NotesSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn restore_keeps_note_order() {
        let snap = NotesSnapshot { max_size: 5, notes: strings(&["z", "a", "m"]) };
        let state = NotesState::from_snapshot(snap);
        assert_eq!(state.notes(), &["z", "a", "m"]);
    }
}
