//! Find index (spec component C8): case-insensitive substring search over
//! row text, scanned in cooperative batches so a host's UI thread stays
//! responsive across a large scrollback.
//!
//! Not present in the teacher, which has no find-bar feature; built from
//! spec.md §4.8/§5 directly, reusing the same "batch, cancel via a tagged
//! handle" shape spec.md §5 describes for the scroll port's deferred
//! redraw coalescing, applied here to row search instead of rendering. The
//! host drives [`FindIndex::tick`] from whatever scheduler it has (a timer,
//! an idle callback, a `requestAnimationFrame`-equivalent); this module owns
//! no thread or timer itself, matching the single-threaded, cooperative
//! concurrency model in spec.md §5.

use std::collections::BTreeMap;

/// One matching row: every byte offset (into the row's text) where the
/// query was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMatch {
    pub row_index: usize,
    pub offsets: Vec<usize>,
}

/// Current selection within the hit set, reported to the host as
/// `(ordinal + 1, total)` per spec.md §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub row_index: usize,
    pub offset: usize,
    pub ordinal: usize,
}

/// A host-supplied row-text source. `row_count` and `row_text` mirror
/// [`crate::terminal::Terminal::row_count`]/`get_row_text`, kept as a trait
/// so the find index has no direct dependency on the terminal module (it
/// only ever needs read-only text access, per spec.md §5's "collaborators
/// hold read-only views").
pub trait RowTextSource {
    fn row_count(&self) -> usize;
    fn row_text(&self, absolute_index: usize) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Scanning { next_row: usize, total_rows: usize },
    Done { total_rows: usize },
}

/// Batched, restartable, case-insensitive row search.
#[derive(Debug, Clone)]
pub struct FindIndex {
    query: String,
    state: State,
    batch_size: usize,
    hits: BTreeMap<usize, Vec<usize>>,
    hit_rows: Vec<usize>,
    selected: Option<usize>, // index into hit_rows
}

impl FindIndex {
    pub fn new(batch_size: usize) -> Self {
        Self {
            query: String::new(),
            state: State::Idle,
            batch_size: batch_size.max(1),
            hits: BTreeMap::new(),
            hit_rows: Vec::new(),
            selected: None,
        }
    }

    pub fn set_batch_size(&mut self, n: usize) {
        self.batch_size = n.max(1);
    }

    /// Reset state and begin batched scanning for `text`. An empty query
    /// clears the index without scheduling any work.
    pub fn start(&mut self, text: &str, source: &dyn RowTextSource) {
        self.hits.clear();
        self.hit_rows.clear();
        self.selected = None;
        self.query = text.to_lowercase();

        if self.query.is_empty() {
            self.state = State::Idle;
            return;
        }

        let total_rows = source.row_count();
        self.state = if total_rows == 0 {
            State::Done { total_rows: 0 }
        } else {
            State::Scanning { next_row: 0, total_rows }
        };
    }

    /// Cancel any pending batch and discard scanning state. Per spec.md
    /// §5, a late batch completion must check for this and self-cancel;
    /// here that's structural — once `stop()` sets `State::Idle`, `tick`
    /// on a stale scan token is simply never called again because the host
    /// owns the scheduling loop, not a background task.
    pub fn stop(&mut self) {
        self.state = State::Idle;
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, State::Scanning { .. })
    }

    /// Scan up to `batch_size` more rows. No-op if idle or already done.
    pub fn tick(&mut self, source: &dyn RowTextSource) {
        let State::Scanning { next_row, total_rows } = self.state else {
            return;
        };
        let end = (next_row + self.batch_size).min(total_rows);
        for row_index in next_row..end {
            if let Some(text) = source.row_text(row_index) {
                let offsets = find_offsets(&text, &self.query);
                if !offsets.is_empty() {
                    self.hits.insert(row_index, offsets.clone());
                    self.hit_rows.push(row_index);
                }
            }
        }
        self.state = if end >= total_rows {
            State::Done { total_rows }
        } else {
            State::Scanning { next_row: end, total_rows }
        };
    }

    /// Run [`FindIndex::tick`] until scanning completes. Useful for tests
    /// and hosts that don't need to stay responsive (e.g. a headless CLI).
    pub fn run_to_completion(&mut self, source: &dyn RowTextSource) {
        while self.is_scanning() {
            self.tick(source);
        }
    }

    /// `(matched_rows, rows_scanned_so_far, total_rows)`.
    pub fn progress(&self) -> (usize, usize, usize) {
        match self.state {
            State::Idle => (0, 0, 0),
            State::Scanning { next_row, total_rows } => (self.hit_rows.len(), next_row, total_rows),
            State::Done { total_rows } => (self.hit_rows.len(), total_rows, total_rows),
        }
    }

    pub fn total_matches(&self) -> usize {
        self.hit_rows.len()
    }

    pub fn matches_for_row(&self, row_index: usize) -> Option<&[usize]> {
        self.hits.get(&row_index).map(Vec::as_slice)
    }

    pub fn selection(&self) -> Option<Selection> {
        let ordinal = self.selected?;
        let row_index = *self.hit_rows.get(ordinal)?;
        let offset = *self.hits.get(&row_index)?.first()?;
        Some(Selection { row_index, offset, ordinal })
    }

    /// Advance to the next hit, wrapping at the end. If scanning hasn't
    /// finished, this only considers rows already scanned (a brute-force
    /// scan of what's visible so far, per spec.md §4.8); once `Done`, the
    /// hit index is complete and advancing is exact.
    pub fn next(&mut self) -> Option<Selection> {
        if self.hit_rows.is_empty() {
            return None;
        }
        let next_ordinal = match self.selected {
            Some(i) => (i + 1) % self.hit_rows.len(),
            None => 0,
        };
        self.selected = Some(next_ordinal);
        self.selection()
    }

    pub fn prev(&mut self) -> Option<Selection> {
        if self.hit_rows.is_empty() {
            return None;
        }
        let prev_ordinal = match self.selected {
            Some(0) | None => self.hit_rows.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(prev_ordinal);
        self.selection()
    }
}

/// All byte offsets in `text` (compared case-insensitively) where `query`
/// occurs, including overlapping matches.
fn find_offsets(text: &str, query: &str) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    let mut offsets = Vec::new();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(query) {
        let abs = start + pos;
        offsets.push(abs);
        start = abs + 1;
        if start >= haystack.len() {
            break;
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRows(Vec<String>);
    impl RowTextSource for FakeRows {
        fn row_count(&self) -> usize {
            self.0.len()
        }
        fn row_text(&self, i: usize) -> Option<String> {
            self.0.get(i).cloned()
        }
    }

    #[test]
    fn finds_across_scrollback_and_cycles_in_order() {
        let rows: Vec<String> = (0..200)
            .map(|i| if i % 2 == 0 { format!("row {i} needle") } else { format!("row {i} plain") })
            .collect();
        let source = FakeRows(rows);

        let mut index = FindIndex::new(50);
        index.start("needle", &source);
        index.run_to_completion(&source);

        assert_eq!(index.total_matches(), 100);

        let first = index.next().unwrap();
        assert_eq!(first.row_index, 0);
        let second = index.next().unwrap();
        assert_eq!(second.row_index, 2);

        // Currently at ordinal 1 (100 hits total); advance 98 more times to
        // reach ordinal 99, then once more to wrap back to ordinal 0.
        for _ in 0..98 {
            index.next();
        }
        let wrapped = index.next().unwrap();
        assert_eq!(wrapped.row_index, first.row_index); // wrapped back to the first hit
    }

    #[test]
    fn case_insensitive_and_multiple_offsets_per_row() {
        let source = FakeRows(vec!["NeeDLE needle NEEDLE".to_string()]);
        let mut index = FindIndex::new(50);
        index.start("needle", &source);
        index.run_to_completion(&source);
        assert_eq!(index.matches_for_row(0).unwrap().len(), 3);
    }

    #[test]
    fn stop_cancels_pending_scan() {
        let rows: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        let source = FakeRows(rows);
        let mut index = FindIndex::new(2);
        index.start("line", &source);
        index.tick(&source);
        assert!(index.is_scanning());
        index.stop();
        assert!(!index.is_scanning());
        assert_eq!(index.progress(), (0, 0, 0));
    }

    #[test]
    fn batches_progress_incrementally() {
        let rows: Vec<String> = (0..120).map(|i| format!("row{i}")).collect();
        let source = FakeRows(rows);
        let mut index = FindIndex::new(50);
        index.start("row", &source);
        index.tick(&source);
        let (_matched, scanned, total) = index.progress();
        assert_eq!(scanned, 50);
        assert_eq!(total, 120);
        assert!(index.is_scanning());
        index.tick(&source);
        index.tick(&source);
        assert!(!index.is_scanning());
    }
}
