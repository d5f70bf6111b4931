//! One full scan: extract events from fetched documents and replay them.
//!
//! Blog pages arrive newest first, and posts are newest first within each
//! page, so the swaps collected across a run form one newest-first log.
//! Additions open slots as soon as they are seen (each opens its own slot,
//! so their order never matters), while swaps are queued and replayed
//! oldest-first after a single reversal at the end.

use crate::dom::Node;
use crate::event::{self, Addition, Change};
use crate::history::{CubeHistory, HistoryError, HistoryReport, Slot};
use crate::payload;
use serde::Serialize;

/// Swap events in one parsed blog document, newest post first.
pub fn changes_in(doc: &Node) -> Vec<Change> {
    match payload::locate_in(doc) {
        Some(page) => event::extract_events(&page, event::CHANGE_SEPARATOR, Change::from_token),
        None => Vec::new(),
    }
}

/// Added-card events in one parsed blog document.
pub fn additions_in(doc: &Node) -> Vec<Addition> {
    match payload::locate_in(doc) {
        Some(page) => event::extract_events(&page, event::ADDITION_SEPARATOR, Addition::from_token),
        None => Vec::new(),
    }
}

/// What one blog page contributed to a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageStats {
    /// Page index in fetch order, 0 = newest.
    pub page: usize,

    /// Cards added on this page.
    pub additions: usize,

    /// Swaps announced on this page.
    pub changes: usize,
}

/// Everything one scan produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    /// The cube that was scanned.
    pub cube_id: String,

    /// Per-page contribution stats, newest first.
    pub pages: Vec<PageStats>,

    /// Total slots discovered.
    pub slots: usize,

    /// Swaps replayed against the slot set.
    pub changes_applied: usize,

    /// The summary, or `None` when the scan found no slots.
    pub report: Option<HistoryReport>,
}

/// Accumulates one scan.
///
/// Feed parsed blog documents newest first (the fetch order), then call
/// [`finish`](HistoryScan::finish) to replay the collected swaps and
/// summarize. Purely synchronous; fetching lives in [`crate::session`].
#[derive(Debug)]
pub struct HistoryScan {
    cube_id: String,
    pages: Vec<PageStats>,
    history: CubeHistory,
    /// Queued swaps in arrival order: newest page first, newest post first
    /// within a page.
    pending: Vec<Change>,
}

impl HistoryScan {
    pub fn new(cube_id: impl Into<String>) -> HistoryScan {
        HistoryScan {
            cube_id: cube_id.into(),
            pages: Vec::new(),
            history: CubeHistory::new(),
            pending: Vec::new(),
        }
    }

    /// Ingest one parsed blog document. Additions open slots immediately;
    /// swaps are queued for [`finish`](HistoryScan::finish).
    pub fn ingest_document(&mut self, doc: &Node) -> PageStats {
        let additions = additions_in(doc);
        let changes = changes_in(doc);
        let stats = PageStats {
            page: self.pages.len(),
            additions: additions.len(),
            changes: changes.len(),
        };
        for addition in additions {
            self.history.add_slot(Slot::from(addition));
        }
        self.pending.extend(changes);
        self.pages.push(stats);
        stats
    }

    /// Pages ingested so far.
    pub fn pages(&self) -> &[PageStats] {
        &self.pages
    }

    /// Replay the queued swaps and summarize.
    ///
    /// The queue arrives newest first, so it is reversed exactly once here
    /// before replay. A swap whose outgoing card no live slot holds aborts
    /// the run.
    pub fn finish(mut self) -> Result<ScanOutcome, HistoryError> {
        self.pending.reverse();
        let changes_applied = self.pending.len();
        for change in self.pending {
            self.history.apply(change)?;
        }
        Ok(ScanOutcome {
            cube_id: self.cube_id,
            pages: self.pages,
            slots: self.history.len(),
            changes_applied,
            report: self.history.report(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PAYLOAD_MARKER;
    use serde_json::json;

    fn payload_node(changelists: &[&str]) -> Node {
        let posts: Vec<serde_json::Value> = changelists
            .iter()
            .map(|changelist| json!({ "changelist": changelist }))
            .collect();
        let text = format!("{PAYLOAD_MARKER}{};", json!({ "posts": posts }));
        Node::element("script", vec![Node::text(text)])
    }

    fn blog_doc(changelists: &[&str]) -> Node {
        Node::document(vec![
            Node::element("div", vec![Node::text("navigation")]),
            payload_node(changelists),
        ])
    }

    #[test]
    fn test_changes_in_finds_payload_node() {
        let doc = blog_doc(&["Ragavan &gt; Dockside"]);
        let changes = changes_in(&doc);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, "Ragavan");
        assert_eq!(changes[0].to, "Dockside");
    }

    #[test]
    fn test_changes_in_ignores_plain_text() {
        let doc = Node::document(vec![Node::element(
            "p",
            vec![Node::text("A &gt; B is not a payload")],
        )]);
        assert!(changes_in(&doc).is_empty());
    }

    #[test]
    fn test_first_payload_node_wins() {
        let doc = Node::document(vec![
            payload_node(&["A &gt; B"]),
            Node::element("footer", vec![payload_node(&["C &gt; D"])]),
        ]);
        let changes = changes_in(&doc);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, "A");
        assert_eq!(changes[0].to, "B");
    }

    #[test]
    fn test_additions_in() {
        let doc = blog_doc(&["Sol Ring+Mana Crypt", "A &gt; B"]);
        let additions = additions_in(&doc);
        let cards: Vec<&str> = additions.iter().map(|a| a.card.as_str()).collect();
        assert_eq!(cards, vec!["Sol Ring", "Mana Crypt"]);
    }

    #[test]
    fn test_ingest_reports_page_stats() {
        let mut scan = HistoryScan::new("test-cube");
        let stats = scan.ingest_document(&blog_doc(&["Sol Ring+Mana Crypt", "A &gt; B"]));
        assert_eq!(
            stats,
            PageStats {
                page: 0,
                additions: 2,
                changes: 1,
            }
        );
        let stats = scan.ingest_document(&blog_doc(&["A+B+C"]));
        assert_eq!(stats.page, 1);
        assert_eq!(stats.additions, 3);
        assert_eq!(stats.changes, 0);
    }

    #[test]
    fn test_finish_replays_newest_first_log_in_order() {
        let mut scan = HistoryScan::new("test-cube");
        // Newest page carries the latest swap; the older page carries the
        // earlier swap and the original addition.
        scan.ingest_document(&blog_doc(&["Dockside &gt; Oko"]));
        scan.ingest_document(&blog_doc(&["Ragavan &gt; Dockside", "Ragavan"]));

        let outcome = scan.finish().unwrap();
        assert_eq!(outcome.slots, 1);
        assert_eq!(outcome.changes_applied, 2);
        let report = outcome.report.unwrap();
        assert_eq!(report.most_varied.variations, 3);
        assert_eq!(report.most_varied.history, "Ragavan > Dockside > Oko");
    }

    #[test]
    fn test_finish_preserves_within_page_order() {
        let mut scan = HistoryScan::new("test-cube");
        // One page, posts newest first: the B>C swap happened after A>B.
        scan.ingest_document(&blog_doc(&["B &gt; C", "A &gt; B", "A"]));

        let outcome = scan.finish().unwrap();
        let report = outcome.report.unwrap();
        assert_eq!(report.most_varied.history, "A > B > C");
    }

    #[test]
    fn test_reversal_spans_pages_and_posts() {
        let mut scan = HistoryScan::new("test-cube");
        // Newest page: two swaps, newest first. Older page: the earliest
        // swap and the addition that opened the slot.
        scan.ingest_document(&blog_doc(&["B &gt; C", "A &gt; B"]));
        scan.ingest_document(&blog_doc(&["X &gt; A", "X"]));

        let outcome = scan.finish().unwrap();
        assert_eq!(outcome.changes_applied, 3);
        let report = outcome.report.unwrap();
        assert_eq!(report.most_varied.variations, 4);
        assert_eq!(report.most_varied.history, "X > A > B > C");
    }

    #[test]
    fn test_unmatched_change_aborts_scan() {
        let mut scan = HistoryScan::new("test-cube");
        // X was never added, so the oldest swap has nothing to rewrite.
        scan.ingest_document(&blog_doc(&["B &gt; C"]));
        scan.ingest_document(&blog_doc(&["X &gt; B", "A"]));

        let err = scan.finish().unwrap_err();
        assert_eq!(
            err,
            HistoryError::UnmatchedChange {
                from: "X".to_string(),
                to: "B".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_scan() {
        let scan = HistoryScan::new("test-cube");
        let outcome = scan.finish().unwrap();
        assert_eq!(outcome.cube_id, "test-cube");
        assert!(outcome.pages.is_empty());
        assert_eq!(outcome.slots, 0);
        assert_eq!(outcome.changes_applied, 0);
        assert_eq!(outcome.report, None);
    }

    #[test]
    fn test_outcome_serializes() {
        let mut scan = HistoryScan::new("test-cube");
        scan.ingest_document(&blog_doc(&["Ragavan &gt; Dockside", "Ragavan"]));
        let outcome = scan.finish().unwrap();

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["cube_id"], "test-cube");
        assert_eq!(value["slots"], 1);
        assert_eq!(value["pages"][0]["changes"], 1);
        assert_eq!(value["report"]["most_varied"]["history"], "Ragavan > Dockside");
    }
}
