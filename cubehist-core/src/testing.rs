//! Testing utilities for cube history scans.
//!
//! This module provides tools for integration testing:
//! - fixture builders that render realistic blog pages around a payload
//! - `ScanHarness` for scripted multi-page scans without a live server
//! - Assertion helpers for verifying scan outcomes

use crate::dom::{parse_document, Node};
use crate::history::HistoryError;
use crate::payload::PAYLOAD_MARKER;
use crate::scan::{HistoryScan, ScanOutcome};
use serde_json::json;

/// Render a complete blog page whose payload carries the given changelists,
/// one post per entry, newest first.
///
/// The page includes the chrome a real CubeCobra page has around the
/// payload script, so fixtures exercise the same path as fetched HTML.
pub fn blog_page_html(changelists: &[&str]) -> String {
    let posts: Vec<serde_json::Value> = changelists
        .iter()
        .map(|changelist| json!({ "changelist": changelist }))
        .collect();
    let props = json!({
        "cube": { "name": "Fixture Cube" },
        "posts": posts,
    });
    format!(
        "<!DOCTYPE html>\
         <html><head><title>Blog Posts</title></head>\
         <body>\
         <div class=\"container\"><p>Cube Blog</p><span>A &gt; B in chrome text</span></div>\
         <script>{PAYLOAD_MARKER}{props};</script>\
         </body></html>"
    )
}

/// Parse a fixture page straight to a document tree.
pub fn blog_page_doc(changelists: &[&str]) -> Node {
    parse_document(&blog_page_html(changelists))
}

/// Drives a [`HistoryScan`] over fixture pages, newest first.
pub struct ScanHarness {
    /// The accumulating scan.
    pub scan: HistoryScan,
}

impl ScanHarness {
    /// Create a harness scanning a fixture cube.
    pub fn new() -> Self {
        Self {
            scan: HistoryScan::new("fixture-cube"),
        }
    }

    /// Ingest one fixture page; each changelist is one post, newest first.
    pub fn page(&mut self, changelists: &[&str]) -> &mut Self {
        self.scan.ingest_document(&blog_page_doc(changelists));
        self
    }

    /// Replay and summarize.
    pub fn finish(self) -> Result<ScanOutcome, HistoryError> {
        self.scan.finish()
    }
}

impl Default for ScanHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the outcome's most-varied slot has the given count and history.
#[track_caller]
pub fn assert_most_varied(outcome: &ScanOutcome, variations: usize, history: &str) {
    let report = outcome
        .report
        .as_ref()
        .unwrap_or_else(|| panic!("Expected a report but the scan found no slots"));
    assert_eq!(
        (report.most_varied.variations, report.most_varied.history.as_str()),
        (variations, history),
        "Expected most varied {variations} '{history}', got {} '{}'",
        report.most_varied.variations,
        report.most_varied.history
    );
}

/// Assert the outcome counted the given number of never-changed slots.
#[track_caller]
pub fn assert_unchanged_slots(outcome: &ScanOutcome, expected: usize) {
    let report = outcome
        .report
        .as_ref()
        .unwrap_or_else(|| panic!("Expected a report but the scan found no slots"));
    assert_eq!(
        report.unchanged_slots, expected,
        "Expected {expected} unchanged slots, got {}",
        report.unchanged_slots
    );
}

/// Assert a replay error's message mentions the given card.
#[track_caller]
pub fn assert_error_mentions(error: &HistoryError, card: &str) {
    let message = error.to_string();
    assert!(
        message.contains(card),
        "Expected error to mention '{card}', got '{message}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{additions_in, changes_in};

    #[test]
    fn test_fixture_page_carries_payload() {
        let doc = blog_page_doc(&["Ragavan &gt; Dockside", "Ragavan+Sol Ring"]);

        let changes = changes_in(&doc);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, "Ragavan");

        let additions = additions_in(&doc);
        let cards: Vec<&str> = additions.iter().map(|a| a.card.as_str()).collect();
        assert_eq!(cards, vec!["Ragavan", "Sol Ring"]);
    }

    #[test]
    fn test_chrome_text_is_not_a_payload() {
        // The fixture chrome contains swap-shaped text outside the script;
        // only the payload may contribute events.
        let doc = blog_page_doc(&[]);
        assert!(changes_in(&doc).is_empty());
        assert!(additions_in(&doc).is_empty());
    }

    #[test]
    fn test_harness_scan_flow() {
        let mut harness = ScanHarness::new();
        harness
            .page(&["Dockside &gt; Oko"])
            .page(&["Ragavan &gt; Dockside", "Ragavan+Sol Ring"]);

        let outcome = harness.finish().unwrap();
        assert_most_varied(&outcome, 3, "Ragavan > Dockside > Oko");
        assert_unchanged_slots(&outcome, 1);
    }

    #[test]
    fn test_harness_surfaces_replay_errors() {
        let mut harness = ScanHarness::new();
        harness.page(&["Missing &gt; Card"]);

        let err = harness.finish().unwrap_err();
        assert_error_mentions(&err, "Missing");
        assert_error_mentions(&err, "Card");
    }
}
