//! Slot histories and replay.
//!
//! A cube is a set of slots. Each slot remembers every card it has held,
//! oldest first; a slot has no identifier of its own and is matched only by
//! the card currently in it. Changes must therefore be applied in
//! chronological order: each swap rewrites the very card the next lookup
//! keys on.

use crate::event::{Addition, Change};
use serde::Serialize;
use thiserror::Error;

/// Errors from replaying changes against the slot set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// The log referenced an outgoing card no live slot currently holds.
    /// This means the reconstruction desynced from the real cube, so the
    /// run aborts rather than guess.
    #[error("no slot matches change from '{from}' to '{to}'")]
    UnmatchedChange { from: String, to: String },
}

/// One card slot: every card it has held, oldest first.
///
/// A slot is never empty and never removed from the cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    cards: Vec<String>,
}

impl Slot {
    /// A new slot opened by adding `card` to the cube.
    pub fn new(card: impl Into<String>) -> Slot {
        Slot {
            cards: vec![card.into()],
        }
    }

    /// The card currently in the slot.
    pub fn current(&self) -> &str {
        self.cards.last().map(String::as_str).unwrap_or("")
    }

    /// How many cards the slot has held.
    pub fn variations(&self) -> usize {
        self.cards.len()
    }

    /// Every card the slot has held, oldest first.
    pub fn cards(&self) -> &[String] {
        &self.cards
    }

    /// The slot's full history, oldest to newest, joined with `" > "`.
    pub fn history_line(&self) -> String {
        self.cards.join(" > ")
    }

    /// Record that the current card was swapped out for `card`.
    pub fn update(&mut self, card: impl Into<String>) {
        self.cards.push(card.into());
    }
}

impl From<Addition> for Slot {
    fn from(addition: Addition) -> Slot {
        Slot::new(addition.card)
    }
}

/// The live slot set for one cube, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CubeHistory {
    slots: Vec<Slot>,
}

impl CubeHistory {
    pub fn new() -> CubeHistory {
        CubeHistory::default()
    }

    /// Open a new slot. Slots keep their discovery order; replay and
    /// summarization both scan in this order.
    pub fn add_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Apply one chronological change: the first slot currently holding
    /// `change.from` takes `change.to`. When several slots hold the same
    /// card, the first one in discovery order wins.
    pub fn apply(&mut self, change: Change) -> Result<(), HistoryError> {
        let Change { from, to } = change;
        match self.slots.iter_mut().find(|slot| slot.current() == from) {
            Some(slot) => {
                slot.update(to);
                Ok(())
            }
            None => Err(HistoryError::UnmatchedChange { from, to }),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots in discovery order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The slot that has changed the most. The first slot wins ties; `None`
    /// when no slots exist.
    pub fn most_varied(&self) -> Option<&Slot> {
        let mut best: Option<&Slot> = None;
        for slot in &self.slots {
            let beats = match best {
                Some(current) => slot.variations() > current.variations(),
                None => true,
            };
            if beats {
                best = Some(slot);
            }
        }
        best
    }

    /// How many slots still hold their original card.
    pub fn unchanged_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.variations() == 1)
            .count()
    }

    /// Summarize the replayed history. `None` when no slots exist.
    pub fn report(&self) -> Option<HistoryReport> {
        let best = self.most_varied()?;
        Some(HistoryReport {
            most_varied: SlotSummary {
                variations: best.variations(),
                history: best.history_line(),
            },
            unchanged_slots: self.unchanged_count(),
        })
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryReport {
    /// The slot that changed the most.
    pub most_varied: SlotSummary,

    /// Count of slots that never changed.
    pub unchanged_slots: usize,
}

/// A slot rendered for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    /// How many cards the slot has held.
    pub variations: usize,

    /// The slot's history, oldest to newest, `" > "`-separated.
    pub history: String,
}
