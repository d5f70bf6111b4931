//! The changelist event grammar.
//!
//! A post's changelist is an HTML fragment whose rendered text encodes two
//! kinds of events. Swap entries are separated by `→` and each reads
//! `Old > New`; added cards are separated by `+`. Tokens that fit neither
//! shape are silently skipped, so a malformed entry never poisons the rest
//! of a changelist.

use crate::dom::parse_document;
use crate::payload::Page;

/// Separator between swap entries in a rendered changelist.
pub const CHANGE_SEPARATOR: char = '→';

/// Separator between added cards in a rendered changelist.
pub const ADDITION_SEPARATOR: char = '+';

/// A card swap: `from` left the cube and `to` took over its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: String,
    pub to: String,
}

impl Change {
    /// Parse one swap entry of the form `Old > New`.
    ///
    /// The token must split on `>` into exactly two non-empty pieces; both
    /// are trimmed. Anything else is not a swap and yields `None`.
    pub fn from_token(token: &str) -> Option<Change> {
        let mut pieces = token.split('>').filter(|piece| !piece.is_empty());
        let from = pieces.next()?;
        let to = pieces.next()?;
        if pieces.next().is_some() {
            return None;
        }
        Some(Change {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        })
    }
}

/// A card added to the cube, opening a new slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    pub card: String,
}

impl Addition {
    /// Parse one added-card entry. Tokens containing `>` are swap entries,
    /// not additions, and yield `None`.
    pub fn from_token(token: &str) -> Option<Addition> {
        if token.contains('>') {
            return None;
        }
        Some(Addition {
            card: token.trim().to_string(),
        })
    }
}

/// Run one grammar over every changelist in a page.
///
/// Each changelist is parsed as an HTML fragment, its rendered text is split
/// on `separator` (empty tokens dropped), and `factory` decides which tokens
/// become events. Order follows the posts, then the text within each post.
pub fn extract_events<T>(
    page: &Page,
    separator: char,
    factory: impl Fn(&str) -> Option<T>,
) -> Vec<T> {
    page.posts
        .iter()
        .flat_map(|post| {
            let text = parse_document(&post.changelist).rendered_text();
            text.split(separator)
                .filter(|token| !token.is_empty())
                .filter_map(&factory)
                .collect::<Vec<T>>()
        })
        .collect()
}
