//! Locating the embedded page payload.
//!
//! CubeCobra server-renders each blog page with its React props serialized
//! into a script node: `window.reactProps = {...};`. The posts (and their
//! changelists) live inside that JSON, not in the visible markup, so the
//! scan finds the script text and decodes it.

use crate::dom::Node;
use serde::Deserialize;

/// The prefix CubeCobra writes before the serialized page props.
pub const PAYLOAD_MARKER: &str = "window.reactProps = ";

/// The decoded page payload. Only the posts matter here; every other field
/// of the props object is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    /// Blog posts on this page, newest first.
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// One blog post from the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Post {
    /// The post's changelist as an HTML fragment. Empty for posts that did
    /// not change the cube.
    #[serde(default)]
    pub changelist: String,
}

/// Check a single node for the embedded payload.
///
/// Only text leaves qualify, and the text must start with
/// [`PAYLOAD_MARKER`]. Returns `None` for everything else, including text
/// whose payload fails to decode; a malformed payload and no payload look
/// the same to callers.
pub fn locate(node: &Node) -> Option<Page> {
    decode(node.as_text()?)
}

/// Decode payload text of the form `window.reactProps = {...};` into a
/// [`Page`]. The trailing semicolon is optional.
pub fn decode(text: &str) -> Option<Page> {
    let body = text.strip_prefix(PAYLOAD_MARKER)?;
    let body = body.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body);
    serde_json::from_str(body).ok()
}

/// Find the page payload anywhere in a parsed document.
///
/// Decodes the first payload-bearing text leaf in walk order and ignores
/// any later ones; a blog page carries at most one.
pub fn locate_in(doc: &Node) -> Option<Page> {
    doc.walk(|node| match locate(node) {
        Some(page) => vec![page],
        None => Vec::new(),
    })
    .into_iter()
    .next()
}
