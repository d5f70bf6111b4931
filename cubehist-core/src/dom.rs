//! Minimal document tree and a forgiving HTML parser.
//!
//! CubeCobra blog pages are server-rendered HTML, and the history scan needs
//! exactly two things from them: the script text node carrying the embedded
//! page payload, and the plain text of changelist fragments. This module
//! provides a small tree ([`Node`]), a tolerant parser ([`parse_document`])
//! that never fails on malformed markup, and the pre-order walk the
//! extractors run on.

/// Elements whose content is raw text: no child tags and no character
/// references until the matching close tag. Keeping script text verbatim is
/// what lets the embedded JSON payload survive byte-for-byte.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Void elements never take children.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Open-element depth cap. An element opened past the cap is kept childless
/// and its content parses as siblings, so pathological nesting cannot blow
/// the stack in later recursive walks.
const MAX_DEPTH: usize = 256;

/// One node of a parsed page.
///
/// Tag names are ASCII-lowercased. Text inside ordinary elements has
/// character references decoded; text inside raw-text elements is verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// The root produced by [`parse_document`].
    Document { children: Vec<Node> },
    /// An element and its ordered children. Attributes are not retained.
    Element { tag: String, children: Vec<Node> },
    /// A text leaf.
    Text(String),
}

impl Node {
    /// A document root over the given children.
    pub fn document(children: Vec<Node>) -> Self {
        Node::Document { children }
    }

    /// An element node. The tag is lowercased to match parser output.
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.into().to_ascii_lowercase(),
            children,
        }
    }

    /// A text leaf.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// The node's children; empty for text leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children } | Node::Element { children, .. } => children,
            Node::Text(_) => &[],
        }
    }

    /// The text of a text leaf.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(value) => Some(value),
            _ => None,
        }
    }

    /// The element's tag name.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Visit every node in pre-order (a node before its children, children
    /// left to right) and concatenate whatever `extract` yields at each.
    pub fn walk<T, F>(&self, mut extract: F) -> Vec<T>
    where
        F: FnMut(&Node) -> Vec<T>,
    {
        fn visit<T, F>(node: &Node, extract: &mut F, out: &mut Vec<T>)
        where
            F: FnMut(&Node) -> Vec<T>,
        {
            out.extend(extract(node));
            for child in node.children() {
                visit(child, extract, out);
            }
        }
        let mut out = Vec::new();
        visit(self, &mut extract, &mut out);
        out
    }

    /// Concatenate every text leaf under this node in document order.
    pub fn rendered_text(&self) -> String {
        fn collect(node: &Node, out: &mut String) {
            if let Node::Text(value) = node {
                out.push_str(value);
            }
            for child in node.children() {
                collect(child, out);
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}

/// Parse an HTML document or fragment into a [`Node`] tree.
///
/// The parser is deliberately forgiving: comments and doctypes are skipped,
/// stray `<` becomes text, close tags with no matching open are ignored, and
/// anything still open at end of input is closed there. It always produces a
/// best-effort tree.
pub fn parse_document(html: &str) -> Node {
    Parser::new(html).run()
}

struct Frame {
    /// Empty for the bottom document frame.
    tag: String,
    children: Vec<Node>,
}

struct Parser<'a> {
    html: &'a str,
    pos: usize,
    /// Open elements. The bottom frame collects document children and is
    /// never popped by tag matching.
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    fn new(html: &'a str) -> Self {
        Parser {
            html,
            pos: 0,
            stack: vec![Frame {
                tag: String::new(),
                children: Vec::new(),
            }],
        }
    }

    fn run(mut self) -> Node {
        while self.pos < self.html.len() {
            match self.html[self.pos..].find('<') {
                Some(offset) => {
                    if offset > 0 {
                        let text = &self.html[self.pos..self.pos + offset];
                        self.push_text(decode_entities(text));
                        self.pos += offset;
                    }
                    self.consume_markup();
                }
                None => {
                    let text = &self.html[self.pos..];
                    self.push_text(decode_entities(text));
                    self.pos = self.html.len();
                }
            }
        }
        while self.stack.len() > 1 {
            self.close_top();
        }
        let children = self.stack.pop().map(|frame| frame.children).unwrap_or_default();
        Node::Document { children }
    }

    /// Consume one `<`-introduced construct. `self.pos` sits on the `<`.
    fn consume_markup(&mut self) {
        let rest = &self.html[self.pos..];
        let after = &rest[1..];

        if let Some(comment) = after.strip_prefix("!--") {
            self.pos += match comment.find("-->") {
                Some(end) => 4 + end + 3,
                None => rest.len(),
            };
        } else if after.starts_with('!') || after.starts_with('?') {
            // Doctype or processing instruction: skip to the closing '>'.
            self.pos += match after.find('>') {
                Some(end) => 2 + end,
                None => rest.len(),
            };
        } else if let Some(close) = after.strip_prefix('/') {
            let name: String = close
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect();
            if !name.is_empty() {
                self.close_tag(&name.to_ascii_lowercase());
            }
            self.pos += match close.find('>') {
                Some(end) => 3 + end,
                None => rest.len(),
            };
        } else if after.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.consume_open_tag();
        } else {
            // Stray '<' is plain text.
            self.push_text("<".to_string());
            self.pos += 1;
        }
    }

    /// Consume an open tag at `self.pos` and push the element it produces,
    /// either onto the open stack or directly into the current frame.
    fn consume_open_tag(&mut self) {
        let after = &self.html[self.pos + 1..];
        let name_len: usize = after
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .map(char::len_utf8)
            .sum();
        let name = after[..name_len].to_ascii_lowercase();

        // Find the closing '>', skipping any inside quoted attribute values.
        let attrs = &after[name_len..];
        let mut quote: Option<char> = None;
        let mut tag_end = None;
        for (i, c) in attrs.char_indices() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' => quote = Some(c),
                    '>' => {
                        tag_end = Some(i);
                        break;
                    }
                    _ => {}
                },
            }
        }
        let Some(tag_end) = tag_end else {
            // Unterminated tag: drop it and stop.
            self.pos = self.html.len();
            return;
        };
        let self_closing = attrs[..tag_end].trim_end().ends_with('/');
        self.pos += 1 + name_len + tag_end + 1;

        if RAW_TEXT_TAGS.contains(&name.as_str()) && !self_closing {
            let start = self.pos;
            let (content_end, resume) = find_raw_close(self.html, start, &name);
            let content = &self.html[start..content_end];
            let children = if content.is_empty() {
                Vec::new()
            } else {
                vec![Node::Text(content.to_string())]
            };
            self.push_node(Node::Element { tag: name, children });
            self.pos = resume;
        } else if self_closing || VOID_TAGS.contains(&name.as_str()) {
            self.push_node(Node::Element {
                tag: name,
                children: Vec::new(),
            });
        } else if self.stack.len() >= MAX_DEPTH {
            self.push_node(Node::Element {
                tag: name,
                children: Vec::new(),
            });
        } else {
            self.stack.push(Frame {
                tag: name,
                children: Vec::new(),
            });
        }
    }

    /// Close the nearest open element named `name`, folding everything above
    /// it first. A close tag with no matching open element is ignored.
    fn close_tag(&mut self, name: &str) {
        let found = (1..self.stack.len()).rev().find(|&i| self.stack[i].tag == name);
        if let Some(idx) = found {
            while self.stack.len() > idx {
                self.close_top();
            }
        }
    }

    fn close_top(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(frame) = self.stack.pop() {
            self.push_node(Node::Element {
                tag: frame.tag,
                children: frame.children,
            });
        }
    }

    fn push_text(&mut self, text: String) {
        if !text.is_empty() {
            self.push_node(Node::Text(text));
        }
    }

    fn push_node(&mut self, node: Node) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(node);
        }
    }
}

/// Find the close tag ending a raw-text element. Returns the end of the raw
/// content and the position to resume parsing after the close tag. Content
/// runs to end of input when no close tag exists.
fn find_raw_close(html: &str, from: usize, tag: &str) -> (usize, usize) {
    let hay = &html[from..];
    let mut search = 0;
    while let Some(found) = hay[search..].find("</") {
        let start = search + found;
        let candidate = &hay[start + 2..];
        if let Some(head) = candidate.get(..tag.len()) {
            if head.eq_ignore_ascii_case(tag) {
                let boundary = candidate[tag.len()..].chars().next();
                let matches = match boundary {
                    None => true,
                    Some(c) => c == '>' || c == '/' || c.is_ascii_whitespace(),
                };
                if matches {
                    let content_end = from + start;
                    let resume = match candidate.find('>') {
                        Some(gt) => from + start + 2 + gt + 1,
                        None => html.len(),
                    };
                    return (content_end, resume);
                }
            }
        }
        search = start + 2;
    }
    (html.len(), html.len())
}

/// Decode HTML character references in ordinary text. Unrecognized
/// references stay literal.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match parse_reference(tail) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse one `&...;` reference at the start of `text` (which begins with
/// `&`). Returns the decoded char and the byte length consumed.
fn parse_reference(text: &str) -> Option<(char, usize)> {
    let semi = text[1..].find(';')?;
    if semi == 0 || semi > 31 {
        return None;
    }
    let body = &text[1..1 + semi];
    let consumed = semi + 2;
    let decoded = if let Some(num) = body.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        char::from_u32(code)?
    } else {
        named_reference(body)?
    };
    Some((decoded, consumed))
}

/// The named references that actually show up in card names and changelists.
fn named_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        "lsquo" => Some('\u{2018}'),
        "rsquo" => Some('\u{2019}'),
        "ldquo" => Some('\u{201c}'),
        "rdquo" => Some('\u{201d}'),
        "hellip" => Some('\u{2026}'),
        "larr" => Some('\u{2190}'),
        "rarr" => Some('\u{2192}'),
        "bull" => Some('\u{2022}'),
        "middot" => Some('\u{b7}'),
        "times" => Some('\u{d7}'),
        _ => None,
    }
}
