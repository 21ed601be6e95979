//! Markup fragments: a forgiving logos-based HTML fragment parser and the
//! matching serializer used by `inner_html`.
//!
//! The parser is deliberately small: it builds nodes straight into the arena,
//! closes void elements implicitly, keeps `<style>` and `<script>` bodies as raw
//! text, and treats anything it cannot tokenize as text.

use logos::{Lexer, Logos};

use super::node::{NodeData, NodeId, NodeKind};
use super::tree::Dom;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose body is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

// ── Tokens ───────────────────────────────────────────────────────────

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum MarkupToken {
    /// `<!-- ... -->`; the callback consumes through the terminator.
    #[token("<!--", comment_body)]
    Comment,

    /// `<!DOCTYPE html>` and friends. Ignored.
    #[regex(r"<![a-zA-Z][^>]*>")]
    Doctype,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\n\r\f]*>")]
    CloseTag,

    /// `<name`; the callback consumes attributes through the closing `>`,
    /// honouring quotes.
    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", open_tag_rest)]
    OpenTag,

    #[regex(r"[^<]+")]
    Text,
}

fn comment_body(lex: &mut Lexer<MarkupToken>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => {
            let rest = lex.remainder().len();
            lex.bump(rest);
            true
        }
    }
}

fn open_tag_rest(lex: &mut Lexer<MarkupToken>) -> bool {
    let mut quote: Option<char> = None;
    for (index, ch) in lex.remainder().char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '>' => {
                lex.bump(index + 1);
                return true;
            }
            None => {}
        }
    }
    false
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum AttrToken {
    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    #[regex(r#"[^ \t\n\r\f"'=<>]+"#)]
    Bare,
}

// ── Parsing ──────────────────────────────────────────────────────────

/// A parsed start tag.
#[derive(Debug, Clone, PartialEq)]
struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

fn parse_start_tag(slice: &str) -> StartTag {
    let inner = slice
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(slice);
    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    let rest = &inner[name_end..];

    let tokens: Vec<(AttrToken, &str)> = AttrToken::lexer(rest)
        .spanned()
        .filter_map(|(token, span)| token.ok().map(|t| (t, &rest[span])))
        .collect();

    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;
    let mut index = 0;
    while index < tokens.len() {
        let (token, text) = tokens[index];
        index += 1;
        if token != AttrToken::Bare {
            continue;
        }
        if text == "/" {
            self_closing = true;
            continue;
        }
        let (attr_name, trailing_slash) = match text.strip_suffix('/') {
            Some(stripped) if index == tokens.len() && !stripped.is_empty() => (stripped, true),
            _ => (text, false),
        };
        self_closing |= trailing_slash;

        let mut value = String::new();
        if !trailing_slash && tokens.get(index).map(|(t, _)| *t) == Some(AttrToken::Eq) {
            index += 1;
            if let Some(&(kind, raw)) = tokens.get(index) {
                index += 1;
                value = match kind {
                    AttrToken::DoubleQuoted | AttrToken::SingleQuoted => {
                        decode_entities(&raw[1..raw.len() - 1])
                    }
                    AttrToken::Bare => decode_entities(raw),
                    AttrToken::Eq => String::new(),
                };
            }
        }

        let attr_name = attr_name.to_ascii_lowercase();
        if !attributes.iter().any(|(n, _)| *n == attr_name) {
            attributes.push((attr_name, value));
        }
    }

    StartTag {
        name,
        attributes,
        self_closing,
    }
}

/// Parse `markup` and append the resulting nodes to `parent`.
///
/// Every created node is owned by `owner`. Returns the new top-level nodes
/// (the ones whose parent is `parent`) in document order.
pub fn parse_into(dom: &mut Dom, parent: NodeId, owner: Option<NodeId>, markup: &str) -> Vec<NodeId> {
    let mut stack: Vec<NodeId> = vec![parent];
    let mut top_level = Vec::new();
    let mut lexer = MarkupToken::lexer(markup);

    while let Some(result) = lexer.next() {
        let slice = lexer.slice();
        let current = stack.last().copied().unwrap_or(parent);
        match result {
            Ok(MarkupToken::Doctype) => {}
            Ok(MarkupToken::Comment) => {
                let body = slice
                    .strip_prefix("<!--")
                    .map(|s| s.strip_suffix("-->").unwrap_or(s))
                    .unwrap_or_default();
                let id = dom.insert_child(current, NodeData::comment(body).with_owner(owner));
                if stack.len() == 1 {
                    top_level.push(id);
                }
            }
            Ok(MarkupToken::OpenTag) => {
                let tag = parse_start_tag(slice);
                let mut data = NodeData::element(&tag.name).with_owner(owner);
                data.attributes = tag.attributes;
                let id = dom.insert_child(current, data);
                if stack.len() == 1 {
                    top_level.push(id);
                }

                if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) && !tag.self_closing {
                    let rest = lexer.remainder();
                    let close = format!("</{}", tag.name);
                    let end = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
                    if end > 0 {
                        dom.insert_child(id, NodeData::text(&rest[..end]).with_owner(owner));
                    }
                    let after = rest[end..].find('>').map(|i| end + i + 1).unwrap_or(rest.len());
                    lexer.bump(after);
                } else if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                    stack.push(id);
                }
            }
            Ok(MarkupToken::CloseTag) => {
                let name = slice[2..slice.len() - 1].trim().to_ascii_lowercase();
                let open = stack
                    .iter()
                    .enumerate()
                    .skip(1)
                    .rev()
                    .find(|(_, node)| dom.get(**node).is_some_and(|data| data.tag == name))
                    .map(|(index, _)| index);
                if let Some(index) = open {
                    stack.truncate(index);
                }
            }
            Ok(MarkupToken::Text) => {
                if let Some(id) = append_text(dom, current, owner, &decode_entities(slice)) {
                    if stack.len() == 1 {
                        top_level.push(id);
                    }
                }
            }
            Err(()) => {
                if let Some(id) = append_text(dom, current, owner, slice) {
                    if stack.len() == 1 {
                        top_level.push(id);
                    }
                }
            }
        }
    }

    top_level
}

/// Append text to `parent`, merging into a trailing text node.
/// Returns the id only when a new node was created.
fn append_text(dom: &mut Dom, parent: NodeId, owner: Option<NodeId>, text: &str) -> Option<NodeId> {
    if text.is_empty() {
        return None;
    }
    if let Some(&last) = dom.children(parent).last() {
        if let Some(data) = dom.get_mut(last) {
            if data.kind == NodeKind::Text {
                data.text.push_str(text);
                return None;
            }
        }
    }
    Some(dom.insert_child(parent, NodeData::text(text).with_owner(owner)))
}

/// Decode the handful of named entities markup templates use, plus numeric
/// references. Unknown entities are kept verbatim.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ── Serialization ────────────────────────────────────────────────────

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Serialize the light-tree children of `id`.
pub fn serialize_children(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    let raw = dom
        .get(id)
        .is_some_and(|data| RAW_TEXT_ELEMENTS.contains(&data.tag.as_str()));
    for &child in dom.children(id) {
        write_node(dom, child, raw, &mut out);
    }
    out
}

/// Serialize a node and its light-tree descendants.
pub fn serialize_node(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

fn write_node(dom: &Dom, id: NodeId, raw_text: bool, out: &mut String) {
    let Some(data) = dom.get(id) else {
        return;
    };
    match data.kind {
        NodeKind::Text if raw_text => out.push_str(&data.text),
        NodeKind::Text => escape_text(&data.text, out),
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&data.text);
            out.push_str("-->");
        }
        NodeKind::Document | NodeKind::ShadowRoot => out.push_str(&serialize_children(dom, id)),
        NodeKind::Element => {
            out.push('<');
            out.push_str(&data.tag);
            for (name, value) in &data.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            if !data.style.is_empty() && data.attribute("style").is_none() {
                out.push_str(" style=\"");
                let declarations: Vec<String> = data
                    .style
                    .iter()
                    .map(|(property, value)| format!("{property}: {value};"))
                    .collect();
                escape_attribute(&declarations.join(" "), out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                return;
            }
            out.push_str(&serialize_children(dom, id));
            out.push_str("</");
            out.push_str(&data.tag);
            out.push('>');
        }
    }
}
