//! Flat view of slide markup: tags and text with byte spans into the source.
//!
//! Built on the `quick_xml` event reader. It only needs to answer structural
//! questions ("is this text the sole content of an `<a:t>` element?") while
//! keeping exact byte offsets into the original string, so callers can splice
//! replacements without re-serializing anything they did not touch.

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Named and numeric character references such as `&amp;` or `&#233;`.
static ENTITY_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:[A-Za-z_][A-Za-z0-9._-]*|#[0-9]+|#x[0-9A-Fa-f]+);").unwrap()
});

/// Local name of a text-run element (`<a:t>`).
const RUN_ELEMENT: &str = "t";

/// Local name of a paragraph element (`<a:p>`).
const PARAGRAPH_ELEMENT: &str = "p";

/// Kind of a scanned node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
    /// `<name ... />`
    Empty,
    /// Character data between tags, still entity-encoded.
    Text,
    /// Comments, processing instructions, CDATA and doctype.
    Other,
}

/// A node in the flat node sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node<'a> {
    pub kind: NodeKind,
    /// Qualified tag name; empty for text and other nodes.
    pub name: &'a str,
    /// Byte span of the whole node in the source.
    pub span: Range<usize>,
}

impl<'a> Node<'a> {
    fn text(span: Range<usize>) -> Self {
        Self {
            kind: NodeKind::Text,
            name: "",
            span,
        }
    }

    fn is_element(&self, local: &str) -> bool {
        matches!(self.kind, NodeKind::Open | NodeKind::Close | NodeKind::Empty)
            && local_name(self.name) == local
    }
}

/// A paragraph element and the character data found inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Paragraph {
    /// Spans of every text node inside the paragraph.
    pub texts: Vec<Range<usize>>,
    /// Whether any text-run element appears inside the paragraph.
    pub has_run: bool,
}

/// Split markup into a flat node sequence.
///
/// Tag spans run from the `<` to one past the `>`; text spans cover the raw,
/// still-encoded character data. Mismatched end tags are tolerated. Anything
/// after a point the reader cannot get past is kept as a single text node.
pub(crate) fn scan(xml: &str) -> Vec<Node<'_>> {
    let mut reader = Reader::from_str(xml);
    reader.check_end_names(false);

    let mut nodes = Vec::new();
    let mut last = 0;

    loop {
        let (kind, name_len) = match reader.read_event() {
            Ok(Event::Text(e)) => {
                // Character data runs up to the next `<` or the end of input.
                let end = xml[last..].find('<').map_or(xml.len(), |i| last + i);
                let start = end.saturating_sub(e.len()).max(last);
                if end > start {
                    nodes.push(Node::text(start..end));
                }
                last = end;
                continue;
            }
            Ok(Event::Start(e)) => (NodeKind::Open, e.name().as_ref().len()),
            Ok(Event::Empty(e)) => (NodeKind::Empty, e.name().as_ref().len()),
            Ok(Event::End(e)) => (NodeKind::Close, e.name().as_ref().len()),
            Ok(Event::Eof) => break,
            Ok(_) => (NodeKind::Other, 0),
            Err(e) => {
                log::debug!("Scanning stopped at byte {}: {}", last, e);
                break;
            }
        };

        let end = reader.buffer_position().min(xml.len());
        let start = xml[last..end].find('<').map_or(last, |i| last + i);
        let name_start = match kind {
            NodeKind::Close => start + 2,
            _ => start + 1,
        };

        nodes.push(Node {
            kind,
            name: xml.get(name_start..name_start + name_len).unwrap_or(""),
            span: start..end,
        });
        last = end;
    }

    if last < xml.len() {
        nodes.push(Node::text(last..xml.len()));
    }

    nodes
}

/// Content spans of every text-run element whose only child is character data.
///
/// `<a:t>Hello</a:t>` yields the span of `Hello`; empty runs, self-closing
/// runs and runs with comments or nested tags are not reported.
pub(crate) fn text_runs(nodes: &[Node<'_>]) -> Vec<Range<usize>> {
    nodes
        .windows(3)
        .filter(|w| {
            w[0].kind == NodeKind::Open
                && w[0].is_element(RUN_ELEMENT)
                && w[1].kind == NodeKind::Text
                && w[2].kind == NodeKind::Close
                && w[2].is_element(RUN_ELEMENT)
        })
        .map(|w| w[1].span.clone())
        .collect()
}

/// Every closed paragraph element, outermost only, in document order.
pub(crate) fn paragraphs(nodes: &[Node<'_>]) -> Vec<Paragraph> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut current = Paragraph {
        texts: Vec::new(),
        has_run: false,
    };

    for node in nodes {
        match node.kind {
            NodeKind::Open if node.is_element(PARAGRAPH_ELEMENT) => {
                depth += 1;
            }
            NodeKind::Close if depth > 0 && node.is_element(PARAGRAPH_ELEMENT) => {
                depth -= 1;
                if depth == 0 {
                    found.push(std::mem::replace(
                        &mut current,
                        Paragraph {
                            texts: Vec::new(),
                            has_run: false,
                        },
                    ));
                }
            }
            NodeKind::Open | NodeKind::Empty if depth > 0 && node.is_element(RUN_ELEMENT) => {
                current.has_run = true;
            }
            NodeKind::Text if depth > 0 => {
                current.texts.push(node.span.clone());
            }
            _ => {}
        }
    }

    found
}

/// Spans of all character data outside tags.
pub(crate) fn text_spans(nodes: &[Node<'_>]) -> Vec<Range<usize>> {
    nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Text)
        .map(|n| n.span.clone())
        .collect()
}

/// Byte ranges of the entity references in raw character data.
pub(crate) fn entity_refs(raw: &str) -> Vec<Range<usize>> {
    ENTITY_REF_REGEX.find_iter(raw).map(|m| m.range()).collect()
}

/// Decode entity references. Text with an unknown or broken reference is
/// returned as-is.
pub fn decode_text(raw: &str) -> String {
    match unescape(raw) {
        Ok(text) => text.into_owned(),
        Err(e) => {
            log::debug!("Keeping undecodable text as-is ({}): {:?}", e, raw);
            raw.to_string()
        }
    }
}

/// Encode `&`, `<`, `>`, `"` and `'` as entity references.
pub fn encode_text(text: &str) -> String {
    escape(text).into_owned()
}

/// Whether the markup parses cleanly: balanced, matching tags and decodable
/// character data.
pub fn is_well_formed(xml: &str) -> bool {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Ok(Event::Text(ref e)) => {
                if e.unescape().is_err() {
                    return false;
                }
            }
            Ok(Event::Eof) => return depth == 0,
            Err(e) => {
                log::debug!("Markup is not well-formed: {}", e);
                return false;
            }
            _ => {}
        }
    }
}

/// Extract the local name from a potentially namespaced tag name.
pub(crate) fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("p:sp"), "sp");
        assert_eq!(local_name("a:t"), "t");
        assert_eq!(local_name("sp"), "sp");
    }

    #[test]
    fn test_scan_kinds_and_names() {
        let xml = concat!(
            r#"<?xml version="1.0"?><a:p><a:r><a:t xml:space="preserve">Hi</a:t></a:r>"#,
            "<a:br/><!-- c --></a:p>"
        );
        let nodes = scan(xml);
        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Other,
                NodeKind::Open,
                NodeKind::Open,
                NodeKind::Open,
                NodeKind::Text,
                NodeKind::Close,
                NodeKind::Close,
                NodeKind::Empty,
                NodeKind::Other,
                NodeKind::Close,
            ]
        );
        assert_eq!(nodes[3].name, "a:t");
        assert_eq!(&xml[nodes[4].span.clone()], "Hi");
        assert_eq!(nodes[7].name, "a:br");
    }

    #[test]
    fn test_scan_quoted_gt_in_attribute() {
        let xml = r#"<a:t title="a>b">x</a:t>"#;
        let nodes = scan(xml);
        assert_eq!(nodes.len(), 3);
        assert_eq!(&xml[nodes[1].span.clone()], "x");
    }

    #[test]
    fn test_scan_unterminated_tag_becomes_text() {
        let xml = "<a:t>x</a:t><a:r";
        let nodes = scan(xml);
        let last = nodes.last().unwrap();
        assert_eq!(last.kind, NodeKind::Text);
        assert_eq!(&xml[last.span.clone()], "<a:r");
    }

    #[test]
    fn test_scan_tolerates_mismatched_end_tags() {
        let xml = "<a:p>Tom & Jerry</a:b></a:p>";
        let nodes = scan(xml);
        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Open, NodeKind::Text, NodeKind::Close, NodeKind::Close]
        );
        assert_eq!(&xml[nodes[1].span.clone()], "Tom & Jerry");
        assert_eq!(nodes[2].name, "a:b");
    }

    #[test]
    fn test_scan_spans_cover_input() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n<p:sld><a:p> <a:r><a:t>A &amp; B</a:t></a:r>\n</a:p><![CDATA[x<y]]></p:sld>"
        );
        let rebuilt: String = scan(xml).iter().map(|n| &xml[n.span.clone()]).collect();
        assert_eq!(rebuilt, xml);
    }

    #[test]
    fn test_text_runs_only_simple_runs() {
        let xml = concat!(
            "<a:t>one</a:t><a:t></a:t><a:t/><a:t>a<!-- -->b</a:t>",
            "<a:tab>no</a:tab><a:t>two</a:t>"
        );
        let nodes = scan(xml);
        let runs: Vec<&str> = text_runs(&nodes).into_iter().map(|r| &xml[r]).collect();
        assert_eq!(runs, vec!["one", "two"]);
    }

    #[test]
    fn test_paragraphs_track_runs() {
        let xml = "<a:p><a:r><a:t>x</a:t></a:r></a:p><a:p>loose <b>text</b></a:p><a:pPr/>";
        let nodes = scan(xml);
        let paras = paragraphs(&nodes);
        assert_eq!(paras.len(), 2);
        assert!(paras[0].has_run);
        assert!(!paras[1].has_run);
        let texts: Vec<&str> = paras[1].texts.iter().map(|r| &xml[r.clone()]).collect();
        assert_eq!(texts, vec!["loose ", "text"]);
    }

    #[test]
    fn test_entity_refs() {
        let raw = "Fish &amp; Chips &#233; &#xE9; & bare";
        let refs: Vec<&str> = entity_refs(raw).into_iter().map(|r| &raw[r]).collect();
        assert_eq!(refs, vec!["&amp;", "&#233;", "&#xE9;"]);
    }

    #[test]
    fn test_decode_and_encode() {
        assert_eq!(
            decode_text("A &amp; B &lt;Co&gt; &quot;X&quot; &apos;y&apos;"),
            "A & B <Co> \"X\" 'y'"
        );
        assert_eq!(decode_text("caf&#233;"), "café");
        assert_eq!(decode_text("bad &nope; ref"), "bad &nope; ref");
        assert_eq!(
            encode_text("A & B <Co> \"X\" 'y'"),
            "A &amp; B &lt;Co&gt; &quot;X&quot; &apos;y&apos;"
        );
    }

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed("<a><b>x &amp; y</b></a>"));
        assert!(!is_well_formed("<a><b>x</a></b>"));
        assert!(!is_well_formed("<a>x & y</a>"));
        assert!(!is_well_formed("<a><b>x</b>"));
    }
}
