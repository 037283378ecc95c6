//! XML navigation layer for vendor recipe documents
//!
//! Documents are parsed with roxmltree into an owned element tree that
//! answers three queries without conflating same-named elements at different
//! depths:
//!
//! - [`Element::find`]: first descendant with a tag
//! - [`Element::find_all`]: every descendant with a tag
//! - [`Element::children_named`]: only the direct children with a tag
//!
//! Vendor formats nest `Segment` in `Segment`, `RecipeElement` in
//! `RecipeElement`, `Signatures` under both operations and phases, so the
//! hierarchy walkers always use the direct-children query.
//!
//! Malformed or truncated input is not rejected outright: the quick-xml event
//! reader recovers whatever prefix of the tree is well formed and the
//! document is flagged as partial. Input nested deeper than [`MAX_DEPTH`]
//! is refused before any tree is built, since building, searching and
//! dropping the tree all recurse per level.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use roxmltree::{Document, Node, ParsingOptions};
use std::ops::Range;
use thiserror::Error;

/// Deepest element nesting accepted; real recipes stay far below this
pub const MAX_DEPTH: usize = 256;

/// Input that cannot be turned into an element tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("no root element found: {0}")]
    NoRootElement(String),

    #[error("elements nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Child of an element: nested element or character data
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

/// Owned XML element with resolved namespace and source byte range
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
    range: Range<usize>,
}

impl Element {
    fn new(name: String, namespace: Option<String>, attributes: Vec<(String, String)>, start: usize) -> Self {
        Self {
            name,
            namespace,
            attributes,
            children: Vec::new(),
            range: start..start,
        }
    }

    /// Local tag name (namespace prefix stripped)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved namespace URI, if any was in scope
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Byte range of this element in the source text
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Attribute value by local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value trimmed, `None` when absent or blank
    pub fn attribute_text(&self, name: &str) -> Option<String> {
        self.attribute(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Direct element children in document order
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct element children with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children().filter(move |child| child.name == tag)
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children().find(|child| child.name == tag)
    }

    pub fn has_child(&self, tag: &str) -> bool {
        self.child(tag).is_some()
    }

    /// First descendant with the given tag (depth-first, document order)
    pub fn find(&self, tag: &str) -> Option<&Element> {
        for child in self.children() {
            if child.name == tag {
                return Some(child);
            }
            if let Some(found) = child.find(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant with the given tag, in document order
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(tag, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        for child in self.children() {
            if child.name == tag {
                found.push(child);
            }
            child.collect_descendants(tag, found);
        }
    }

    /// Text content
    ///
    /// The element's own character data if it has any; otherwise the
    /// concatenated text of all descendants.
    pub fn text(&self) -> String {
        let direct: String = self
            .children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect();
        if !direct.trim().is_empty() {
            return direct;
        }
        let mut aggregated = String::new();
        self.collect_text(&mut aggregated);
        aggregated
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Trimmed text of the first direct child with the tag, `None` when blank
    pub fn child_text(&self, tag: &str) -> Option<String> {
        self.child(tag)
            .map(|child| child.text().trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// Trimmed text of this element, `None` when blank
    pub fn trimmed_text(&self) -> Option<String> {
        let text = self.text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn from_node(node: Node) -> Self {
        let mut element = Element::new(
            node.tag_name().name().to_string(),
            node.tag_name().namespace().map(str::to_string),
            node.attributes()
                .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                .collect(),
            node.range().start,
        );
        element.range = node.range();
        for child in node.children() {
            if child.is_element() {
                element.children.push(XmlNode::Element(Element::from_node(child)));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    element.children.push(XmlNode::Text(text.to_string()));
                }
            }
        }
        element
    }
}

/// Parsed vendor document
#[derive(Debug, Clone)]
pub struct XmlDocument<'input> {
    source: &'input str,
    root: Element,
    recovery_error: Option<String>,
}

impl<'input> XmlDocument<'input> {
    /// Parse XML text, recovering a partial tree from malformed input
    pub fn parse(source: &'input str) -> Result<Self, XmlError> {
        if exceeds_depth(source, MAX_DEPTH) {
            log::warn!("XML nests deeper than {} levels, refusing to parse", MAX_DEPTH);
            return Err(XmlError::TooDeep { limit: MAX_DEPTH });
        }
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        match Document::parse_with_options(source, options) {
            Ok(doc) => Ok(Self {
                source,
                root: Element::from_node(doc.root_element()),
                recovery_error: None,
            }),
            Err(err) => {
                let message = err.to_string();
                log::warn!("XML is not well formed ({}), recovering partial tree", message);
                let root = recover_tree(source).ok_or_else(|| XmlError::NoRootElement(message.clone()))?;
                Ok(Self {
                    source,
                    root,
                    recovery_error: Some(message),
                })
            }
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// True when the tree was recovered from malformed input
    pub fn is_partial(&self) -> bool {
        self.recovery_error.is_some()
    }

    pub fn recovery_error(&self) -> Option<&str> {
        self.recovery_error.as_deref()
    }

    /// Verbatim source text of an element of this document
    pub fn raw(&self, element: &Element) -> &'input str {
        let range = element.range();
        let end = range.end.min(self.source.len());
        let start = range.start.min(end);
        self.source.get(start..end).unwrap_or_default()
    }
}

/// Decode the five predefined XML entities and character references
pub fn decode_entities(text: &str) -> String {
    quick_xml::escape::unescape(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// Streaming depth scan: true as soon as nesting passes `limit`
///
/// End tags are not matched against their start tags, so malformed input is
/// measured the same way the recovery reader would build it.
fn exceeds_depth(source: &str, limit: usize) -> bool {
    let mut reader = Reader::from_str(source);
    reader.check_end_names(false);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            Ok(Event::Empty(_)) if depth >= limit => return true,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}

// ============================================================================
// PARTIAL TREE RECOVERY
// ============================================================================

struct OpenElement {
    element: Element,
    /// Namespace declarations made on this element: (prefix, uri), "" = default
    declarations: Vec<(String, String)>,
}

/// Build as much of the tree as is well formed, closing whatever is left open
fn recover_tree(source: &str) -> Option<Element> {
    let mut reader = Reader::from_str(source);
    reader.check_end_names(false);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(ref tag)) => {
                let open = open_element(tag, &stack, start);
                stack.push(open);
            }
            Ok(Event::Empty(ref tag)) => {
                let mut open = open_element(tag, &stack, start);
                open.element.range.end = reader.buffer_position();
                attach(&mut stack, &mut root, open.element);
            }
            Ok(Event::End(_)) => {
                if let Some(mut open) = stack.pop() {
                    open.element.range.end = reader.buffer_position();
                    attach(&mut stack, &mut root, open.element);
                }
            }
            Ok(Event::Text(ref text)) => {
                if let Some(top) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned());
                    top.element.children.push(XmlNode::Text(value));
                }
            }
            Ok(Event::CData(ref data)) => {
                if let Some(top) = stack.last_mut() {
                    let value = String::from_utf8_lossy(data).into_owned();
                    top.element.children.push(XmlNode::Text(value));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
        if root.is_some() && stack.is_empty() {
            break;
        }
    }

    while let Some(mut open) = stack.pop() {
        open.element.range.end = source.len();
        attach(&mut stack, &mut root, open.element);
    }
    root
}

fn attach(stack: &mut [OpenElement], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.element.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn open_element(tag: &BytesStart, stack: &[OpenElement], start: usize) -> OpenElement {
    let qualified = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let (prefix, local) = match qualified.split_once(':') {
        Some((prefix, local)) => (prefix.to_string(), local.to_string()),
        None => (String::new(), qualified.clone()),
    };

    let mut declarations = Vec::new();
    let mut attributes = Vec::new();
    for attr in tag.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(declared) = key.strip_prefix("xmlns:") {
            declarations.push((declared.to_string(), value));
        } else {
            let local_key = key.split_once(':').map(|(_, k)| k.to_string()).unwrap_or(key);
            attributes.push((local_key, value));
        }
    }

    let namespace = declarations
        .iter()
        .find(|(declared, _)| *declared == prefix)
        .map(|(_, uri)| uri.clone())
        .or_else(|| {
            stack.iter().rev().find_map(|open| {
                open.declarations
                    .iter()
                    .find(|(declared, _)| *declared == prefix)
                    .map(|(_, uri)| uri.clone())
            })
        })
        .filter(|uri| !uri.is_empty());

    OpenElement {
        element: Element::new(local, namespace, attributes, start),
        declarations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"<?xml version="1.0"?>
<Recipe xmlns="urn:test">
  <Segment name="outer">
    <Parameter name="a"/>
    <Segment name="inner">
      <Parameter name="b"/>
    </Segment>
  </Segment>
  <Segment name="second"/>
</Recipe>"#;

    #[test]
    fn test_direct_children_do_not_merge_depths() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let root = doc.root();
        let top: Vec<_> = root.children_named("Segment").collect();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].attribute("name"), Some("outer"));

        let inner: Vec<_> = top[0].children_named("Segment").collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(top[0].children_named("Parameter").count(), 1);
    }

    #[test]
    fn test_find_and_find_all_search_every_depth() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let root = doc.root();
        assert_eq!(root.find_all("Segment").len(), 3);
        assert_eq!(root.find_all("Parameter").len(), 2);
        assert_eq!(root.find("Parameter").and_then(|p| p.attribute("name")), Some("a"));
        assert!(root.find("Missing").is_none());
    }

    #[test]
    fn test_namespace_is_resolved() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        assert_eq!(doc.root().namespace(), Some("urn:test"));
        assert_eq!(doc.root().name(), "Recipe");
        assert!(!doc.is_partial());
    }

    #[test]
    fn test_text_aggregates_descendants_when_no_direct_text() {
        let xml = "<Note><b>Bold</b> <i>italic</i></Note>";
        let doc = XmlDocument::parse(xml).unwrap();
        // the lone space is whitespace only, so descendant text is used
        assert_eq!(doc.root().text(), "Bold italic");

        let xml = "<Note>direct<b>nested</b></Note>";
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().text(), "direct");
    }

    #[test]
    fn test_entities_are_decoded() {
        let xml = "<Name>&lt;b&gt;&amp;&quot;&apos;&lt;/b&gt;</Name>";
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().text(), "<b>&\"'</b>");
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("broken &bogus; entity"), "broken &bogus; entity");
    }

    #[test]
    fn test_truncated_input_degrades_to_partial_tree() {
        let xml = r#"<Recipe xmlns="urn:test"><Header><Name>Granulation</Name></Header><Steps><Step id="1"/><Step id="2""#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert!(doc.is_partial());
        assert_eq!(doc.root().name(), "Recipe");
        assert_eq!(doc.root().namespace(), Some("urn:test"));
        assert_eq!(
            doc.root().child("Header").and_then(|h| h.child_text("Name")),
            Some("Granulation".to_string())
        );
        assert!(doc.root().find_all("Step").len() >= 1);
    }

    #[test]
    fn test_no_root_element_is_error() {
        assert!(XmlDocument::parse("just text").is_err());
        assert!(XmlDocument::parse("").is_err());
    }

    #[test]
    fn test_raw_returns_verbatim_source() {
        let xml = r#"<Root><Keep a="1"><x/></Keep></Root>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let keep = doc.root().child("Keep").unwrap();
        assert_eq!(doc.raw(keep), r#"<Keep a="1"><x/></Keep>"#);
    }

    #[test]
    fn test_prefixed_namespace() {
        let xml = r#"<b2mml:BatchInformation xmlns:b2mml="urn:b2mml"><b2mml:ID>X</b2mml:ID></b2mml:BatchInformation>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().name(), "BatchInformation");
        assert_eq!(doc.root().namespace(), Some("urn:b2mml"));
        assert_eq!(doc.root().child_text("ID"), Some("X".to_string()));
    }

    fn nested(root: &str, depth: usize) -> String {
        format!("<{root}>{}{}</{root}>", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn test_depth_limit() {
        let at_limit = nested("Recipe", MAX_DEPTH - 1);
        let doc = XmlDocument::parse(&at_limit).unwrap();
        assert_eq!(doc.root().find_all("a").len(), MAX_DEPTH - 1);

        let over = nested("Recipe", MAX_DEPTH);
        assert_eq!(XmlDocument::parse(&over).unwrap_err(), XmlError::TooDeep { limit: MAX_DEPTH });

        let empty_leaf = format!("<Recipe>{}<b/>{}</Recipe>", "<a>".repeat(MAX_DEPTH - 1), "</a>".repeat(MAX_DEPTH - 1));
        assert!(XmlDocument::parse(&empty_leaf).is_err());
    }

    #[test]
    fn test_deep_malformed_input_is_refused_before_recovery() {
        // Never closed, so roxmltree fails and recovery would build the tree
        let unclosed = format!("<MasterRecipe>{}", "<a>".repeat(100_000));
        assert!(matches!(XmlDocument::parse(&unclosed), Err(XmlError::TooDeep { .. })));
        assert!(XmlDocument::parse(&nested("MasterRecipe", 100_000)).is_err());
    }
}
