//! XML fragment emission helpers
//!
//! Generators compose their documents from per-subtree string fragments.
//! Every fragment puts each tag on its own line so the line-based pretty
//! printer can indent the result. All interpolated text, attribute values
//! included, goes through [`escape`].

use std::fmt::{self, Display, Write};

/// Escape `& < > " '` plus line breaks
///
/// Line breaks become character references so free text never splits a tag
/// across lines; parsers decode them back to the original characters.
pub fn escape(text: &str) -> String {
    let escaped = quick_xml::escape::escape(text);
    if escaped.contains(['\n', '\r']) {
        escaped.replace('\r', "&#13;").replace('\n', "&#10;")
    } else {
        escaped.into_owned()
    }
}

/// XML declaration line
pub fn declaration(encoding: &str) -> String {
    format!("<?xml version=\"1.0\" encoding=\"{}\"?>\n", escape(encoding))
}

/// Comment line; `--` cannot appear inside a comment and is broken up
pub fn comment(text: &str) -> String {
    let mut body = text.replace("--", "- -");
    if body.ends_with('-') {
        body.push(' ');
    }
    format!("<!-- {} -->\n", body.replace('\n', " "))
}

/// Start tag with attributes, built fluently
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
    attributes: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: String::new(),
        }
    }

    /// Add an attribute; the value is escaped
    pub fn attr(mut self, key: &str, value: impl Display) -> Self {
        // Writing to a String cannot fail
        let _ = write!(self.attributes, " {}=\"{}\"", key, escape(&value.to_string()));
        self
    }

    /// Add an attribute only when a value is present
    pub fn attr_opt<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    /// `<Name attrs>` line
    pub fn open(&self) -> String {
        format!("<{}{}>\n", self.name, self.attributes)
    }

    /// `</Name>` line
    pub fn close(&self) -> String {
        format!("</{}>\n", self.name)
    }

    /// `<Name attrs/>` line
    pub fn empty(&self) -> String {
        format!("<{}{}/>\n", self.name, self.attributes)
    }

    /// `<Name attrs>text</Name>` on one line, text escaped
    pub fn text(&self, text: &str) -> String {
        format!("<{}{}>{}</{}>\n", self.name, self.attributes, escape(text), self.name)
    }

    /// Open tag, inner fragment, close tag; self-closing when `inner` is empty
    pub fn wrap(&self, inner: &str) -> String {
        if inner.is_empty() {
            return self.empty();
        }
        let mut out = self.open();
        out.push_str(inner);
        out.push_str(&self.close());
        out
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}{}>", self.name, self.attributes)
    }
}

/// `<name>text</name>` line
pub fn leaf(name: &str, text: impl Display) -> String {
    Tag::new(name).text(&text.to_string())
}

/// `<name>text</name>` line, or nothing when the value is absent
pub fn leaf_opt<V: Display>(name: &str, value: Option<V>) -> String {
    value.map(|value| leaf(name, value)).unwrap_or_default()
}

/// `<name>text</name>` line, or nothing when the text is empty
pub fn leaf_text(name: &str, text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        Tag::new(name).text(text)
    }
}

/// Container element around `inner`, omitted entirely when `inner` is empty
pub fn section(name: &str, inner: &str) -> String {
    if inner.is_empty() {
        String::new()
    } else {
        Tag::new(name).wrap(inner)
    }
}

/// Render a float without a trailing `.0` for whole numbers
pub fn number(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_five_characters() {
        assert_eq!(escape(r#"<b>&"'</b>"#), "&lt;b&gt;&amp;&quot;&apos;&lt;/b&gt;");
    }

    #[test]
    fn test_escape_line_breaks() {
        assert_eq!(escape("line 1\nline 2"), "line 1&#10;line 2");
    }

    #[test]
    fn test_tag_attributes_are_escaped() {
        let tag = Tag::new("Phase").attr("name", "Mix & \"Blend\"").attr("sequence", 2);
        assert_eq!(tag.empty(), "<Phase name=\"Mix &amp; &quot;Blend&quot;\" sequence=\"2\"/>\n");
    }

    #[test]
    fn test_attr_opt_skips_none() {
        let tag = Tag::new("Unit").attr_opt("min", None::<f64>).attr_opt("max", Some(5.5));
        assert_eq!(tag.open(), "<Unit max=\"5.5\">\n");
    }

    #[test]
    fn test_wrap_empty_inner_self_closes() {
        assert_eq!(Tag::new("Signatures").wrap(""), "<Signatures/>\n");
        assert_eq!(
            Tag::new("Signatures").wrap("<Signature/>\n"),
            "<Signatures>\n<Signature/>\n</Signatures>\n"
        );
    }

    #[test]
    fn test_section_omitted_when_empty() {
        assert_eq!(section("Phases", ""), "");
        assert_eq!(leaf_text("Instructions", ""), "");
        assert_eq!(section("Phases", "<Phase/>\n"), "<Phases>\n<Phase/>\n</Phases>\n");
    }

    #[test]
    fn test_comment_breaks_double_dash() {
        assert_eq!(comment("a -- b"), "<!-- a - - b -->\n");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(5.0), "5");
        assert_eq!(number(2.25), "2.25");
    }
}
