//! Line-based XML re-indentation
//!
//! Assumes each tag sits on its own logical line, which is what the
//! fragment helpers in `markup` produce. Self-closing tags and lines that
//! open and close the same element do not change the depth.

/// Re-indent `xml` by `indent` spaces per nesting level
pub fn pretty_print(xml: &str, indent: usize) -> String {
    let mut out = String::with_capacity(xml.len() + xml.len() / 4);
    let mut depth: usize = 0;

    for line in xml.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let kind = classify(line);
        if kind == LineKind::Close {
            depth = depth.saturating_sub(1);
        }

        for _ in 0..depth * indent {
            out.push(' ');
        }
        out.push_str(line);
        out.push('\n');

        if kind == LineKind::Open {
            depth += 1;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Open,
    Close,
    Neutral,
}

fn classify(line: &str) -> LineKind {
    if line.starts_with("</") {
        LineKind::Close
    } else if line.starts_with("<?") || line.starts_with("<!") {
        LineKind::Neutral
    } else if line.starts_with('<') {
        if line.ends_with("/>") || line.contains("</") {
            LineKind::Neutral
        } else {
            LineKind::Open
        }
    } else {
        LineKind::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_indentation() {
        let xml = "<?xml version=\"1.0\"?>\n<A>\n<B>\n<C>text</C>\n<D/>\n</B>\n</A>\n";
        let pretty = pretty_print(xml, 2);
        assert_eq!(
            pretty,
            "<?xml version=\"1.0\"?>\n<A>\n  <B>\n    <C>text</C>\n    <D/>\n  </B>\n</A>\n"
        );
    }

    #[test]
    fn test_comments_do_not_change_depth() {
        let xml = "<A>\n<!-- note -->\n<B/>\n</A>\n";
        assert_eq!(pretty_print(xml, 4), "<A>\n    <!-- note -->\n    <B/>\n</A>\n");
    }

    #[test]
    fn test_unbalanced_close_does_not_underflow() {
        let xml = "</A>\n<B/>\n";
        assert_eq!(pretty_print(xml, 2), "</A>\n<B/>\n");
    }

    #[test]
    fn test_reindents_already_indented_input() {
        let xml = "<A>\n        <B/>\n</A>";
        assert_eq!(pretty_print(xml, 2), "<A>\n  <B/>\n</A>\n");
    }
}
