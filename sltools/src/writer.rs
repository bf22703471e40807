//! Canonical rendering of a [`StringTable`].
//!
//! The renderer is pure: the same tree always yields the same text, and that
//! text parses back into the same tree.

use std::borrow::Cow;

use quick_xml::escape::partial_escape;

use crate::{
    repair::CANONICAL_DECLARATION,
    types::{Element, Node, StringTable},
};

/// One nesting step.
pub const INDENT: &str = "    ";

/// Renders `table` with the canonical declaration, 4-space indentation, and
/// a blank line before every run of comments. The output ends with one newline.
pub fn serialize(table: &StringTable) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(CANONICAL_DECLARATION);
    out.push('\n');
    for comment in &table.prolog {
        write_comment(comment, &mut out);
        out.push('\n');
    }
    write_element(&table.root, 0, &mut out);
    out.push('\n');
    for comment in &table.epilog {
        write_comment(comment, &mut out);
        out.push('\n');
    }
    out
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    write_start(element, out);
    if element.children.is_empty() {
        write_leaf_end(element, out);
        return;
    }
    if element.is_mixed() {
        out.push('>');
        for node in &element.children {
            write_inline(node, out);
        }
        write_end(element, out);
        return;
    }

    out.push('>');
    let mut previous_was_comment = false;
    for node in &element.children {
        let is_comment = matches!(node, Node::Comment(_));
        if is_comment && !previous_was_comment {
            out.push('\n');
        }
        previous_was_comment = is_comment;

        out.push('\n');
        push_indent(depth + 1, out);
        match node {
            Node::Element(child) => write_element(child, depth + 1, out),
            Node::Comment(comment) => write_comment(comment, out),
            Node::Text(text) => out.push_str(&escape_text(text)),
        }
    }
    out.push('\n');
    push_indent(depth, out);
    write_end(element, out);
}

fn write_inline(node: &Node, out: &mut String) {
    match node {
        Node::Element(element) => {
            write_start(element, out);
            if element.children.is_empty() {
                write_leaf_end(element, out);
            } else {
                out.push('>');
                for child in &element.children {
                    write_inline(child, out);
                }
                write_end(element, out);
            }
        }
        Node::Comment(comment) => write_comment(comment, out),
        Node::Text(text) => out.push_str(&escape_text(text)),
    }
}

fn write_start(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
}

fn write_leaf_end(element: &Element, out: &mut String) {
    match element.text.as_deref() {
        Some(text) => {
            out.push('>');
            out.push_str(&escape_text(text));
            write_end(element, out);
        }
        None => out.push_str("/>"),
    }
}

fn write_end(element: &Element, out: &mut String) {
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_comment(comment: &str, out: &mut String) {
    out.push_str("<!--");
    out.push_str(comment);
    out.push_str("-->");
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn escape_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in partial_escape(value).chars() {
        match ch {
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use indoc::indoc;

    fn entry(id: &str, text: &str) -> Node {
        Node::Element(
            Element::new("string")
                .with_attribute("id", id)
                .with_child(Node::Element(Element::new("text").with_text(text))),
        )
    }

    #[test]
    fn test_serialize_indents_and_separates_comment_blocks() {
        let mut table = StringTable::new(
            Element::new("string_table")
                .with_child(entry("a", "A & <b>"))
                .with_child(Node::Comment(" one ".into()))
                .with_child(Node::Comment(" two ".into()))
                .with_child(entry("b", "B")),
        );
        table.prolog.push(" header ".into());

        let expected = indoc! {r#"
            <?xml version='1.0' encoding='WINDOWS-1251'?>
            <!-- header -->
            <string_table>
                <string id="a">
                    <text>A &amp; &lt;b&gt;</text>
                </string>

                <!-- one -->
                <!-- two -->
                <string id="b">
                    <text>B</text>
                </string>
            </string_table>
        "#};
        assert_eq!(serialize(&table), expected);
    }

    #[test]
    fn test_serialize_self_closing_and_attribute_escaping() {
        let table = StringTable::new(
            Element::new("string_table").with_child(Node::Element(
                Element::new("string").with_attribute("id", "say \"hi\" & <go>\n"),
            )),
        );
        assert_eq!(
            serialize(&table),
            "<?xml version='1.0' encoding='WINDOWS-1251'?>\n<string_table>\n    <string id=\"say &quot;hi&quot; &amp; &lt;go&gt;&#10;\"/>\n</string_table>\n"
        );
    }

    #[test]
    fn test_serialize_mixed_content_inline() {
        let table = parse("<string_table><text>a <b>bold</b> c</text></string_table>").unwrap();
        assert!(
            serialize(&table).contains("\n    <text>a <b>bold</b> c</text>\n"),
            "{}",
            serialize(&table)
        );
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let source = indoc! {r#"
            <string_table>
              <!-- a --><!-- b -->
              <string id="x"><text>
                keep   this
              </text></string>
              <string id="y"><text>   </text></string>
              <string id="z"><text/></string>
            </string_table>
        "#};
        let once = serialize(&parse(source).unwrap());
        let twice = serialize(&parse(&once).unwrap());
        assert_eq!(once, twice);
        assert!(once.contains("<text>\n    keep   this\n  </text>"));
        assert!(once.contains("<text>   </text>"));
        assert!(once.contains("<text/>"));
    }
}
