//! Parsing string table text into a [`StringTable`].

use std::borrow::Cow;

use quick_xml::{
    Reader,
    errors::IllFormedError,
    escape::EscapeError,
    events::{BytesStart, Event},
};

use crate::{
    error::{SyntaxCause, XmlSyntaxError},
    types::{Element, Node, StringTable},
};

/// Parses `text` into a tree.
///
/// Line endings are normalized to `\n` first. Whitespace-only text between
/// elements is dropped, leaf text is kept verbatim, and a declaration is
/// accepted only at offset 0.
pub fn parse(text: &str) -> Result<StringTable, XmlSyntaxError> {
    let text = normalize_line_endings(text);
    let text: &str = &text;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_comments = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();

    loop {
        let offset = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let position = reader.error_position() as usize;
                return Err(XmlSyntaxError::at(text, position, classify(err)));
            }
        };

        match event {
            Event::Decl(_) => {
                if offset != 0 {
                    return Err(XmlSyntaxError::at(
                        text,
                        offset,
                        SyntaxCause::MisplacedDeclaration,
                    ));
                }
            }
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlSyntaxError::at(text, offset, SyntaxCause::ContentAfterRoot));
                }
                stack.push(start_element(text, offset, &e)?);
            }
            Event::Empty(e) => {
                let element = start_element(text, offset, &e)?;
                attach(element, &mut stack, &mut root, text, offset)?;
            }
            Event::End(e) => {
                let Some(element) = stack.pop() else {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(XmlSyntaxError::at(
                        text,
                        offset,
                        SyntaxCause::UnmatchedEndTag(name),
                    ));
                };
                attach(finish_element(element), &mut stack, &mut root, text, offset)?;
            }
            Event::Text(t) => {
                let value = t.unescape().map_err(|err| XmlSyntaxError::at(text, offset, classify(err)))?;
                push_text(value.into_owned(), &mut stack, root.is_some(), text, offset)?;
            }
            Event::CData(c) => {
                let value = String::from_utf8_lossy(&c).into_owned();
                push_text(value, &mut stack, root.is_some(), text, offset)?;
            }
            Event::Comment(c) => {
                let body = String::from_utf8_lossy(&c).into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Comment(body)),
                    None if root.is_some() => epilog.push(body),
                    None => prolog.push(body),
                }
            }
            Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlSyntaxError::at(
            text,
            text.len(),
            SyntaxCause::UnclosedElement(open.name.clone()),
        ));
    }
    let root = root.ok_or_else(|| XmlSyntaxError::new(1, 1, SyntaxCause::EmptyDocument))?;

    Ok(StringTable {
        prolog,
        root,
        epilog,
    })
}

fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn classify(err: quick_xml::Error) -> SyntaxCause {
    match err {
        quick_xml::Error::IllFormed(IllFormedError::DoubleHyphenInComment) => {
            SyntaxCause::DoubleHyphenInComment
        }
        quick_xml::Error::IllFormed(IllFormedError::MismatchedEndTag { expected, found }) => {
            SyntaxCause::MismatchedEndTag { expected, found }
        }
        quick_xml::Error::IllFormed(IllFormedError::UnmatchedEndTag(name)) => {
            SyntaxCause::UnmatchedEndTag(name)
        }
        quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name)) => {
            SyntaxCause::UnclosedElement(name)
        }
        quick_xml::Error::Escape(EscapeError::UnrecognizedEntity(_, entity)) => {
            SyntaxCause::UnknownEntity(entity)
        }
        other => SyntaxCause::Other(other.to_string()),
    }
}

fn start_element(text: &str, offset: usize, e: &BytesStart) -> Result<Element, XmlSyntaxError> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            XmlSyntaxError::at(text, offset, classify(quick_xml::Error::InvalidAttr(err)))
        })?;
        let value = attr
            .unescape_value()
            .map_err(|err| XmlSyntaxError::at(text, offset, classify(err)))?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(element)
}

/// Collapses collected text nodes: a leaf keeps its text verbatim, an element
/// with structure loses whitespace-only text, real mixed content stays as is.
fn finish_element(mut element: Element) -> Element {
    let has_structure = element
        .children
        .iter()
        .any(|node| !matches!(node, Node::Text(_)));
    if !has_structure {
        let text: String = element
            .children
            .drain(..)
            .filter_map(|node| match node {
                Node::Text(text) => Some(text),
                _ => None,
            })
            .collect();
        element.text = (!text.is_empty()).then_some(text);
        return element;
    }

    let has_text = element
        .children
        .iter()
        .any(|node| matches!(node, Node::Text(text) if !text.trim().is_empty()));
    if !has_text {
        element.children.retain(|node| !matches!(node, Node::Text(_)));
    }
    element
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
    text: &str,
    offset: usize,
) -> Result<(), XmlSyntaxError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => {
            return Err(XmlSyntaxError::at(text, offset, SyntaxCause::ContentAfterRoot));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(
    value: String,
    stack: &mut [Element],
    after_root: bool,
    text: &str,
    offset: usize,
) -> Result<(), XmlSyntaxError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Text(value));
        return Ok(());
    }
    if value.trim().is_empty() {
        return Ok(());
    }
    let cause = if after_root {
        SyntaxCause::ContentAfterRoot
    } else {
        SyntaxCause::ContentBeforeRoot
    };
    Err(XmlSyntaxError::at(text, offset, cause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{STRING_TAG, StringEntry};
    use indoc::indoc;

    #[test]
    fn test_parse_string_table() {
        let xml = indoc! {r#"
            <?xml version="1.0" encoding="windows-1251"?>
            <!-- prolog -->
            <string_table>
                <string id="st_one">
                    <text>One &amp; only</text>
                </string>
                <!-- separator -->
                <string id="st_two"><text>  Two  </text></string>
            </string_table>
        "#};
        let table = parse(xml).unwrap();

        assert_eq!(table.prolog, vec![" prolog ".to_string()]);
        assert_eq!(table.root.name, "string_table");
        assert_eq!(table.root.children.len(), 3);
        assert!(matches!(&table.root.children[1], Node::Comment(c) if c == " separator "));
        assert_eq!(
            table.entries(),
            vec![
                StringEntry {
                    id: "st_one",
                    text: Some("One & only")
                },
                StringEntry {
                    id: "st_two",
                    text: Some("  Two  ")
                },
            ]
        );
    }

    #[test]
    fn test_parse_keeps_mixed_content() {
        let table = parse("<string_table><text>a <b>bold</b> c</text></string_table>").unwrap();
        let Node::Element(text) = &table.root.children[0] else {
            panic!("expected element");
        };
        assert!(text.is_mixed());
        assert_eq!(text.children.len(), 3);
    }

    #[test]
    fn test_empty_leaf_has_no_text() {
        let table = parse("<string_table><string id=\"a\"><text></text></string></string_table>")
            .unwrap();
        let strings = table.string_elements();
        assert_eq!(strings[0].name, STRING_TAG);
        assert_eq!(strings[0].child("text").unwrap().text, None);
    }

    #[test]
    fn test_parse_crlf() {
        let table = parse("<string_table>\r\n<string id=\"a\"><text>x\r\ny</text></string>\r\n</string_table>")
            .unwrap();
        assert_eq!(table.entries()[0].text, Some("x\ny"));
    }

    #[test]
    fn test_double_hyphen_in_comment() {
        let err = parse("<string_table>\n<!-- a -- b -->\n</string_table>").unwrap_err();
        assert_eq!(err.cause, SyntaxCause::DoubleHyphenInComment);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse("").unwrap_err().cause, SyntaxCause::EmptyDocument);
        assert_eq!(
            parse("  \n<!-- only a comment -->\n").unwrap_err().cause,
            SyntaxCause::EmptyDocument
        );
    }

    #[test]
    fn test_misplaced_declaration() {
        let err = parse("\n<?xml version=\"1.0\"?><a/>").unwrap_err();
        assert_eq!(err.cause, SyntaxCause::MisplacedDeclaration);
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse("<string_table><text></string></string_table>").unwrap_err();
        assert_eq!(
            err.cause,
            SyntaxCause::MismatchedEndTag {
                expected: "text".into(),
                found: "string".into()
            }
        );
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<string_table>\n<string id=\"a\">").unwrap_err();
        assert_eq!(err.cause, SyntaxCause::UnclosedElement("string".into()));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_content_after_root() {
        let err = parse("<a/>\n<b/>").unwrap_err();
        assert_eq!(err.cause, SyntaxCause::ContentAfterRoot);
        assert_eq!(parse("<a/> tail").unwrap_err().cause, SyntaxCause::ContentAfterRoot);
        assert_eq!(parse("head <a/>").unwrap_err().cause, SyntaxCause::ContentBeforeRoot);
    }

    #[test]
    fn test_unknown_entity() {
        let err = parse("<a>&nbsp;</a>").unwrap_err();
        assert_eq!(err.cause, SyntaxCause::UnknownEntity("nbsp".into()));
    }

    #[test]
    fn test_trailing_comments_are_kept() {
        let table = parse("<a/>\n<!-- end -->\n").unwrap();
        assert_eq!(table.epilog, vec![" end ".to_string()]);
    }
}
