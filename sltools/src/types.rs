//! In-memory tree of one string table document.
//!
//! Node order is significant and preserved by every transformation.
//! Whitespace-only text between elements is not part of the tree.

use serde::Serialize;

/// Element holding one translatable entry.
pub const STRING_TAG: &str = "string";
/// Child of a [`STRING_TAG`] element holding the translatable content.
pub const TEXT_TAG: &str = "text";
/// Attribute identifying an entry.
pub const ID_ATTRIBUTE: &str = "id";

/// A parsed document: comments before the root, the root, comments after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    pub prolog: Vec<String>,
    pub root: Element,
    pub epilog: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Comment(String),
    /// Only present inside mixed-content elements.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Text of a leaf element, kept verbatim.
    pub text: Option<String>,
    pub children: Vec<Node>,
}

/// Borrowed view of one `<string id="...">` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringEntry<'a> {
    pub id: &'a str,
    pub text: Option<&'a str>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True if text nodes sit next to elements or comments.
    pub fn is_mixed(&self) -> bool {
        self.children.iter().any(|node| matches!(node, Node::Text(_)))
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Text of a leaf, or the concatenated text nodes of a mixed element.
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self
                .children
                .iter()
                .filter_map(|node| match node {
                    Node::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl StringTable {
    pub fn new(root: Element) -> Self {
        StringTable {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Every `<string>` element in document order, at any depth.
    pub fn string_elements(&self) -> Vec<&Element> {
        fn collect<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
            if el.name == STRING_TAG {
                out.push(el);
                return;
            }
            for node in &el.children {
                if let Node::Element(child) = node {
                    collect(child, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    /// Mutable counterpart of [`StringTable::string_elements`].
    pub fn string_elements_mut(&mut self) -> Vec<&mut Element> {
        fn collect<'a>(el: &'a mut Element, out: &mut Vec<&'a mut Element>) {
            if el.name == STRING_TAG {
                out.push(el);
                return;
            }
            for node in &mut el.children {
                if let Node::Element(child) = node {
                    collect(child, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&mut self.root, &mut out);
        out
    }

    /// Entries with an `id`, in document order. Entries without one are logged and skipped.
    pub fn entries(&self) -> Vec<StringEntry<'_>> {
        self.string_elements()
            .into_iter()
            .filter_map(|el| {
                let Some(id) = el.attribute(ID_ATTRIBUTE) else {
                    log::warn!("Skipping <{STRING_TAG}> element without an `{ID_ATTRIBUTE}` attribute");
                    return None;
                };
                let text = el.child(TEXT_TAG).and_then(|text| text.text.as_deref());
                Some(StringEntry { id, text })
            })
            .collect()
    }
}
