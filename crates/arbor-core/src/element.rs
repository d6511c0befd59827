//! Subtree descriptions.
//!
//! `draw()` returns an [`Element`]: plain tags and text mixed with references
//! to child widgets that have not been expanded yet. The runtime expands the
//! widget references, each through its own render bridge, and hands the host
//! a [`Node`] tree that no longer mentions widgets.

use std::fmt;

use crate::widget::{Widget, WidgetRef};

pub type Attributes = Vec<(String, String)>;

#[derive(Clone, Default)]
pub enum Element {
    #[default]
    Empty,
    Text(String),
    Tag(Tag),
    Fragment(Vec<Element>),
    Widget(WidgetRef),
}

#[derive(Clone, Debug)]
pub struct Tag {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Element>,
}

impl Element {
    pub fn text(text: impl Into<String>) -> Self {
        Element::Text(text.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Element::Tag(Tag {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Self {
        Element::Fragment(children.into_iter().collect())
    }

    pub fn widget(widget: impl Widget) -> Self {
        Element::Widget(WidgetRef::new(widget))
    }

    /// Adds a pass-through attribute. Ignored on anything but a tag.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        if let Element::Tag(tag) = &mut self {
            tag.attributes.push((name.into(), value.to_string()));
        }
        self
    }

    pub fn attrs(mut self, attributes: impl IntoIterator<Item = (String, String)>) -> Self {
        if let Element::Tag(tag) = &mut self {
            tag.attributes.extend(attributes);
        }
        self
    }

    /// Appends a child to a tag or fragment; anything else becomes a
    /// fragment of itself and the child.
    pub fn child(self, child: Element) -> Self {
        match self {
            Element::Tag(mut tag) => {
                tag.children.push(child);
                Element::Tag(tag)
            }
            Element::Fragment(mut children) => {
                children.push(child);
                Element::Fragment(children)
            }
            Element::Empty => child,
            other => Element::Fragment(vec![other, child]),
        }
    }

    pub fn children(self, children: impl IntoIterator<Item = Element>) -> Self {
        children.into_iter().fold(self, Element::child)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Element::Empty)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Empty => write!(f, "Empty"),
            Element::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Element::Tag(tag) => fmt::Debug::fmt(tag, f),
            Element::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Element::Widget(widget) => f.debug_tuple("Widget").field(&widget.core().name()).finish(),
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Element::text(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Element::Text(text)
    }
}

/// Expanded output of a frame.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(String),
    Tag {
        name: String,
        attributes: Attributes,
        children: Vec<Node>,
    },
    Fragment(Vec<Node>),
}

impl Node {
    /// Concatenated text of the whole subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Empty => {}
            Node::Text(text) => out.push_str(text),
            Node::Tag { children, .. } | Node::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Depth-first search for the first tag called `name`.
    pub fn find(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Tag { name: n, .. } if n == name => Some(self),
            Node::Tag { children, .. } | Node::Fragment(children) => {
                children.iter().find_map(|child| child.find(name))
            }
            _ => None,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            Node::Tag { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Compact markup, mostly for tests and debugging.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => Ok(()),
            Node::Text(text) => f.write_str(text),
            Node::Fragment(children) => children.iter().try_for_each(|c| fmt::Display::fmt(c, f)),
            Node::Tag {
                name,
                attributes,
                children,
            } => {
                write!(f, "<{name}")?;
                for (key, value) in attributes {
                    write!(f, " {key}=\"{value}\"")?;
                }
                if children.is_empty() {
                    return write!(f, "/>");
                }
                f.write_str(">")?;
                for child in children {
                    fmt::Display::fmt(child, f)?;
                }
                write!(f, "</{name}>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_of_nested_nodes() {
        let node = Node::Tag {
            name: "p".into(),
            attributes: vec![("id".into(), "a".into())],
            children: vec![
                Node::Text("x".into()),
                Node::Fragment(vec![Node::Empty, Node::Text("y".into())]),
                Node::Tag {
                    name: "br".into(),
                    attributes: vec![],
                    children: vec![],
                },
            ],
        };
        assert_eq!(node.to_string(), "<p id=\"a\">xy<br/></p>");
        assert_eq!(node.text_content(), "xy");
        assert_eq!(node.attribute("id"), Some("a"));
        assert!(node.find("br").is_some());
    }

    #[test]
    fn child_on_empty_replaces_it() {
        let e = Element::Empty.child(Element::text("a"));
        assert!(matches!(e, Element::Text(ref t) if t == "a"));
        let e = Element::text("a").child(Element::text("b"));
        assert!(matches!(e, Element::Fragment(ref v) if v.len() == 2));
    }
}
