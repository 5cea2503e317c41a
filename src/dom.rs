//! A small owned DOM used to render pages and to model what the preview
//! editor does to them.
//!
//! Pages are built as [`Document`] trees, serialised to HTML for the
//! browser, and the same trees are what the classifier, the overlay and the
//! reconciler operate on in tests. Nodes are addressed by [`NodePath`]: the
//! child indices from the root `<html>` element down to the node.

/// Child indices from the document root to a node.
pub type NodePath = Vec<usize>;

const VOID_ELEMENTS: &[&str] = &["area", "br", "hr", "img", "input", "link", "meta", "source"];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

// ============================================================================
// Text Escaping
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Elements
// ============================================================================

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// This element when it matches `pred`, else its first matching
    /// descendant in document order.
    pub fn self_or_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.self_or_descendant(pred))
    }

    pub fn self_or_descendant_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                if let Some(found) = e.self_or_descendant_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// First text node in document order, searching descendants depth first.
    pub fn first_text_mut(&mut self) -> Option<&mut String> {
        for child in self.children.iter_mut() {
            match child {
                Node::Text(t) => return Some(t),
                Node::Element(e) => {
                    if let Some(t) = e.first_text_mut() {
                        return Some(t);
                    }
                }
            }
        }
        None
    }

    /// First text node that is a direct child of this element.
    pub fn first_direct_text_mut(&mut self) -> Option<&mut String> {
        self.children.iter_mut().find_map(|c| match c {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        })
    }

    /// Tag of the per-entry children when this element renders a block
    /// field as one child per entry: `li` inside lists, `p` inside a
    /// container holding only paragraphs.
    pub fn block_item_tag(&self) -> Option<&'static str> {
        if matches!(self.tag.as_str(), "ul" | "ol") {
            return Some("li");
        }
        let mut children = self.child_elements().peekable();
        children.peek()?;
        children.all(|c| c.tag == "p").then_some("p")
    }

    /// Value of one declaration in the inline `style` attribute.
    pub fn style_property(&self, name: &str) -> Option<String> {
        parse_style(self.attr("style")?)
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn set_style_property(&mut self, name: &str, value: &str) {
        let mut decls = self.attr("style").map(parse_style).unwrap_or_default();
        match decls.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((name.to_string(), value.to_string())),
        }
        let style = decls
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", style);
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&html_escape(v));
            out.push('"');
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_html(out),
                Node::Text(t) if raw => out.push_str(t),
                Node::Text(t) => out.push_str(&html_escape(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_ascii_lowercase(), v.trim().to_string()))
        })
        .collect()
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(head: Element, body: Element) -> Self {
        Self {
            root: Element::new("html")
                .with_attr("lang", "en")
                .with_child(head)
                .with_child(body),
        }
    }

    pub fn from_body(body: Element) -> Self {
        Self::new(Element::new("head"), body)
    }

    pub fn get(&self, path: &[usize]) -> Option<&Element> {
        let mut el = &self.root;
        for &idx in path {
            el = match el.children.get(idx)? {
                Node::Element(e) => e,
                Node::Text(_) => return None,
            };
        }
        Some(el)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut el = &mut self.root;
        for &idx in path {
            el = match el.children.get_mut(idx)? {
                Node::Element(e) => e,
                Node::Text(_) => return None,
            };
        }
        Some(el)
    }

    /// First element in document order matching `pred`.
    pub fn find(&self, pred: impl Fn(&Element) -> bool) -> Option<NodePath> {
        let mut path = Vec::new();
        find_in(&self.root, &pred, &mut path).then_some(path)
    }

    /// All matching elements in document order.
    pub fn find_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<NodePath> {
        let mut found = Vec::new();
        collect_paths(&self.root, &pred, &mut Vec::new(), &mut found);
        found
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodePath> {
        self.find(|e| e.attr(name) == Some(value))
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodePath> {
        self.find_by_attr("id", id)
    }

    /// Ancestors of the node at `path`, nearest first, ending at the root.
    pub fn ancestors(&self, path: &[usize]) -> Vec<&Element> {
        (0..path.len())
            .rev()
            .filter_map(|len| self.get(&path[..len]))
            .collect()
    }

    pub fn body_path(&self) -> Option<NodePath> {
        self.root
            .children
            .iter()
            .position(|c| matches!(c, Node::Element(e) if e.tag == "body"))
            .map(|i| vec![i])
    }

    pub fn body(&self) -> Option<&Element> {
        self.get(&self.body_path()?)
    }

    pub fn append_child(&mut self, parent: &[usize], child: Element) -> Option<NodePath> {
        let el = self.get_mut(parent)?;
        el.children.push(Node::Element(child));
        let mut path = parent.to_vec();
        path.push(el.children.len() - 1);
        Some(path)
    }

    pub fn remove(&mut self, path: &[usize]) -> Option<Element> {
        let (&last, parent) = path.split_last()?;
        let parent = self.get_mut(parent)?;
        if !matches!(parent.children.get(last), Some(Node::Element(_))) {
            return None;
        }
        match parent.children.remove(last) {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.root.write_html(&mut out);
        out
    }
}

fn find_in(el: &Element, pred: &impl Fn(&Element) -> bool, path: &mut NodePath) -> bool {
    if pred(el) {
        return true;
    }
    for (i, child) in el.children.iter().enumerate() {
        if let Node::Element(e) = child {
            path.push(i);
            if find_in(e, pred, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

fn collect_paths(
    el: &Element,
    pred: &impl Fn(&Element) -> bool,
    path: &mut NodePath,
    found: &mut Vec<NodePath>,
) {
    if pred(el) {
        found.push(path.clone());
    }
    for (i, child) in el.children.iter().enumerate() {
        if let Node::Element(e) = child {
            path.push(i);
            collect_paths(e, pred, path, found);
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_body(
            Element::new("body").with_child(
                Element::new("section")
                    .with_attr("style", "background-color: #000")
                    .with_child(Element::new("h1").with_attr("id", "title").with_text("Welcome"))
                    .with_child(
                        Element::new("a")
                            .with_attr("href", "/book")
                            .with_child(Element::new("span").with_attr("class", "icon"))
                            .with_text("Book now"),
                    ),
            ),
        )
    }

    #[test]
    fn test_find_and_get() {
        let doc = sample();
        let path = doc.find_by_id("title").unwrap();
        assert_eq!(doc.get(&path).unwrap().text_content(), "Welcome");
        assert!(doc.find_by_id("missing").is_none());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let doc = sample();
        let path = doc.find_by_id("title").unwrap();
        let tags: Vec<_> = doc.ancestors(&path).iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["section", "body", "html"]);
    }

    #[test]
    fn test_direct_text_skips_child_elements() {
        let mut doc = sample();
        let path = doc.find(|e| e.tag == "a").unwrap();
        let link = doc.get_mut(&path).unwrap();
        *link.first_direct_text_mut().unwrap() = "Reserve".to_string();
        assert_eq!(link.child_elements().count(), 1);
        assert_eq!(link.text_content(), "Reserve");
    }

    #[test]
    fn test_serialise_escapes_text_and_attrs() {
        let el = Element::new("p")
            .with_attr("title", "\"quoted\"")
            .with_text("a < b & c");
        assert_eq!(el.to_html(), r#"<p title="&quot;quoted&quot;">a &lt; b &amp; c</p>"#);
        let img = Element::new("img").with_attr("src", "/a.jpg");
        assert_eq!(img.to_html(), r#"<img src="/a.jpg">"#);
        let script = Element::new("script").with_text("if (a < b) {}");
        assert_eq!(script.to_html(), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_style_properties() {
        let mut el = Element::new("div").with_attr("style", "color: red; Background-Color: #fff");
        assert_eq!(el.style_property("background-color").as_deref(), Some("#fff"));
        el.set_style_property("--editor-primary", "#123456");
        el.set_style_property("color", "blue");
        assert_eq!(
            el.attr("style"),
            Some("color: blue; background-color: #fff; --editor-primary: #123456")
        );
    }

    #[test]
    fn test_append_and_remove() {
        let mut doc = sample();
        let body = doc.body_path().unwrap();
        let path = doc
            .append_child(&body, Element::new("div").with_attr("id", "overlay"))
            .unwrap();
        assert_eq!(doc.find_by_id("overlay"), Some(path.clone()));
        let removed = doc.remove(&path).unwrap();
        assert_eq!(removed.attr("id"), Some("overlay"));
        assert!(doc.find_by_id("overlay").is_none());
    }
}
