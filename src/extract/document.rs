//! Document model shared by the HTML and XML parsers
//!
//! Both parsers lower their output into the same arena of nodes so the
//! selector engine only has one tree shape to walk. Nodes are appended in
//! pre-order, which makes a node's id its document order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use scraper::{ElementRef, Html};

pub type NodeId = usize;

/// Which parser produced a document; decides name matching rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Element names compare ASCII case-insensitively
    Html,
    /// Element names compare exactly
    Xml,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    kind: DocumentKind,
    nodes: Vec<Node>,
}

impl Document {
    /// An empty document holding only the document node
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markup with the tolerant HTML5 parser
    pub fn parse_html(text: &str) -> Self {
        let html = Html::parse_document(text);
        let mut document = Self::new(DocumentKind::Html);
        let root = document.root();
        append_html_element(&mut document, root, html.root_element());
        document
    }

    /// Parse markup as XML, keeping whatever was built before the first
    /// syntax error
    pub fn parse_xml(text: &str) -> Self {
        let mut document = Self::new(DocumentKind::Xml);
        let mut reader = Reader::from_str(text);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
        }

        let mut open: Vec<NodeId> = vec![document.root()];

        loop {
            let parent = open.last().copied().unwrap_or(0);
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    let id = document.append(parent, xml_element(&start));
                    open.push(id);
                }
                Ok(Event::Empty(start)) => {
                    document.append(parent, xml_element(&start));
                }
                Ok(Event::End(end)) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    // Close up to the nearest open element with this name;
                    // stray end tags are ignored.
                    if let Some(depth) = open
                        .iter()
                        .rposition(|&id| document.element_name(id) == Some(name.as_str()))
                    {
                        open.truncate(depth);
                    }
                }
                Ok(Event::Text(text)) => {
                    if parent != 0 {
                        document.append_text(parent, &String::from_utf8_lossy(&text));
                    }
                }
                Ok(Event::CData(data)) => {
                    if parent != 0 {
                        document.append_text(parent, &String::from_utf8_lossy(&data));
                    }
                }
                Ok(Event::GeneralRef(reference)) => {
                    if parent != 0 {
                        let name = String::from_utf8_lossy(&reference).into_owned();
                        document.append_text(parent, &resolve_entity(&name));
                    }
                }
                Ok(Event::Comment(comment)) => {
                    let body = String::from_utf8_lossy(&comment).into_owned();
                    document.append(parent, NodeData::Comment(body));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    log::trace!(
                        "XML parse stopped at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
            }
        }

        document
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// The top-level element, if the parse produced one
    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&id| matches!(self.nodes[id].data, NodeData::Element { .. }))
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id].data {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Compare an element or attribute name under this document's rules
    pub fn names_match(&self, actual: &str, wanted: &str) -> bool {
        match self.kind {
            DocumentKind::Html => actual.eq_ignore_ascii_case(wanted),
            DocumentKind::Xml => actual == wanted,
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn descendant_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        // Explicit stack; page depth is unbounded
        let mut pending: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            match &self.nodes[next].data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element { .. } => {
                    pending.extend(self.nodes[next].children.iter().rev().copied())
                }
                _ => {}
            }
        }
    }

    /// Append a node under `parent` and return its id
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Append text, merging with a directly preceding text sibling
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last].data {
                existing.push_str(text);
                return;
            }
        }
        self.append(parent, NodeData::Text(text.to_string()));
    }
}

/// Copy scraper's tree into the arena in pre-order without recursing
fn append_html_element(document: &mut Document, parent: NodeId, element: ElementRef<'_>) {
    let mut pending = vec![(parent, *element)];

    while let Some((parent, node)) = pending.pop() {
        match node.value() {
            scraper::Node::Element(value) => {
                let id = document.append(
                    parent,
                    NodeData::Element {
                        name: value.name().to_string(),
                        attributes: value
                            .attrs()
                            .map(|(name, value)| Attribute {
                                name: name.to_string(),
                                value: value.to_string(),
                            })
                            .collect(),
                    },
                );
                let children: Vec<_> = node.children().collect();
                pending.extend(children.into_iter().rev().map(|child| (id, child)));
            }
            scraper::Node::Text(text) => document.append_text(parent, &text.text),
            scraper::Node::Comment(comment) => {
                document.append(parent, NodeData::Comment(String::from(&*comment.comment)));
            }
            _ => {}
        }
    }
}

fn xml_element(start: &BytesStart<'_>) -> NodeData {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    let mut raw_attributes = start.attributes();
    raw_attributes.with_checks(false);

    for attribute in raw_attributes.flatten() {
        let raw_value = String::from_utf8_lossy(&attribute.value).into_owned();
        let value = match quick_xml::escape::unescape(&raw_value) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => raw_value,
        };
        attributes.push(Attribute {
            name: String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            value,
        });
    }

    NodeData::Element { name, attributes }
}

/// Resolve the body of an `&...;` reference; unknown entities stay literal
fn resolve_entity(name: &str) -> String {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => numeric.parse::<u32>().ok(),
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return ch.to_string();
        }
    } else if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{};", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_parse_wraps_fragment_in_html_body() {
        let document = Document::parse_html("<h1>Hello</h1>");
        let root = document.root_element().expect("html root element");

        assert_eq!(document.element_name(root), Some("html"));
        assert_eq!(document.descendant_text(root), "Hello");
        assert_eq!(document.kind(), DocumentKind::Html);
    }

    #[test]
    fn test_html_parse_keeps_attributes_and_comments() {
        let document = Document::parse_html(
            r#"<div id="price" class="big">10 <!-- cents --><b>EUR</b></div>"#,
        );
        let div = (0..document.len())
            .find(|&id| document.element_name(id) == Some("div"))
            .expect("div element");

        let attributes = document.attributes(div);
        assert_eq!(attributes.len(), 2);
        assert!(attributes.contains(&Attribute {
            name: "id".into(),
            value: "price".into()
        }));
        assert!(attributes.iter().any(|a| a.name == "class" && a.value == "big"));
        assert_eq!(document.descendant_text(div), "10 EUR");
        assert!(document
            .node(div)
            .children
            .iter()
            .any(|&c| document.node(c).data == NodeData::Comment(" cents ".into())));
    }

    #[test]
    fn test_xml_parse_builds_tree_in_document_order() {
        let document =
            Document::parse_xml("<?xml version=\"1.0\"?><feed><item>a</item><item>b</item></feed>");
        let root = document.root_element().expect("feed element");

        assert_eq!(document.element_name(root), Some("feed"));
        let items = &document.node(root).children;
        assert_eq!(items.len(), 2);
        assert!(items[0] < items[1]);
        assert_eq!(document.descendant_text(items[1]), "b");
    }

    #[test]
    fn test_xml_parse_resolves_entities_and_cdata() {
        let document = Document::parse_xml(
            "<r a=\"x &amp; y\">Tom &amp; Jerry &#169; <![CDATA[<raw>]]></r>",
        );
        let root = document.root_element().unwrap();

        assert_eq!(document.attributes(root)[0].value, "x & y");
        assert_eq!(document.descendant_text(root), "Tom & Jerry © <raw>");
    }

    #[test]
    fn test_xml_parse_tolerates_mismatched_and_unclosed_tags() {
        let document = Document::parse_xml("<html><body><p>one<br></p><p>two</p></body></html>");
        let root = document.root_element().unwrap();

        assert_eq!(document.element_name(root), Some("html"));
        assert!(document.descendant_text(root).contains("one"));
        assert!(document.descendant_text(root).contains("two"));
    }

    #[test]
    fn test_xml_parse_of_garbage_keeps_partial_tree() {
        let document = Document::parse_xml("<a><b>kept</b><<<");
        let root = document.root_element().unwrap();

        assert_eq!(document.descendant_text(root), "kept");
    }

    #[test]
    fn test_name_matching_rules() {
        let html = Document::new(DocumentKind::Html);
        let xml = Document::new(DocumentKind::Xml);

        assert!(html.names_match("div", "DIV"));
        assert!(!xml.names_match("Item", "item"));
        assert!(xml.names_match("dc:creator", "dc:creator"));
    }

    #[test]
    fn test_adjacent_text_is_merged() {
        let mut document = Document::new(DocumentKind::Xml);
        let root = document.root();
        let element = document.append(
            root,
            NodeData::Element {
                name: "p".into(),
                attributes: Vec::new(),
            },
        );
        document.append_text(element, "Tom ");
        document.append_text(element, "&");
        document.append_text(element, " Jerry");

        assert_eq!(document.node(element).children.len(), 1);
        assert_eq!(document.descendant_text(element), "Tom & Jerry");
    }

    /// Runs `f` on a thread with the stack size tokio gives blocking tasks
    fn on_small_stack<T, F>(f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn test_deeply_nested_xml_parses_on_small_stack() {
        let depth = 200_000;

        let (len, text) = on_small_stack(move || {
            let markup = format!("{}<h1>deep</h1>{}", "<d>".repeat(depth), "</d>".repeat(depth));
            let document = Document::parse_xml(&markup);
            let root = document.root_element().unwrap();
            (document.len(), document.descendant_text(root))
        });

        // document node, the wrappers, h1 and its text
        assert_eq!(len, depth + 3);
        assert_eq!(text, "deep");
    }

    #[test]
    fn test_deeply_nested_html_parses_on_small_stack() {
        let depth = 20_000;

        let text = on_small_stack(move || {
            let markup = format!("{}<h1>deep</h1>{}", "<div>".repeat(depth), "</div>".repeat(depth));
            let document = Document::parse_html(&markup);
            document.descendant_text(document.root())
        });

        assert_eq!(text, "deep");
    }
}
