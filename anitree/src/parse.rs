// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use xmlwriter::XmlWriter;

use crate::schema::{self, conventional_prefix};
use crate::{Document, EId, Error, Node, NodeId, Options, SVG_NS, XML_NS};

/// An attribute passed to [`TreeBuilder::start_element`].
#[derive(Clone, Copy, Debug)]
pub struct XmlAttribute<'a> {
    /// Namespace URI.
    pub namespace: Option<&'a str>,
    /// Local or qualified name.
    pub name: &'a str,
    /// Raw value.
    pub value: &'a str,
}

/// A push interface for building a document from an XML tokenizer.
///
/// Elements are appended to the current node and their attributes are set
/// through the schema, so ids, listeners and load events are handled the same
/// way as for a document built by hand.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    doc: &'a mut Document,
    stack: Vec<NodeId>,
    keep_whitespace: bool,
    nodes_limit: u32,
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder that appends to the document root.
    pub fn new(doc: &'a mut Document, opt: &Options) -> Self {
        let root = doc.root().id();
        TreeBuilder {
            doc,
            stack: vec![root],
            keep_whitespace: opt.keep_whitespace,
            nodes_limit: opt.nodes_limit,
        }
    }

    /// Returns the node new children are appended to.
    #[inline]
    pub fn current(&self) -> NodeId {
        // The root is never popped.
        self.stack[self.stack.len() - 1]
    }

    /// Declares a namespace prefix.
    pub fn namespace(&mut self, prefix: Option<&str>, uri: &str) {
        self.doc.add_namespace(prefix.unwrap_or(""), uri);
    }

    /// Opens an element.
    ///
    /// Unknown elements are replaced with `desc`. Attribute errors are logged
    /// and skipped.
    pub fn start_element(
        &mut self,
        namespace: Option<&str>,
        tag_name: &str,
        attributes: &[XmlAttribute],
    ) -> Result<NodeId, Error> {
        if self.stack.len() as u32 > self.nodes_limit {
            return Err(Error::ElementsLimitReached);
        }

        let eid = match EId::from_str(tag_name) {
            Some(eid) => eid,
            None => {
                log::warn!("Unsupported element '{}'. Replaced with 'desc'.", tag_name);
                EId::Desc
            }
        };

        let parent = self.current();
        let node = self.doc.create_element_id(eid);
        if let Some(e) = self.doc.element_data_mut(node) {
            e.namespace = namespace.map(String::from);
        }

        if let Err(e) = self.doc.append_child(parent, node) {
            log::warn!("Failed to append {}: {}.", eid, e);
        }

        log::trace!("Append {} to {:?}.", eid, parent);
        self.stack.push(node);

        for attr in attributes {
            if let Err(e) = self
                .doc
                .set_attribute_ns(node, attr.namespace, attr.name, attr.value)
            {
                match e {
                    crate::AttrError::UnknownAttribute(_) => {
                        log::warn!("Unsupported attribute '{}' on {}.", attr.name, eid);
                    }
                    _ => log::warn!("Failed to parse {} value: '{}'. {}.", attr.name, attr.value, e),
                }
            }
        }

        Ok(node)
    }

    /// Closes the current element.
    ///
    /// The element and its children are marked as parsed.
    pub fn end_element(&mut self) -> Option<NodeId> {
        if self.stack.len() < 2 {
            log::warn!("Unbalanced element end.");
            return None;
        }

        let node = self.stack.pop()?;
        self.doc.finish_element(node);
        Some(node)
    }

    /// Appends a text node, including CDATA sections.
    ///
    /// Whitespace-only text is skipped unless `keep_whitespace` is set.
    pub fn text(&mut self, data: &str) -> Option<NodeId> {
        if !self.keep_whitespace && data.trim().is_empty() {
            return None;
        }

        let parent = self.current();
        let node = self.doc.create_text_node(data);
        match self.doc.append_child(parent, node) {
            Ok(()) => Some(node),
            Err(e) => {
                log::warn!("Failed to append text: {}.", e);
                None
            }
        }
    }
}

impl Document {
    /// Parses a [`Document`] from a string.
    pub fn parse_str(text: &str, opt: &Options) -> Result<Document, Error> {
        let xml = roxmltree::Document::parse(text)?;
        Document::parse_tree(&xml, opt)
    }

    /// Parses a [`Document`] from a [`roxmltree::Document`].
    pub fn parse_tree(xml: &roxmltree::Document, opt: &Options) -> Result<Document, Error> {
        let mut doc = Document::new();
        doc.base_iri = opt.base_iri.clone();

        {
            let mut builder = TreeBuilder::new(&mut doc, opt);
            for node in xml.root().children() {
                parse_xml_node(node, &mut builder)?;
            }
        }

        match doc.root_element() {
            Some(node) => {
                if node.tag_name() != Some(EId::Svg) {
                    log::warn!("The root element is not 'svg'.");
                }
            }
            None => return Err(Error::NoRootElement),
        }

        Ok(doc)
    }

    /// Writes the document back to XML.
    ///
    /// Attributes are written in their canonical form.
    pub fn to_xml_string(&self) -> String {
        let mut xml = XmlWriter::new(xmlwriter::Options::default());
        write_children(self.root(), true, &mut xml);
        xml.end_document()
    }
}

fn parse_xml_node(node: roxmltree::Node, builder: &mut TreeBuilder) -> Result<(), Error> {
    if node.is_element() {
        for ns in node.namespaces() {
            builder.namespace(ns.name(), ns.uri());
        }

        let attributes: Vec<XmlAttribute> = node
            .attributes()
            .map(|attr| XmlAttribute {
                namespace: attr.namespace(),
                name: attr.name(),
                value: attr.value(),
            })
            .collect();

        let tag_name = node.tag_name();
        builder.start_element(tag_name.namespace(), tag_name.name(), &attributes)?;

        for child in node.children() {
            parse_xml_node(child, builder)?;
        }

        builder.end_element();
    } else if node.is_text() {
        builder.text(node.text().unwrap_or(""));
    }

    Ok(())
}

fn write_children(parent: Node, is_root: bool, xml: &mut XmlWriter) {
    for node in parent.children() {
        let tag_name = match node.tag_name() {
            Some(v) => v,
            None => {
                let text = node.text();
                if !text.is_empty() {
                    xml.write_text(text);
                }

                continue;
            }
        };

        xml.start_element(tag_name.to_str());

        if is_root {
            write_namespaces(node, xml);
        }

        for attr in node.attributes() {
            let name = match schema::descriptor(tag_name, attr.name) {
                Some(d) => match d.namespace {
                    Some(uri) => {
                        let doc = node.document();
                        match doc.lookup_prefix(uri).or_else(|| conventional_prefix(uri)) {
                            Some(prefix) => format!("{}:{}", prefix, d.name),
                            None => d.name.to_string(),
                        }
                    }
                    None => d.name.to_string(),
                },
                None => attr.name.to_str().to_string(),
            };

            xml.write_attribute(&name, &attr.value);
        }

        // Text is written as is, with no indentation.
        let preserve = node.children().any(|c| c.is_text());
        if preserve {
            xml.set_preserve_whitespaces(true);
        }

        if node.has_children() {
            write_children(node, false, xml);
        }

        xml.end_element();

        if preserve {
            xml.set_preserve_whitespaces(false);
        }
    }
}

fn write_namespaces(root: Node, xml: &mut XmlWriter) {
    xml.write_attribute("xmlns", SVG_NS);

    let mut declared: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let tag_name = match node.tag_name() {
            Some(v) => v,
            None => continue,
        };

        for attr in node.attributes() {
            let uri = match schema::descriptor(tag_name, attr.name).and_then(|d| d.namespace) {
                Some(uri) => uri,
                None => continue,
            };

            if uri == XML_NS || declared.contains(&uri) {
                continue;
            }

            let doc = root.document();
            if let Some(prefix) = doc.lookup_prefix(uri).or_else(|| conventional_prefix(uri)) {
                xml.write_attribute(&format!("xmlns:{}", prefix), uri);
                declared.push(uri);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AId;

    #[test]
    fn unknown_element_becomes_desc() {
        let doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg'><blink/><rect/></svg>",
            &Options::default(),
        )
        .unwrap();

        let tags: Vec<_> = doc.root_element().unwrap().children().map(|n| n.tag_name()).collect();
        assert_eq!(tags, vec![Some(EId::Desc), Some(EId::Rect)]);
    }

    #[test]
    fn whitespace_text() {
        let text = "<svg xmlns='http://www.w3.org/2000/svg'>\n  <text> a </text>\n</svg>";
        let doc = Document::parse_str(text, &Options::default()).unwrap();
        assert_eq!(doc.root_element().unwrap().children().count(), 1);

        let opt = Options {
            keep_whitespace: true,
            ..Options::default()
        };
        let doc = Document::parse_str(text, &opt).unwrap();
        assert_eq!(doc.root_element().unwrap().children().count(), 3);
    }

    #[test]
    fn cdata() {
        let doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg'><script><![CDATA[a < b]]></script></svg>",
            &Options::default(),
        )
        .unwrap();
        let script = doc.root_element().unwrap().first_child().unwrap();
        assert_eq!(script.text(), "a < b");
    }

    #[test]
    fn nesting_limit() {
        let opt = Options {
            nodes_limit: 3,
            ..Options::default()
        };
        let text = "<svg xmlns='http://www.w3.org/2000/svg'><g><g><g/></g></g></svg>";
        assert!(matches!(Document::parse_str(text, &opt), Err(Error::ElementsLimitReached)));

        let text = "<svg xmlns='http://www.w3.org/2000/svg'><g><g/></g></svg>";
        assert!(Document::parse_str(text, &opt).is_ok());
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            Document::parse_str("<svg", &Options::default()),
            Err(Error::ParsingFailed(_))
        ));
    }

    #[test]
    fn elements_are_loaded() {
        let doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg'><g><rect/></g></svg>",
            &Options::default(),
        )
        .unwrap();
        assert!(doc.descendants().filter(|n| n.is_element()).all(|n| n.is_loaded()));
    }

    #[test]
    fn bad_attributes_are_skipped() {
        let doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg'><rect x='abc' y='5' class='c'/></svg>",
            &Options::default(),
        )
        .unwrap();
        let rect = doc.root_element().unwrap().first_child().unwrap();
        assert!(!rect.has_attribute(AId::X));
        assert_eq!(rect.attribute::<f64>(AId::Y), Some(5.0));
    }

    #[test]
    fn push_interface() {
        let mut doc = Document::new();
        let opt = Options::default();
        let mut builder = TreeBuilder::new(&mut doc, &opt);
        builder.namespace(Some("xlink"), crate::XLINK_NS);
        let svg = builder.start_element(Some(SVG_NS), "svg", &[]).unwrap();
        builder
            .start_element(
                Some(SVG_NS),
                "image",
                &[XmlAttribute {
                    namespace: Some(crate::XLINK_NS),
                    name: "href",
                    value: "a.png",
                }],
            )
            .unwrap();
        builder.end_element();
        assert_eq!(builder.end_element(), Some(svg));
        assert_eq!(builder.end_element(), None);

        let image = doc.get(svg).first_child().unwrap();
        assert_eq!(image.attribute::<&str>(AId::Href), Some("a.png"));
        assert_eq!(image.namespace(), Some(SVG_NS));
        assert!(doc.is_loaded(svg));
    }

    #[test]
    fn write_xml() {
        let doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
                <rect x='1in' fill='red'/><image xlink:href='a.png'/>\
            </svg>",
            &Options::default(),
        )
        .unwrap();

        let xml = doc.to_xml_string();
        assert!(xml.starts_with(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\">"
        ));
        assert!(xml.contains("<rect x=\"96\" fill=\"#ff0000\"/>"));
        assert!(xml.contains("<image xlink:href=\"a.png\"/>"));

        // The output can be parsed back.
        let doc2 = Document::parse_str(&xml, &Options::default()).unwrap();
        assert_eq!(doc2.to_xml_string(), xml);
    }
}
