// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::schema::{self, AttributeDescriptor};
use crate::{
    AId, AttrError, Attribute, AttributeValue, Document, Listener, NodeId, XMLNS_NS,
};

/// A record of a successful write to a watched attribute.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttributeChange {
    /// The element.
    pub node: NodeId,
    /// The attribute.
    pub attribute: AId,
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(idx) => (Some(&name[..idx]), &name[idx + 1..]),
        None => (None, name),
    }
}

impl Document {
    /// Sets an attribute from a string.
    ///
    /// The name may be qualified, like `xlink:href`. Its prefix is resolved
    /// through the document namespace table.
    ///
    /// On error, the previous value stays in place.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), AttrError> {
        let (prefix, _) = split_qname(name);
        let namespace = match prefix {
            Some("xmlns") => Some(XMLNS_NS.to_string()),
            Some(prefix) => match self.lookup_namespace(prefix) {
                Some(uri) => Some(uri.to_string()),
                None => return Err(AttrError::UnknownAttribute(name.to_string())),
            },
            None => None,
        };
        self.set_attribute_ns(node, namespace.as_deref(), name, value)
    }

    /// Sets a namespaced attribute from a string.
    ///
    /// The prefix of a qualified name is ignored, `namespace` is used instead.
    /// Attributes from the SVG namespace are treated as unqualified.
    /// `xmlns` declarations are added to the namespace table.
    pub fn set_attribute_ns(
        &mut self,
        node: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<(), AttrError> {
        let (prefix, local) = split_qname(qualified_name);

        if namespace == Some(XMLNS_NS) || qualified_name == "xmlns" {
            let prefix = if prefix.is_some() { local } else { "" };
            self.add_namespace(prefix, value);
            return Ok(());
        }

        let eid = self.get(node).tag_name().ok_or(AttrError::NotAnElement)?;
        let descriptor = schema::lookup(eid, namespace, local)
            .ok_or_else(|| AttrError::UnknownAttribute(qualified_name.to_string()))?;

        let value = descriptor.parse(value.trim_start())?;
        self.apply(node, descriptor, value);
        Ok(())
    }

    /// Sets a typed attribute value.
    ///
    /// The value must match the attribute's kind.
    pub fn set_property(
        &mut self,
        node: NodeId,
        aid: AId,
        value: AttributeValue,
    ) -> Result<(), AttrError> {
        let eid = self.get(node).tag_name().ok_or(AttrError::NotAnElement)?;
        let descriptor = schema::descriptor(eid, aid)
            .ok_or_else(|| AttrError::UnknownAttribute(aid.to_str().to_string()))?;

        if !descriptor.kind.accepts(&value) {
            return Err(AttrError::TypeMismatch(descriptor.name.to_string()));
        }

        self.apply(node, descriptor, value);
        Ok(())
    }

    fn apply(&mut self, node: NodeId, descriptor: &AttributeDescriptor, value: AttributeValue) {
        let aid = descriptor.id;

        if aid == AId::Id {
            self.unindex_id(node);
        }

        let style = match (aid, &value) {
            (AId::Style, AttributeValue::String(s)) => Some(s.clone()),
            _ => None,
        };

        self.store(node, aid, value);

        match aid {
            AId::Id => {
                let element_id = self.get(node).element_id().to_string();
                if !element_id.is_empty() && self.is_connected(node) {
                    self.index_id(element_id, node);
                }
            }
            AId::Base => self.invalidate_base_iri(node),
            AId::OnLoad => {
                let registered = self
                    .get(node)
                    .listeners("load")
                    .iter()
                    .any(|r| r.listener == Listener::Inline(node));
                if !registered {
                    self.add_event_listener(node, "load", Listener::Inline(node), false);
                }

                self.request_load_event(node);
            }
            AId::Style => {
                if let Some(style) = style {
                    self.apply_style(node, &style);
                }
            }
            _ => {}
        }
    }

    fn store(&mut self, node: NodeId, aid: AId, value: AttributeValue) {
        let e = match self.element_data_mut(node) {
            Some(e) => e,
            None => return,
        };

        match e.attributes.iter_mut().find(|a| a.name == aid) {
            Some(attr) => attr.value = value,
            None => e.attributes.push(Attribute { name: aid, value }),
        }

        if e.watched.contains(&aid) {
            self.changes.push(AttributeChange {
                node,
                attribute: aid,
            });
        }
    }

    fn apply_style(&mut self, node: NodeId, style: &str) {
        let eid = match self.get(node).tag_name() {
            Some(v) => v,
            None => return,
        };

        for declaration in simplecss::DeclarationTokenizer::from(style) {
            match schema::lookup(eid, None, declaration.name) {
                Some(d) if d.is_property() => {
                    if let Err(e) = self.set_attribute_ns(node, None, d.name, declaration.value) {
                        log::warn!("Failed to apply style on {}: {}.", eid, e);
                    }
                }
                _ => {
                    log::warn!("Unsupported style property '{}' on {}.", declaration.name, eid);
                }
            }
        }
    }

    /// Returns an attribute value formatted as a string.
    ///
    /// Falls back to the attribute's default value when it's not set.
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let n = self.get(node);
        let (prefix, local) = split_qname(name);
        let namespace = match prefix {
            Some(prefix) => Some(self.lookup_namespace(prefix)?),
            None => None,
        };

        let descriptor = schema::lookup(n.tag_name()?, namespace, local)?;
        match n.attribute_value(descriptor.id) {
            Some(value) => Some(descriptor.format(value)),
            None => descriptor.default_value().map(|v| descriptor.format(&v)),
        }
    }

    /// Returns a typed attribute value.
    ///
    /// Inheritable attributes without a local value are resolved from
    /// ancestors, stopping at `svg`. Other attributes fall back to their
    /// default value.
    pub fn get_property(&self, node: NodeId, aid: AId) -> Option<AttributeValue> {
        let n = self.get(node);
        let descriptor = n.descriptor(aid)?;

        if let Some(value) = n.attribute_value(aid) {
            return Some(value.clone());
        }

        if descriptor.is_inheritable() {
            n.find_attribute::<&AttributeValue>(aid).cloned()
        } else {
            descriptor.default_value()
        }
    }

    /// Starts tracking writes to an attribute.
    ///
    /// See [`Document::take_changes`].
    pub fn watch_attribute(&mut self, node: NodeId, aid: AId) {
        if let Some(e) = self.element_data_mut(node) {
            if !e.watched.contains(&aid) {
                e.watched.push(aid);
            }
        }
    }

    /// Returns and clears the list of watched attribute writes.
    pub fn take_changes(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EId, XLINK_NS, XML_NS};

    fn doc_with(tag: &str) -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let svg = doc.create_element("svg").unwrap();
        let node = doc.create_element(tag).unwrap();
        doc.append_child(doc.root().id(), svg).unwrap();
        doc.append_child(svg, node).unwrap();
        (doc, svg, node)
    }

    #[test]
    fn set_and_get() {
        let (mut doc, _, rect) = doc_with("rect");
        doc.set_attribute(rect, "x", "  10").unwrap();
        assert_eq!(doc.get_attribute(rect, "x").as_deref(), Some("10"));
        assert_eq!(doc.get_property(rect, AId::X), Some(AttributeValue::Length(10.0)));
        assert_eq!(doc.get_attribute(rect, "y").as_deref(), Some("0"));
        assert_eq!(doc.get(rect).attribute::<f64>(AId::X), Some(10.0));
    }

    #[test]
    fn unknown_attribute() {
        let (mut doc, _, rect) = doc_with("rect");
        assert_eq!(
            doc.set_attribute(rect, "cx", "10"),
            Err(AttrError::UnknownAttribute("cx".to_string()))
        );
        assert_eq!(doc.get_attribute(rect, "cx"), None);
    }

    #[test]
    fn invalid_value_keeps_previous() {
        let (mut doc, _, rect) = doc_with("rect");
        doc.set_attribute(rect, "width", "5").unwrap();
        assert_eq!(
            doc.set_attribute(rect, "width", "wide"),
            Err(AttrError::InvalidValue {
                attribute: "width".to_string(),
                value: "wide".to_string()
            })
        );
        assert_eq!(doc.get(rect).attribute::<f64>(AId::Width), Some(5.0));
    }

    #[test]
    fn arity_mismatch() {
        let (mut doc, svg, _) = doc_with("g");
        assert_eq!(
            doc.set_attribute(svg, "viewBox", "0 0 100"),
            Err(AttrError::ArityMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn namespaced() {
        let (mut doc, _, image) = doc_with("image");
        assert!(doc.set_attribute(image, "xlink:href", "a.png").is_err());

        doc.add_namespace("xlink", XLINK_NS);
        doc.set_attribute(image, "xlink:href", "a.png").unwrap();
        assert_eq!(doc.get(image).attribute::<&str>(AId::Href), Some("a.png"));
        assert_eq!(doc.get_attribute(image, "xlink:href").as_deref(), Some("a.png"));

        doc.set_attribute_ns(image, Some(XLINK_NS), "l:href", "b.png").unwrap();
        assert_eq!(doc.get(image).attribute::<&str>(AId::Href), Some("b.png"));

        doc.set_attribute_ns(image, Some(crate::SVG_NS), "x", "3").unwrap();
        assert_eq!(doc.get(image).attribute::<f64>(AId::X), Some(3.0));
    }

    #[test]
    fn xmlns_declaration() {
        let (mut doc, svg, _) = doc_with("g");
        doc.set_attribute(svg, "xmlns:ev", crate::XML_EVENTS_NS).unwrap();
        assert_eq!(doc.lookup_namespace("ev"), Some(crate::XML_EVENTS_NS));
        assert_eq!(doc.lookup_prefix(crate::XML_EVENTS_NS), Some("ev"));
        assert_eq!(doc.lookup_namespace("xml"), Some(XML_NS));
        assert!(doc.get(svg).attributes().is_empty());
    }

    #[test]
    fn enum_never_fails() {
        let (mut doc, svg, _) = doc_with("g");
        doc.set_attribute(svg, "baseProfile", "FULL").unwrap();
        assert_eq!(doc.get_attribute(svg, "baseProfile").as_deref(), Some("full"));
        doc.set_attribute(svg, "baseProfile", "").unwrap();
        assert_eq!(doc.get_attribute(svg, "baseProfile").as_deref(), Some("none"));
        assert_eq!(doc.get_attribute(svg, "version").as_deref(), Some("1.2"));
    }

    #[test]
    fn inheritance_stops_at_svg() {
        let mut doc = Document::new();
        let outer = doc.create_element("svg").unwrap();
        let g = doc.create_element("g").unwrap();
        let inner = doc.create_element("svg").unwrap();
        let rect = doc.create_element("rect").unwrap();
        let circle = doc.create_element("circle").unwrap();
        doc.append_child(doc.root().id(), outer).unwrap();
        doc.append_child(outer, g).unwrap();
        doc.append_child(g, rect).unwrap();
        doc.append_child(g, inner).unwrap();
        doc.append_child(inner, circle).unwrap();

        doc.set_attribute(g, "fill", "red").unwrap();
        doc.set_attribute(outer, "stroke", "blue").unwrap();

        let red = AttributeValue::Color(svgtypes::Color::new_rgb(255, 0, 0));
        assert_eq!(doc.get_property(rect, AId::Fill), Some(red));
        assert_eq!(doc.get_property(circle, AId::Fill), None);
        // `svg` itself ends the lookup.
        assert_eq!(doc.get_property(rect, AId::Stroke), None);
        assert!(doc.get_property(outer, AId::Stroke).is_some());
        // Inheritable attributes never fall back to the default.
        assert_eq!(doc.get_property(rect, AId::FillOpacity), None);
    }

    #[test]
    fn style_declarations() {
        let (mut doc, _, rect) = doc_with("rect");
        doc.set_attribute(rect, "style", "fill:#00ff00; width:10; unknown:1; fill-opacity:0.5")
            .unwrap();
        assert_eq!(doc.get_attribute(rect, "fill").as_deref(), Some("#00ff00"));
        assert_eq!(doc.get_property(rect, AId::FillOpacity), Some(AttributeValue::Number(0.5)));
        // `width` is not a style property.
        assert_eq!(doc.get(rect).attribute::<f64>(AId::Width), None);
    }

    #[test]
    fn set_property_checks_kind() {
        let (mut doc, _, rect) = doc_with("rect");
        assert_eq!(
            doc.set_property(rect, AId::X, AttributeValue::Number(1.0)),
            Err(AttrError::TypeMismatch("x".to_string()))
        );
        doc.set_property(rect, AId::X, AttributeValue::Length(4.0)).unwrap();
        assert_eq!(doc.get(rect).attribute::<f64>(AId::X), Some(4.0));

        let text = doc.create_text_node("a");
        assert_eq!(
            doc.set_property(text, AId::X, AttributeValue::Length(4.0)),
            Err(AttrError::NotAnElement)
        );
    }

    #[test]
    fn id_index() {
        let (mut doc, svg, rect) = doc_with("rect");
        doc.set_attribute(rect, "id", "r1").unwrap();
        assert_eq!(doc.element_by_id("r1").unwrap().id(), rect);

        doc.set_attribute(rect, "id", "r2").unwrap();
        assert!(doc.element_by_id("r1").is_none());
        assert_eq!(doc.element_by_id("r2").unwrap().id(), rect);

        let dup = doc.create_element("circle").unwrap();
        doc.set_attribute(dup, "id", "r2").unwrap();
        // Not attached yet.
        assert_eq!(doc.element_by_id("r2").unwrap().id(), rect);
        doc.append_child(svg, dup).unwrap();
        assert_eq!(doc.element_by_id("r2").unwrap().tag_name(), Some(EId::Circle));
    }

    #[test]
    fn watched_changes() {
        let (mut doc, _, rect) = doc_with("rect");
        doc.set_attribute(rect, "x", "1").unwrap();
        assert!(doc.take_changes().is_empty());

        doc.watch_attribute(rect, AId::X);
        doc.set_attribute(rect, "x", "2").unwrap();
        doc.set_attribute(rect, "y", "2").unwrap();
        let _ = doc.set_attribute(rect, "x", "bad");
        assert_eq!(
            doc.take_changes(),
            vec![AttributeChange { node: rect, attribute: AId::X }]
        );
        assert!(doc.take_changes().is_empty());
    }
}
