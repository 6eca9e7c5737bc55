// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Document, EId, ElementData, NodeData, NodeId, NodeKind, TreeError};

impl Document {
    /// Creates an unparented element.
    ///
    /// Returns `None` for an unknown tag name.
    pub fn create_element(&mut self, tag_name: &str) -> Option<NodeId> {
        let eid = EId::from_str(tag_name)?;
        Some(self.create_element_id(eid))
    }

    /// Creates an unparented element from a known tag.
    pub fn create_element_id(&mut self, tag_name: EId) -> NodeId {
        self.push_node(NodeKind::Element(Box::new(ElementData::new(tag_name))))
    }

    /// Creates an unparented text node.
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from(self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// The child must be unparented. Both trees stay unchanged on error.
    /// Ids of the appended subtree are indexed when `parent` is connected
    /// to the document root.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.node_data(child).parent.is_some() {
            return Err(TreeError::AlreadyAttached);
        }

        if matches!(self.node_data(child).kind, NodeKind::Root)
            || matches!(self.node_data(parent).kind, NodeKind::Text(_))
            || self.get(parent).ancestors().any(|n| n.id() == child)
        {
            return Err(TreeError::HierarchyRequest);
        }

        let last_child_id = self.node_data(parent).children.map(|(_, id)| id);

        if let Some(id) = last_child_id {
            self.node_data_mut(id).next_sibling = Some(child);
        }

        {
            let data = self.node_data_mut(child);
            data.parent = Some(parent);
            data.prev_sibling = last_child_id;
            data.next_sibling = None;
        }

        let parent_data = self.node_data_mut(parent);
        parent_data.children = Some(match parent_data.children {
            Some((first_child_id, _)) => (first_child_id, child),
            None => (child, child),
        });

        self.invalidate_base_iri(child);
        if self.is_connected(parent) {
            self.index_subtree(child);
        }

        Ok(())
    }

    /// Not supported.
    pub fn insert_before(
        &mut self,
        _parent: NodeId,
        _child: NodeId,
        _reference: NodeId,
    ) -> Result<(), TreeError> {
        Err(TreeError::NotSupported)
    }

    /// Not supported.
    pub fn remove_child(&mut self, _parent: NodeId, _child: NodeId) -> Result<(), TreeError> {
        Err(TreeError::NotSupported)
    }

    /// Not supported.
    pub fn replace_child(
        &mut self,
        _parent: NodeId,
        _new_child: NodeId,
        _old_child: NodeId,
    ) -> Result<(), TreeError> {
        Err(TreeError::NotSupported)
    }

    /// Checks that a node is attached to the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).ancestors().any(|n| n.is_root())
    }

    fn index_subtree(&mut self, id: NodeId) {
        let ids: Vec<(String, NodeId)> = self
            .get(id)
            .descendants()
            .filter_map(|n| {
                let element_id = n.element_id();
                if element_id.is_empty() {
                    None
                } else {
                    Some((element_id.to_string(), n.id()))
                }
            })
            .collect();

        for (element_id, node) in ids {
            self.index_id(element_id, node);
        }
    }

    pub(crate) fn index_id(&mut self, element_id: String, node: NodeId) {
        if let Some(prev) = self.links.insert(element_id, node) {
            if prev != node {
                log::warn!(
                    "Element '#{}' has a duplicated id. The last one will be used.",
                    self.get(node).element_id()
                );
            }
        }
    }

    pub(crate) fn unindex_id(&mut self, node: NodeId) {
        let old = self.get(node).element_id().to_string();
        if !old.is_empty() && self.links.get(&old) == Some(&node) {
            self.links.remove(&old);
        }
    }

    pub(crate) fn element_ids(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(node)
            .descendants()
            .filter(|n| n.is_element())
            .map(|n| n.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let svg = doc.create_element("svg").unwrap();
        let g = doc.create_element("g").unwrap();
        doc.append_child(doc.root().id(), svg).unwrap();
        doc.append_child(svg, g).unwrap();
        (doc, svg, g)
    }

    #[test]
    fn unknown_tag() {
        let mut doc = Document::new();
        assert_eq!(doc.create_element("blink"), None);
        assert!(doc.create_element("animateTransform").is_some());
    }

    #[test]
    fn sibling_links() {
        let (mut doc, svg, _) = sample();
        let a = doc.create_element("rect").unwrap();
        let b = doc.create_element("circle").unwrap();
        doc.append_child(svg, a).unwrap();
        doc.append_child(svg, b).unwrap();

        let svg_node = doc.get(svg);
        let ids: Vec<_> = svg_node.children().map(|n| n.tag_name().unwrap()).collect();
        assert_eq!(ids, vec![EId::G, EId::Rect, EId::Circle]);

        let rect = doc.get(a);
        assert_eq!(rect.prev_sibling().unwrap().tag_name(), Some(EId::G));
        assert_eq!(rect.next_sibling().unwrap().id(), b);
        assert_eq!(doc.get(b).next_sibling(), None);
        assert_eq!(svg_node.last_child().unwrap().id(), b);
        assert_eq!(rect.parent().unwrap().id(), svg);

        let rev: Vec<_> = svg_node.children().rev().map(|n| n.id()).collect();
        assert_eq!(rev[0], b);
    }

    #[test]
    fn append_attached() {
        let (mut doc, svg, g) = sample();
        let other = doc.create_element("g").unwrap();
        assert_eq!(doc.append_child(other, g), Err(TreeError::AlreadyAttached));

        assert_eq!(doc.get(g).parent().unwrap().id(), svg);
        assert!(!doc.get(other).has_children());
        assert_eq!(doc.get(svg).children().count(), 1);
    }

    #[test]
    fn hierarchy_errors() {
        let (mut doc, svg, g) = sample();
        let root = doc.root().id();
        assert_eq!(doc.append_child(g, root), Err(TreeError::HierarchyRequest));

        let text = doc.create_text_node("text");
        let rect = doc.create_element("rect").unwrap();
        assert_eq!(doc.append_child(text, rect), Err(TreeError::HierarchyRequest));

        let a = doc.create_element("g").unwrap();
        let b = doc.create_element("g").unwrap();
        doc.append_child(a, b).unwrap();
        assert_eq!(doc.append_child(b, a), Err(TreeError::HierarchyRequest));
        assert_eq!(doc.append_child(a, a), Err(TreeError::HierarchyRequest));

        assert_eq!(doc.get(svg).children().count(), 1);
    }

    #[test]
    fn not_supported() {
        let (mut doc, svg, g) = sample();
        let rect = doc.create_element("rect").unwrap();
        assert_eq!(doc.insert_before(svg, rect, g), Err(TreeError::NotSupported));
        assert_eq!(doc.remove_child(svg, g), Err(TreeError::NotSupported));
        assert_eq!(doc.replace_child(svg, rect, g), Err(TreeError::NotSupported));
    }

    #[test]
    fn connected() {
        let (mut doc, _, g) = sample();
        let detached = doc.create_element("g").unwrap();
        assert!(doc.is_connected(g));
        assert!(!doc.is_connected(detached));
    }

    #[test]
    fn text_content() {
        let (mut doc, svg, _) = sample();
        let text = doc.create_element("text").unwrap();
        let tspan = doc.create_element("tspan").unwrap();
        let t1 = doc.create_text_node("Hello, ");
        let t2 = doc.create_text_node("World");
        doc.append_child(svg, text).unwrap();
        doc.append_child(text, t1).unwrap();
        doc.append_child(text, tspan).unwrap();
        doc.append_child(tspan, t2).unwrap();

        assert_eq!(doc.get(text).text(), "Hello, ");
        assert_eq!(doc.get(text).text_content(), "Hello, World");
    }
}
