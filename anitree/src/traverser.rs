// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Document, EId, NodeId};

macro_rules! traverser {
    ($($(#[$meta:meta])* $method:ident),+ $(,)?) => {
        /// A per-element visitor.
        ///
        /// Every method defaults to a no-op, so an implementation only handles
        /// the elements it cares about.
        #[allow(unused_variables)]
        pub trait Traverser {
            $(
                $(#[$meta])*
                fn $method(&mut self, doc: &mut Document, node: NodeId) {}
            )+
        }
    };
}

traverser!(
    /// Visits an `animate` element.
    traverse_animate,
    /// Visits an `animateTransform` element.
    traverse_animate_transform,
    /// Visits a `circle` element.
    traverse_circle,
    /// Visits a `desc` element.
    traverse_desc,
    /// Visits a `g` element.
    traverse_g,
    /// Visits a `handler` element.
    traverse_handler,
    /// Visits an `image` element.
    traverse_image,
    /// Visits a `line` element.
    traverse_line,
    /// Visits a `path` element.
    traverse_path,
    /// Visits a `polyline` element.
    traverse_polyline,
    /// Visits a `rect` element.
    traverse_rect,
    /// Visits a `script` element.
    traverse_script,
    /// Visits an `svg` element.
    traverse_svg,
    /// Visits a `text` element.
    traverse_text,
    /// Visits a `title` element.
    traverse_title,
    /// Visits a `tspan` element.
    traverse_tspan,
    /// Visits a `video` element.
    traverse_video,
);

fn visit<T: Traverser + ?Sized>(traverser: &mut T, doc: &mut Document, node: NodeId) {
    let tag_name = match doc.get(node).tag_name() {
        Some(v) => v,
        None => return,
    };

    match tag_name {
        EId::Animate => traverser.traverse_animate(doc, node),
        EId::AnimateTransform => traverser.traverse_animate_transform(doc, node),
        EId::Circle => traverser.traverse_circle(doc, node),
        EId::Desc => traverser.traverse_desc(doc, node),
        EId::G => traverser.traverse_g(doc, node),
        EId::Handler => traverser.traverse_handler(doc, node),
        EId::Image => traverser.traverse_image(doc, node),
        EId::Line => traverser.traverse_line(doc, node),
        EId::Path => traverser.traverse_path(doc, node),
        EId::Polyline => traverser.traverse_polyline(doc, node),
        EId::Rect => traverser.traverse_rect(doc, node),
        EId::Script => traverser.traverse_script(doc, node),
        EId::Svg => traverser.traverse_svg(doc, node),
        EId::Text => traverser.traverse_text(doc, node),
        EId::Title => traverser.traverse_title(doc, node),
        EId::Tspan => traverser.traverse_tspan(doc, node),
        EId::Video => traverser.traverse_video(doc, node),
    }
}

/// Walks a subtree in document order.
///
/// The node is visited first, then each child subtree. Visitors may mutate
/// the document, but nodes appended during the walk to an already visited
/// parent are not visited.
pub fn walk_tree<T: Traverser + ?Sized>(traverser: &mut T, doc: &mut Document, node: NodeId) {
    visit(traverser, doc, node);

    let mut child = doc.get(node).first_child().map(|n| n.id());
    while let Some(id) = child {
        walk_tree(traverser, doc, id);
        child = doc.get(id).next_sibling().map(|n| n.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AId, Options};

    #[derive(Default)]
    struct Collector {
        visited: Vec<EId>,
    }

    impl Traverser for Collector {
        fn traverse_svg(&mut self, _: &mut Document, _: NodeId) {
            self.visited.push(EId::Svg);
        }

        fn traverse_g(&mut self, _: &mut Document, _: NodeId) {
            self.visited.push(EId::G);
        }

        fn traverse_rect(&mut self, doc: &mut Document, node: NodeId) {
            self.visited.push(EId::Rect);
            doc.set_attribute(node, "width", "7").unwrap();
        }
    }

    #[test]
    fn document_order() {
        let mut doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <g><rect/><title>t</title></g><rect/>\
            </svg>",
            &Options::default(),
        )
        .unwrap();

        let mut collector = Collector::default();
        let root = doc.root().id();
        walk_tree(&mut collector, &mut doc, root);

        assert_eq!(collector.visited, vec![EId::Svg, EId::G, EId::Rect, EId::Rect]);
        let widths: Vec<_> = doc
            .descendants()
            .filter(|n| n.tag_name() == Some(EId::Rect))
            .map(|n| n.attribute::<f64>(AId::Width))
            .collect();
        assert_eq!(widths, vec![Some(7.0), Some(7.0)]);
    }
}
