// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anitree::{walk_tree, Document, EventType, NodeId, Traverser};

use crate::builder::register_handler;

/// Registers `load` handlers only.
///
/// Useful for running a document's scripts without building a scene.
#[derive(Clone, Copy, Default, Debug)]
pub struct LoadTraverser;

impl Traverser for LoadTraverser {
    fn traverse_handler(&mut self, doc: &mut Document, node: NodeId) {
        if doc.handler_event_type(node) == EventType::Load {
            register_handler(doc, node);
        }
    }
}

/// Walks the whole document with a [`LoadTraverser`].
pub fn register_load_handlers(doc: &mut Document) {
    let root = doc.root().id();
    walk_tree(&mut LoadTraverser, doc, root);
}
