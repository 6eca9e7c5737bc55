// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::{HashMap, HashSet};

use anitree::schema::{self, FontStyle, FontWeight};
use anitree::{AId, Document, MouseData, NodeId, ScriptContext, ScriptError, XmlEvent};

use crate::shapes;

/// A scene object index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Returns the index inside [`Scene::objects`].
    #[inline]
    pub fn get(&self) -> usize {
        self.0
    }
}

/// Resolved fill and stroke.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct Paint {
    /// Fill color, with `fill-opacity` applied to alpha.
    pub fill: Option<tiny_skia::Color>,
    /// Stroke color.
    pub stroke: Option<tiny_skia::Color>,
}

/// A text object.
#[derive(Clone, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct TextData {
    pub x: f64,
    pub y: f64,
    /// Flattened text of the element and its `tspan` children.
    pub text: String,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
}

/// An image or a video object.
#[derive(Clone, PartialEq, Debug)]
pub struct ImageData {
    /// Position and size. `None` when the size is zero.
    pub rect: Option<tiny_skia::Rect>,
    /// The `xlink:href` resolved against the element's base IRI.
    pub href: Option<String>,
    /// Fetched content. `None` when loading failed.
    pub data: Option<Vec<u8>>,
    /// Content type from the `type` attribute.
    pub mime_type: Option<String>,
    /// Set for `video` elements.
    pub is_video: bool,
}

/// A scene object kind.
#[derive(Clone, Debug)]
pub enum ObjectKind {
    /// `svg` and `g`.
    Group,
    /// `rect`, `circle`, `line`, `path` and `polyline`.
    ///
    /// `None` for shapes without geometry, like a zero sized rect.
    Path(Option<tiny_skia::Path>),
    /// `text`.
    Text(TextData),
    /// `image` and `video`.
    Image(ImageData),
}

/// A paintable object bound to an element.
#[derive(Clone, Debug)]
pub struct SceneObject {
    /// The element this object was built from.
    pub node: NodeId,
    /// The closest ancestor object.
    pub parent: Option<ObjectId>,
    /// Geometry and content.
    pub kind: ObjectKind,
    /// Fill and stroke.
    pub paint: Paint,
    /// The element's `transform`.
    pub transform: tiny_skia::Transform,
    /// Does this object receive mouse events.
    pub reactive: bool,
    /// Was the object updated by [`Scene::sync`] since the last [`Scene::clear_dirty`].
    pub dirty: bool,
    /// Animatable attributes the object is built from.
    pub bindings: Vec<AId>,
}

/// A flat list of scene objects in document order.
#[derive(Clone, Default, Debug)]
pub struct Scene {
    objects: Vec<SceneObject>,
    by_node: HashMap<NodeId, ObjectId>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Scene::default()
    }

    /// Appends an object.
    ///
    /// An element can be bound to a single object. A second one replaces the link.
    pub fn push(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.by_node.insert(object.node, id);
        self.objects.push(object);
        id
    }

    /// Returns all objects.
    #[inline]
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Returns an object.
    #[inline]
    pub fn get(&self, id: ObjectId) -> &SceneObject {
        &self.objects[id.0]
    }

    /// Returns a mutable object.
    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> &mut SceneObject {
        &mut self.objects[id.0]
    }

    /// Returns the object bound to an element.
    #[inline]
    pub fn object_for(&self, node: NodeId) -> Option<ObjectId> {
        self.by_node.get(&node).cloned()
    }

    /// Returns the number of objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Checks that the scene has no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Rebuilds objects whose bound attributes were written since the last call.
    ///
    /// Refreshed objects are marked dirty until [`Scene::clear_dirty`].
    /// Inheritable attributes also refresh objects of descendant elements.
    /// Returns the number of refreshed objects.
    pub fn sync(&mut self, doc: &mut Document) -> usize {
        let mut nodes: Vec<NodeId> = Vec::new();
        for change in doc.take_changes() {
            let node = doc.get(change.node);
            let inheritable = node
                .tag_name()
                .and_then(|eid| schema::descriptor(eid, change.attribute))
                .map(|d| d.is_inheritable())
                .unwrap_or(false);

            if inheritable {
                nodes.extend(node.descendants().map(|n| n.id()));
            } else {
                nodes.push(change.node);
            }
        }

        let mut refreshed = HashSet::new();
        for node in nodes {
            let id = match self.object_for(node) {
                Some(v) => v,
                None => continue,
            };

            if !refreshed.insert(id) {
                continue;
            }

            shapes::refresh(doc.get(node), &mut self.objects[id.0]);
            self.objects[id.0].dirty = true;
        }

        log::trace!("{} objects refreshed.", refreshed.len());
        refreshed.len()
    }

    /// Resets the dirty flag of every object.
    pub fn clear_dirty(&mut self) {
        for object in &mut self.objects {
            object.dirty = false;
        }
    }

    /// Delivers a button release on an object as a `click` event.
    ///
    /// Returns `false` when the object is not reactive.
    pub fn button_release(
        &self,
        doc: &Document,
        object: ObjectId,
        mouse: MouseData,
        script: &mut dyn ScriptContext,
    ) -> Result<bool, ScriptError> {
        let object = self.get(object);
        if !object.reactive {
            return Ok(false);
        }

        doc.dispatch_event(XmlEvent::click(object.node, mouse), script)?;
        Ok(true)
    }
}
