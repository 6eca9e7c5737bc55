// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anitree::schema::{self, TransformType};
use anitree::{
    walk_tree, AId, Document, Duration, EventType, Listener, NodeId, RepeatCount,
    ResourceFetcher, Traverser, ValueKind,
};

use crate::animation::{Interval, Repeat, Score, ScoreEntry, Timeline};
use crate::scene::{ImageData, ObjectId, ObjectKind, Scene, SceneObject};
use crate::shapes;

/// Builds a [`Scene`] and a [`Score`] from a document.
///
/// Scene objects watch their animatable attributes, so [`Scene::sync`]
/// picks up later writes.
pub struct SceneBuilder<'a> {
    fetcher: &'a dyn ResourceFetcher,
    scene: Scene,
    score: Score,
    reactive: Vec<NodeId>,
}

impl std::fmt::Debug for SceneBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SceneBuilder")
            .field("scene", &self.scene)
            .field("score", &self.score)
            .finish()
    }
}

/// Walks the whole document with a [`SceneBuilder`].
pub fn build_scene(doc: &mut Document, fetcher: &dyn ResourceFetcher) -> (Scene, Score) {
    let mut builder = SceneBuilder::new(fetcher);
    let root = doc.root().id();
    walk_tree(&mut builder, doc, root);
    builder.finish()
}

impl<'a> SceneBuilder<'a> {
    /// Creates a new builder.
    pub fn new(fetcher: &'a dyn ResourceFetcher) -> Self {
        SceneBuilder {
            fetcher,
            scene: Scene::new(),
            score: Score::new(),
            reactive: Vec::new(),
        }
    }

    /// Returns the built scene and score.
    ///
    /// Score entries and mouse handlers targeting elements visited later
    /// are linked to their objects here.
    pub fn finish(mut self) -> (Scene, Score) {
        self.score.resolve_objects(&self.scene);

        for target in self.reactive {
            match self.scene.object_for(target) {
                Some(id) => self.scene.get_mut(id).reactive = true,
                None => log::warn!("Handler target has no scene object."),
            }
        }

        (self.scene, self.score)
    }

    fn parent_object(&self, doc: &Document, node: NodeId) -> Option<ObjectId> {
        doc.get(node)
            .ancestors()
            .skip(1)
            .find_map(|n| self.scene.object_for(n.id()))
    }

    fn push_object(&mut self, doc: &mut Document, node: NodeId, kind: ObjectKind) -> ObjectId {
        let n = doc.get(node);
        let bindings = n.tag_name().map(shapes::bindings).unwrap_or_default();
        let object = SceneObject {
            node,
            parent: self.parent_object(doc, node),
            kind,
            paint: shapes::convert_paint(n),
            transform: shapes::convert_transform(n),
            reactive: false,
            dirty: false,
            bindings,
        };

        for aid in &object.bindings {
            doc.watch_attribute(node, *aid);
        }

        self.scene.push(object)
    }

    fn build_shape(&mut self, doc: &mut Document, node: NodeId) {
        if let Some(kind) = shapes::convert(doc.get(node)) {
            self.push_object(doc, node, kind);
        }
    }

    fn build_image(&mut self, doc: &mut Document, node: NodeId, is_video: bool) {
        let n = doc.get(node);
        let href = n.attribute::<&str>(AId::Href).map(|href| doc.resolve_href(node, href));

        let data = match href {
            Some(ref iri) => match self.fetcher.fetch(iri) {
                Ok(data) => Some(data),
                Err(e) => {
                    log::warn!("Cannot load '{}': {}.", iri, e);
                    None
                }
            },
            None => {
                log::warn!("Cannot load an image without 'href'.");
                None
            }
        };

        let image = ImageData {
            rect: shapes::convert_image_rect(n),
            href,
            data,
            mime_type: n.attribute::<&str>(AId::Type).map(String::from),
            is_video,
        };

        self.push_object(doc, node, ObjectKind::Image(image));
    }

    fn build_animation(&mut self, doc: &Document, node: NodeId, transform: Option<TransformType>) {
        let n = doc.get(node);
        let target = animation_target(doc, node);
        let target_node = doc.get(target);
        let target_eid = match target_node.tag_name() {
            Some(v) => v,
            None => return,
        };

        let name = match transform {
            Some(_) => AId::Transform.to_str(),
            None => n.attribute::<&str>(AId::AttributeName).unwrap_or(""),
        };

        let descriptor = match schema::lookup(target_eid, None, name) {
            Some(d) if d.is_animatable() => d,
            Some(_) => {
                log::warn!("Cannot animate property {}: not animatable.", name);
                return;
            }
            None => {
                log::warn!(
                    "Cannot animate property {}: {} has no '{}' attribute.",
                    name,
                    target_eid,
                    name
                );
                return;
            }
        };

        let (from, to) = match (
            n.attribute::<&str>(AId::From),
            n.attribute::<&str>(AId::To),
        ) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                log::warn!("Animation of {} requires 'from' and 'to'. Skipped.", name);
                return;
            }
        };

        let parse = |text: &str| match transform {
            Some(_) => ValueKind::NumberList(None).parse(text).ok(),
            None => descriptor.parse(text).ok(),
        };

        let interval = match (parse(from), parse(to)) {
            (Some(from), Some(to)) => Interval {
                from,
                to,
                transform,
            },
            _ => {
                log::warn!("Failed to parse {} interval: '{}' to '{}'.", name, from, to);
                return;
            }
        };

        let duration = match n.attribute::<Duration>(AId::Dur) {
            Some(d) if !d.is_zero() => d.to_milliseconds(),
            _ => {
                log::warn!("Animation of {} has no duration. Skipped.", name);
                return;
            }
        };

        let timeline = Timeline {
            duration,
            repeat: Repeat::from_repeat_count(n.attribute::<RepeatCount>(AId::RepeatCount)),
        };

        self.score.append(ScoreEntry {
            object: None,
            node: target,
            attribute: descriptor.id,
            timeline,
            interval,
        });
    }
}

/// Returns the element an animation applies to.
///
/// That's the element referenced by a local `xlink:href`, or the parent element.
/// Anything else, including external references, falls back to the parent.
fn animation_target(doc: &Document, node: NodeId) -> NodeId {
    let n = doc.get(node);
    if let Some(id) = n.attribute::<&str>(AId::Href).and_then(|h| h.strip_prefix('#')) {
        if let Some(target) = doc.element_by_id(id) {
            return target.id();
        }
    }

    n.parent().map(|p| p.id()).unwrap_or(node)
}

/// Registers a `handler` on its target.
///
/// Load events fire at once when the target is loaded.
/// Returns the target of a mouse event handler, which has to become reactive.
pub(crate) fn register_handler(doc: &mut Document, node: NodeId) -> Option<NodeId> {
    let target = match doc.handler_target(node) {
        Some(v) => v,
        None => {
            log::warn!("Handler has no target.");
            return None;
        }
    };

    let kind = doc.handler_event_type(node);
    match kind {
        EventType::Click => {
            doc.add_event_listener(target, kind.as_str(), Listener::Handler(node), false);
            Some(target)
        }
        EventType::Load => {
            doc.add_event_listener(target, kind.as_str(), Listener::Handler(node), false);
            doc.request_load_event(target);
            None
        }
        EventType::SvgTimer => {
            doc.add_event_listener(target, kind.as_str(), Listener::Handler(node), false);
            None
        }
        EventType::None => {
            log::warn!("Unknown handler event {}.", kind);
            None
        }
    }
}

impl Traverser for SceneBuilder<'_> {
    fn traverse_svg(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_g(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_rect(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_circle(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_line(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_path(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_polyline(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_text(&mut self, doc: &mut Document, node: NodeId) {
        self.build_shape(doc, node);
    }

    fn traverse_image(&mut self, doc: &mut Document, node: NodeId) {
        self.build_image(doc, node, false);
    }

    fn traverse_video(&mut self, doc: &mut Document, node: NodeId) {
        self.build_image(doc, node, true);
    }

    fn traverse_animate(&mut self, doc: &mut Document, node: NodeId) {
        self.build_animation(doc, node, None);
    }

    fn traverse_animate_transform(&mut self, doc: &mut Document, node: NodeId) {
        let kind = doc
            .get(node)
            .attribute::<TransformType>(AId::Type)
            .unwrap_or_default();

        if kind == TransformType::None {
            log::warn!("animateTransform without a transform type. Skipped.");
            return;
        }

        self.build_animation(doc, node, Some(kind));
    }

    fn traverse_handler(&mut self, doc: &mut Document, node: NodeId) {
        if let Some(target) = register_handler(doc, node) {
            self.reactive.push(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anitree::{AttributeValue, Options, ResourceError};

    struct NoFetch;

    impl ResourceFetcher for NoFetch {
        fn fetch(&self, iri: &str) -> Result<Vec<u8>, ResourceError> {
            Err(ResourceError::UnsupportedScheme(iri.to_string()))
        }
    }

    struct StaticFetch;

    impl ResourceFetcher for StaticFetch {
        fn fetch(&self, _: &str) -> Result<Vec<u8>, ResourceError> {
            Ok(vec![1, 2, 3])
        }
    }

    fn build(text: &str) -> (Document, Scene, Score) {
        let mut doc = Document::parse_str(text, &Options::default()).unwrap();
        let (scene, score) = build_scene(&mut doc, &NoFetch);
        (doc, scene, score)
    }

    #[test]
    fn parents() {
        let (_, scene, _) = build(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <g><desc>d</desc><rect width='1' height='1'/></g>\
            </svg>",
        );

        assert_eq!(scene.len(), 3);
        assert_eq!(scene.objects()[0].parent, None);
        assert_eq!(scene.objects()[1].parent, Some(scene.object_for(scene.objects()[0].node).unwrap()));
        assert_eq!(scene.objects()[2].parent, Some(scene.object_for(scene.objects()[1].node).unwrap()));
    }

    #[test]
    fn animate_later_target() {
        let (_, scene, score) = build(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
                <animate xlink:href='#r' attributeName='width' from='1' to='2' dur='1s'/>\
                <rect id='r'/>\
            </svg>",
        );

        assert_eq!(score.len(), 1);
        let entry = &score.entries()[0];
        assert_eq!(entry.attribute, AId::Width);
        assert_eq!(entry.object, scene.object_for(entry.node));
        assert!(entry.object.is_some());
    }

    #[test]
    fn animate_skipped() {
        let (_, _, score) = build(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect>\
                    <animate attributeName='cx' from='1' to='2' dur='1s'/>\
                    <animate attributeName='x' from='1' to='zz' dur='1s'/>\
                    <animate attributeName='x' from='1' to='2'/>\
                    <animate attributeName='x' from='1' to='2' dur='0s'/>\
                    <animate attributeName='x' to='2' dur='1s'/>\
                </rect>\
            </svg>",
        );

        assert!(score.is_empty());
    }

    #[test]
    fn external_href_falls_back_to_parent() {
        let (doc, _, score) = build(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
                <circle id='c'>\
                    <animate xlink:href='other.svg#r' attributeName='r' from='1' to='2' dur='1s'/>\
                </circle>\
            </svg>",
        );

        assert_eq!(score.entries()[0].node, doc.element_by_id("c").unwrap().id());
    }

    #[test]
    fn animate_transform() {
        let (_, _, score) = build(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect>\
                    <animateTransform type='rotate' from='0' to='90' dur='1s' repeatCount='indefinite'/>\
                    <animateTransform from='0' to='90' dur='1s'/>\
                </rect>\
            </svg>",
        );

        assert_eq!(score.len(), 1);
        let entry = &score.entries()[0];
        assert_eq!(entry.attribute, AId::Transform);
        assert_eq!(entry.interval.transform, Some(TransformType::Rotate));
        assert_eq!(entry.interval.from, AttributeValue::NumberList(vec![0.0]));
        assert!(entry.timeline.is_looping());
    }

    #[test]
    fn failed_image() {
        let (_, scene, _) = build(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
                <image xlink:href='http://example.com/a.png' width='10' height='5'/>\
            </svg>",
        );

        match scene.objects()[1].kind {
            ObjectKind::Image(ref image) => {
                assert_eq!(image.href.as_deref(), Some("http://example.com/a.png"));
                assert_eq!(image.data, None);
                assert!(image.rect.is_some());
            }
            ref kind => panic!("unexpected kind: {:?}", kind),
        }
    }

    #[test]
    fn fetched_video() {
        let opt = Options {
            base_iri: Some("file:///media".to_string()),
            ..Options::default()
        };
        let mut doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
                <video xlink:href='a.ogv' type='video/ogg'/>\
            </svg>",
            &opt,
        )
        .unwrap();
        let (scene, _) = build_scene(&mut doc, &StaticFetch);

        match scene.objects()[1].kind {
            ObjectKind::Image(ref image) => {
                assert!(image.is_video);
                assert_eq!(image.href.as_deref(), Some("file:///media/a.ogv"));
                assert_eq!(image.data.as_deref(), Some(&[1u8, 2, 3][..]));
                assert_eq!(image.mime_type.as_deref(), Some("video/ogg"));
            }
            ref kind => panic!("unexpected kind: {:?}", kind),
        }
    }

    #[test]
    fn click_handler_makes_reactive() {
        let (doc, scene, _) = build(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:ev='http://www.w3.org/2001/xml-events'>\
                <rect><handler ev:event='click'>go()</handler></rect>\
                <circle/>\
            </svg>",
        );

        assert!(scene.objects()[1].reactive);
        assert!(!scene.objects()[2].reactive);
        let rect = scene.objects()[1].node;
        assert_eq!(doc.get(rect).listeners("click").len(), 1);
    }

    #[test]
    fn click_handler_before_target() {
        let (doc, scene, _) = build(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:ev='http://www.w3.org/2001/xml-events' \
                  xmlns:xlink='http://www.w3.org/1999/xlink'>\
                <handler xlink:href='#r' ev:event='click'>go()</handler>\
                <rect id='r'/>\
            </svg>",
        );

        let rect = doc.element_by_id("r").unwrap().id();
        assert!(scene.get(scene.object_for(rect).unwrap()).reactive);
        assert_eq!(doc.get(rect).listeners("click").len(), 1);
    }

    #[test]
    fn load_handler_is_queued() {
        let (doc, _, _) = build(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:ev='http://www.w3.org/2001/xml-events'>\
                <handler ev:event='load'>go()</handler>\
                <handler ev:event='SVGTimer'>tick()</handler>\
                <handler ev:event='mousemove'>no()</handler>\
            </svg>",
        );

        assert_eq!(doc.queued_events(), 1);
        let svg = doc.root_element().unwrap();
        assert_eq!(svg.listeners("load").len(), 1);
        assert_eq!(svg.listeners("SVGTimer").len(), 1);
    }

    #[test]
    fn non_animatable_attributes() {
        let (_, _, score) = build(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect>\
                    <animate attributeName='onload' from='a()' to='b()' dur='1s'/>\
                    <animate attributeName='id' from='a' to='b' dur='1s'/>\
                    <animate attributeName='style' from='fill:red' to='fill:blue' dur='1s'/>\
                </rect>\
            </svg>",
        );

        assert!(score.is_empty());
    }

    #[test]
    fn sync_after_write() {
        let (mut doc, mut scene, _) = build(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <g id='g'><rect id='r' width='10' height='10'/></g>\
            </svg>",
        );

        assert_eq!(scene.sync(&mut doc), 0);

        let rect = doc.element_by_id("r").unwrap().id();
        doc.set_attribute(rect, "width", "20").unwrap();
        doc.set_attribute(rect, "id", "r2").unwrap();
        assert_eq!(scene.sync(&mut doc), 1);

        let object = scene.get(scene.object_for(rect).unwrap());
        assert!(object.dirty);
        match object.kind {
            ObjectKind::Path(Some(ref path)) => assert_eq!(path.bounds().width(), 20.0),
            ref kind => panic!("unexpected kind: {:?}", kind),
        }

        // Dirty objects are refreshed again.
        doc.set_attribute(rect, "width", "30").unwrap();
        assert_eq!(scene.sync(&mut doc), 1);
        match scene.get(scene.object_for(rect).unwrap()).kind {
            ObjectKind::Path(Some(ref path)) => assert_eq!(path.bounds().width(), 30.0),
            ref kind => panic!("unexpected kind: {:?}", kind),
        }

        // An inherited paint refreshes descendants.
        scene.clear_dirty();
        let g = doc.element_by_id("g").unwrap().id();
        doc.set_attribute(g, "fill", "blue").unwrap();
        assert_eq!(scene.sync(&mut doc), 2);
        let object = scene.get(scene.object_for(rect).unwrap());
        assert_eq!(object.paint.fill, Some(tiny_skia::Color::from_rgba8(0, 0, 255, 255)));
    }
}
