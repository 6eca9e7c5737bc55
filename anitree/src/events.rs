// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! DOM-style events and the element load lifecycle.

use crate::script::{
    wrap_handler_code, ScriptContext, ScriptValue, HANDLER_FUNCTION, SCRIPT_FILE_LABEL,
};
use crate::{AId, Document, NodeId, ScriptError};

keyword_enum!(
    /// An event type.
    EventType, EVENT_TYPE, default = None, {
        None => "none",
        Load => "load",
        Click => "click",
        SvgTimer => "SVGTimer",
    }
);

impl EventType {
    /// Checks that this is a mouse event.
    #[inline]
    pub fn is_mouse_event(&self) -> bool {
        matches!(self, EventType::Click)
    }
}

/// Mouse event details.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[allow(missing_docs)]
pub struct MouseData {
    pub screen_x: i32,
    pub screen_y: i32,
    pub client_x: i32,
    pub client_y: i32,
    pub button: u32,
}

/// An event.
#[derive(Clone, PartialEq, Debug)]
pub struct XmlEvent {
    /// Event type.
    pub kind: EventType,
    /// The element the event was dispatched to.
    pub target: NodeId,
    /// The element whose listeners are currently invoked.
    pub current_target: Option<NodeId>,
    /// Can the default action be prevented.
    pub cancelable: bool,
    /// Was the default action prevented.
    pub default_prevented: bool,
    /// Mouse details. Set only for mouse events.
    pub mouse: Option<MouseData>,
}

impl XmlEvent {
    /// Creates a new event.
    ///
    /// Mouse events are cancelable.
    pub fn new(kind: EventType, target: NodeId) -> Self {
        XmlEvent {
            kind,
            target,
            current_target: None,
            cancelable: kind.is_mouse_event(),
            default_prevented: false,
            mouse: None,
        }
    }

    /// Creates a `load` event.
    #[inline]
    pub fn load(target: NodeId) -> Self {
        XmlEvent::new(EventType::Load, target)
    }

    /// Creates a `click` event.
    pub fn click(target: NodeId, mouse: MouseData) -> Self {
        XmlEvent {
            mouse: Some(mouse),
            ..XmlEvent::new(EventType::Click, target)
        }
    }

    /// Prevents the default action of a cancelable event.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// An event listener.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Listener {
    /// The `onload` attribute of an element.
    Inline(NodeId),
    /// A `handler` element.
    Handler(NodeId),
}

/// A registered listener.
#[derive(Clone, PartialEq, Debug)]
pub struct ListenerRegistration {
    /// Event type name.
    pub event_type: String,
    /// The listener.
    pub listener: Listener,
    /// Capture flag. Stored, but dispatch has no capture phase.
    pub use_capture: bool,
}

impl Document {
    /// Registers a listener on an element.
    ///
    /// Listeners are never de-duplicated.
    pub fn add_event_listener(
        &mut self,
        target: NodeId,
        event_type: &str,
        listener: Listener,
        use_capture: bool,
    ) {
        let e = match self.element_data_mut(target) {
            Some(e) => e,
            None => {
                log::warn!("Event listeners can be added only to elements.");
                return;
            }
        };

        log::debug!("Add {:?} for {} on {}.", listener, event_type, e.tag_name);

        e.listeners
            .get_or_insert_with(Default::default)
            .entry(event_type.to_string())
            .or_default()
            .push(ListenerRegistration {
                event_type: event_type.to_string(),
                listener,
                use_capture,
            });
    }

    /// Does nothing.
    pub fn remove_event_listener(
        &mut self,
        _target: NodeId,
        event_type: &str,
        _listener: Listener,
        _use_capture: bool,
    ) {
        log::debug!("Removing '{}' listeners is not supported.", event_type);
    }

    /// Delivers an event to listeners registered on its target.
    ///
    /// Listeners are called in registration order. The first script error
    /// stops the dispatch.
    pub fn dispatch_event(
        &self,
        mut event: XmlEvent,
        script: &mut dyn ScriptContext,
    ) -> Result<(), ScriptError> {
        let target = self.get(event.target);
        let listeners = target.listeners(event.kind.as_str());
        if listeners.is_empty() {
            log::warn!(
                "Received event {} on {}, but no listeners registered.",
                event.kind,
                target.tag_name().map(|t| t.to_str()).unwrap_or("node")
            );
            return Ok(());
        }

        event.current_target = Some(event.target);
        for registration in listeners {
            self.handle_event(registration.listener, &event, script)?;
        }

        Ok(())
    }

    /// Invokes a single listener.
    pub fn handle_event(
        &self,
        listener: Listener,
        event: &XmlEvent,
        script: &mut dyn ScriptContext,
    ) -> Result<(), ScriptError> {
        let code = match listener {
            Listener::Handler(handler) => self.handler_code(handler),
            Listener::Inline(node) => {
                if event.kind != EventType::Load {
                    log::warn!("Inline handlers support only load events, got {}.", event.kind);
                    return Ok(());
                }

                let source = self.get(node).attribute::<&str>(AId::OnLoad).unwrap_or("");
                wrap_handler_code(source)
            }
        };

        script.eval(&code, SCRIPT_FILE_LABEL)?;
        script.call_function(HANDLER_FUNCTION, &[ScriptValue::Event(event.clone())])?;
        Ok(())
    }

    /// Returns the element a `handler` listens on.
    ///
    /// That's the element referenced by a local `xlink:href`, or the parent element.
    pub fn handler_target(&self, handler: NodeId) -> Option<NodeId> {
        let node = self.get(handler);
        if let Some(href) = node.attribute::<&str>(AId::Href) {
            if let Some(id) = href.strip_prefix('#') {
                if let Some(target) = self.element_by_id(id) {
                    return Some(target.id());
                }
            }
        }

        node.parent_element().map(|n| n.id())
    }

    /// Returns the wrapped source of a `handler` element.
    pub fn handler_code(&self, handler: NodeId) -> String {
        wrap_handler_code(self.get(handler).text())
    }

    /// Returns the event type a `handler` element listens for.
    pub fn handler_event_type(&self, handler: NodeId) -> EventType {
        self.get(handler)
            .attribute::<EventType>(AId::Event)
            .unwrap_or_default()
    }

    /// Adds an event to the queue.
    pub fn queue_event(&mut self, event: XmlEvent) {
        log::trace!("Queue {} for {:?}.", event.kind, event.target);
        self.queue.push_back(event);
    }

    /// Returns the number of queued events.
    #[inline]
    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// Dispatches queued events in FIFO order.
    ///
    /// On a script error, the remaining events stay queued.
    pub fn process_events(&mut self, script: &mut dyn ScriptContext) -> Result<(), ScriptError> {
        while let Some(event) = self.queue.pop_front() {
            self.dispatch_event(event, script)?;
        }

        Ok(())
    }

    /// Queues a `load` event for an element.
    ///
    /// When the element is not loaded yet, the event is deferred until it is.
    /// Only one deferred event per element is kept.
    pub fn request_load_event(&mut self, target: NodeId) {
        let loaded = match self.element_data_mut(target) {
            Some(e) if !e.load.loaded => {
                e.load.deferred_load = true;
                false
            }
            Some(_) => true,
            None => return,
        };

        if loaded {
            self.queue_event(XmlEvent::load(target));
        }
    }

    /// Marks an element as parsed.
    ///
    /// The element becomes loaded when all its child elements are.
    pub fn finish_element(&mut self, node: NodeId) {
        let unloaded = self
            .get(node)
            .children()
            .filter(|n| n.is_element() && !n.is_loaded())
            .count() as u32;

        let pending = match self.element_data_mut(node) {
            Some(e) => {
                e.load.parsed = true;
                e.load.pending = e.load.pending.saturating_sub(1) + unloaded;
                e.load.pending
            }
            None => return,
        };

        log::trace!("{:?} parsed, {} pending.", node, pending);

        if pending == 0 {
            self.emit_loaded(node);
        }
    }

    /// Adjusts the pending load count of an element.
    ///
    /// `false` holds the element unloaded, `true` releases one hold.
    pub fn set_loaded(&mut self, node: NodeId, loaded: bool) {
        let ready = match self.element_data_mut(node) {
            Some(e) => {
                if loaded {
                    e.load.pending = e.load.pending.saturating_sub(1);
                } else {
                    e.load.pending += 1;
                }

                e.load.parsed && e.load.pending == 0
            }
            None => return,
        };

        if ready {
            self.emit_loaded(node);
        }
    }

    /// Checks that an element is loaded.
    #[inline]
    pub fn is_loaded(&self, node: NodeId) -> bool {
        self.get(node).is_loaded()
    }

    fn emit_loaded(&mut self, node: NodeId) {
        let deferred = match self.element_data_mut(node) {
            Some(e) if !e.load.loaded => {
                e.load.loaded = true;
                std::mem::replace(&mut e.load.deferred_load, false)
            }
            _ => return,
        };

        if deferred {
            self.queue_event(XmlEvent::load(node));
        }

        let parent = match self.get(node).parent() {
            Some(p) => p.id(),
            None => return,
        };

        let waiting = match self.element_data(parent) {
            Some(e) => e.load.parsed && !e.load.loaded,
            None => false,
        };

        if waiting {
            self.set_loaded(parent, true);
        }
    }
}
