// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Document, EventType, NodeId, XmlEvent};

/// A uDOM `SVGTimer`.
///
/// The timer is driven by the host through [`SvgTimer::tick`] and queues
/// `SVGTimer` events on its target element. Times are in milliseconds.
#[derive(Clone, PartialEq, Debug)]
pub struct SvgTimer {
    target: NodeId,
    delay: f64,
    repeat_interval: f64,
    running: bool,
}

impl SvgTimer {
    /// Creates a stopped timer.
    ///
    /// `initial_interval` is the delay before the first event after [`SvgTimer::start`].
    /// A non-positive `repeat_interval` makes a one-shot timer.
    pub fn new(target: NodeId, initial_interval: f64, repeat_interval: f64) -> Self {
        SvgTimer {
            target,
            delay: initial_interval,
            repeat_interval,
            running: false,
        }
    }

    /// Returns the element events are queued on.
    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Checks that the timer is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the time until the next event.
    #[inline]
    pub fn delay(&self) -> f64 {
        self.delay.max(0.0)
    }

    /// Returns the repeat interval.
    #[inline]
    pub fn repeat_interval(&self) -> f64 {
        self.repeat_interval
    }

    /// Sets the repeat interval. Applies after the next event.
    #[inline]
    pub fn set_repeat_interval(&mut self, interval: f64) {
        self.repeat_interval = interval;
    }

    /// Starts the timer.
    ///
    /// A negative delay is replaced with the repeat interval.
    pub fn start(&mut self) {
        if self.running {
            return;
        }

        if self.delay < 0.0 {
            self.delay = self.repeat_interval;
        }

        log::debug!("Timer on {:?} starts in {}ms.", self.target, self.delay);
        self.running = true;
    }

    /// Stops the timer. The remaining delay is kept.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Sets the time until the next event.
    ///
    /// On a running timer, a negative delay stops it and a zero delay
    /// fires an event at once.
    pub fn set_delay(&mut self, doc: &mut Document, delay: f64) {
        if !self.running {
            self.delay = delay;
        } else if delay < 0.0 {
            self.delay = delay;
            self.stop();
        } else if delay == 0.0 {
            self.fire(doc);
        } else {
            self.delay = delay;
        }
    }

    /// Advances the timer.
    ///
    /// Queues an event for every expired interval.
    /// Returns the number of queued events.
    pub fn tick(&mut self, doc: &mut Document, elapsed: f64) -> usize {
        let mut left = elapsed;
        let mut fired = 0;
        while self.running && left >= self.delay {
            left -= self.delay.max(0.0);
            self.fire(doc);
            fired += 1;
        }

        if self.running {
            self.delay -= left;
        }

        fired
    }

    fn fire(&mut self, doc: &mut Document) {
        doc.queue_event(XmlEvent::new(EventType::SvgTimer, self.target));

        if self.repeat_interval > 0.0 {
            self.delay = self.repeat_interval;
        } else {
            self.running = false;
        }
    }
}
