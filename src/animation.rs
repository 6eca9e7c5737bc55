// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anitree::schema::TransformType;
use anitree::{AId, AttributeValue, Document, NodeId, RepeatCount};

use crate::scene::{ObjectId, Scene};

/// How many times a timeline runs.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Repeat {
    /// A finite number of runs. Fractions stop mid-run.
    Count(f64),
    /// Runs forever.
    Loop,
}

impl Repeat {
    /// Converts an optional `repeatCount`.
    ///
    /// A missing count is a single run.
    pub fn from_repeat_count(count: Option<RepeatCount>) -> Self {
        match count {
            Some(RepeatCount::Indefinite) => Repeat::Loop,
            Some(RepeatCount::Count(n)) => Repeat::Count(n),
            None => Repeat::Count(1.0),
        }
    }
}

/// A linear timeline.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Timeline {
    /// Duration of a single run in milliseconds. Always positive.
    pub duration: f64,
    /// Repeat mode.
    pub repeat: Repeat,
}

impl Timeline {
    /// Checks that the timeline never ends.
    #[inline]
    pub fn is_looping(&self) -> bool {
        self.repeat == Repeat::Loop
    }

    /// Returns the total play time in milliseconds.
    ///
    /// `None` for looping timelines.
    pub fn total_duration(&self) -> Option<f64> {
        match self.repeat {
            Repeat::Count(n) => Some(self.duration * n),
            Repeat::Loop => None,
        }
    }

    /// Returns the run progress in the 0..1 range at a time.
    ///
    /// A finished timeline holds its final progress.
    pub fn progress(&self, elapsed: f64) -> f64 {
        if !(elapsed > 0.0) {
            return 0.0;
        }

        if let Some(total) = self.total_duration() {
            if elapsed >= total {
                let fract = total / self.duration;
                let fract = fract - fract.floor();
                return if fract == 0.0 { 1.0 } else { fract };
            }
        }

        (elapsed % self.duration) / self.duration
    }
}

/// A pair of values to interpolate between.
#[derive(Clone, PartialEq, Debug)]
pub struct Interval {
    /// The start value.
    pub from: AttributeValue,
    /// The end value.
    pub to: AttributeValue,
    /// Set for `animateTransform`, where the values are number lists.
    pub transform: Option<TransformType>,
}

impl Interval {
    /// Returns an interpolated value.
    ///
    /// Numbers, lengths, colors, lists and transforms are interpolated linearly.
    /// Other kinds switch from `from` to `to` at the middle.
    pub fn value_at(&self, progress: f64) -> AttributeValue {
        let t = progress.max(0.0).min(1.0);
        let value = lerp_value(&self.from, &self.to, t);

        match (self.transform, value) {
            (Some(kind), AttributeValue::NumberList(list)) => {
                AttributeValue::Transform(to_transform(kind, &list))
            }
            (_, value) => value,
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_list(a: &[f64], b: &[f64], t: f64) -> Option<Vec<f64>> {
    if a.len() != b.len() {
        return None;
    }

    Some(a.iter().zip(b).map(|(a, b)| lerp(*a, *b, t)).collect())
}

fn lerp_value(from: &AttributeValue, to: &AttributeValue, t: f64) -> AttributeValue {
    use AttributeValue as V;

    let value = match (from, to) {
        (V::Number(a), V::Number(b)) => Some(V::Number(lerp(*a, *b, t))),
        (V::Length(a), V::Length(b)) => Some(V::Length(lerp(*a, *b, t))),
        (V::NumberList(a), V::NumberList(b)) => lerp_list(a, b, t).map(V::NumberList),
        (V::LengthList(a), V::LengthList(b)) => lerp_list(a, b, t).map(V::LengthList),
        (V::Color(a), V::Color(b)) => {
            let c = |a: u8, b: u8| lerp(a as f64, b as f64, t).round() as u8;
            Some(V::Color(svgtypes::Color::new_rgba(
                c(a.red, b.red),
                c(a.green, b.green),
                c(a.blue, b.blue),
                c(a.alpha, b.alpha),
            )))
        }
        (V::Transform(a), V::Transform(b)) => Some(V::Transform(svgtypes::Transform::new(
            lerp(a.a, b.a, t),
            lerp(a.b, b.b, t),
            lerp(a.c, b.c, t),
            lerp(a.d, b.d, t),
            lerp(a.e, b.e, t),
            lerp(a.f, b.f, t),
        ))),
        _ => None,
    };

    match value {
        Some(v) => v,
        None if t < 0.5 => from.clone(),
        None => to.clone(),
    }
}

fn to_transform(kind: TransformType, list: &[f64]) -> svgtypes::Transform {
    let arg = |i: usize| list.get(i).cloned();

    match kind {
        TransformType::Translate => {
            let tx = arg(0).unwrap_or(0.0);
            let ty = arg(1).unwrap_or(0.0);
            svgtypes::Transform::new(1.0, 0.0, 0.0, 1.0, tx, ty)
        }
        TransformType::Scale => {
            let sx = arg(0).unwrap_or(1.0);
            let sy = arg(1).unwrap_or(sx);
            svgtypes::Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
        }
        TransformType::Rotate => {
            let (sin, cos) = arg(0).unwrap_or(0.0).to_radians().sin_cos();
            let cx = arg(1).unwrap_or(0.0);
            let cy = arg(2).unwrap_or(0.0);
            svgtypes::Transform::new(
                cos,
                sin,
                -sin,
                cos,
                cx - cx * cos + cy * sin,
                cy - cx * sin - cy * cos,
            )
        }
        TransformType::SkewX => {
            let tan = arg(0).unwrap_or(0.0).to_radians().tan();
            svgtypes::Transform::new(1.0, 0.0, tan, 1.0, 0.0, 0.0)
        }
        TransformType::SkewY => {
            let tan = arg(0).unwrap_or(0.0).to_radians().tan();
            svgtypes::Transform::new(1.0, tan, 0.0, 1.0, 0.0, 0.0)
        }
        TransformType::None => svgtypes::Transform::default(),
    }
}

/// A scheduled animation.
#[derive(Clone, PartialEq, Debug)]
pub struct ScoreEntry {
    /// The scene object of the target. `None` when the target has no object.
    pub object: Option<ObjectId>,
    /// The animated element.
    pub node: NodeId,
    /// The animated attribute.
    pub attribute: AId,
    /// Timing.
    pub timeline: Timeline,
    /// Values.
    pub interval: Interval,
}

/// A list of animations started together.
#[derive(Clone, Default, Debug)]
pub struct Score {
    entries: Vec<ScoreEntry>,
}

impl Score {
    /// Creates an empty score.
    pub fn new() -> Self {
        Score::default()
    }

    /// Appends an entry.
    pub fn append(&mut self, entry: ScoreEntry) {
        log::debug!(
            "Schedule {} on {:?} for {}ms.",
            entry.attribute,
            entry.node,
            entry.timeline.duration
        );
        self.entries.push(entry);
    }

    /// Returns all entries in scheduling order.
    #[inline]
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks that the score is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the time after which nothing changes.
    ///
    /// `None` when any timeline loops.
    pub fn duration(&self) -> Option<f64> {
        let mut max = 0.0f64;
        for entry in &self.entries {
            max = max.max(entry.timeline.total_duration()?);
        }

        Some(max)
    }

    /// Links entries to scene objects of their targets.
    pub(crate) fn resolve_objects(&mut self, scene: &Scene) {
        for entry in &mut self.entries {
            entry.object = scene.object_for(entry.node);
        }
    }

    /// Writes interpolated values at a time into the document.
    ///
    /// Returns the number of written values. Failed writes are logged.
    pub fn apply(&self, doc: &mut Document, elapsed: f64) -> usize {
        let mut count = 0;
        for entry in &self.entries {
            let progress = entry.timeline.progress(elapsed);
            let value = entry.interval.value_at(progress);
            match doc.set_property(entry.node, entry.attribute, value) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("Failed to animate {}: {}.", entry.attribute, e),
            }
        }

        count
    }
}
