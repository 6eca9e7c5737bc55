// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anitree::schema::{self, FontStyle, FontWeight};
use anitree::{AId, EId, Node};
use tiny_skia::{Path, PathBuilder, Rect};

use crate::scene::{ObjectKind, Paint, SceneObject, TextData};

/// Control point distance of a cubic Bézier approximating a quarter circle.
const ARC_K: f32 = 0.552_284_75;

/// Converts an element into an object kind.
///
/// Images are not handled here, since they have to be fetched.
pub(crate) fn convert(node: Node) -> Option<ObjectKind> {
    match node.tag_name()? {
        EId::Svg | EId::G => Some(ObjectKind::Group),
        EId::Rect => Some(ObjectKind::Path(convert_rect(node))),
        EId::Circle => Some(ObjectKind::Path(convert_circle(node))),
        EId::Line => Some(ObjectKind::Path(convert_line(node))),
        EId::Path => Some(ObjectKind::Path(convert_path(node))),
        EId::Polyline => Some(ObjectKind::Path(convert_polyline(node))),
        EId::Text => Some(ObjectKind::Text(convert_text(node))),
        _ => None,
    }
}

/// Rebuilds an object from its element.
pub(crate) fn refresh(node: Node, object: &mut SceneObject) {
    match object.kind {
        ObjectKind::Image(ref mut image) => image.rect = convert_image_rect(node),
        _ => {
            if let Some(kind) = convert(node) {
                object.kind = kind;
            }
        }
    }

    object.paint = convert_paint(node);
    object.transform = convert_transform(node);
}

/// Returns the animatable attributes of an element.
pub(crate) fn bindings(eid: EId) -> Vec<AId> {
    schema::all_attributes(eid)
        .filter(|d| d.is_animatable())
        .map(|d| d.id)
        .collect()
}

pub(crate) fn convert_paint(node: Node) -> Paint {
    let fill = match node.tag_name() {
        // Lines are never filled.
        Some(EId::Line) => None,
        _ => {
            let opacity = node.resolve::<f64>(AId::FillOpacity).unwrap_or(1.0);
            node.find_attribute::<svgtypes::Color>(AId::Fill)
                .map(|c| convert_color(c, opacity))
        }
    };

    let stroke = node
        .find_attribute::<svgtypes::Color>(AId::Stroke)
        .map(|c| convert_color(c, 1.0));

    Paint { fill, stroke }
}

fn convert_color(color: svgtypes::Color, opacity: f64) -> tiny_skia::Color {
    let alpha = (color.alpha as f64 * opacity).round().max(0.0).min(255.0) as u8;
    tiny_skia::Color::from_rgba8(color.red, color.green, color.blue, alpha)
}

pub(crate) fn convert_transform(node: Node) -> tiny_skia::Transform {
    match node.attribute::<svgtypes::Transform>(AId::Transform) {
        Some(ts) => tiny_skia::Transform::from_row(
            ts.a as f32,
            ts.b as f32,
            ts.c as f32,
            ts.d as f32,
            ts.e as f32,
            ts.f as f32,
        ),
        None => tiny_skia::Transform::identity(),
    }
}

fn length(node: Node, aid: AId) -> f32 {
    node.resolve::<f64>(aid).unwrap_or(0.0) as f32
}

fn convert_rect(node: Node) -> Option<Path> {
    let width = length(node, AId::Width);
    let height = length(node, AId::Height);
    if !(width > 0.0 && height > 0.0) {
        log::warn!("Rect '{}' has zero size. Skipped.", node.element_id());
        return None;
    }

    let x = length(node, AId::X);
    let y = length(node, AId::Y);

    // A missing radius takes the value of the other one.
    let (rx, ry) = match (
        node.attribute::<f64>(AId::Rx),
        node.attribute::<f64>(AId::Ry),
    ) {
        (None, None) => (0.0, 0.0),
        (Some(rx), None) => (rx, rx),
        (None, Some(ry)) => (ry, ry),
        (Some(rx), Some(ry)) => (rx, ry),
    };

    let rx = (rx.max(0.0) as f32).min(width / 2.0);
    let ry = (ry.max(0.0) as f32).min(height / 2.0);

    if rx == 0.0 || ry == 0.0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, width, height)?));
    }

    let kx = rx * ARC_K;
    let ky = ry * ARC_K;
    let right = x + width;
    let bottom = y + height;

    let mut builder = PathBuilder::new();
    builder.move_to(x + rx, y);
    builder.line_to(right - rx, y);
    builder.cubic_to(right - rx + kx, y, right, y + ry - ky, right, y + ry);
    builder.line_to(right, bottom - ry);
    builder.cubic_to(right, bottom - ry + ky, right - rx + kx, bottom, right - rx, bottom);
    builder.line_to(x + rx, bottom);
    builder.cubic_to(x + rx - kx, bottom, x, bottom - ry + ky, x, bottom - ry);
    builder.line_to(x, y + ry);
    builder.cubic_to(x, y + ry - ky, x + rx - kx, y, x + rx, y);
    builder.close();
    builder.finish()
}

fn convert_circle(node: Node) -> Option<Path> {
    let cx = length(node, AId::Cx);
    let cy = length(node, AId::Cy);
    let r = length(node, AId::R);

    if !(r > 0.0) {
        log::warn!("Circle '{}' has an invalid 'r' value. Skipped.", node.element_id());
        return None;
    }

    ellipse_to_path(cx, cy, r, r)
}

/// Builds an ellipse from four cubic Béziers.
fn ellipse_to_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    let kx = rx * ARC_K;
    let ky = ry * ARC_K;

    let mut builder = PathBuilder::new();
    builder.move_to(cx + rx, cy);
    builder.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
    builder.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
    builder.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
    builder.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
    builder.close();
    builder.finish()
}

fn convert_line(node: Node) -> Option<Path> {
    let mut builder = PathBuilder::new();
    builder.move_to(length(node, AId::X1), length(node, AId::Y1));
    builder.line_to(length(node, AId::X2), length(node, AId::Y2));
    builder.finish()
}

fn convert_path(node: Node) -> Option<Path> {
    let value: &str = node.attribute(AId::D)?;
    let mut builder = PathBuilder::new();
    for segment in svgtypes::SimplifyingPathParser::from(value) {
        let segment = match segment {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Path '{}' has invalid data: {}. Truncated.", node.element_id(), e);
                break;
            }
        };

        match segment {
            svgtypes::SimplePathSegment::MoveTo { x, y } => {
                builder.move_to(x as f32, y as f32);
            }
            svgtypes::SimplePathSegment::LineTo { x, y } => {
                builder.line_to(x as f32, y as f32);
            }
            svgtypes::SimplePathSegment::Quadratic { x1, y1, x, y } => {
                builder.quad_to(x1 as f32, y1 as f32, x as f32, y as f32);
            }
            svgtypes::SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                builder.cubic_to(
                    x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32,
                );
            }
            svgtypes::SimplePathSegment::ClosePath => {
                builder.close();
            }
        }
    }

    builder.finish()
}

fn convert_polyline(node: Node) -> Option<Path> {
    let points: &[(f64, f64)] = node.attribute(AId::Points).unwrap_or(&[]);

    if points.len() < 2 {
        log::warn!(
            "Polyline '{}' has less than 2 points. Skipped.",
            node.element_id()
        );
        return None;
    }

    let mut builder = PathBuilder::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            builder.move_to(x as f32, y as f32);
        } else {
            builder.line_to(x as f32, y as f32);
        }
    }

    builder.finish()
}

fn convert_text(node: Node) -> TextData {
    let first = |aid: AId| -> f64 {
        node.attribute::<&[f64]>(aid)
            .and_then(|list| list.first().cloned())
            .unwrap_or(0.0)
    };

    TextData {
        x: first(AId::X),
        y: first(AId::Y),
        text: node.text_content(),
        font_family: node.find_attribute::<&str>(AId::FontFamily).map(String::from),
        font_size: node.find_attribute::<f64>(AId::FontSize),
        font_style: node.find_attribute::<FontStyle>(AId::FontStyle).unwrap_or_default(),
        font_weight: node.find_attribute::<FontWeight>(AId::FontWeight).unwrap_or_default(),
    }
}

pub(crate) fn convert_image_rect(node: Node) -> Option<Rect> {
    let width = length(node, AId::Width);
    let height = length(node, AId::Height);
    if !(width > 0.0 && height > 0.0) {
        return None;
    }

    Rect::from_xywh(length(node, AId::X), length(node, AId::Y), width, height)
}
