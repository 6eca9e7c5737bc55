// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-element attribute descriptors.

use crate::error::AttrError;
use crate::values::{AttributeValue, Coercion, ValueKind};
use crate::{AId, EId, XLINK_NS, XML_EVENTS_NS, XML_NS};

/// Attribute descriptor flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttributeFlags(u8);

impl AttributeFlags {
    /// No flags.
    pub const NONE: Self = AttributeFlags(0);
    /// A style property, can be set via the `style` attribute.
    pub const PROPERTY: Self = AttributeFlags(1 << 0);
    /// Can be a target of an animation element.
    pub const ANIMATABLE: Self = AttributeFlags(1 << 1);
    /// Resolved from ancestors when not set locally.
    pub const INHERITABLE: Self = AttributeFlags(1 << 2);

    /// Combines two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        AttributeFlags(self.0 | other.0)
    }

    /// Checks that all of `other` flags are set.
    #[inline]
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AttributeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, other: Self) -> Self {
        self.union(other)
    }
}

const PROPERTY: AttributeFlags = AttributeFlags::PROPERTY;
const ANIMATABLE: AttributeFlags = AttributeFlags::ANIMATABLE;
const INHERITED_PROPERTY: AttributeFlags = AttributeFlags::PROPERTY
    .union(AttributeFlags::ANIMATABLE)
    .union(AttributeFlags::INHERITABLE);
const FONT_PROPERTY: AttributeFlags = AttributeFlags::PROPERTY.union(AttributeFlags::INHERITABLE);

/// An immutable attribute description.
///
/// One static table exists per element kind, shared by all its instances.
#[derive(Debug)]
pub struct AttributeDescriptor {
    /// Attribute id.
    pub id: AId,
    /// Local name.
    pub name: &'static str,
    /// Human readable label.
    pub label: &'static str,
    /// Namespace URI. `None` for unqualified attributes.
    pub namespace: Option<&'static str>,
    /// Value kind.
    pub kind: ValueKind,
    /// Default value in its string form.
    pub default: Option<&'static str>,
    /// Flags.
    pub flags: AttributeFlags,
}

impl AttributeDescriptor {
    const fn new(id: AId, name: &'static str, label: &'static str, kind: ValueKind) -> Self {
        AttributeDescriptor {
            id,
            name,
            label,
            namespace: None,
            kind,
            default: None,
            flags: AttributeFlags::NONE,
        }
    }

    const fn ns(self, namespace: &'static str) -> Self {
        AttributeDescriptor {
            namespace: Some(namespace),
            ..self
        }
    }

    const fn default(self, default: &'static str) -> Self {
        AttributeDescriptor {
            default: Some(default),
            ..self
        }
    }

    const fn flags(self, flags: AttributeFlags) -> Self {
        AttributeDescriptor { flags, ..self }
    }

    /// Coerces a string into a value.
    pub fn parse(&self, text: &str) -> Result<AttributeValue, AttrError> {
        self.kind.parse(text).map_err(|e| match e {
            Coercion::Invalid => AttrError::InvalidValue {
                attribute: self.name.to_string(),
                value: text.to_string(),
            },
            Coercion::ArityMismatch { expected, actual } => {
                AttrError::ArityMismatch { expected, actual }
            }
        })
    }

    /// Formats a value.
    #[inline]
    pub fn format(&self, value: &AttributeValue) -> String {
        value.to_string()
    }

    /// Returns the coerced default value.
    ///
    /// Enumerations always have a default.
    pub fn default_value(&self) -> Option<AttributeValue> {
        if let ValueKind::Enum(table) = self.kind {
            return Some(AttributeValue::Enum(table.default_value()));
        }

        let text = self.default?;
        self.kind.parse(text).ok()
    }

    /// Checks the `PROPERTY` flag.
    #[inline]
    pub fn is_property(&self) -> bool {
        self.flags.contains(AttributeFlags::PROPERTY)
    }

    /// Checks the `ANIMATABLE` flag.
    #[inline]
    pub fn is_animatable(&self) -> bool {
        self.flags.contains(AttributeFlags::ANIMATABLE)
    }

    /// Checks the `INHERITABLE` flag.
    #[inline]
    pub fn is_inheritable(&self) -> bool {
        self.flags.contains(AttributeFlags::INHERITABLE)
    }

    /// Returns a name with a conventional namespace prefix.
    pub fn qualified_name(&self) -> String {
        match self.namespace.and_then(conventional_prefix) {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.to_string(),
        }
    }
}

pub(crate) fn conventional_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        XML_NS => Some("xml"),
        XLINK_NS => Some("xlink"),
        XML_EVENTS_NS => Some("ev"),
        _ => None,
    }
}

keyword_enum!(
    /// The `version` attribute of the `svg` element.
    SvgVersion, SVG_VERSION, default = V1_2, {
        V1_0 => "1.0",
        V1_1 => "1.1",
        V1_2 => "1.2",
    }
);

keyword_enum!(
    /// The `baseProfile` attribute of the `svg` element.
    BaseProfile, BASE_PROFILE, default = None, {
        None => "none",
        Full => "full",
        Basic => "basic",
        Tiny => "tiny",
    }
);

keyword_enum!(
    /// The `attributeType` attribute of animation elements.
    AttributeType, ATTRIBUTE_TYPE, default = Auto, {
        Auto => "auto",
        Css => "CSS",
        Xml => "XML",
    }
);

keyword_enum!(
    /// The `type` attribute of the `animateTransform` element.
    TransformType, TRANSFORM_TYPE, default = None, {
        None => "none",
        Translate => "translate",
        Scale => "scale",
        Rotate => "rotate",
        SkewX => "skewX",
        SkewY => "skewY",
    }
);

keyword_enum!(
    /// The `editable` attribute of the `text` element.
    Editable, EDITABLE, default = None, {
        None => "none",
        Simple => "simple",
    }
);

keyword_enum!(
    /// The `font-style` property.
    FontStyle, FONT_STYLE, default = Normal, {
        Normal => "normal",
        Italic => "italic",
        Oblique => "oblique",
    }
);

keyword_enum!(
    /// The `font-weight` property.
    FontWeight, FONT_WEIGHT, default = Normal, {
        Normal => "normal",
        Bold => "bold",
        Bolder => "bolder",
        Lighter => "lighter",
        W100 => "100",
        W200 => "200",
        W300 => "300",
        W400 => "400",
        W500 => "500",
        W600 => "600",
        W700 => "700",
        W800 => "800",
        W900 => "900",
    }
);

use crate::events::EVENT_TYPE;
use crate::script::SCRIPT_TYPE;

type D = AttributeDescriptor;

static COMMON: &[AttributeDescriptor] = &[
    D::new(AId::Id, "id", "Id", ValueKind::String),
    D::new(AId::Base, "base", "Base IRI", ValueKind::String).ns(XML_NS),
    D::new(AId::Fill, "fill", "Fill", ValueKind::Color).flags(INHERITED_PROPERTY),
    D::new(AId::Stroke, "stroke", "Stroke", ValueKind::Color).flags(INHERITED_PROPERTY),
    D::new(AId::FillOpacity, "fill-opacity", "Fill opacity", ValueKind::Opacity)
        .default("1")
        .flags(INHERITED_PROPERTY),
    D::new(AId::Style, "style", "Style", ValueKind::String),
    D::new(AId::OnLoad, "onload", "On load", ValueKind::String),
    D::new(AId::Transform, "transform", "Transform", ValueKind::Transform).flags(ANIMATABLE),
];

static SVG: &[AttributeDescriptor] = &[
    D::new(AId::Version, "version", "Version", ValueKind::Enum(&SVG_VERSION)),
    D::new(AId::BaseProfile, "baseProfile", "Base profile", ValueKind::Enum(&BASE_PROFILE)),
    D::new(AId::Width, "width", "Width", ValueKind::Length),
    D::new(AId::Height, "height", "Height", ValueKind::Length),
    D::new(AId::ViewBox, "viewBox", "View box", ValueKind::NumberList(Some(4))),
    D::new(AId::PreserveAspectRatio, "preserveAspectRatio", "Preserve aspect ratio", ValueKind::AspectRatio),
];

static RECT: &[AttributeDescriptor] = &[
    D::new(AId::X, "x", "X", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Y, "y", "Y", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Width, "width", "Width", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Height, "height", "Height", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Rx, "rx", "X radius", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Ry, "ry", "Y radius", ValueKind::Length).default("0").flags(ANIMATABLE),
];

static CIRCLE: &[AttributeDescriptor] = &[
    D::new(AId::Cx, "cx", "Center X", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Cy, "cy", "Center Y", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::R, "r", "Radius", ValueKind::Length).default("0").flags(ANIMATABLE),
];

static LINE: &[AttributeDescriptor] = &[
    D::new(AId::X1, "x1", "X1", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Y1, "y1", "Y1", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::X2, "x2", "X2", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Y2, "y2", "Y2", ValueKind::Length).default("0").flags(ANIMATABLE),
];

static PATH: &[AttributeDescriptor] = &[
    D::new(AId::D, "d", "Path data", ValueKind::String).flags(ANIMATABLE),
];

static POLYLINE: &[AttributeDescriptor] = &[
    D::new(AId::Points, "points", "Points", ValueKind::Points).flags(ANIMATABLE),
];

static TEXT: &[AttributeDescriptor] = &[
    D::new(AId::X, "x", "X", ValueKind::LengthList).flags(ANIMATABLE),
    D::new(AId::Y, "y", "Y", ValueKind::LengthList).flags(ANIMATABLE),
    D::new(AId::Rotate, "rotate", "Rotate", ValueKind::NumberList(None)),
    D::new(AId::Editable, "editable", "Editable", ValueKind::Enum(&EDITABLE)),
    D::new(AId::FontFamily, "font-family", "Font family", ValueKind::String).flags(FONT_PROPERTY),
    D::new(AId::FontStyle, "font-style", "Font style", ValueKind::Enum(&FONT_STYLE)).flags(FONT_PROPERTY),
    D::new(AId::FontWeight, "font-weight", "Font weight", ValueKind::Enum(&FONT_WEIGHT)).flags(FONT_PROPERTY),
    D::new(AId::FontSize, "font-size", "Font size", ValueKind::Length).flags(FONT_PROPERTY),
];

static MEDIA: &[AttributeDescriptor] = &[
    D::new(AId::X, "x", "X", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Y, "y", "Y", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Width, "width", "Width", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::Height, "height", "Height", ValueKind::Length).default("0").flags(ANIMATABLE),
    D::new(AId::PreserveAspectRatio, "preserveAspectRatio", "Preserve aspect ratio", ValueKind::AspectRatio),
    D::new(AId::Href, "href", "Href", ValueKind::String).ns(XLINK_NS),
    D::new(AId::Type, "type", "Content type", ValueKind::String),
];

static ANIMATE: &[AttributeDescriptor] = &[
    D::new(AId::AttributeType, "attributeType", "Attribute type", ValueKind::Enum(&ATTRIBUTE_TYPE)),
    D::new(AId::AttributeName, "attributeName", "Attribute name", ValueKind::String),
    D::new(AId::From, "from", "From", ValueKind::String),
    D::new(AId::To, "to", "To", ValueKind::String),
    D::new(AId::Dur, "dur", "Duration", ValueKind::Duration),
    D::new(AId::RepeatCount, "repeatCount", "Repeat count", ValueKind::RepeatCount),
    D::new(AId::Href, "href", "Href", ValueKind::String).ns(XLINK_NS).flags(ANIMATABLE),
];

static ANIMATE_TRANSFORM: &[AttributeDescriptor] = &[
    D::new(AId::Type, "type", "Transform type", ValueKind::Enum(&TRANSFORM_TYPE)),
];

static HANDLER: &[AttributeDescriptor] = &[
    D::new(AId::Type, "type", "Script type", ValueKind::Enum(&SCRIPT_TYPE)),
    D::new(AId::Event, "event", "Event type", ValueKind::Enum(&EVENT_TYPE)).ns(XML_EVENTS_NS),
    D::new(AId::Href, "href", "Target", ValueKind::String).ns(XLINK_NS),
];

static SCRIPT: &[AttributeDescriptor] = &[
    D::new(AId::Type, "type", "Script type", ValueKind::Enum(&SCRIPT_TYPE)),
    D::new(AId::Href, "href", "Href", ValueKind::String).ns(XLINK_NS),
];

/// Returns the descriptors declared by an element kind.
///
/// Attributes shared by all elements are not included. See [`common_attributes`].
pub fn element_attributes(eid: EId) -> &'static [AttributeDescriptor] {
    match eid {
        EId::Svg => SVG,
        EId::Rect => RECT,
        EId::Circle => CIRCLE,
        EId::Line => LINE,
        EId::Path => PATH,
        EId::Polyline => POLYLINE,
        EId::Text | EId::Tspan => TEXT,
        EId::Image | EId::Video => MEDIA,
        EId::Animate => ANIMATE,
        // `animateTransform` extends `animate`, see `lookup`.
        EId::AnimateTransform => ANIMATE_TRANSFORM,
        EId::Handler => HANDLER,
        EId::Script => SCRIPT,
        EId::G | EId::Desc | EId::Title => &[],
    }
}

/// Returns the descriptors shared by all elements.
#[inline]
pub fn common_attributes() -> &'static [AttributeDescriptor] {
    COMMON
}

/// Returns all descriptors of an element kind, the most specific first.
pub fn all_attributes(eid: EId) -> impl Iterator<Item = &'static AttributeDescriptor> {
    let inherited: &'static [AttributeDescriptor] = if eid == EId::AnimateTransform {
        ANIMATE
    } else {
        &[]
    };

    element_attributes(eid)
        .iter()
        .chain(inherited.iter())
        .chain(COMMON.iter())
}

/// Finds a descriptor by its namespace and local name.
///
/// The SVG namespace is treated as no namespace.
pub fn lookup(
    eid: EId,
    namespace: Option<&str>,
    name: &str,
) -> Option<&'static AttributeDescriptor> {
    let namespace = match namespace {
        Some(crate::SVG_NS) => None,
        ns => ns,
    };

    all_attributes(eid).find(|d| d.name == name && d.namespace == namespace)
}

/// Finds a descriptor by its id.
pub fn descriptor(eid: EId, aid: AId) -> Option<&'static AttributeDescriptor> {
    all_attributes(eid).find(|d| d.id == aid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_namespace() {
        assert!(lookup(EId::Image, Some(XLINK_NS), "href").is_some());
        assert!(lookup(EId::Image, None, "href").is_none());
        assert!(lookup(EId::Rect, None, "x").is_some());
        assert!(lookup(EId::Rect, Some(crate::SVG_NS), "x").is_some());
        assert!(lookup(EId::G, Some(XML_NS), "base").is_some());
        assert!(lookup(EId::Handler, Some(XML_EVENTS_NS), "event").is_some());
    }

    #[test]
    fn animate_transform_extends_animate() {
        assert!(descriptor(EId::AnimateTransform, AId::AttributeName).is_some());
        assert!(descriptor(EId::AnimateTransform, AId::Dur).is_some());
        let ty = descriptor(EId::AnimateTransform, AId::Type).unwrap();
        assert!(matches!(ty.kind, ValueKind::Enum(_)));
    }

    #[test]
    fn common_attributes_everywhere() {
        for eid in &[EId::Svg, EId::G, EId::Desc, EId::Handler, EId::Rect] {
            assert!(descriptor(*eid, AId::Fill).is_some());
            assert!(descriptor(*eid, AId::Id).is_some());
        }
    }

    #[test]
    fn enum_defaults() {
        for eid in &[EId::Svg, EId::Text, EId::Animate, EId::AnimateTransform, EId::Handler] {
            for d in all_attributes(*eid) {
                if let ValueKind::Enum(table) = d.kind {
                    assert_eq!(
                        d.parse("definitely-not-a-keyword").unwrap(),
                        AttributeValue::Enum(table.default_value()),
                        "{}",
                        d.name
                    );
                }
            }
        }
    }

    #[test]
    fn defaults() {
        let d = descriptor(EId::Rect, AId::X).unwrap();
        assert_eq!(d.default_value(), Some(AttributeValue::Length(0.0)));

        let d = descriptor(EId::Rect, AId::FillOpacity).unwrap();
        assert_eq!(d.default_value(), Some(AttributeValue::Number(1.0)));

        let d = descriptor(EId::Svg, AId::Version).unwrap();
        assert_eq!(d.default_value(), Some(SvgVersion::V1_2.into()));

        assert_eq!(descriptor(EId::Rect, AId::Fill).unwrap().default_value(), None);
    }

    #[test]
    fn flags() {
        let fill = descriptor(EId::Rect, AId::Fill).unwrap();
        assert!(fill.is_property() && fill.is_animatable() && fill.is_inheritable());

        let x = descriptor(EId::Rect, AId::X).unwrap();
        assert!(!x.is_property() && x.is_animatable() && !x.is_inheritable());
    }

    #[test]
    fn keyword_enums() {
        assert_eq!(SvgVersion::from_keyword("1.1"), SvgVersion::V1_1);
        assert_eq!(SvgVersion::from_keyword("2.0"), SvgVersion::V1_2);
        assert_eq!(TransformType::from_keyword("skewx"), TransformType::SkewX);
        assert_eq!(FontWeight::W700.as_str(), "700");
    }

    #[test]
    fn qualified_names() {
        assert_eq!(descriptor(EId::Image, AId::Href).unwrap().qualified_name(), "xlink:href");
        assert_eq!(descriptor(EId::G, AId::Base).unwrap().qualified_name(), "xml:base");
        assert_eq!(descriptor(EId::Rect, AId::X).unwrap().qualified_name(), "x");
    }
}
