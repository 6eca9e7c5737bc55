// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

macro_rules! names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[allow(missing_docs)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Parses a name from a string.
            ///
            /// Names are case-sensitive.
            #[allow(clippy::should_implement_trait)]
            pub fn from_str(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Returns the name as a string.
            pub fn to_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.to_str())
            }
        }
    };
}

names!(
    /// A supported element name.
    EId {
        Animate => "animate",
        AnimateTransform => "animateTransform",
        Circle => "circle",
        Desc => "desc",
        G => "g",
        Handler => "handler",
        Image => "image",
        Line => "line",
        Path => "path",
        Polyline => "polyline",
        Rect => "rect",
        Script => "script",
        Svg => "svg",
        Text => "text",
        Title => "title",
        Tspan => "tspan",
        Video => "video",
    }
);

names!(
    /// A supported attribute name.
    ///
    /// Names are local, the namespace is stored by the attribute descriptor.
    AId {
        AttributeName => "attributeName",
        AttributeType => "attributeType",
        Base => "base",
        BaseProfile => "baseProfile",
        Cx => "cx",
        Cy => "cy",
        D => "d",
        Dur => "dur",
        Editable => "editable",
        Event => "event",
        Fill => "fill",
        FillOpacity => "fill-opacity",
        FontFamily => "font-family",
        FontSize => "font-size",
        FontStyle => "font-style",
        FontWeight => "font-weight",
        From => "from",
        Height => "height",
        Href => "href",
        Id => "id",
        OnLoad => "onload",
        Points => "points",
        PreserveAspectRatio => "preserveAspectRatio",
        R => "r",
        RepeatCount => "repeatCount",
        Rotate => "rotate",
        Rx => "rx",
        Ry => "ry",
        Stroke => "stroke",
        Style => "style",
        To => "to",
        Transform => "transform",
        Type => "type",
        Version => "version",
        ViewBox => "viewBox",
        Width => "width",
        X => "x",
        X1 => "x1",
        X2 => "x2",
        Y => "y",
        Y1 => "y1",
        Y2 => "y2",
    }
);

impl EId {
    /// Checks if this element ends inherited attribute lookup.
    ///
    /// Inheritable attributes are never resolved from the element itself
    /// when reached as an ancestor.
    pub fn is_terminal_scope(&self) -> bool {
        matches!(self, EId::Svg)
    }
}
