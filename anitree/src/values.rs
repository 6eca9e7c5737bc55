// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Typed attribute values and their string coercion.

use std::str::FromStr;

use svgtypes::{Align, AspectRatio, Color, Length, LengthUnit, Transform};

use crate::timing::{Duration, RepeatCount};

/// A keyword table of an enumerated attribute.
#[derive(Debug)]
pub struct EnumTable {
    /// Enum name, used in diagnostics.
    pub name: &'static str,
    /// Keywords in declaration order.
    pub keywords: &'static [&'static str],
    /// Index of the default keyword.
    pub default: usize,
}

impl EnumTable {
    /// Matches a keyword case-insensitively.
    ///
    /// Never fails: an unknown keyword resolves to the table's default.
    pub fn parse(&'static self, text: &str) -> EnumValue {
        let text = text.trim();
        match self.keywords.iter().position(|k| k.eq_ignore_ascii_case(text)) {
            Some(index) => EnumValue { table: self, index },
            None => {
                log::warn!(
                    "Unknown {} value '{}'. Fallback to '{}'.",
                    self.name,
                    text,
                    self.keywords[self.default]
                );
                self.default_value()
            }
        }
    }

    /// Returns the default value.
    #[inline]
    pub fn default_value(&'static self) -> EnumValue {
        EnumValue {
            table: self,
            index: self.default,
        }
    }
}

/// A value of an enumerated attribute.
#[derive(Clone, Copy, Debug)]
pub struct EnumValue {
    table: &'static EnumTable,
    index: usize,
}

impl EnumValue {
    /// Returns the keyword index in its table.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the keyword.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.table.keywords[self.index]
    }

    /// Returns the keyword table.
    #[inline]
    pub fn table(&self) -> &'static EnumTable {
        self.table
    }

    /// Checks that the value belongs to the specified table.
    #[inline]
    pub fn is_of(&self, table: &'static EnumTable) -> bool {
        std::ptr::eq(self.table, table)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.table, other.table) && self.index == other.index
    }
}

/// Declares a keyword enum with a matching [`EnumTable`].
///
/// The `default` variant is used when matching fails.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $table:ident, default = $default:ident,
        { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[allow(missing_docs)]
        pub enum $name {
            $($variant),+
        }

        #[allow(missing_docs)]
        pub static $table: $crate::EnumTable = $crate::EnumTable {
            name: stringify!($name),
            keywords: &[$($text),+],
            default: $name::$default as usize,
        };

        impl $name {
            const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            /// Returns the keyword.
            #[inline]
            pub fn as_str(&self) -> &'static str {
                $table.keywords[*self as usize]
            }

            /// Converts an [`EnumValue`] of the matching table.
            pub fn from_enum_value(value: $crate::EnumValue) -> Option<Self> {
                if value.is_of(&$table) {
                    Self::VARIANTS.get(value.index()).copied()
                } else {
                    None
                }
            }

            /// Matches a keyword, falling back to the default.
            #[inline]
            pub fn from_keyword(text: &str) -> Self {
                // The index always comes from the same table.
                Self::VARIANTS[$table.parse(text).index()]
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl<'a> $crate::FromValue<'a> for $name {
            fn parse(value: &'a $crate::AttributeValue) -> Option<Self> {
                match *value {
                    $crate::AttributeValue::Enum(v) => $name::from_enum_value(v),
                    _ => None,
                }
            }
        }

        impl From<$name> for $crate::AttributeValue {
            fn from(v: $name) -> Self {
                $crate::AttributeValue::Enum($crate::EnumValue::new(&$table, v as usize))
            }
        }
    };
}

impl EnumValue {
    #[doc(hidden)]
    #[inline]
    pub fn new(table: &'static EnumTable, index: usize) -> Self {
        debug_assert!(index < table.keywords.len());
        EnumValue { table, index }
    }
}

/// The kind of value an attribute holds.
#[derive(Clone, Copy, Debug)]
pub enum ValueKind {
    /// A verbatim string.
    String,
    /// A number.
    Number,
    /// A number clamped to the 0..1 range.
    Opacity,
    /// A length, stored in pixels.
    Length,
    /// A list of lengths, stored in pixels.
    LengthList,
    /// A list of numbers, with an optional fixed arity.
    NumberList(Option<usize>),
    /// A list of coordinate pairs.
    Points,
    /// A color or `none`.
    Color,
    /// A keyword from a table.
    Enum(&'static EnumTable),
    /// A SMIL duration.
    Duration,
    /// A SMIL repeat count.
    RepeatCount,
    /// A `preserveAspectRatio` value.
    AspectRatio,
    /// A transform list.
    Transform,
}

impl ValueKind {
    /// Coerces a string into a value of this kind.
    pub fn parse(&self, text: &str) -> Result<AttributeValue, Coercion> {
        match *self {
            ValueKind::String => Ok(AttributeValue::String(text.to_string())),
            ValueKind::Number => parse_number(text).map(AttributeValue::Number),
            ValueKind::Opacity => {
                parse_number(text).map(|n| AttributeValue::Number(n.max(0.0).min(1.0)))
            }
            ValueKind::Length => parse_length(text).map(AttributeValue::Length),
            ValueKind::LengthList => parse_length_list(text).map(AttributeValue::LengthList),
            ValueKind::NumberList(arity) => {
                let list = parse_number_list(text)?;
                check_arity(arity, list.len())?;
                Ok(AttributeValue::NumberList(list))
            }
            ValueKind::Points => parse_points(text).map(AttributeValue::Points),
            ValueKind::Color => parse_color(text),
            ValueKind::Enum(table) => Ok(AttributeValue::Enum(table.parse(text))),
            ValueKind::Duration => Duration::from_str(text)
                .map(AttributeValue::Duration)
                .map_err(|_| Coercion::Invalid),
            ValueKind::RepeatCount => RepeatCount::from_str(text)
                .map(AttributeValue::RepeatCount)
                .map_err(|_| Coercion::Invalid),
            ValueKind::AspectRatio => AspectRatio::from_str(text)
                .map(AttributeValue::AspectRatio)
                .map_err(|_| Coercion::Invalid),
            ValueKind::Transform => Transform::from_str(text)
                .map(AttributeValue::Transform)
                .map_err(|_| Coercion::Invalid),
        }
    }

    /// Checks that a typed value can be stored in an attribute of this kind.
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        match (*self, value) {
            (ValueKind::String, AttributeValue::String(_)) => true,
            (ValueKind::Number, AttributeValue::Number(_)) => true,
            (ValueKind::Opacity, AttributeValue::Number(n)) => (0.0..=1.0).contains(n),
            (ValueKind::Length, AttributeValue::Length(_)) => true,
            (ValueKind::LengthList, AttributeValue::LengthList(_)) => true,
            (ValueKind::NumberList(arity), AttributeValue::NumberList(list)) => {
                check_arity(arity, list.len()).is_ok()
            }
            (ValueKind::Points, AttributeValue::Points(_)) => true,
            (ValueKind::Color, AttributeValue::Color(_)) => true,
            (ValueKind::Color, AttributeValue::None) => true,
            (ValueKind::Enum(table), AttributeValue::Enum(v)) => v.is_of(table),
            (ValueKind::Duration, AttributeValue::Duration(_)) => true,
            (ValueKind::RepeatCount, AttributeValue::RepeatCount(_)) => true,
            (ValueKind::AspectRatio, AttributeValue::AspectRatio(_)) => true,
            (ValueKind::Transform, AttributeValue::Transform(_)) => true,
            _ => false,
        }
    }
}

/// A coercion failure, without the attribute context.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Coercion {
    /// The text is not a valid value of the kind.
    Invalid,
    /// A list has an unexpected number of items.
    ArityMismatch {
        /// Required item count.
        expected: usize,
        /// Parsed item count.
        actual: usize,
    },
}

fn check_arity(arity: Option<usize>, actual: usize) -> Result<(), Coercion> {
    match arity {
        Some(expected) if expected != actual => Err(Coercion::ArityMismatch { expected, actual }),
        _ => Ok(()),
    }
}

/// A coerced attribute value.
#[derive(Clone, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum AttributeValue {
    /// The `none` keyword of a paint attribute.
    None,
    String(String),
    Number(f64),
    /// A length in pixels.
    Length(f64),
    /// Lengths in pixels.
    LengthList(Vec<f64>),
    NumberList(Vec<f64>),
    Points(Vec<(f64, f64)>),
    Color(Color),
    Enum(EnumValue),
    Duration(Duration),
    RepeatCount(RepeatCount),
    AspectRatio(AspectRatio),
    Transform(Transform),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            AttributeValue::None => write!(f, "none"),
            AttributeValue::String(ref s) => write!(f, "{}", s),
            AttributeValue::Number(n) | AttributeValue::Length(n) => write!(f, "{}", n),
            AttributeValue::LengthList(ref list) | AttributeValue::NumberList(ref list) => {
                write_list(f, list.iter())
            }
            AttributeValue::Points(ref list) => {
                for (i, (x, y)) in list.iter().enumerate() {
                    if i != 0 {
                        write!(f, " ")?;
                    }

                    write!(f, "{},{}", x, y)?;
                }

                Ok(())
            }
            AttributeValue::Color(c) => {
                if c.alpha == 255 {
                    write!(f, "#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
                } else {
                    let a = c.alpha as f64 / 255.0;
                    write!(f, "rgba({},{},{},{})", c.red, c.green, c.blue, a)
                }
            }
            AttributeValue::Enum(v) => write!(f, "{}", v.as_str()),
            AttributeValue::Duration(d) => write!(f, "{}", d),
            AttributeValue::RepeatCount(r) => write!(f, "{}", r),
            AttributeValue::AspectRatio(r) => {
                if r.defer {
                    write!(f, "defer ")?;
                }

                write!(f, "{}", align_to_str(r.align))?;

                if r.slice {
                    write!(f, " slice")?;
                }

                Ok(())
            }
            AttributeValue::Transform(ts) => {
                write!(f, "matrix(")?;
                write_list(f, [ts.a, ts.b, ts.c, ts.d, ts.e, ts.f].iter())?;
                write!(f, ")")
            }
        }
    }
}

fn write_list<'a>(
    f: &mut std::fmt::Formatter,
    list: impl Iterator<Item = &'a f64>,
) -> std::fmt::Result {
    for (i, n) in list.enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }

        write!(f, "{}", n)?;
    }

    Ok(())
}

fn align_to_str(align: Align) -> &'static str {
    match align {
        Align::None => "none",
        Align::XMinYMin => "xMinYMin",
        Align::XMidYMin => "xMidYMin",
        Align::XMaxYMin => "xMaxYMin",
        Align::XMinYMid => "xMinYMid",
        Align::XMidYMid => "xMidYMid",
        Align::XMaxYMid => "xMaxYMid",
        Align::XMinYMax => "xMinYMax",
        Align::XMidYMax => "xMidYMax",
        Align::XMaxYMax => "xMaxYMax",
    }
}

/// Parses a number surrounded by optional whitespace.
pub fn parse_number(text: &str) -> Result<f64, Coercion> {
    svgtypes::Number::from_str(text)
        .map(|n| n.0)
        .map_err(|_| Coercion::Invalid)
}

/// Parses a comma and/or whitespace separated list of numbers.
pub fn parse_number_list(text: &str) -> Result<Vec<f64>, Coercion> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    svgtypes::NumberListParser::from(text)
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| Coercion::Invalid)
}

/// Parses a list of coordinate pairs.
///
/// An odd number of coordinates is an arity error.
pub fn parse_points(text: &str) -> Result<Vec<(f64, f64)>, Coercion> {
    let numbers = parse_number_list(text)?;
    if numbers.len() % 2 != 0 {
        return Err(Coercion::ArityMismatch {
            expected: numbers.len() + 1,
            actual: numbers.len(),
        });
    }

    Ok(numbers.chunks(2).map(|p| (p[0], p[1])).collect())
}

/// Parses a length and converts it into pixels.
pub fn parse_length(text: &str) -> Result<f64, Coercion> {
    let length = Length::from_str(text.trim()).map_err(|_| Coercion::Invalid)?;
    length_to_px(length).ok_or(Coercion::Invalid)
}

/// Parses a list of lengths and converts them into pixels.
pub fn parse_length_list(text: &str) -> Result<Vec<f64>, Coercion> {
    let mut list = Vec::new();
    for length in svgtypes::LengthListParser::from(text) {
        let length = length.map_err(|_| Coercion::Invalid)?;
        list.push(length_to_px(length).ok_or(Coercion::Invalid)?);
    }

    Ok(list)
}

const DPI: f64 = 96.0;
const FONT_SIZE: f64 = 16.0;

/// Converts a length into pixels.
///
/// Percentages have no reference box here and cannot be converted.
pub fn length_to_px(length: Length) -> Option<f64> {
    let n = length.number;
    let px = match length.unit {
        LengthUnit::None | LengthUnit::Px => n,
        LengthUnit::Em => n * FONT_SIZE,
        LengthUnit::Ex => n * FONT_SIZE / 2.0,
        LengthUnit::In => n * DPI,
        LengthUnit::Cm => n * DPI / 2.54,
        LengthUnit::Mm => n * DPI / 25.4,
        LengthUnit::Pt => n * DPI / 72.0,
        LengthUnit::Pc => n * DPI / 6.0,
        LengthUnit::Percent => return None,
    };

    Some(px)
}

fn parse_color(text: &str) -> Result<AttributeValue, Coercion> {
    let text = text.trim();
    if text == "none" {
        return Ok(AttributeValue::None);
    }

    Color::from_str(text)
        .map(AttributeValue::Color)
        .map_err(|_| Coercion::Invalid)
}

/// Checks that a string is an absolute IRI this engine knows how to load.
pub fn is_iri(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("file://")
}

/// Counts whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A trait for extracting a typed value from an [`AttributeValue`].
pub trait FromValue<'a>: Sized {
    /// Extracts a value.
    ///
    /// Returns `None` when the attribute holds a value of a different kind.
    fn parse(value: &'a AttributeValue) -> Option<Self>;
}

impl<'a> FromValue<'a> for &'a AttributeValue {
    #[inline]
    fn parse(value: &'a AttributeValue) -> Option<Self> {
        Some(value)
    }
}

impl<'a> FromValue<'a> for &'a str {
    fn parse(value: &'a AttributeValue) -> Option<Self> {
        match *value {
            AttributeValue::String(ref s) => Some(s),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for f64 {
    fn parse(value: &'a AttributeValue) -> Option<Self> {
        match *value {
            AttributeValue::Number(n) | AttributeValue::Length(n) => Some(n),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for &'a [f64] {
    fn parse(value: &'a AttributeValue) -> Option<Self> {
        match *value {
            AttributeValue::NumberList(ref list) | AttributeValue::LengthList(ref list) => {
                Some(list)
            }
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for &'a [(f64, f64)] {
    fn parse(value: &'a AttributeValue) -> Option<Self> {
        match *value {
            AttributeValue::Points(ref list) => Some(list),
            _ => None,
        }
    }
}

macro_rules! impl_from_value {
    ($rtype:ty, $etype:ident) => {
        impl<'a> FromValue<'a> for $rtype {
            fn parse(value: &'a AttributeValue) -> Option<Self> {
                match *value {
                    AttributeValue::$etype(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(Color, Color);
impl_from_value!(EnumValue, Enum);
impl_from_value!(Duration, Duration);
impl_from_value!(RepeatCount, RepeatCount);
impl_from_value!(AspectRatio, AspectRatio);
impl_from_value!(Transform, Transform);

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_TABLE: EnumTable = EnumTable {
        name: "test",
        keywords: &["none", "simple", "Fancy"],
        default: 1,
    };

    #[test]
    fn number_round_trip() {
        for text in &["0", "1", "-1", "1.5", ".5", "-0.25", "1e3", "2.5E-2", " 7 ", "+3"] {
            let n = parse_number(text).unwrap();
            let s = AttributeValue::Number(n).to_string();
            assert_eq!(parse_number(&s).unwrap(), n, "'{}' -> '{}'", text, s);
        }
    }

    #[test]
    fn number_errors() {
        assert_eq!(parse_number(""), Err(Coercion::Invalid));
        assert_eq!(parse_number("1,5"), Err(Coercion::Invalid));
        assert_eq!(parse_number("1px"), Err(Coercion::Invalid));
        assert_eq!(parse_number("abc"), Err(Coercion::Invalid));
        assert_eq!(parse_number("1e"), Err(Coercion::Invalid));
        assert_eq!(parse_number("-"), Err(Coercion::Invalid));
    }

    #[test]
    fn enum_matching() {
        assert_eq!(TEST_TABLE.parse("simple").index(), 1);
        assert_eq!(TEST_TABLE.parse("NONE").index(), 0);
        assert_eq!(TEST_TABLE.parse("fancy").as_str(), "Fancy");
    }

    #[test]
    fn enum_fallback() {
        for text in &["", "   ", "unknown", "simplest", "none none"] {
            assert_eq!(TEST_TABLE.parse(text), TEST_TABLE.default_value());
        }
    }

    #[test]
    fn number_list() {
        assert_eq!(parse_number_list("1 2,3 , 4").unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(parse_number_list("").unwrap(), Vec::<f64>::new());
        assert_eq!(parse_number_list("1 x"), Err(Coercion::Invalid));
    }

    #[test]
    fn number_list_arity() {
        let kind = ValueKind::NumberList(Some(4));
        assert!(kind.parse("0 0 100 100").is_ok());
        assert_eq!(
            kind.parse("0 0 100"),
            Err(Coercion::ArityMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn points() {
        assert_eq!(
            parse_points("10,20 100,200").unwrap(),
            vec![(10.0, 20.0), (100.0, 200.0)]
        );
        assert_eq!(
            parse_points("10,20 100"),
            Err(Coercion::ArityMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn lengths() {
        assert_eq!(parse_length("10").unwrap(), 10.0);
        assert_eq!(parse_length(" 10px ").unwrap(), 10.0);
        assert_eq!(parse_length("1in").unwrap(), 96.0);
        assert_eq!(parse_length("2em").unwrap(), 32.0);
        assert_eq!(parse_length("72pt").unwrap(), 96.0);
        assert_eq!(parse_length("50%"), Err(Coercion::Invalid));
        assert_eq!(parse_length("1q"), Err(Coercion::Invalid));
    }

    #[test]
    fn length_list() {
        assert_eq!(parse_length_list("10 20px 1in").unwrap(), vec![10.0, 20.0, 96.0]);
    }

    #[test]
    fn colors() {
        assert_eq!(
            ValueKind::Color.parse("red").unwrap(),
            AttributeValue::Color(Color::new_rgb(255, 0, 0))
        );
        assert_eq!(ValueKind::Color.parse("none").unwrap(), AttributeValue::None);
        assert_eq!(ValueKind::Color.parse("#00ff00").unwrap().to_string(), "#00ff00");
        assert_eq!(ValueKind::Color.parse("zzz"), Err(Coercion::Invalid));
    }

    #[test]
    fn opacity_is_clamped() {
        assert_eq!(ValueKind::Opacity.parse("1.5").unwrap(), AttributeValue::Number(1.0));
        assert_eq!(ValueKind::Opacity.parse("-1").unwrap(), AttributeValue::Number(0.0));
    }

    #[test]
    fn accepts() {
        assert!(ValueKind::Length.accepts(&AttributeValue::Length(1.0)));
        assert!(!ValueKind::Length.accepts(&AttributeValue::Number(1.0)));
        assert!(ValueKind::Color.accepts(&AttributeValue::None));
        assert!(!ValueKind::NumberList(Some(4)).accepts(&AttributeValue::NumberList(vec![1.0])));
        assert!(ValueKind::Enum(&TEST_TABLE).accepts(&AttributeValue::Enum(TEST_TABLE.default_value())));
    }

    #[test]
    fn aspect_ratio_to_string() {
        let v = ValueKind::AspectRatio.parse("xMinYMax slice").unwrap();
        assert_eq!(v.to_string(), "xMinYMax slice");
    }

    #[test]
    fn transform() {
        let v = ValueKind::Transform.parse("translate(10 20)").unwrap();
        assert_eq!(v.to_string(), "matrix(1 0 0 1 10 20)");
    }

    #[test]
    fn iri() {
        assert!(is_iri("http://example.com/a.svg"));
        assert!(is_iri("file:///tmp/a.svg"));
        assert!(!is_iri("a.svg"));
        assert!(!is_iri("#id"));
    }

    #[test]
    fn words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words(" \t"), 0);
        assert_eq!(count_words("one"), 1);
        assert_eq!(count_words(" one"), 1);
        assert_eq!(count_words("one "), 1);
        assert_eq!(count_words(" one "), 1);
        assert_eq!(count_words("two words"), 2);
        assert_eq!(count_words(" two words"), 2);
        assert_eq!(count_words("two words "), 2);
        assert_eq!(count_words(" two  words "), 2);
    }
}
