// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// A document loading error.
#[derive(Debug)]
pub enum Error {
    /// Elements are nested deeper than `Options::nodes_limit`.
    ElementsLimitReached,

    /// The document has no root element.
    NoRootElement,

    /// Failed to parse an XML data.
    ParsingFailed(roxmltree::Error),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::ElementsLimitReached => {
                write!(f, "the maximum elements nesting depth has been reached")
            }
            Error::NoRootElement => {
                write!(f, "the document has no root element")
            }
            Error::ParsingFailed(ref e) => {
                write!(f, "XML data parsing failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for Error {}

/// A tree mutation error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TreeError {
    /// The node already has a parent.
    AlreadyAttached,

    /// The operation would produce an invalid hierarchy.
    ///
    /// Occurs when appending the document node, appending into a text node
    /// or appending a node into its own subtree.
    HierarchyRequest,

    /// The operation is not implemented.
    NotSupported,
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            TreeError::AlreadyAttached => write!(f, "node is already attached"),
            TreeError::HierarchyRequest => write!(f, "invalid node hierarchy"),
            TreeError::NotSupported => write!(f, "operation is not supported"),
        }
    }
}

impl std::error::Error for TreeError {}

/// An attribute access error.
#[derive(Clone, PartialEq, Debug)]
pub enum AttrError {
    /// The element has no attribute with such name.
    UnknownAttribute(String),

    /// The value cannot be coerced into the attribute's kind.
    InvalidValue {
        /// Attribute name.
        attribute: String,
        /// Raw value.
        value: String,
    },

    /// A list attribute has an unexpected number of items.
    ArityMismatch {
        /// Required item count.
        expected: usize,
        /// Parsed item count.
        actual: usize,
    },

    /// A typed value doesn't match the attribute's kind.
    TypeMismatch(String),

    /// The node is not an element.
    NotAnElement,
}

impl std::fmt::Display for AttrError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            AttrError::UnknownAttribute(ref name) => {
                write!(f, "unknown attribute '{}'", name)
            }
            AttrError::InvalidValue {
                ref attribute,
                ref value,
            } => {
                write!(f, "invalid {} value: '{}'", attribute, value)
            }
            AttrError::ArityMismatch { expected, actual } => {
                write!(f, "expected {} items, got {}", expected, actual)
            }
            AttrError::TypeMismatch(ref name) => {
                write!(f, "value type doesn't match attribute '{}'", name)
            }
            AttrError::NotAnElement => write!(f, "node is not an element"),
        }
    }
}

impl std::error::Error for AttrError {}

/// A resource fetching error.
#[derive(Debug)]
pub enum ResourceError {
    /// The IRI scheme cannot be fetched.
    UnsupportedScheme(String),

    /// The IRI cannot be converted into a path.
    InvalidIri(String),

    /// Failed to read a file.
    Io(std::path::PathBuf, std::io::Error),

    /// The resource is not a UTF-8 text.
    NotUtf8(String),
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ResourceError::UnsupportedScheme(ref iri) => {
                write!(f, "unsupported IRI scheme: '{}'", iri)
            }
            ResourceError::InvalidIri(ref iri) => write!(f, "invalid IRI: '{}'", iri),
            ResourceError::Io(ref path, ref e) => {
                write!(f, "failed to read '{}' cause {}", path.display(), e)
            }
            ResourceError::NotUtf8(ref iri) => {
                write!(f, "'{}' has not an UTF-8 encoding", iri)
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            ResourceError::Io(_, ref e) => Some(e),
            _ => None,
        }
    }
}

/// An error reported by the scripting runtime.
#[derive(Clone, PartialEq, Debug)]
pub struct ScriptError {
    /// The runtime's message, verbatim.
    pub message: String,
}

impl ScriptError {
    /// Creates a new error.
    pub fn new<S: Into<String>>(message: S) -> Self {
        ScriptError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "script error: {}", self.message)
    }
}

impl std::error::Error for ScriptError {}
