// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Document loading options.
#[derive(Clone, Debug)]
pub struct Options {
    /// The document base IRI.
    ///
    /// Used to resolve relative `xml:base` and `xlink:href` values.
    /// Usually a `file://` IRI of the directory that contains the document.
    ///
    /// Default: `None`
    pub base_iri: Option<String>,

    /// Maximum elements nesting depth.
    ///
    /// Deeper documents will fail with `Error::ElementsLimitReached`.
    ///
    /// Default: 1024
    pub nodes_limit: u32,

    /// Keep whitespace-only text nodes.
    ///
    /// Default: false
    pub keep_whitespace: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            base_iri: None,
            nodes_limit: 1024,
            keep_whitespace: false,
        }
    }
}
