// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Base IRI resolution and external resources loading.

use std::path::PathBuf;

use crate::values::is_iri;
use crate::{AId, Document, NodeId, NodeKind, ResourceError};

/// A synchronous resource loader.
pub trait ResourceFetcher {
    /// Loads a resource by its resolved IRI.
    fn fetch(&self, iri: &str) -> Result<Vec<u8>, ResourceError>;

    /// Loads a resource as a UTF-8 text.
    fn fetch_text(&self, iri: &str) -> Result<String, ResourceError> {
        let data = self.fetch(iri)?;
        String::from_utf8(data).map_err(|_| ResourceError::NotUtf8(iri.to_string()))
    }
}

/// A fetcher that reads local files.
///
/// Accepts `file://` IRIs and plain paths.
#[derive(Clone, Copy, Default, Debug)]
pub struct LocalFetcher;

impl ResourceFetcher for LocalFetcher {
    fn fetch(&self, iri: &str) -> Result<Vec<u8>, ResourceError> {
        let path = if iri.starts_with("file://") {
            url::Url::parse(iri)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| ResourceError::InvalidIri(iri.to_string()))?
        } else if iri.contains("://") {
            return Err(ResourceError::UnsupportedScheme(iri.to_string()));
        } else {
            PathBuf::from(iri)
        };

        log::debug!("Loading '{}'.", path.display());
        std::fs::read(&path).map_err(|e| ResourceError::Io(path, e))
    }
}

/// Resolves a relative reference against a base, treating the base as a directory.
pub(crate) fn join_iri(base: &str, relative: &str) -> String {
    let mut dir = base.to_string();
    if !dir.ends_with('/') {
        dir.push('/');
    }

    match url::Url::parse(&dir).and_then(|url| url.join(relative)) {
        Ok(url) => url.to_string(),
        Err(_) => {
            // Not an IRI, like a plain path.
            dir.push_str(relative.trim_start_matches("./"));
            dir
        }
    }
}

impl Document {
    /// Returns a node's base IRI.
    ///
    /// An `xml:base` that is an IRI is used as is, a relative one is resolved
    /// against the parent's base IRI. Without `xml:base`, the parent's
    /// base IRI is used. The document node uses [`Document::document_base_iri`].
    ///
    /// Results are cached per element.
    pub fn base_iri(&self, node: NodeId) -> Option<&str> {
        let n = self.get(node);
        match n.d.kind {
            NodeKind::Root => self.base_iri.as_deref(),
            NodeKind::Text(_) => n.parent().and_then(|p| self.base_iri(p.id())),
            NodeKind::Element(ref e) => e
                .base_iri
                .get_or_init(|| self.resolve_base_iri(node))
                .as_deref(),
        }
    }

    fn resolve_base_iri(&self, node: NodeId) -> Option<String> {
        let n = self.get(node);
        let parent_base = n.parent().and_then(|p| self.base_iri(p.id()));

        match n.attribute::<&str>(AId::Base) {
            Some(base) if is_iri(base) => Some(base.to_string()),
            Some(base) => match parent_base {
                Some(parent_base) => Some(join_iri(parent_base, base)),
                None => Some(base.to_string()),
            },
            None => parent_base.map(String::from),
        }
    }

    pub(crate) fn invalidate_base_iri(&mut self, node: NodeId) {
        let ids: Vec<NodeId> = self.element_ids(node).collect();
        for id in ids {
            if let Some(e) = self.element_data_mut(id) {
                e.base_iri.take();
            }
        }
    }

    /// Resolves an `href` against a node's base IRI.
    ///
    /// IRIs and references without a base are returned unchanged.
    pub fn resolve_href(&self, node: NodeId, href: &str) -> String {
        if is_iri(href) {
            return href.to_string();
        }

        match self.base_iri(node) {
            Some(base) => join_iri(base, href),
            None => href.to_string(),
        }
    }

    /// Returns the source of a `script` element.
    ///
    /// Inline text has priority. Otherwise `xlink:href` is resolved and fetched.
    /// Returns `None` for an empty script.
    pub fn script_source(
        &self,
        node: NodeId,
        fetcher: &dyn ResourceFetcher,
    ) -> Result<Option<String>, ResourceError> {
        let n = self.get(node);
        let text = n.text_content();
        if !text.trim().is_empty() {
            return Ok(Some(text));
        }

        match n.attribute::<&str>(AId::Href) {
            Some(href) => {
                let iri = self.resolve_href(node, href);
                fetcher.fetch_text(&iri).map(Some)
            }
            None => Ok(None),
        }
    }
}
