// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anitree::{
    AId, Document, EId, NodeId, ResourceFetcher, ScriptContext, ScriptError, ScriptType,
    ScriptValue, SCRIPT_FILE_LABEL,
};

/// Exposes the document as the `document` global.
pub fn expose_document(doc: &Document, script: &mut dyn ScriptContext) -> Result<(), ScriptError> {
    script.add_global_object("document", ScriptValue::Node(doc.root().id()))
}

/// Evaluates every `script` element in document order.
///
/// External scripts are fetched synchronously. Fetch failures and
/// unsupported script types are logged and skipped, while the first
/// evaluation error stops the run.
///
/// Returns the number of evaluated scripts.
pub fn run_scripts(
    doc: &Document,
    fetcher: &dyn ResourceFetcher,
    script: &mut dyn ScriptContext,
) -> Result<usize, ScriptError> {
    let nodes: Vec<NodeId> = doc
        .descendants()
        .filter(|n| n.tag_name() == Some(EId::Script))
        .map(|n| n.id())
        .collect();

    let mut count = 0;
    for node in nodes {
        let n = doc.get(node);
        if n.attribute::<ScriptType>(AId::Type).unwrap_or_default() != ScriptType::EcmaScript {
            log::warn!("Only ECMAScript scripts are supported.");
            continue;
        }

        let source = match doc.script_source(node, fetcher) {
            Ok(Some(v)) => v,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Failed to load a script: {}.", e);
                continue;
            }
        };

        let label = match n.attribute::<&str>(AId::Href) {
            Some(href) if n.text_content().trim().is_empty() => doc.resolve_href(node, href),
            _ => SCRIPT_FILE_LABEL.to_string(),
        };

        script.eval(&source, &label)?;
        count += 1;
    }

    Ok(count)
}
