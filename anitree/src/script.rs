// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The scripting runtime boundary.

use crate::{NodeId, ScriptError, XmlEvent};

/// The name of the function every handler is wrapped into.
pub const HANDLER_FUNCTION: &str = "__event_handler";

/// The file label used when evaluating handler code.
pub const SCRIPT_FILE_LABEL: &str = "svg";

/// Wraps handler code into a function taking an `event` (aliased as `evt`).
pub fn wrap_handler_code(code: &str) -> String {
    format!(
        "function {}(event) {{let evt=event;{}}}",
        HANDLER_FUNCTION, code
    )
}

keyword_enum!(
    /// A script content type.
    ScriptType, SCRIPT_TYPE, default = EcmaScript, {
        EcmaScript => "application/ecmascript",
        JavaArchive => "application/java-archive",
    }
);

/// A value passed to or returned from the scripting runtime.
#[derive(Clone, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum ScriptValue {
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    /// A document node.
    Node(NodeId),
    /// An event object.
    Event(XmlEvent),
}

/// A scripting runtime.
///
/// Passed explicitly to everything that runs scripts.
pub trait ScriptContext {
    /// Evaluates a source text.
    ///
    /// `file` is a label used in the runtime's diagnostics.
    fn eval(&mut self, source: &str, file: &str) -> Result<ScriptValue, ScriptError>;

    /// Calls a global function.
    fn call_function(&mut self, name: &str, args: &[ScriptValue])
        -> Result<ScriptValue, ScriptError>;

    /// Exposes a host value as a global.
    fn add_global_object(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    pub enum Call {
        Eval(String, String),
        Function(String, Vec<ScriptValue>),
        Global(String, ScriptValue),
    }

    /// Records every call, optionally failing evaluation of matching sources.
    #[derive(Default, Debug)]
    pub struct Recorder {
        pub calls: Vec<Call>,
        fail_on: Option<String>,
    }

    impl Recorder {
        pub fn failing_on(pattern: &str) -> Self {
            Recorder {
                calls: Vec::new(),
                fail_on: Some(pattern.to_string()),
            }
        }

        pub fn evaluated(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Eval(source, _) => Some(source.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn called(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Function(..)))
                .count()
        }

        pub fn last_event(&self) -> Option<XmlEvent> {
            self.calls.iter().rev().find_map(|c| match c {
                Call::Function(_, args) => match args.first() {
                    Some(ScriptValue::Event(e)) => Some(e.clone()),
                    _ => None,
                },
                _ => None,
            })
        }
    }

    impl ScriptContext for Recorder {
        fn eval(&mut self, source: &str, file: &str) -> Result<ScriptValue, ScriptError> {
            self.calls
                .push(Call::Eval(source.to_string(), file.to_string()));

            match self.fail_on {
                Some(ref pattern) if source.contains(pattern.as_str()) => {
                    Err(ScriptError::new("failed"))
                }
                _ => Ok(ScriptValue::Undefined),
            }
        }

        fn call_function(
            &mut self,
            name: &str,
            args: &[ScriptValue],
        ) -> Result<ScriptValue, ScriptError> {
            self.calls.push(Call::Function(name.to_string(), args.to_vec()));
            Ok(ScriptValue::Undefined)
        }

        fn add_global_object(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError> {
            self.calls.push(Call::Global(name.to_string(), value));
            Ok(())
        }
    }

    #[test]
    fn wrapping() {
        assert_eq!(
            wrap_handler_code("alert(1)"),
            "function __event_handler(event) {let evt=event;alert(1)}"
        );
    }

    #[test]
    fn script_types() {
        assert_eq!(
            ScriptType::from_keyword("application/java-archive"),
            ScriptType::JavaArchive
        );
        assert_eq!(ScriptType::from_keyword("text/x-tcl"), ScriptType::EcmaScript);
    }

    #[test]
    fn recorder_labels() {
        let mut r = Recorder::default();
        r.eval("x", SCRIPT_FILE_LABEL).unwrap();
        assert_eq!(r.calls, vec![Call::Eval("x".to_string(), "svg".to_string())]);
    }
}
