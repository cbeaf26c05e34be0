use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value;

use crate::renderer::for_loop::ForLoop;

pub type Val<'a> = Cow<'a, Value>;
pub type FrameContext<'a> = HashMap<&'a str, Val<'a>>;

/// Name of the loop helper variable available in a `#foreach` body
pub const FOREACH_HELPER: &str = "foreach";

/// Enumerates the types of stack frames
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameType {
    /// Original frame, where `#set` assignments end up
    Origin,
    /// New frame for macro call
    Macro,
    /// New frame for for loop
    ForLoop,
}

/// Entry in the stack frame
#[derive(Debug)]
pub struct StackFrame<'a> {
    /// Type of stack frame
    pub kind: FrameType,
    /// Frame name for context/debugging
    pub name: &'a str,
    /// Assigned values
    ///
    /// - `#set(...)` adds to the origin frame, or to a macro frame for its arguments
    /// - `#name(a b)` builds the macro frame context before invocation
    context: FrameContext<'a>,
    /// `ForLoop` if frame is for a for loop
    pub for_loop: Option<ForLoop<'a>>,
}

impl<'a> StackFrame<'a> {
    pub fn new(kind: FrameType, name: &'a str) -> Self {
        StackFrame { kind, name, context: FrameContext::new(), for_loop: None }
    }

    pub fn new_for_loop(name: &'a str, for_loop: ForLoop<'a>) -> Self {
        StackFrame {
            kind: FrameType::ForLoop,
            name,
            context: FrameContext::new(),
            for_loop: Some(for_loop),
        }
    }

    pub fn new_macro(name: &'a str, context: FrameContext<'a>) -> Self {
        StackFrame { kind: FrameType::Macro, name, context, for_loop: None }
    }

    /// Finds a value in the stack frame.
    /// Looks first in the frame context, then at the loop variables.
    pub fn find_value(&self, key: &str) -> Option<Val<'a>> {
        self.context.get(key).cloned().or_else(|| self.find_value_in_for_loop(key))
    }

    /// Finds a value in the `for_loop` if there is one
    pub fn find_value_in_for_loop(&self, key: &str) -> Option<Val<'a>> {
        let for_loop = self.for_loop.as_ref()?;

        if key == for_loop.value_name {
            return for_loop.get_current_value();
        }
        if key == FOREACH_HELPER {
            return Some(Cow::Owned(for_loop.helper()));
        }

        None
    }

    /// Whether this frame holds an assignment for that key
    pub fn contains_key(&self, key: &str) -> bool {
        self.context.contains_key(key)
    }

    /// Insert a value in the context
    pub fn insert(&mut self, key: &'a str, value: Val<'a>) {
        self.context.insert(key, value);
    }
}
