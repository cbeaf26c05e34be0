use std::borrow::Cow;

use serde_json::Value;

use crate::errors::{Error, Result};
use crate::renderer::for_loop::{ForLoop, ForLoopState};
use crate::renderer::stack_frame::{FrameContext, FrameType, StackFrame, Val};
use crate::Context;

/// Contains the user data and allows no mutation
#[derive(Debug)]
pub struct UserContext<'a> {
    /// Read-only context
    inner: &'a Context,
}

impl<'a> UserContext<'a> {
    /// Create an immutable user context to be used in the call stack
    pub fn new(context: &'a Context) -> Self {
        UserContext { inner: context }
    }

    pub fn find_value(&self, key: &str) -> Option<&'a Value> {
        self.inner.get(key)
    }
}

/// Contains the stack of frames
#[derive(Debug)]
pub struct CallStack<'a> {
    /// The stack of frames
    stack: Vec<StackFrame<'a>>,
    /// User supplied context for the render
    context: UserContext<'a>,
}

impl<'a> CallStack<'a> {
    /// Create the initial call stack
    pub fn new(context: &'a Context) -> CallStack<'a> {
        CallStack {
            stack: vec![StackFrame::new(FrameType::Origin, "ORIGIN")],
            context: UserContext::new(context),
        }
    }

    pub fn push_for_loop_frame(&mut self, name: &'a str, for_loop: ForLoop<'a>) {
        self.stack.push(StackFrame::new_for_loop(name, for_loop));
    }

    pub fn push_macro_frame(&mut self, name: &'a str, context: FrameContext<'a>) {
        self.stack.push(StackFrame::new_macro(name, context));
    }

    /// How many macro calls are currently being rendered
    pub fn macro_depth(&self) -> usize {
        self.stack.iter().filter(|f| f.kind == FrameType::Macro).count()
    }

    /// Returns mutable reference to current `StackFrame`
    pub fn current_frame_mut(&mut self) -> Result<&mut StackFrame<'a>> {
        self.stack.last_mut().ok_or_else(|| Error::msg("No current frame exists"))
    }

    /// Returns immutable reference to current `StackFrame`
    pub fn current_frame(&self) -> Result<&StackFrame<'a>> {
        self.stack.last().ok_or_else(|| Error::msg("No current frame exists"))
    }

    /// Pop the last frame
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Looks a name up in the frames, innermost first, then in the user context.
    /// A JSON `null` is the same as no value at all.
    pub fn lookup(&self, key: &str) -> Option<Val<'a>> {
        for stack_frame in self.stack.iter().rev() {
            if let Some(found) = stack_frame.find_value(key) {
                return if found.is_null() { None } else { Some(found) };
            }
        }

        match self.context.find_value(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(Cow::Borrowed(value)),
        }
    }

    /// Add an assignment from `#set(...)`.
    ///
    /// It goes to the innermost macro frame if that macro has an argument with that
    /// name, to the origin frame otherwise. The user context is never modified.
    pub fn add_assignment(&mut self, key: &'a str, value: Val<'a>) {
        let macro_frame = self
            .stack
            .iter()
            .rposition(|f| f.kind == FrameType::Macro)
            .filter(|&i| self.stack[i].contains_key(key));

        let idx = macro_frame.unwrap_or(0);
        self.stack[idx].insert(key, value);
    }

    /// Breaks current for loop
    pub fn break_for_loop(&mut self) -> Result<()> {
        match self.current_frame_mut()?.for_loop {
            Some(ref mut for_loop) => {
                for_loop.break_loop();
                Ok(())
            }
            None => Err(Error::msg("Attempted `#break` while not in `#foreach`")),
        }
    }

    /// Moves the current for loop to its next value
    pub fn increment_for_loop(&mut self) -> Result<()> {
        match self.current_frame_mut()?.for_loop {
            Some(ref mut for_loop) => {
                for_loop.increment();
                Ok(())
            }
            None => Err(Error::msg("Attempted to move to the next value while not in `#foreach`")),
        }
    }

    /// True if the current loop was asked to stop by a `#break`
    pub fn should_break_for_loop(&self) -> bool {
        match self.current_frame() {
            Ok(frame) => match frame.for_loop {
                Some(ref for_loop) => for_loop.state == ForLoopState::Break,
                None => false,
            },
            Err(_) => false,
        }
    }
}
