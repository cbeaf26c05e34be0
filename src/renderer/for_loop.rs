use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::renderer::stack_frame::Val;

/// Enumerates the states of a for loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ForLoopState {
    /// State during iteration
    Normal,
    /// State on encountering a `#break`
    Break,
}

/// Tracks the state of a `#foreach` while its body is rendered
#[derive(Debug)]
pub struct ForLoop<'a> {
    /// The value name, ie in `#foreach($person in $people)` it would be `person`
    pub value_name: &'a str,
    /// What's the current loop index (0-indexed)
    pub current: usize,
    /// Values to iterate on
    pub values: Vec<Val<'a>>,
    /// Current state of the loop
    pub state: ForLoopState,
}

impl<'a> ForLoop<'a> {
    /// Loops over an array, or over the values of an object
    pub fn new(value_name: &'a str, container: Val<'a>) -> ForLoop<'a> {
        let values = match container {
            Cow::Borrowed(Value::Array(items)) => items.iter().map(Cow::Borrowed).collect(),
            Cow::Borrowed(Value::Object(map)) => map.values().map(Cow::Borrowed).collect(),
            Cow::Owned(Value::Array(items)) => items.into_iter().map(Cow::Owned).collect(),
            Cow::Owned(Value::Object(map)) => map.into_iter().map(|(_, v)| Cow::Owned(v)).collect(),
            _ => Vec::new(),
        };

        ForLoop { value_name, current: 0, values, state: ForLoopState::Normal }
    }

    /// Move to the next value
    pub fn increment(&mut self) {
        self.current += 1;
        self.state = ForLoopState::Normal;
    }

    /// Set state of loop to break
    pub fn break_loop(&mut self) {
        self.state = ForLoopState::Break;
    }

    pub fn get_current_value(&self) -> Option<Val<'a>> {
        self.values.get(self.current).cloned()
    }

    /// The `$foreach` helper object of the current iteration
    pub fn helper(&self) -> Value {
        let mut map = Map::new();
        map.insert("index".to_string(), Value::from(self.current));
        map.insert("count".to_string(), Value::from(self.current + 1));
        map.insert("hasNext".to_string(), Value::Bool(self.current + 1 < self.len()));
        map.insert("first".to_string(), Value::Bool(self.current == 0));
        map.insert("last".to_string(), Value::Bool(self.current + 1 == self.len()));
        Value::Object(map)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
