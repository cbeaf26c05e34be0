use std::borrow::Cow;

use serde::ser::Serialize;
use serde_json::value::{to_value, Map, Value};

use crate::errors::{Error, Result as VellumResult};

/// The struct that holds the context of a template rendering.
///
/// Light wrapper around a JSON object mapping names to values. A rendering only
/// ever borrows it immutably: `#set` assignments live in the renderer's own call
/// stack and never write back into the context.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    data: Map<String, Value>,
}

impl Context {
    /// Initializes an empty context
    pub fn new() -> Self {
        Context { data: Map::new() }
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    ///
    /// Panics if the serialization fails.
    ///
    /// ```rust
    /// # use vellum::Context;
    /// let mut context = vellum::Context::new();
    /// context.insert("number_users", &42);
    /// ```
    pub fn insert<T: Serialize + ?Sized, S: Into<String>>(&mut self, key: S, val: &T) {
        self.data.insert(key.into(), to_value(val).unwrap());
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    ///
    /// Returns an error if the serialization fails.
    pub fn try_insert<T: Serialize + ?Sized, S: Into<String>>(
        &mut self,
        key: S,
        val: &T,
    ) -> VellumResult<()> {
        self.data.insert(key.into(), to_value(val)?);

        Ok(())
    }

    /// Appends the data of the `source` parameter to `self`, overwriting existing keys.
    pub fn extend(&mut self, source: Context) {
        for (key, value) in source.data {
            self.data.insert(key, value);
        }
    }

    /// Converts the context to a `serde_json::Value` consuming the context.
    pub fn into_json(self) -> Value {
        Value::Object(self.data)
    }

    /// Takes a serde-json `Value` and convert it into a `Context` with no overhead/cloning.
    pub fn from_value(obj: Value) -> VellumResult<Self> {
        match obj {
            Value::Object(data) => Ok(Context { data }),
            _ => Err(Error::msg(format!(
                "Creating a Context from a Value requires it being a JSON object, got {}",
                describe_value(&obj)
            ))),
        }
    }

    /// Takes something that impl Serialize and create a context with it.
    /// Meant to be used if you have a hashmap or a struct and don't want to insert values
    /// one by one in the context.
    pub fn from_serialize(value: impl Serialize) -> VellumResult<Self> {
        let obj = to_value(value).map_err(Error::json)?;
        Context::from_value(obj)
    }

    /// Returns the value at a given key index.
    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }

    /// Remove a key from the context, returning the value at the key if the key was previously
    /// inserted into the context.
    pub fn remove(&mut self, index: &str) -> Option<Value> {
        self.data.remove(index)
    }

    /// Checks if a value exists at a specific index.
    pub fn contains_key(&self, index: &str) -> bool {
        self.data.contains_key(index)
    }

    /// How many top-level names the context binds
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the context binds no names at all
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

/// A short human description of the JSON type of a value, e.g. `an array`
pub fn describe_value(value: &Value) -> &'static str {
    match *value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Converts a value into the text inserted in the output
pub trait ValueRender {
    fn render(&self) -> Cow<'_, str>;
}

// Lists and maps render the way the Velocity runtime prints Java collections.
impl ValueRender for Value {
    fn render(&self) -> Cow<'_, str> {
        match *self {
            Value::String(ref s) => Cow::Borrowed(s),
            Value::Number(ref i) => Cow::Owned(i.to_string()),
            Value::Bool(i) => Cow::Owned(i.to_string()),
            Value::Null => Cow::Borrowed("null"),
            Value::Array(ref a) => {
                let mut buf = String::with_capacity(a.len() * 4 + 2);
                buf.push('[');
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str(&v.render());
                }
                buf.push(']');
                Cow::Owned(buf)
            }
            Value::Object(ref m) => {
                let mut buf = String::with_capacity(m.len() * 8 + 2);
                buf.push('{');
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str(k);
                    buf.push('=');
                    buf.push_str(&v.render());
                }
                buf.push('}');
                Cow::Owned(buf)
            }
        }
    }
}

/// Converts a value to a f64 if it is a number
pub trait ValueNumber {
    fn to_number(&self) -> Result<f64, ()>;
}

impl ValueNumber for Value {
    fn to_number(&self) -> Result<f64, ()> {
        match *self {
            Value::Number(ref n) => Ok(n.as_f64().unwrap_or(0.0)),
            _ => Err(()),
        }
    }
}

/// Converts a dynamic value into a boolean, used by `#if` and the logic operators
pub trait ValueTruthy {
    fn is_truthy(&self) -> bool;
}

impl ValueTruthy for Value {
    fn is_truthy(&self) -> bool {
        match *self {
            Value::Number(ref i) => {
                if i.is_i64() {
                    return i.as_i64().unwrap() != 0;
                }
                if i.is_u64() {
                    return i.as_u64().unwrap() != 0;
                }
                let f = i.as_f64().unwrap();
                f != 0.0 && !f.is_nan()
            }
            Value::Bool(ref i) => *i,
            Value::Null => false,
            Value::String(ref i) => !i.is_empty(),
            Value::Array(ref i) => !i.is_empty(),
            Value::Object(ref i) => !i.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn can_extend_context() {
        let mut target = Context::new();
        target.insert("a", &1);
        target.insert("b", &2);
        let mut source = Context::new();
        source.insert("b", &3);
        source.insert("d", &4);
        target.extend(source);
        assert_eq!(*target.get("a").unwrap(), to_value(1).unwrap());
        assert_eq!(*target.get("b").unwrap(), to_value(3).unwrap());
        assert_eq!(*target.get("d").unwrap(), to_value(4).unwrap());
    }

    #[test]
    fn can_create_context_from_value() {
        let obj = json!({
            "name": "bob",
            "age": 25
        });
        let context_from_value = Context::from_value(obj).unwrap();
        let mut context = Context::new();
        context.insert("name", "bob");
        context.insert("age", &25);
        assert_eq!(context_from_value, context);
    }

    #[test]
    fn can_create_context_from_impl_serialize() {
        let mut map = HashMap::new();
        map.insert("name", "bob");
        map.insert("last_name", "something");
        let context_from_serialize = Context::from_serialize(&map).unwrap();
        let mut context = Context::new();
        context.insert("name", "bob");
        context.insert("last_name", "something");
        assert_eq!(context_from_serialize, context);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        let err = Context::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Creating a Context from a Value requires it being a JSON object, got an array"
        );
    }

    #[test]
    fn can_remove_a_key() {
        let mut context = Context::new();
        context.insert("name", "foo");
        context.insert("bio", "Hi, I'm foo.");

        let mut expected = Context::new();
        expected.insert("name", "foo");
        assert_eq!(context.remove("bio"), Some(to_value("Hi, I'm foo.").unwrap()));
        assert_eq!(context.get("bio"), None);
        assert_eq!(context, expected);
    }

    #[test]
    fn renders_collections_like_java_collections() {
        assert_eq!(json!(["a", 1, true]).render(), "[a, 1, true]");
        assert_eq!(json!({"a": 1}).render(), "{a=1}");
        assert_eq!(json!(2.5).render(), "2.5");
        assert_eq!(json!(3).render(), "3");
    }

    #[test]
    fn truthiness_follows_empty_checks() {
        assert!(!json!("").is_truthy());
        assert!(!json!([]).is_truthy());
        assert!(!json!({}).is_truthy());
        assert!(!json!(0).is_truthy());
        assert!(!json!(0.0).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(json!("a").is_truthy());
        assert!(json!(-1).is_truthy());
    }
}
