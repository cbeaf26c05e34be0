/// Methods callable on references: `$name.toUpperCase()`, `$items.size()`, `$map.get("k")`
use serde_json::value::{Map, Value};

use crate::context::ValueRender;
use crate::errors::{Error, Result};

/// Checks the number of arguments given to a method
fn expect_args(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max { min.to_string() } else { format!("{} to {}", min, max) };
        return Err(Error::msg(format!(
            "Method `{}` takes {} argument(s) but {} were given",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

/// Converts a char index into a byte index, `None` if out of bounds
fn byte_index(s: &str, char_idx: usize) -> Option<usize> {
    if char_idx == s.chars().count() {
        return Some(s.len());
    }
    s.char_indices().nth(char_idx).map(|(i, _)| i)
}

fn get_index(name: &str, val: &Value) -> Result<usize> {
    let idx = try_get_value!(name, "index", i64, val);
    if idx < 0 {
        return Err(Error::msg(format!("Method `{}` received a negative index: {}", name, idx)));
    }
    Ok(idx as usize)
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let res = match name {
        "length" => {
            expect_args(name, args, 0, 0)?;
            Value::from(s.chars().count())
        }
        "isEmpty" => {
            expect_args(name, args, 0, 0)?;
            Value::Bool(s.is_empty())
        }
        "toUpperCase" => {
            expect_args(name, args, 0, 0)?;
            Value::String(s.to_uppercase())
        }
        "toLowerCase" => {
            expect_args(name, args, 0, 0)?;
            Value::String(s.to_lowercase())
        }
        "trim" => {
            expect_args(name, args, 0, 0)?;
            Value::String(s.trim().to_string())
        }
        "contains" => {
            expect_args(name, args, 1, 1)?;
            let needle = try_get_value!(name, "needle", String, args[0]);
            Value::Bool(s.contains(&needle))
        }
        "startsWith" => {
            expect_args(name, args, 1, 1)?;
            let prefix = try_get_value!(name, "prefix", String, args[0]);
            Value::Bool(s.starts_with(&prefix))
        }
        "endsWith" => {
            expect_args(name, args, 1, 1)?;
            let suffix = try_get_value!(name, "suffix", String, args[0]);
            Value::Bool(s.ends_with(&suffix))
        }
        "replace" => {
            expect_args(name, args, 2, 2)?;
            let from = try_get_value!(name, "from", String, args[0]);
            let to = try_get_value!(name, "to", String, args[1]);
            Value::String(s.replace(&from, &to))
        }
        "substring" => {
            expect_args(name, args, 1, 2)?;
            let len = s.chars().count();
            let begin = get_index(name, &args[0])?;
            let end = match args.get(1) {
                Some(val) => get_index(name, val)?,
                None => len,
            };
            if begin > end || end > len {
                return Err(Error::msg(format!(
                    "Method `substring` range {}..{} is out of bounds for a string of length {}",
                    begin, end, len
                )));
            }
            // both are in bounds, checked above
            let start = byte_index(s, begin).unwrap_or(0);
            let stop = byte_index(s, end).unwrap_or(s.len());
            Value::String(s[start..stop].to_string())
        }
        "indexOf" => {
            expect_args(name, args, 1, 1)?;
            let needle = try_get_value!(name, "needle", String, args[0]);
            match s.find(&needle) {
                Some(byte_idx) => Value::from(s[..byte_idx].chars().count()),
                None => Value::from(-1),
            }
        }
        "equals" => {
            expect_args(name, args, 1, 1)?;
            Value::Bool(args[0].as_str() == Some(s))
        }
        _ => return Ok(None),
    };

    Ok(Some(res))
}

fn list_method(items: &[Value], name: &str, args: &[Value]) -> Result<Option<Value>> {
    let res = match name {
        "size" => {
            expect_args(name, args, 0, 0)?;
            Value::from(items.len())
        }
        "isEmpty" => {
            expect_args(name, args, 0, 0)?;
            Value::Bool(items.is_empty())
        }
        "get" => {
            expect_args(name, args, 1, 1)?;
            let idx = get_index(name, &args[0])?;
            match items.get(idx) {
                Some(val) => val.clone(),
                None => {
                    return Err(Error::msg(format!(
                        "index `{}` is out of bounds for a list of size {}",
                        idx,
                        items.len()
                    )))
                }
            }
        }
        "contains" => {
            expect_args(name, args, 1, 1)?;
            Value::Bool(items.contains(&args[0]))
        }
        _ => return Ok(None),
    };

    Ok(Some(res))
}

fn map_method(map: &Map<String, Value>, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let res = match name {
        "size" => {
            expect_args(name, args, 0, 0)?;
            Value::from(map.len())
        }
        "isEmpty" => {
            expect_args(name, args, 0, 0)?;
            Value::Bool(map.is_empty())
        }
        "get" => {
            expect_args(name, args, 1, 1)?;
            // a missing key is an undefined value, not an error
            map.get(args[0].render().as_ref()).cloned().unwrap_or(Value::Null)
        }
        "containsKey" => {
            expect_args(name, args, 1, 1)?;
            Value::Bool(map.contains_key(args[0].render().as_ref()))
        }
        "keySet" => {
            expect_args(name, args, 0, 0)?;
            Value::Array(map.keys().map(|k| Value::String(k.clone())).collect())
        }
        "values" => {
            expect_args(name, args, 0, 0)?;
            Value::Array(map.values().cloned().collect())
        }
        _ => return Ok(None),
    };

    Ok(Some(res))
}

/// Calls the method `name` on `value`.
///
/// Returns `Ok(None)` when the value has no method with that name: the reference is then
/// undefined, like any other missing property.
pub fn call(value: &Value, name: &str, args: &[Value]) -> Result<Option<Value>> {
    match *value {
        Value::String(ref s) => string_method(s, name, args),
        Value::Array(ref items) => list_method(items, name, args),
        Value::Object(ref map) => map_method(map, name, args),
        _ => Ok(None),
    }
}
