use serde::Serialize;
use serde_json::json;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::engine::Engine;
use crate::errors::Result;

mod basic;
mod foreach;

#[derive(Debug, Serialize)]
pub struct Product {
    name: String,
    price: f64,
    tags: Vec<String>,
}

impl Product {
    #[allow(dead_code)]
    pub fn new() -> Product {
        Product {
            name: "Lamp".to_owned(),
            price: 19.5,
            tags: vec!["home".to_owned(), "light".to_owned()],
        }
    }
}

/// A context with a bit of everything
pub fn sample_context() -> Context {
    let mut context = Context::new();
    context.insert("name", "Ada");
    context.insert("age", &36);
    context.insert("price", &2.5);
    context.insert("empty", "");
    context.insert("nothing", &json!(null));
    context.insert("user", &json!({"name": "Bob", "tags": ["a", "b"]}));
    context.insert("scores", &json!({"a": 1, "b": 2}));
    context.insert("none", &json!([]));
    context
}

pub fn render_template(content: &str, context: &Context) -> Result<String> {
    Engine::new().render_str(content, context)
}

pub fn render_with_config(
    content: &str,
    context: &Context,
    config: EngineConfig,
) -> Result<String> {
    Engine::with_config(config).render_str(content, context)
}

/// The full error message, causes included
pub fn render_err(content: &str) -> String {
    render_template(content, &sample_context()).unwrap_err().full_message()
}
