#![doc(html_root_url = "https://docs.rs/vellum")]
//! # Vellum
//!
//! A small Velocity-style template engine and the core of a live HTML preview.
//!
//! The engine substitutes the values of a JSON context into a template written in
//! a subset of VTL: `$references`, `#set`, `#if`/`#elseif`/`#else`, `#foreach`,
//! `#macro`, comments and unparsed blocks.
//!
//! ```rust
//! use vellum::{Context, Engine};
//!
//! let mut context = Context::new();
//! context.insert("name", "World");
//! let rendered = Engine::one_off("<p>Hello $name!</p>", &context).unwrap();
//! assert_eq!(rendered, "<p>Hello World!</p>");
//! ```
//!
//! The [`preview`] module wraps the engine: a [`preview::PreviewSession`] takes the
//! template and JSON texts as the user types them and tells the host what to display,
//! including a safe fallback document and a notice when something fails.
//!
//! ```rust
//! use std::sync::Arc;
//! use vellum::{Engine, PreviewConfig};
//! use vellum::preview::PreviewSession;
//!
//! let mut session = PreviewSession::new(Arc::new(Engine::new()), PreviewConfig::default());
//! session.set_template_text("<p>$greeting</p>");
//! let update = session.set_context_text(r#"{"greeting": "hi"}"#);
//! assert_eq!(update.display.srcdoc, "<p>hi</p>");
//! assert_eq!(update.display.sandbox, "allow-same-origin");
//! ```

#[macro_use]
mod macros;
mod builtins;
mod config;
mod context;
mod engine;
mod errors;
mod parser;
mod renderer;
mod template;
mod utils;

pub mod preview;

// Library exports.

pub use crate::config::{EngineConfig, PreviewConfig};
pub use crate::context::Context;
pub use crate::engine::{Engine, Evaluation, SubstitutionEngine};
pub use crate::errors::{Error, ErrorKind, Result};
#[doc(hidden)]
pub use crate::template::Template;
pub use crate::utils::escape_html;
// Re-export Value and other useful things from serde
// so apps can build contexts
pub use serde_json::value::{from_value, to_value, Map, Number, Value};

// Exposes the AST if one needs it but changing the AST is not considered
// a breaking change so it isn't public
#[doc(hidden)]
pub use crate::parser::ast;
