use std::collections::HashMap;

use crate::errors::Result;
use crate::parser::ast::{MacroDefinition, Node};
use crate::parser::parse;

/// This is the parsed equivalent of a template source.
/// Templates are parsed again on every evaluation, nothing is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Name of the template, used as the log tag of the evaluation
    pub name: String,
    /// The AST of the template
    pub ast: Vec<Node>,
    /// Every macro defined in the template, wherever the definition is
    pub macros: HashMap<String, MacroDefinition>,
}

impl Template {
    /// Parse the template string given
    pub fn new(tpl_name: &str, input: &str) -> Result<Template> {
        let ast = parse(input)?;

        let mut macros = HashMap::new();
        collect_macros(&ast, &mut macros);

        Ok(Template { name: tpl_name.to_string(), ast, macros })
    }
}

/// Macros are visible from the whole template, even when defined inside a block
/// or after being called. A later definition replaces an earlier one.
fn collect_macros(nodes: &[Node], macros: &mut HashMap<String, MacroDefinition>) {
    for node in nodes {
        match *node {
            Node::MacroDefinition(ref definition) => {
                collect_macros(&definition.body, macros);
                macros.insert(definition.name.clone(), definition.clone());
            }
            Node::If(ref if_node) => {
                for (_, body) in &if_node.conditions {
                    collect_macros(body, macros);
                }
                if let Some(ref body) = if_node.otherwise {
                    collect_macros(body, macros);
                }
            }
            Node::Foreach(ref foreach) => {
                collect_macros(&foreach.body, macros);
                if let Some(ref body) = foreach.empty_body {
                    collect_macros(body, macros);
                }
            }
            _ => (),
        }
    }
}
