use lazy_static::lazy_static;
use pest::error::{ErrorVariant, LineColLocation};
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{Error, Result as VellumResult};

// This include forces recompiling this source file if the grammar file changes.
// Uncomment it when doing changes to the .pest file
const _GRAMMAR: &str = include_str!("vtl.pest");

#[derive(Parser)]
#[grammar = "parser/vtl.pest"]
pub struct VtlParser;

/// The AST of VTL templates
pub mod ast;

#[cfg(test)]
mod tests;

use self::ast::*;

lazy_static! {
    // Later ops bind tighter
    static ref EXPR_PARSER: PrattParser<Rule> = PrattParser::new()
        .op(Op::infix(Rule::op_or, Assoc::Left))
        .op(Op::infix(Rule::op_and, Assoc::Left))
        .op(Op::infix(Rule::op_eq, Assoc::Left) | Op::infix(Rule::op_ineq, Assoc::Left))
        .op(Op::infix(Rule::op_lt, Assoc::Left)
            | Op::infix(Rule::op_lte, Assoc::Left)
            | Op::infix(Rule::op_gt, Assoc::Left)
            | Op::infix(Rule::op_gte, Assoc::Left))
        .op(Op::infix(Rule::op_plus, Assoc::Left) | Op::infix(Rule::op_minus, Assoc::Left))
        .op(Op::infix(Rule::op_times, Assoc::Left)
            | Op::infix(Rule::op_slash, Assoc::Left)
            | Op::infix(Rule::op_modulo, Assoc::Left))
        .op(Op::prefix(Rule::op_not));
}

fn parse_int(pair: &Pair<Rule>) -> VellumResult<i64> {
    pair.as_str()
        .parse()
        .map_err(|_| Error::msg(format!("Integer out of bounds: `{}`", pair.as_str())))
}

fn parse_float(pair: &Pair<Rule>) -> VellumResult<f64> {
    pair.as_str()
        .parse()
        .map_err(|_| Error::msg(format!("Float out of bounds: `{}`", pair.as_str())))
}

fn parse_method_call(pair: Pair<Rule>) -> VellumResult<MethodCall> {
    let mut name = None;
    let mut args = vec![];

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::ident => name = Some(p.as_str().to_string()),
            Rule::call_args => {
                for arg in p.into_inner() {
                    args.push(parse_expr(arg)?);
                }
            }
            _ => unreachable!("{:?} not supposed to get there (parse_method_call)!", p.as_rule()),
        }
    }

    Ok(MethodCall { name: name.unwrap(), args })
}

fn parse_reference(pair: Pair<Rule>) -> VellumResult<Reference> {
    let source = pair.as_str().to_string();
    let mut quiet = false;
    let mut root = None;
    let mut segments = vec![];

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::quiet => quiet = true,
            Rule::ref_path => {
                for p2 in p.into_inner() {
                    match p2.as_rule() {
                        Rule::ident => root = Some(p2.as_str().to_string()),
                        Rule::property => {
                            // `.` is not a token, the only inner pair is the ident
                            let name = p2.into_inner().next().unwrap().as_str().to_string();
                            segments.push(Segment::Property(name));
                        }
                        Rule::index => {
                            let expr = p2.into_inner().next().unwrap();
                            segments.push(Segment::Index(parse_expr(expr)?));
                        }
                        Rule::method_call => {
                            segments.push(Segment::Method(parse_method_call(p2)?));
                        }
                        _ => unreachable!("unexpected {:?} rule in reference path", p2.as_rule()),
                    }
                }
            }
            _ => unreachable!("{:?} not supposed to get there (parse_reference)!", p.as_rule()),
        }
    }

    Ok(Reference { source, quiet, root: root.unwrap(), segments })
}

fn parse_dq_string(pair: Pair<Rule>) -> VellumResult<Expr> {
    let mut parts = vec![];
    let mut has_reference = false;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::dq_text => parts.push(StringPart::Text(p.as_str().replace("\\\"", "\""))),
            Rule::reference => {
                has_reference = true;
                parts.push(StringPart::Reference(parse_reference(p)?));
            }
            _ => unreachable!("Got {:?} in parse_dq_string", p.as_rule()),
        }
    }

    if !has_reference {
        let mut text = String::new();
        for part in parts {
            if let StringPart::Text(t) = part {
                text.push_str(&t);
            }
        }
        return Ok(Expr::String(text));
    }

    Ok(Expr::Interpolated(parts))
}

fn parse_sq_string(pair: &Pair<Rule>) -> String {
    let raw = pair.as_str();
    raw[1..raw.len() - 1].to_string()
}

fn parse_primary(pair: Pair<Rule>) -> VellumResult<Expr> {
    let expr = match pair.as_rule() {
        Rule::group => parse_expr(pair.into_inner().next().unwrap())?,
        Rule::int => Expr::Int(parse_int(&pair)?),
        Rule::float => Expr::Float(parse_float(&pair)?),
        Rule::boolean => Expr::Bool(pair.as_str() == "true"),
        Rule::sq_string => Expr::String(parse_sq_string(&pair)),
        Rule::dq_string => parse_dq_string(pair)?,
        Rule::reference => Expr::Reference(parse_reference(pair)?),
        Rule::list => {
            let mut values = vec![];
            for p in pair.into_inner() {
                values.push(parse_expr(p)?);
            }
            Expr::List(values)
        }
        Rule::range => {
            let mut bounds = pair.into_inner();
            let start = parse_expr(bounds.next().unwrap())?;
            let end = parse_expr(bounds.next().unwrap())?;
            Expr::Range(Box::new(start), Box::new(end))
        }
        Rule::map => {
            let mut entries = vec![];
            for entry in pair.into_inner() {
                let mut kv = entry.into_inner();
                let key = parse_expr(kv.next().unwrap())?;
                let value = parse_expr(kv.next().unwrap())?;
                entries.push((key, value));
            }
            Expr::Map(entries)
        }
        _ => unreachable!("Got {:?} in parse_primary: {}", pair.as_rule(), pair.as_str()),
    };
    Ok(expr)
}

fn parse_expr(pair: Pair<Rule>) -> VellumResult<Expr> {
    debug_assert_eq!(pair.as_rule(), Rule::expr);

    EXPR_PARSER
        .map_primary(parse_primary)
        .map_prefix(|op, rhs: VellumResult<Expr>| match op.as_rule() {
            Rule::op_not => Ok(Expr::Not(Box::new(rhs?))),
            _ => unreachable!("{:?} is not a prefix operator", op.as_rule()),
        })
        .map_infix(|lhs: VellumResult<Expr>, op, rhs: VellumResult<Expr>| {
            let (lhs, rhs) = (Box::new(lhs?), Box::new(rhs?));
            let math = match op.as_rule() {
                Rule::op_plus => Some(MathOperator::Add),
                Rule::op_minus => Some(MathOperator::Sub),
                Rule::op_times => Some(MathOperator::Mul),
                Rule::op_slash => Some(MathOperator::Div),
                Rule::op_modulo => Some(MathOperator::Modulo),
                _ => None,
            };
            if let Some(operator) = math {
                return Ok(Expr::Math(MathExpr { lhs, rhs, operator }));
            }

            let operator = match op.as_rule() {
                Rule::op_or => LogicOperator::Or,
                Rule::op_and => LogicOperator::And,
                Rule::op_eq => LogicOperator::Eq,
                Rule::op_ineq => LogicOperator::NotEq,
                Rule::op_lt => LogicOperator::Lt,
                Rule::op_lte => LogicOperator::Lte,
                Rule::op_gt => LogicOperator::Gt,
                Rule::op_gte => LogicOperator::Gte,
                _ => unreachable!("{:?} is not an infix operator", op.as_rule()),
            };
            Ok(Expr::Logic(LogicExpr { lhs, rhs, operator }))
        })
        .parse(pair.into_inner())
}

fn parse_set_tag(pair: Pair<Rule>) -> VellumResult<Node> {
    let mut target = None;
    let mut value = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::set_target => target = Some(p.into_inner().next().unwrap().as_str().to_string()),
            Rule::expr => value = Some(parse_expr(p)?),
            _ => unreachable!("unexpected {:?} rule in parse_set_tag", p.as_rule()),
        }
    }

    let target = target.unwrap();
    let mut names = target.split('.').map(|s| s.to_string());
    let key = names.next().unwrap();

    Ok(Node::Set(Set { key, path: names.collect(), value: value.unwrap() }))
}

fn parse_if(pair: Pair<Rule>) -> VellumResult<Node> {
    let mut conditions = vec![];
    let mut otherwise = None;

    // the branch we're currently collecting the body of
    let mut expr = None;
    let mut in_else = false;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::if_tag | Rule::elseif_tag => {
                expr = Some(parse_expr(p.into_inner().next().unwrap())?);
            }
            Rule::else_tag => in_else = true,
            Rule::content => {
                let body = parse_content(p)?;
                if in_else {
                    otherwise = Some(body);
                } else {
                    conditions.push((expr.take().unwrap(), body));
                }
            }
            Rule::end_tag => break,
            _ => unreachable!("unreachable rule in parse_if: {:?}", p.as_rule()),
        }
    }

    Ok(Node::If(If { conditions, otherwise }))
}

fn parse_foreach(pair: Pair<Rule>) -> VellumResult<Node> {
    let mut value = None;
    let mut container = None;
    let mut body = vec![];
    let mut empty_body = None;
    let mut in_else = false;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::foreach_tag => {
                for p2 in p.into_inner() {
                    match p2.as_rule() {
                        Rule::loop_var => {
                            value = Some(p2.into_inner().next().unwrap().as_str().to_string())
                        }
                        Rule::expr => container = Some(parse_expr(p2)?),
                        _ => unreachable!("unexpected {:?} rule in foreach tag", p2.as_rule()),
                    }
                }
            }
            Rule::else_tag => in_else = true,
            Rule::content => {
                if in_else {
                    empty_body = Some(parse_content(p)?);
                } else {
                    body = parse_content(p)?;
                }
            }
            Rule::end_tag => break,
            _ => unreachable!("unexpected {:?} rule in parse_foreach", p.as_rule()),
        }
    }

    Ok(Node::Foreach(Foreach {
        value: value.unwrap(),
        container: container.unwrap(),
        body,
        empty_body,
    }))
}

fn parse_macro_definition(pair: Pair<Rule>) -> VellumResult<Node> {
    let mut name = String::new();
    let mut params = vec![];
    let mut body = vec![];

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::macro_tag => {
                for p2 in p.into_inner() {
                    match p2.as_rule() {
                        Rule::ident => name = p2.as_str().to_string(),
                        Rule::macro_param => {
                            params.push(p2.into_inner().next().unwrap().as_str().to_string())
                        }
                        _ => unreachable!("unexpected {:?} rule in macro tag", p2.as_rule()),
                    }
                }
            }
            Rule::content => body = parse_content(p)?,
            Rule::end_tag => (),
            _ => unreachable!("unexpected {:?} rule in parse_macro_definition", p.as_rule()),
        }
    }

    Ok(Node::MacroDefinition(MacroDefinition { name, params, body }))
}

fn parse_macro_call(pair: Pair<Rule>) -> VellumResult<Node> {
    let mut name = None;
    let mut args = vec![];

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::macro_name => name = Some(p.as_str().to_string()),
            Rule::expr => args.push(parse_expr(p)?),
            _ => unreachable!("Got {:?} in parse_macro_call", p.as_rule()),
        }
    }

    Ok(Node::MacroCall(MacroCall { name: name.unwrap(), args }))
}

fn parse_escaped_reference(pair: Pair<Rule>) -> VellumResult<Node> {
    let mut backslashes = 0;
    let mut reference = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::escape_marks => backslashes = p.as_str().len(),
            Rule::reference => reference = Some(parse_reference(p)?),
            _ => unreachable!("Got {:?} in parse_escaped_reference", p.as_rule()),
        }
    }

    Ok(Node::EscapedReference(backslashes, reference.unwrap()))
}

/// Pushes a node, merging consecutive pieces of text
fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let Node::Text(ref new) = node {
        if let Some(Node::Text(ref mut last)) = nodes.last_mut() {
            last.push_str(new);
            return;
        }
    }
    nodes.push(node);
}

fn parse_content(pair: Pair<Rule>) -> VellumResult<Vec<Node>> {
    let pairs = pair.into_inner();
    let mut nodes = Vec::with_capacity(pairs.len());

    for p in pairs {
        let node = match p.as_rule() {
            Rule::line_comment | Rule::block_comment => continue,
            Rule::unparsed => {
                let raw = p.into_inner().next().unwrap().as_str();
                if raw.is_empty() {
                    continue;
                }
                Node::Text(raw.to_string())
            }
            Rule::text | Rule::stray => Node::Text(p.as_str().to_string()),
            Rule::set_tag => parse_set_tag(p)?,
            Rule::if_block => parse_if(p)?,
            Rule::foreach_block => parse_foreach(p)?,
            Rule::macro_definition => parse_macro_definition(p)?,
            Rule::macro_call => parse_macro_call(p)?,
            Rule::break_tag => Node::Break,
            Rule::stop_tag => Node::Stop,
            Rule::escaped_reference => parse_escaped_reference(p)?,
            Rule::reference => Node::Reference(parse_reference(p)?),
            _ => unreachable!("unreachable content rule: {:?}", p.as_rule()),
        };
        push_node(&mut nodes, node);
    }

    Ok(nodes)
}

fn rename_rule(rule: &Rule) -> String {
    match *rule {
        Rule::EOI => "end of input".to_string(),
        Rule::int => "an integer".to_string(),
        Rule::float => "a float".to_string(),
        Rule::boolean => "`true` or `false`".to_string(),
        Rule::sq_string | Rule::dq_string | Rule::dq_text => "a string".to_string(),
        Rule::list => "a list (`[a, b]`)".to_string(),
        Rule::range => "a range (`[1..5]`)".to_string(),
        Rule::map | Rule::map_entry => "a map (`{\"key\": value}`)".to_string(),
        Rule::ident => "an identifier".to_string(),
        Rule::dotted_ident => "a dotted identifier".to_string(),
        Rule::reference | Rule::ref_path => "a reference (`$name`)".to_string(),
        Rule::escaped_reference | Rule::escape_marks => {
            "an escaped reference (`\\$name`)".to_string()
        }
        Rule::quiet => "`!`".to_string(),
        Rule::property => "a property (`.name`)".to_string(),
        Rule::index => "an index (`[expr]`)".to_string(),
        Rule::method_call => "a method call (`.name()`)".to_string(),
        Rule::call_args => "method arguments".to_string(),
        Rule::expr | Rule::group => "an expression".to_string(),
        Rule::op_or => "`||`".to_string(),
        Rule::op_and => "`&&`".to_string(),
        Rule::op_not => "`!`".to_string(),
        Rule::op_eq => "`==`".to_string(),
        Rule::op_ineq => "`!=`".to_string(),
        Rule::op_lt => "`<`".to_string(),
        Rule::op_lte => "`<=`".to_string(),
        Rule::op_gt => "`>`".to_string(),
        Rule::op_gte => "`>=`".to_string(),
        Rule::op_plus => "`+`".to_string(),
        Rule::op_minus => "`-`".to_string(),
        Rule::op_times => "`*`".to_string(),
        Rule::op_slash => "`/`".to_string(),
        Rule::op_modulo => "`%`".to_string(),
        Rule::set_tag | Rule::set_target => "a `#set($name = value)` directive".to_string(),
        Rule::if_tag | Rule::if_block => "an `#if(...)` directive".to_string(),
        Rule::elseif_tag => "an `#elseif(...)` directive".to_string(),
        Rule::else_tag => "an `#else` directive".to_string(),
        Rule::end_tag => "an `#end` directive".to_string(),
        Rule::foreach_tag | Rule::foreach_block | Rule::loop_var => {
            "a `#foreach($item in $items)` directive".to_string()
        }
        Rule::macro_tag | Rule::macro_definition | Rule::macro_param => {
            "a `#macro(name $arg)` definition".to_string()
        }
        Rule::macro_call | Rule::macro_name => "a macro call (`#name(...)`)".to_string(),
        Rule::break_tag => "a `#break` directive".to_string(),
        Rule::stop_tag => "a `#stop` directive".to_string(),
        Rule::line_comment | Rule::block_comment => "a comment".to_string(),
        Rule::unparsed | Rule::unparsed_text => "an unparsed block (`#[[...]]#`)".to_string(),
        Rule::text | Rule::stray | Rule::content => "some content".to_string(),
        Rule::template => "a template".to_string(),
        ref other => format!("{:?}", other),
    }
}

/// Readable names of `rules`, each name once, joined like `a, b, or c`
fn join_rules(rules: &[Rule]) -> String {
    let mut names: Vec<String> = Vec::with_capacity(rules.len());
    for rule in rules {
        let name = rename_rule(rule);
        if !names.contains(&name) {
            names.push(name);
        }
    }

    match names.len() {
        0 => String::new(),
        1 => names.remove(0),
        2 => format!("{} or {}", names[0], names[1]),
        n => format!("{}, or {}", names[..n - 1].join(", "), names[n - 1]),
    }
}

/// A one-line description of a pest error: position first, then what was expected
fn describe_error(e: &pest::error::Error<Rule>) -> String {
    let (line, col) = match e.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };

    let message = match e.variant {
        ErrorVariant::ParsingError { ref positives, ref negatives } => {
            match (negatives.is_empty(), positives.is_empty()) {
                (false, false) => format!(
                    "unexpected {}; expected {}",
                    join_rules(negatives),
                    join_rules(positives)
                ),
                (false, true) => format!("unexpected {}", join_rules(negatives)),
                (true, false) => format!("expected {}", join_rules(positives)),
                (true, true) => "unknown parsing error".to_string(),
            }
        }
        ErrorVariant::CustomError { ref message } => message.clone(),
    };
    format!("line {}, column {}: {}", line, col, message)
}

/// Parses a template source into its nodes
pub fn parse(input: &str) -> VellumResult<Vec<Node>> {
    let mut pairs = match VtlParser::parse(Rule::template, input) {
        Ok(p) => p,
        Err(e) => return Err(Error::parse(describe_error(&e))),
    };

    let mut nodes = vec![];

    // We must have at least a `template` pair if we got there
    for p in pairs.next().unwrap().into_inner() {
        match p.as_rule() {
            Rule::content => nodes.extend(parse_content(p)?),
            Rule::EOI => (),
            _ => unreachable!("unknown tpl rule: {:?}", p.as_rule()),
        }
    }

    Ok(nodes)
}
