use std::borrow::Cow;
use std::cmp::Ordering;

use log::debug;
use serde_json::value::Index;
use serde_json::{Map, Number, Value};

use crate::builtins::methods;
use crate::config::EngineConfig;
use crate::context::{describe_value, ValueNumber, ValueRender, ValueTruthy};
use crate::engine::Evaluation;
use crate::errors::{Error, Result};
use crate::parser::ast::*;
use crate::renderer::call_stack::CallStack;
use crate::renderer::for_loop::ForLoop;
use crate::renderer::stack_frame::{FrameContext, Val};
use crate::template::Template;
use crate::Context;

/// How many values a range literal can hold
const MAX_RANGE_LEN: usize = 100_000;

/// What the rendering does after a node
#[derive(Clone, Copy, Debug, PartialEq)]
enum Flow {
    /// Keep going
    Continue,
    /// `#break`: leave the innermost `#foreach` or macro body
    Break,
    /// `#stop`: end the evaluation with the output so far
    Stop,
    /// The output reached its maximum length
    Full,
}

/// Gets a value within a value, keeping lifetime
fn child<'a, I: Index>(value: Val<'a>, index: I) -> Option<Val<'a>> {
    match value {
        Cow::Borrowed(r) => r.get(index).map(Cow::Borrowed),
        Cow::Owned(ref r) => r.get(index).map(|found| Cow::Owned(found.clone())),
    }
}

/// How an expression is named in error messages
fn describe_expr(expr: &Expr) -> Cow<'_, str> {
    match *expr {
        Expr::Reference(ref r) => Cow::Borrowed(&r.source),
        Expr::Int(i) => Cow::Owned(i.to_string()),
        Expr::Float(f) => Cow::Owned(f.to_string()),
        Expr::String(ref s) => Cow::Owned(format!("'{}'", s)),
        _ => Cow::Borrowed("expression"),
    }
}

/// Numbers are equal by value whatever their representation, values of different
/// types are compared by their rendered form
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l == r,
            _ => l.as_f64() == r.as_f64(),
        },
        (Value::String(_), Value::String(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Object(_), Value::Object(_)) => lhs == rhs,
        _ => lhs.render() == rhs.render(),
    }
}

fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn int_math(lhs: i64, rhs: i64, operator: MathOperator) -> Result<Value> {
    let res = match operator {
        MathOperator::Add => lhs.checked_add(rhs),
        MathOperator::Sub => lhs.checked_sub(rhs),
        MathOperator::Mul => lhs.checked_mul(rhs),
        MathOperator::Div | MathOperator::Modulo if rhs == 0 => {
            return Err(Error::msg(format!("Division by zero in `{} {} {}`", lhs, operator, rhs)));
        }
        MathOperator::Div => lhs.checked_div(rhs),
        MathOperator::Modulo => lhs.checked_rem(rhs),
    };

    res.map(Value::from)
        .ok_or_else(|| Error::msg(format!("Integer overflow in `{} {} {}`", lhs, operator, rhs)))
}

fn float_math(lhs: f64, rhs: f64, operator: MathOperator) -> Result<Value> {
    let res = match operator {
        MathOperator::Add => lhs + rhs,
        MathOperator::Sub => lhs - rhs,
        MathOperator::Mul => lhs * rhs,
        MathOperator::Div | MathOperator::Modulo if rhs == 0.0 => {
            return Err(Error::msg(format!("Division by zero in `{} {} {}`", lhs, operator, rhs)));
        }
        MathOperator::Div => lhs / rhs,
        MathOperator::Modulo => lhs % rhs,
    };

    Number::from_f64(res).map(Value::Number).ok_or_else(|| {
        Error::msg(format!("`{} {} {}` is not a finite number", lhs, operator, rhs))
    })
}

/// Processes the ast and renders the output
pub struct Processor<'a> {
    /// The template we're rendering
    template: &'a Template,
    /// The call stack for processing
    call_stack: CallStack<'a>,
    /// Limits of the evaluation
    config: &'a EngineConfig,
    /// Everything rendered so far
    output: String,
}

impl<'a> Processor<'a> {
    /// Create a new `Processor` that will do the rendering
    pub fn new(template: &'a Template, context: &'a Context, config: &'a EngineConfig) -> Self {
        Processor { template, call_stack: CallStack::new(context), config, output: String::new() }
    }

    /// Appends to the output, as long as it stays under the maximum length
    fn write(&mut self, s: &str) -> Flow {
        if let Some(max) = self.config.max_output_len {
            let room = max.saturating_sub(self.output.len());
            if s.len() > room {
                let mut end = room;
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                self.output.push_str(&s[..end]);
                return Flow::Full;
            }
        }

        self.output.push_str(s);
        Flow::Continue
    }

    fn render_body(&mut self, body: &'a [Node]) -> Result<Flow> {
        for node in body {
            let flow = self.render_node(node)?;
            if flow != Flow::Continue {
                return Ok(flow);
            }
        }

        Ok(Flow::Continue)
    }

    fn render_node(&mut self, node: &'a Node) -> Result<Flow> {
        match *node {
            Node::Text(ref s) => Ok(self.write(s)),
            Node::Reference(ref reference) => self.render_reference(reference),
            Node::EscapedReference(backslashes, ref reference) => {
                self.render_escaped_reference(backslashes, reference)
            }
            Node::Set(ref set) => {
                self.eval_set(set)?;
                Ok(Flow::Continue)
            }
            Node::If(ref if_node) => self.render_if(if_node),
            Node::Foreach(ref foreach) => self.render_foreach(foreach),
            // collected when the template was parsed
            Node::MacroDefinition(_) => Ok(Flow::Continue),
            Node::MacroCall(ref call) => self.render_macro_call(call),
            Node::Break => Ok(Flow::Break),
            Node::Stop => Ok(Flow::Stop),
        }
    }

    fn render_reference(&mut self, reference: &'a Reference) -> Result<Flow> {
        match self.resolve_reference(reference)? {
            Some(value) => Ok(self.write(&value.render())),
            None if reference.quiet => Ok(Flow::Continue),
            None => Ok(self.write(&reference.source)),
        }
    }

    /// Backslashes escape each other in pairs, a remaining one escapes the reference.
    /// Undefined references are always written as is.
    fn render_escaped_reference(
        &mut self,
        backslashes: usize,
        reference: &'a Reference,
    ) -> Result<Flow> {
        let mut out = String::new();

        match self.resolve_reference(reference)? {
            Some(value) => {
                out.push_str(&"\\".repeat(backslashes / 2));
                if backslashes % 2 == 1 {
                    out.push_str(&reference.source);
                } else {
                    out.push_str(&value.render());
                }
            }
            None => {
                out.push_str(&"\\".repeat(backslashes));
                out.push_str(&reference.source);
            }
        }

        Ok(self.write(&out))
    }

    fn eval_set(&mut self, set: &'a Set) -> Result<()> {
        let value = match self.eval_expression(&set.value)? {
            Some(value) => value,
            None => {
                debug!("`#set` of `${}` ignored: the value is undefined", set.key);
                return Ok(());
            }
        };

        let (last, parents) = match set.path.split_last() {
            Some(split) => split,
            None => {
                self.call_stack.add_assignment(&set.key, value);
                return Ok(());
            }
        };

        let target_name = format!("${}.{}", set.key, set.path.join("."));
        let mut root = match self.call_stack.lookup(&set.key) {
            Some(root) => root.into_owned(),
            None => {
                return Err(Error::msg(format!(
                    "Can't set `{}`: `${}` is undefined",
                    target_name, set.key
                )));
            }
        };

        let mut target = &mut root;
        for name in parents {
            target = match target {
                Value::Object(map) => {
                    map.entry(name.clone()).or_insert_with(|| Value::Object(Map::new()))
                }
                _ => {
                    return Err(Error::msg(format!(
                        "Can't set `{}`: `{}` is not a map",
                        target_name, name
                    )))
                }
            };
        }
        match target {
            Value::Object(map) => {
                map.insert(last.clone(), value.into_owned());
            }
            other => {
                return Err(Error::msg(format!(
                    "Can't set `{}` on {}, only maps have properties",
                    target_name,
                    describe_value(other)
                )))
            }
        }

        self.call_stack.add_assignment(&set.key, Cow::Owned(root));
        Ok(())
    }

    fn render_if(&mut self, if_node: &'a If) -> Result<Flow> {
        for &(ref expr, ref body) in &if_node.conditions {
            if self.eval_as_bool(expr)? {
                return self.render_body(body);
            }
        }

        if let Some(ref body) = if_node.otherwise {
            return self.render_body(body);
        }

        Ok(Flow::Continue)
    }

    fn render_empty_foreach(&mut self, foreach: &'a Foreach) -> Result<Flow> {
        match foreach.empty_body {
            Some(ref body) => self.render_body(body),
            None => Ok(Flow::Continue),
        }
    }

    fn render_foreach(&mut self, foreach: &'a Foreach) -> Result<Flow> {
        let container = match self.eval_expression(&foreach.container)? {
            Some(container) => container,
            None => return self.render_empty_foreach(foreach),
        };

        match *container {
            Value::Array(_) | Value::Object(_) => (),
            ref other => {
                return Err(Error::msg(format!(
                    "`#foreach` can only iterate on lists and maps, but `{}` is {}",
                    describe_expr(&foreach.container),
                    describe_value(other)
                )));
            }
        }

        let for_loop = ForLoop::new(&foreach.value, container);
        if for_loop.is_empty() {
            return self.render_empty_foreach(foreach);
        }

        let mut iterations = for_loop.len();
        if let Some(max) = self.config.max_foreach_iterations {
            if iterations > max {
                debug!(
                    "`#foreach` over `{}` stopped after {} iterations",
                    describe_expr(&foreach.container),
                    max
                );
                iterations = max;
            }
        }

        self.call_stack.push_for_loop_frame(&foreach.value, for_loop);

        let mut flow = Flow::Continue;
        for _ in 0..iterations {
            flow = self.render_body(&foreach.body)?;
            if flow == Flow::Break {
                self.call_stack.break_for_loop()?;
                flow = Flow::Continue;
            }
            if flow != Flow::Continue || self.call_stack.should_break_for_loop() {
                break;
            }
            self.call_stack.increment_for_loop()?;
        }

        self.call_stack.pop();
        Ok(flow)
    }

    fn render_macro_call(&mut self, call: &'a MacroCall) -> Result<Flow> {
        let template = self.template;
        let definition =
            template.macros.get(&call.name).ok_or_else(|| Error::macro_not_found(&call.name))?;

        if call.args.len() > definition.params.len() {
            return Err(Error::too_many_arguments(
                &call.name,
                definition.params.len(),
                call.args.len(),
            ));
        }
        if self.call_stack.macro_depth() >= self.config.max_call_depth {
            return Err(Error::call_depth_exceeded(self.config.max_call_depth));
        }

        // Missing arguments are bound to null so they are undefined inside the macro
        // instead of resolving to a variable of the caller.
        let mut frame_context = FrameContext::with_capacity(definition.params.len());
        for (i, param) in definition.params.iter().enumerate() {
            let value = match call.args.get(i) {
                Some(arg) => self.eval_expression(arg)?.unwrap_or(Cow::Owned(Value::Null)),
                None => Cow::Owned(Value::Null),
            };
            frame_context.insert(param.as_str(), value);
        }

        self.call_stack.push_macro_frame(&definition.name, frame_context);
        let flow = self.render_body(&definition.body)?;
        self.call_stack.pop();

        Ok(if flow == Flow::Break { Flow::Continue } else { flow })
    }

    fn resolve_reference(&mut self, reference: &'a Reference) -> Result<Option<Val<'a>>> {
        let mut current = match self.call_stack.lookup(&reference.root) {
            Some(value) => value,
            None => return Ok(None),
        };

        for segment in &reference.segments {
            let next = match *segment {
                Segment::Property(ref name) => child(current, name.as_str()),
                Segment::Index(ref expr) => match self.eval_expression(expr)? {
                    Some(idx) => match *idx {
                        Value::Number(ref n) => match n.as_u64() {
                            Some(i) => child(current, i as usize),
                            None => None,
                        },
                        Value::String(ref key) => child(current, key.as_str()),
                        _ => None,
                    },
                    None => None,
                },
                Segment::Method(ref call) => {
                    let mut args = Vec::with_capacity(call.args.len());
                    for arg in &call.args {
                        args.push(self.eval_expression(arg)?.map_or(Value::Null, Cow::into_owned));
                    }
                    methods::call(&current, &call.name, &args)
                        .map_err(|e| Error::call_method(&call.name, e))?
                        .map(Cow::Owned)
                }
            };

            current = match next {
                Some(value) if !value.is_null() => value,
                _ => return Ok(None),
            };
        }

        Ok(Some(current))
    }

    fn eval_interpolated(&mut self, parts: &'a [StringPart]) -> Result<String> {
        let mut res = String::new();

        for part in parts {
            match *part {
                StringPart::Text(ref s) => res.push_str(s),
                StringPart::Reference(ref reference) => match self.resolve_reference(reference)? {
                    Some(value) => res.push_str(&value.render()),
                    None if reference.quiet => (),
                    None => res.push_str(&reference.source),
                },
            }
        }

        Ok(res)
    }

    fn eval_integer(&mut self, expr: &'a Expr) -> Result<i64> {
        match self.eval_expression(expr)? {
            Some(value) => value.as_i64().ok_or_else(|| {
                Error::msg(format!(
                    "Range bounds must be integers, but `{}` is {}",
                    describe_expr(expr),
                    describe_value(&value)
                ))
            }),
            None => Err(Error::msg(format!("Range bound `{}` is undefined", describe_expr(expr)))),
        }
    }

    /// `[1..3]` and `[3..1]` both include their bounds
    fn eval_range(&mut self, start: &'a Expr, end: &'a Expr) -> Result<Value> {
        let start = self.eval_integer(start)?;
        let end = self.eval_integer(end)?;

        // i128 holds the length of any i64 range
        let len = (i128::from(end) - i128::from(start)).unsigned_abs() + 1;
        if len > MAX_RANGE_LEN as u128 {
            return Err(Error::msg(format!(
                "Range `[{}..{}]` is too large: it has {} values but at most {} are allowed",
                start, end, len, MAX_RANGE_LEN
            )));
        }

        let values = if start <= end {
            (start..=end).map(Value::from).collect()
        } else {
            (end..=start).rev().map(Value::from).collect()
        };

        Ok(Value::Array(values))
    }

    fn eval_operand(&mut self, expr: &'a Expr, operator: MathOperator) -> Result<Val<'a>> {
        self.eval_expression(expr)?.ok_or_else(|| {
            Error::msg(format!(
                "Can't use undefined `{}` in a `{}` operation",
                describe_expr(expr),
                operator
            ))
        })
    }

    fn eval_math(&mut self, math: &'a MathExpr) -> Result<Value> {
        let lhs = self.eval_operand(&math.lhs, math.operator)?;
        let rhs = self.eval_operand(&math.rhs, math.operator)?;

        if math.operator == MathOperator::Add && (lhs.is_string() || rhs.is_string()) {
            return Ok(Value::String(format!("{}{}", lhs.render(), rhs.render())));
        }

        if let (Some(l), Some(r)) = (lhs.as_i64(), rhs.as_i64()) {
            return int_math(l, r, math.operator);
        }

        let mut numbers = [0.0; 2];
        for (i, (expr, value)) in [(&math.lhs, &lhs), (&math.rhs, &rhs)].iter().enumerate() {
            numbers[i] = value.to_number().map_err(|_| {
                Error::msg(format!(
                    "A `{}` operation needs numbers, but `{}` is {}",
                    math.operator,
                    describe_expr(expr),
                    describe_value(value)
                ))
            })?;
        }

        float_math(numbers[0], numbers[1], math.operator)
    }

    fn eval_logic(&mut self, logic: &'a LogicExpr) -> Result<bool> {
        match logic.operator {
            LogicOperator::And => {
                Ok(self.eval_as_bool(&logic.lhs)? && self.eval_as_bool(&logic.rhs)?)
            }
            LogicOperator::Or => {
                Ok(self.eval_as_bool(&logic.lhs)? || self.eval_as_bool(&logic.rhs)?)
            }
            LogicOperator::Eq | LogicOperator::NotEq => {
                let lhs = self.eval_expression(&logic.lhs)?;
                let rhs = self.eval_expression(&logic.rhs)?;
                let equal = match (lhs, rhs) {
                    (Some(l), Some(r)) => values_equal(&l, &r),
                    (None, None) => true,
                    _ => false,
                };
                Ok(if logic.operator == LogicOperator::Eq { equal } else { !equal })
            }
            LogicOperator::Gt | LogicOperator::Gte | LogicOperator::Lt | LogicOperator::Lte => {
                let lhs = self.eval_expression(&logic.lhs)?;
                let rhs = self.eval_expression(&logic.rhs)?;
                // comparing with an undefined value is false, not an error
                let (l, r) = match (lhs, rhs) {
                    (Some(l), Some(r)) => (l, r),
                    _ => return Ok(false),
                };
                let ordering = compare_values(&l, &r).ok_or_else(|| {
                    Error::msg(format!(
                        "Can't compare {} with {} using `{}`",
                        describe_value(&l),
                        describe_value(&r),
                        logic.operator
                    ))
                })?;
                Ok(match logic.operator {
                    LogicOperator::Gt => ordering == Ordering::Greater,
                    LogicOperator::Gte => ordering != Ordering::Less,
                    LogicOperator::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })
            }
        }
    }

    fn eval_as_bool(&mut self, expr: &'a Expr) -> Result<bool> {
        Ok(match self.eval_expression(expr)? {
            Some(value) => value.is_truthy(),
            None => false,
        })
    }

    /// Evaluates an expression, `None` meaning it is undefined
    fn eval_expression(&mut self, expr: &'a Expr) -> Result<Option<Val<'a>>> {
        let value = match *expr {
            Expr::String(ref s) => Value::String(s.clone()),
            Expr::Interpolated(ref parts) => Value::String(self.eval_interpolated(parts)?),
            Expr::Int(i) => Value::from(i),
            Expr::Float(f) => Value::from(f),
            Expr::Bool(b) => Value::Bool(b),
            Expr::Reference(ref reference) => return self.resolve_reference(reference),
            Expr::List(ref items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expression(item)?.map_or(Value::Null, Cow::into_owned));
                }
                Value::Array(values)
            }
            Expr::Range(ref start, ref end) => self.eval_range(start, end)?,
            Expr::Map(ref entries) => {
                let mut map = Map::new();
                for &(ref key, ref value) in entries {
                    let key = match self.eval_expression(key)? {
                        Some(k) => k.render().into_owned(),
                        None => {
                            return Err(Error::msg(format!(
                                "Map key `{}` is undefined",
                                describe_expr(key)
                            )))
                        }
                    };
                    let value = self.eval_expression(value)?.map_or(Value::Null, Cow::into_owned);
                    map.insert(key, value);
                }
                Value::Object(map)
            }
            Expr::Math(ref math) => self.eval_math(math)?,
            Expr::Logic(ref logic) => Value::Bool(self.eval_logic(logic)?),
            Expr::Not(ref inner) => Value::Bool(!self.eval_as_bool(inner)?),
        };

        Ok(Some(Cow::Owned(value)))
    }

    /// Entry point for the rendering
    pub fn render(mut self) -> Result<Evaluation> {
        let template = self.template;
        debug!("rendering `{}`", template.name);

        match self.render_body(&template.ast)? {
            Flow::Full => Ok(Evaluation::Incomplete(self.output)),
            // `#break` outside of a loop ends the template like `#stop`
            Flow::Continue | Flow::Break | Flow::Stop => Ok(Evaluation::Complete(self.output)),
        }
    }
}
