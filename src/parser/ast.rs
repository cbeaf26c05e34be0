use std::fmt;

/// All math operators
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MathOperator {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Modulo,
}

impl fmt::Display for MathOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                MathOperator::Add => "+",
                MathOperator::Sub => "-",
                MathOperator::Mul => "*",
                MathOperator::Div => "/",
                MathOperator::Modulo => "%",
            }
        )
    }
}

/// All logic operators
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LogicOperator {
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// ==
    Eq,
    /// !=
    NotEq,
    /// and
    And,
    /// or
    Or,
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                LogicOperator::Gt => ">",
                LogicOperator::Gte => ">=",
                LogicOperator::Lt => "<",
                LogicOperator::Lte => "<=",
                LogicOperator::Eq => "==",
                LogicOperator::NotEq => "!=",
                LogicOperator::And => "&&",
                LogicOperator::Or => "||",
            }
        )
    }
}

/// A method called on a reference: `$name.toUpperCase()`
#[derive(Clone, Debug, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// One step after the root identifier of a reference
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// `.name`
    Property(String),
    /// `[expr]`
    Index(Expr),
    /// `.name(args)`
    Method(MethodCall),
}

/// A `$reference`, in text, strings or expressions
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    /// The reference exactly as written, rendered back when it is undefined
    pub source: String,
    /// `$!name`: renders nothing when undefined
    pub quiet: bool,
    /// The name looked up in the scopes
    pub root: String,
    pub segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MathExpr {
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub operator: MathOperator,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogicExpr {
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub operator: LogicOperator,
}

/// A piece of a double quoted string
#[derive(Clone, Debug, PartialEq)]
pub enum StringPart {
    Text(String),
    Reference(Reference),
}

/// An expression is what is found in directives arguments, method arguments and indexes.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    String(String),
    /// A double quoted string containing references
    Interpolated(Vec<StringPart>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Reference(Reference),
    List(Vec<Expr>),
    /// `[start..end]`, both inclusive
    Range(Box<Expr>, Box<Expr>),
    Map(Vec<(Expr, Expr)>),
    Math(MathExpr),
    Logic(LogicExpr),
    Not(Box<Expr>),
}

/// Set a variable `#set($greeting = "hey")`
#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    /// The name being assigned
    pub key: String,
    /// Dotted keys after the name, for `#set($user.name = ...)`
    pub path: Vec<String>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    /// First item is the `#if`, all the ones after are `#elseif`
    pub conditions: Vec<(Expr, Vec<Node>)>,
    /// The optional `#else` block
    pub otherwise: Option<Vec<Node>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Foreach {
    /// Name of the local variable for the value in the loop
    pub value: String,
    /// Expression being iterated on
    pub container: Expr,
    /// What's in the loop itself
    pub body: Vec<Node>,
    /// What's rendered when there is nothing to iterate on
    pub empty_body: Option<Vec<Node>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MacroDefinition {
    pub name: String,
    /// Parameter names, without the `$`
    pub params: Vec<String>,
    pub body: Vec<Node>,
}

/// `#card($user "wide")`
#[derive(Clone, Debug, PartialEq)]
pub struct MacroCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// All nodes that can be encountered in a template
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Some actual text
    Text(String),
    /// A `$reference` in text
    Reference(Reference),
    /// A reference preceded by backslashes: `\$name`
    EscapedReference(usize, Reference),
    /// The `#set(...)` directive
    Set(Set),
    /// A `#if` / `#elseif` / `#else` block
    If(If),
    /// A `#foreach($i in $items)...#end`
    Foreach(Foreach),
    /// A `#macro(name $a)...#end`, collected before rendering
    MacroDefinition(MacroDefinition),
    MacroCall(MacroCall),
    /// `#break`
    Break,
    /// `#stop`
    Stop,
}
