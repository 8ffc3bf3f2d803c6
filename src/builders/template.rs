use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use crate::core::error::DescribeError;
use crate::core::model::{CommitInfo, MarkerInfo};

/// Same output as `git describe --always --long --tags --dirty`.
pub const DEFAULT_TEMPLATE: &str = concat!(
    r#"{{if ne .Tag.Name ""}}{{.Tag.Name}}-{{.Tag.Count}}-{{end}}"#,
    "{{.Commit.ShortHash}}",
    "{{if .Dirty}}-dirty{{end}}",
);

/// `<tag>-<count>`, or just `<count>` without a tag.
pub const PACKAGE_TEMPLATE: &str = concat!(
    r#"{{if ne .Tag.Name ""}}{{.Tag.Name}}-{{.Tag.Count}}{{else}}{{.Tag.Count}}{{end}}"#,
    "{{if .Dirty}}-dirty{{end}}",
);

/// `<tag>.<count>`, or `0.0.<count>` without a tag. The `-dirty` suffix makes
/// the result a non-canonical semver string.
pub const SEMVER_TEMPLATE: &str = concat!(
    r#"{{if ne .Tag.Name ""}}{{.Tag.Name}}.{{.Tag.Count}}{{else}}0.0.{{.Tag.Count}}{{end}}"#,
    "{{if .Dirty}}-dirty{{end}}",
);

static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\.[A-Za-z_][A-Za-z0-9_]*)+$").expect("field path pattern is valid")
});
static CONDITION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"?|\S+"#).expect("condition token pattern is valid")
});

/// Which template renders the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateChoice {
    #[default]
    Default,
    Package,
    Semver,
    Custom(String),
}

impl TemplateChoice {
    /// Looks up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "package" => Some(Self::Package),
            "semver" => Some(Self::Semver),
            _ => None,
        }
    }

    /// The template text to parse.
    pub fn source(&self) -> &str {
        match self {
            Self::Default => DEFAULT_TEMPLATE,
            Self::Package => PACKAGE_TEMPLATE,
            Self::Semver => SEMVER_TEMPLATE,
            Self::Custom(text) => text,
        }
    }
}

/// A value a field reference evaluates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Empty strings, zero and false are falsy.
    fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Int(n) => *n != 0,
            Self::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// The facts a template can reference.
///
/// Exposed paths: `.Commit.Hash`, `.Commit.ShortHash`, `.Commit.Timestamp`,
/// `.Commit.Author.Name`, `.Commit.Author.Email`, `.Tag.Name`, `.Tag.Count`
/// and `.Dirty`.
#[derive(Debug, Clone, Copy)]
pub struct TemplateData<'a> {
    pub commit: &'a CommitInfo,
    pub marker: &'a MarkerInfo,
    pub dirty: bool,
}

impl TemplateData<'_> {
    fn field(&self, path: &[String]) -> Option<Value> {
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        let value = match segments.as_slice() {
            ["Commit", "Hash"] => Value::Str(self.commit.hash.clone()),
            ["Commit", "ShortHash"] => Value::Str(self.commit.short_hash.clone()),
            ["Commit", "Timestamp"] => Value::Str(self.commit.timestamp.to_rfc3339()),
            ["Commit", "Author", "Name"] => Value::Str(self.commit.author.name.clone()),
            ["Commit", "Author", "Email"] => Value::Str(self.commit.author.email.clone()),
            ["Tag", "Name"] => Value::Str(self.marker.name.clone()),
            ["Tag", "Count"] => Value::Int(i64::try_from(self.marker.distance).ok()?),
            ["Dirty"] => Value::Bool(self.dirty),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Field(Vec<String>),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Truthy(Operand),
    Not(Operand),
    Compare {
        negate: bool,
        left: Operand,
        right: Operand,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Field(Vec<String>),
    If {
        condition: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// An `{{if}}` whose `{{end}}` has not been seen yet.
struct OpenBlock {
    condition: Condition,
    then: Vec<Node>,
    otherwise: Vec<Node>,
    in_else: bool,
}

/// A parsed descriptor template.
///
/// The language is deliberately small: literal text, `{{.Field.Path}}`
/// references and `{{if COND}}...{{else}}...{{end}}` blocks, where COND is
/// `.Path`, `not .Path` or `eq`/`ne` with two operands (field paths, quoted
/// strings, integers, `true`, `false`). Nothing else is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parses `source`, failing with `TemplateSyntax` on malformed text.
    pub fn parse(source: &str) -> Result<Self, DescribeError> {
        let mut root = Vec::new();
        let mut open: Vec<OpenBlock> = Vec::new();
        let mut cursor = 0;

        while let Some(action) = next_action(source, cursor)? {
            push_text(&mut root, &mut open, &source[cursor..action.start]);
            cursor = action.end;

            let inner = source[action.start + 2..action.end - 2].trim();
            match inner {
                "" => return Err(DescribeError::syntax("empty action {{}}")),
                "else" => {
                    let block = open
                        .last_mut()
                        .ok_or_else(|| DescribeError::syntax("{{else}} without {{if}}"))?;
                    if block.in_else {
                        return Err(DescribeError::syntax("more than one {{else}} in {{if}}"));
                    }
                    block.in_else = true;
                }
                "end" => {
                    let block = open
                        .pop()
                        .ok_or_else(|| DescribeError::syntax("{{end}} without {{if}}"))?;
                    let node = Node::If {
                        condition: block.condition,
                        then: block.then,
                        otherwise: block.otherwise,
                    };
                    push_node(&mut root, &mut open, node);
                }
                _ if inner.starts_with('.') => {
                    let path = parse_path(inner)?;
                    push_node(&mut root, &mut open, Node::Field(path));
                }
                _ => match inner.strip_prefix("if") {
                    Some(rest) if rest.starts_with(char::is_whitespace) => {
                        open.push(OpenBlock {
                            condition: parse_condition(rest)?,
                            then: Vec::new(),
                            otherwise: Vec::new(),
                            in_else: false,
                        });
                    }
                    _ => {
                        return Err(DescribeError::syntax(format!(
                            "unknown action {{{{{inner}}}}}"
                        )));
                    }
                },
            }
        }

        push_text(&mut root, &mut open, &source[cursor..]);
        if !open.is_empty() {
            return Err(DescribeError::syntax("unclosed {{if}}, missing {{end}}"));
        }

        Ok(Self { nodes: root })
    }

    /// Renders the template. The same data always yields the same string.
    pub fn render(&self, data: &TemplateData<'_>) -> Result<String, DescribeError> {
        let mut out = String::new();
        render_nodes(&self.nodes, data, &mut out)?;
        Ok(out)
    }
}

fn push_node(root: &mut Vec<Node>, open: &mut [OpenBlock], node: Node) {
    match open.last_mut() {
        Some(block) if block.in_else => block.otherwise.push(node),
        Some(block) => block.then.push(node),
        None => root.push(node),
    }
}

/// Finds the next `{{...}}` at or after `from`, delimiters included. A `}}`
/// inside a quoted string does not close the action.
fn next_action(source: &str, from: usize) -> Result<Option<Range<usize>>, DescribeError> {
    let Some(offset) = source[from..].find("{{") else {
        return Ok(None);
    };
    let start = from + offset;
    let bytes = source.as_bytes();
    let mut in_quote = false;
    let mut i = start + 2;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => i += 1,
            b'"' => in_quote = !in_quote,
            b'}' if !in_quote && bytes.get(i + 1) == Some(&b'}') => {
                return Ok(Some(start..i + 2));
            }
            _ => {}
        }
        i += 1;
    }
    Err(DescribeError::syntax("unclosed action, missing }}"))
}

fn push_text(root: &mut Vec<Node>, open: &mut [OpenBlock], text: &str) {
    if !text.is_empty() {
        push_node(root, open, Node::Text(text.to_string()));
    }
}

fn parse_path(token: &str) -> Result<Vec<String>, DescribeError> {
    if !FIELD_PATH.is_match(token) {
        return Err(DescribeError::syntax(format!("malformed field path {token:?}")));
    }
    Ok(token[1..].split('.').map(str::to_string).collect())
}

fn parse_operand(token: &str) -> Result<Operand, DescribeError> {
    if token.starts_with('"') {
        return parse_string(token).map(|s| Operand::Literal(Value::Str(s)));
    }
    if token.starts_with('.') {
        return parse_path(token).map(Operand::Field);
    }
    match token {
        "true" => Ok(Operand::Literal(Value::Bool(true))),
        "false" => Ok(Operand::Literal(Value::Bool(false))),
        _ => token
            .parse::<i64>()
            .map(|n| Operand::Literal(Value::Int(n)))
            .map_err(|_| DescribeError::syntax(format!("unexpected operand {token:?}"))),
    }
}

fn parse_string(token: &str) -> Result<String, DescribeError> {
    let unterminated = || DescribeError::syntax(format!("unterminated string {token}"));
    let body = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(unterminated)?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(escaped @ ('"' | '\\')) => out.push(escaped),
            Some(other) => {
                return Err(DescribeError::syntax(format!("unknown escape \\{other}")));
            }
            None => return Err(unterminated()),
        }
    }
    Ok(out)
}

fn parse_condition(text: &str) -> Result<Condition, DescribeError> {
    let tokens: Vec<&str> = CONDITION_TOKEN
        .find_iter(text)
        .map(|token| token.as_str())
        .collect();

    match tokens.as_slice() {
        [] => Err(DescribeError::syntax("{{if}} without a condition")),
        ["not", operand] => Ok(Condition::Not(parse_operand(operand)?)),
        [op @ ("eq" | "ne"), left, right] => Ok(Condition::Compare {
            negate: *op == "ne",
            left: parse_operand(left)?,
            right: parse_operand(right)?,
        }),
        [operand] => Ok(Condition::Truthy(parse_operand(operand)?)),
        _ => Err(DescribeError::syntax(format!(
            "unsupported condition {:?}",
            text.trim()
        ))),
    }
}

fn lookup(path: &[String], data: &TemplateData<'_>) -> Result<Value, DescribeError> {
    data.field(path)
        .ok_or_else(|| DescribeError::render(format!("field .{} is not defined", path.join("."))))
}

fn resolve(operand: &Operand, data: &TemplateData<'_>) -> Result<Value, DescribeError> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Field(path) => lookup(path, data),
    }
}

fn evaluate(condition: &Condition, data: &TemplateData<'_>) -> Result<bool, DescribeError> {
    match condition {
        Condition::Truthy(operand) => Ok(resolve(operand, data)?.is_truthy()),
        Condition::Not(operand) => Ok(!resolve(operand, data)?.is_truthy()),
        Condition::Compare {
            negate,
            left,
            right,
        } => {
            let left = resolve(left, data)?;
            let right = resolve(right, data)?;
            let equal = match (&left, &right) {
                (Value::Str(a), Value::Str(b)) => a == b,
                (Value::Int(a), Value::Int(b)) => a == b,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                _ => {
                    return Err(DescribeError::render(format!(
                        "incompatible types for comparison: {left:?} and {right:?}"
                    )));
                }
            };
            Ok(equal != *negate)
        }
    }
}

fn render_nodes(
    nodes: &[Node],
    data: &TemplateData<'_>,
    out: &mut String,
) -> Result<(), DescribeError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(path) => {
                out.push_str(&lookup(path, data)?.to_string());
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if evaluate(condition, data)? { then } else { otherwise };
                render_nodes(branch, data, out)?;
            }
        }
    }
    Ok(())
}
