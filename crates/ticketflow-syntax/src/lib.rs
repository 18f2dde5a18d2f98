//! Syntax tree for TicketFlow page templates.
//!
//! Templates mix raw text with two kinds of markup:
//! - `{{ expression }}` outputs, optionally followed by `|filter` segments
//! - `{% directive %}` control tags: `extends`, `block`, `for`, `if`,
//!   `elseif`, `else` and their closing tags
//!
//! Parsing never fails. Unknown or unbalanced directives become
//! [`AstNode::Directive`] nodes that render to nothing, and outputs that do
//! not hold a valid expression keep their source text.

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::tokenize;
pub use token::{Token, TokenType};

// ============================================================================
// Location
// ============================================================================

/// Location in source code (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

// ============================================================================
// AST Nodes
// ============================================================================

/// A parsed template: the top-level list of nodes.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<AstNode>,
    location: Location,
}

impl Template {
    pub fn new(nodes: Vec<AstNode>, location: Location) -> Self {
        Self { nodes, location }
    }

    pub fn nodes(&self) -> &[AstNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<AstNode> {
        self.nodes
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The first `{% extends %}` directive anywhere in the template.
    pub fn extends(&self) -> Option<&ExtendsNode> {
        find_extends(&self.nodes)
    }
}

fn find_extends(nodes: &[AstNode]) -> Option<&ExtendsNode> {
    nodes.iter().find_map(|node| match node {
        AstNode::Extends(n) => Some(n),
        AstNode::Block(n) => find_extends(&n.body),
        AstNode::For(n) => find_extends(&n.body),
        AstNode::If(n) => n
            .branches
            .iter()
            .find_map(|branch| find_extends(&branch.body))
            .or_else(|| n.else_branch.as_deref().and_then(find_extends)),
        _ => None,
    })
}

#[derive(Debug, Clone)]
pub enum AstNode {
    Text(TextNode),
    Output(OutputNode),
    Extends(ExtendsNode),
    Block(BlockNode),
    For(ForBlock),
    If(IfBlock),
    Directive(DirectiveNode),
}

impl AstNode {
    pub fn location(&self) -> Location {
        match self {
            AstNode::Text(n) => n.location,
            AstNode::Output(n) => n.location,
            AstNode::Extends(n) => n.location,
            AstNode::Block(n) => n.location,
            AstNode::For(n) => n.location,
            AstNode::If(n) => n.location,
            AstNode::Directive(n) => n.location,
        }
    }
}

/// Raw text content.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub content: String,
    pub location: Location,
}

/// Output tag: `{{ path }}` or `{{ path | filter | filter(args) }}`.
///
/// `expression` is `None` when the tag content is not a path; the tag is
/// then emitted unchanged.
#[derive(Debug, Clone)]
pub struct OutputNode {
    pub expression: Option<Expression>,
    pub source: String,
    pub location: Location,
}

/// `{% extends "parent" %}`
#[derive(Debug, Clone)]
pub struct ExtendsNode {
    pub parent: String,
    pub location: Location,
}

/// `{% block name %} ... {% endblock %}`
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub name: String,
    pub body: Vec<AstNode>,
    pub location: Location,
}

/// `{% for item in collection %} ... {% endfor %}`
#[derive(Debug, Clone)]
pub struct ForBlock {
    pub item_ident: String,
    pub collection: Path,
    pub body: Vec<AstNode>,
    pub location: Location,
}

/// `{% if %} ... {% elseif %} ... {% else %} ... {% endif %}`
///
/// `branches` holds the `if` branch followed by every `elseif` in source order.
#[derive(Debug, Clone)]
pub struct IfBlock {
    pub branches: Vec<ConditionalBranch>,
    pub else_branch: Option<Vec<AstNode>>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct ConditionalBranch {
    pub condition: Condition,
    pub body: Vec<AstNode>,
    pub location: Location,
}

/// A directive tag with no effect on output: unsupported keywords, stray
/// closing tags, and openers that were never closed.
#[derive(Debug, Clone)]
pub struct DirectiveNode {
    pub source: String,
    pub location: Location,
}

// ============================================================================
// Expressions
// ============================================================================

/// A dot-separated path (e.g., ticket.status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<String>,
    location: Location,
}

impl Path {
    pub fn new(segments: Vec<String>, location: Location) -> Self {
        Self { segments, location }
    }

    /// Parse a path made of word-character segments (`[A-Za-z0-9_]+`).
    pub fn parse(text: &str, location: Location) -> Option<Self> {
        let segments: Vec<String> = text.trim().split('.').map(str::to_string).collect();
        if segments.iter().all(|s| is_word(s)) {
            Some(Self::new(segments, location))
        } else {
            None
        }
    }

    /// Split on dots without validating segments. Lookups of odd names simply
    /// fail to resolve.
    pub fn lenient(text: &str, location: Location) -> Self {
        let segments = text.trim().split('.').map(|s| s.trim().to_string()).collect();
        Self::new(segments, location)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, the variable name.
    pub fn head(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_dotted(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Returns the path as a dot-separated string.
    pub fn as_str(&self) -> String {
        self.segments.join(".")
    }
}

/// The content of an output tag: a path and its filter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub path: Path,
    pub filters: Vec<Filter>,
}

impl Expression {
    /// Parse `path | name | name(arg, arg)`. Returns `None` if the path part
    /// is not a valid path.
    pub fn parse(content: &str, location: Location) -> Option<Self> {
        let mut parts = content.split('|');
        let path = Path::parse(parts.next()?, location)?;
        let filters = parts
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Filter::parse)
            .collect();
        Some(Self { path, filters })
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name == name)
    }

    /// No filters, or only `raw`.
    pub fn is_plain(&self) -> bool {
        self.filters.iter().all(|f| f.name == "raw")
    }
}

/// A single filter segment such as `upper` or `slice(1, 2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub args: Vec<String>,
}

impl Filter {
    pub fn parse(segment: &str) -> Self {
        let segment = segment.trim();
        match segment.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').unwrap_or(rest);
                let args = inner
                    .split(',')
                    .map(|arg| strip_quotes(arg).to_string())
                    .filter(|arg| !arg.is_empty())
                    .collect();
                Self {
                    name: name.trim().to_string(),
                    args,
                }
            }
            None => Self {
                name: segment.to_string(),
                args: Vec::new(),
            },
        }
    }
}

/// Condition of an `if` or `elseif` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `path == 'literal'`
    Equals { path: Path, literal: String },
    /// `name`: truthiness of a looked-up value.
    Truthy(Path),
}

impl Condition {
    pub fn parse(text: &str, location: Location) -> Self {
        match text.split_once("==") {
            Some((lhs, rhs)) => Condition::Equals {
                path: Path::lenient(lhs, location),
                literal: strip_quotes(rhs).to_string(),
            },
            None => Condition::Truthy(Path::lenient(text, location)),
        }
    }
}

/// Trim whitespace and any surrounding quote characters.
fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"')
}

pub(crate) fn is_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a template source string into an AST.
pub fn parse(source: &str) -> Template {
    parser::parse(tokenize(source))
}
