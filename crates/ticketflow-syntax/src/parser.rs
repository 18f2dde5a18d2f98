//! Tree builder for page templates.
//!
//! Consumes the flat token stream from the lexer and pairs `block`/`endblock`,
//! `for`/`endfor` and `if`/`elseif`/`else`/`endif` with a stack of open
//! frames. The builder never fails:
//! - a closing tag that does not match the innermost open frame is kept as an
//!   inert [`DirectiveNode`]
//! - a frame still open at the end of input is unwound: its opening tag
//!   becomes inert and its children move up into the enclosing frame

use crate::token::{Token, TokenType};
use crate::{
    is_word, AstNode, BlockNode, Condition, ConditionalBranch, DirectiveNode, Expression,
    ExtendsNode, ForBlock, IfBlock, Location, OutputNode, Path, Template, TextNode,
};

/// Build an AST Template from a token stream.
pub fn parse(tokens: Vec<Token>) -> Template {
    let mut parser = Parser::new();
    for token in tokens {
        parser.push_token(token);
    }
    parser.finish()
}

/// A `{% ... %}` tag classified by its leading keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    Extends(&'a str),
    Block(&'a str),
    EndBlock,
    For { item: &'a str, collection: &'a str },
    EndFor,
    If(&'a str),
    ElseIf(&'a str),
    Else,
    EndIf,
    Unsupported,
}

/// Classify the trimmed content of a directive tag.
pub fn classify(content: &str) -> Directive<'_> {
    let (keyword, rest) = match content.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (content, ""),
    };

    match keyword {
        "extends" => unquote(rest).map_or(Directive::Unsupported, Directive::Extends),
        "block" if is_word(rest) => Directive::Block(rest),
        "endblock" if rest.is_empty() || is_word(rest) => Directive::EndBlock,
        "for" => parse_for(rest).unwrap_or(Directive::Unsupported),
        "endfor" if rest.is_empty() => Directive::EndFor,
        "if" if !rest.is_empty() => Directive::If(rest),
        "elseif" if !rest.is_empty() => Directive::ElseIf(rest),
        "else" if rest.is_empty() => Directive::Else,
        "endif" if rest.is_empty() => Directive::EndIf,
        _ => Directive::Unsupported,
    }
}

/// `"name"` or `'name'` to `name`.
fn unquote(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = text[1..].strip_suffix(quote)?.trim();
    (!inner.is_empty()).then_some(inner)
}

/// `item in collection`
fn parse_for(rest: &str) -> Option<Directive<'_>> {
    let mut parts = rest.split_whitespace();
    let item = parts.next().filter(|item| is_word(item))?;
    parts.next().filter(|kw| *kw == "in")?;
    let collection = parts.next()?;
    Path::parse(collection, Location::default())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Directive::For { item, collection })
}

enum FrameKind {
    Block {
        name: String,
    },
    For {
        item_ident: String,
        collection: Path,
    },
    If {
        branches: Vec<ConditionalBranch>,
        /// Condition of the branch being collected; `None` once `else` is seen.
        pending: Option<(Condition, Location)>,
    },
}

struct Frame {
    kind: FrameKind,
    open: DirectiveNode,
    nodes: Vec<AstNode>,
}

struct Parser {
    root: Vec<AstNode>,
    stack: Vec<Frame>,
}

impl Parser {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn push_token(&mut self, token: Token) {
        match token.token_type {
            TokenType::Text => self.push_node(AstNode::Text(TextNode {
                content: token.value,
                location: token.location,
            })),
            TokenType::Output => {
                let expression = Expression::parse(token.content(), token.location);
                self.push_node(AstNode::Output(OutputNode {
                    expression,
                    source: token.value,
                    location: token.location,
                }));
            }
            TokenType::Tag => self.push_tag(token),
        }
    }

    fn push_tag(&mut self, token: Token) {
        let location = token.location;
        match classify(token.content()) {
            Directive::Extends(parent) => {
                let parent = parent.to_string();
                self.push_node(AstNode::Extends(ExtendsNode { parent, location }));
            }
            Directive::Block(name) => {
                let kind = FrameKind::Block {
                    name: name.to_string(),
                };
                self.open(kind, token);
            }
            Directive::For { item, collection } => {
                let kind = FrameKind::For {
                    item_ident: item.to_string(),
                    collection: Path::lenient(collection, location),
                };
                self.open(kind, token);
            }
            Directive::If(condition) => {
                let kind = FrameKind::If {
                    branches: Vec::new(),
                    pending: Some((Condition::parse(condition, location), location)),
                };
                self.open(kind, token);
            }
            Directive::ElseIf(condition) => {
                let condition = Condition::parse(condition, location);
                self.switch_branch(Some((condition, location)), token);
            }
            Directive::Else => self.switch_branch(None, token),
            Directive::EndBlock => self.close(|k| matches!(k, FrameKind::Block { .. }), token),
            Directive::EndFor => self.close(|k| matches!(k, FrameKind::For { .. }), token),
            Directive::EndIf => self.close(|k| matches!(k, FrameKind::If { .. }), token),
            Directive::Unsupported => self.push_inert(token),
        }
    }

    fn open(&mut self, kind: FrameKind, token: Token) {
        self.stack.push(Frame {
            kind,
            open: inert(token),
            nodes: Vec::new(),
        });
    }

    /// Handle `elseif` (`next` is `Some`) or `else` (`next` is `None`).
    fn switch_branch(&mut self, next: Option<(Condition, Location)>, token: Token) {
        let Some(frame) = self.stack.last_mut() else {
            return self.push_inert(token);
        };
        let FrameKind::If { branches, pending } = &mut frame.kind else {
            return self.push_inert(token);
        };
        // Once `else` has been seen, later `elseif`/`else` tags are inert.
        let Some((condition, location)) = pending.take() else {
            return self.push_inert(token);
        };
        branches.push(ConditionalBranch {
            condition,
            body: std::mem::take(&mut frame.nodes),
            location,
        });
        *pending = next;
    }

    fn close(&mut self, matches_kind: impl Fn(&FrameKind) -> bool, token: Token) {
        match self.stack.last() {
            Some(frame) if matches_kind(&frame.kind) => {}
            _ => return self.push_inert(token),
        }
        if let Some(frame) = self.stack.pop() {
            let node = build_node(frame);
            self.push_node(node);
        }
    }

    fn push_inert(&mut self, token: Token) {
        self.push_node(AstNode::Directive(inert(token)));
    }

    fn push_node(&mut self, node: AstNode) {
        match self.stack.last_mut() {
            Some(frame) => frame.nodes.push(node),
            None => self.root.push(node),
        }
    }

    fn finish(mut self) -> Template {
        while let Some(frame) = self.stack.pop() {
            for node in unwind(frame) {
                self.push_node(node);
            }
        }
        Template::new(self.root, Location::new(1, 1, 0))
    }
}

fn inert(token: Token) -> DirectiveNode {
    DirectiveNode {
        source: token.value,
        location: token.location,
    }
}

fn build_node(frame: Frame) -> AstNode {
    let location = frame.open.location;
    match frame.kind {
        FrameKind::Block { name } => AstNode::Block(BlockNode {
            name,
            body: frame.nodes,
            location,
        }),
        FrameKind::For {
            item_ident,
            collection,
        } => AstNode::For(ForBlock {
            item_ident,
            collection,
            body: frame.nodes,
            location,
        }),
        FrameKind::If {
            mut branches,
            pending,
        } => {
            let else_branch = match pending {
                Some((condition, branch_location)) => {
                    branches.push(ConditionalBranch {
                        condition,
                        body: frame.nodes,
                        location: branch_location,
                    });
                    None
                }
                None => Some(frame.nodes),
            };
            AstNode::If(IfBlock {
                branches,
                else_branch,
                location,
            })
        }
    }
}

/// Flatten a frame that was never closed: the opener becomes inert and every
/// collected child is kept in source order.
fn unwind(frame: Frame) -> Vec<AstNode> {
    let mut nodes = vec![AstNode::Directive(frame.open)];
    if let FrameKind::If { branches, .. } = frame.kind {
        for branch in branches {
            nodes.extend(branch.body);
        }
    }
    nodes.extend(frame.nodes);
    nodes
}
