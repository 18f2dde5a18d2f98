//! Renderer for evaluating template ASTs.
//!
//! Inheritance is resolved before a tree reaches the renderer. Rendering
//! never fails:
//! - unresolved names render as empty text, skip loops, or make conditions
//!   false
//! - unresolvable dotted paths keep their `{{ ... }}` source
//! - leftover directives render as nothing

use crate::context::{Context, Globals};
use crate::filters::FilterChain;
use crate::value::Value;
use ticketflow_syntax::{AstNode, Condition, ForBlock, IfBlock, OutputNode, Template};

/// Renderer for evaluating template ASTs
pub struct Renderer<'a> {
    globals: &'a Globals,
}

impl<'a> Renderer<'a> {
    /// Create a renderer over the engine's globals
    pub fn new(globals: &'a Globals) -> Self {
        Self { globals }
    }

    /// Render a template with the given data
    pub fn render(&self, template: &Template, data: Value) -> String {
        let mut context = Context::new(self.globals, data);
        self.render_nodes(template.nodes(), &mut context)
    }

    fn render_nodes(&self, nodes: &[AstNode], context: &mut Context) -> String {
        let mut output = String::new();

        for node in nodes {
            match node {
                AstNode::Text(n) => output.push_str(&n.content),
                AstNode::Output(n) => output.push_str(&self.render_output(n, context)),
                AstNode::Block(n) => output.push_str(&self.render_nodes(&n.body, context)),
                AstNode::For(n) => output.push_str(&self.render_for(n, context)),
                AstNode::If(n) => output.push_str(&self.render_if(n, context)),
                AstNode::Extends(_) => {}
                AstNode::Directive(n) => {
                    tracing::trace!(
                        directive = %n.source,
                        line = n.location.line,
                        "stripping unsupported directive"
                    );
                }
            }
        }

        output
    }

    fn render_output(&self, node: &OutputNode, context: &Context) -> String {
        let Some(expression) = &node.expression else {
            return verbatim(node);
        };
        let path = &expression.path;
        let chain = FilterChain::from_filters(&expression.filters);
        // A bare name never refers to a loop item, only to the top level.
        let value = if path.is_dotted() {
            context.resolve(path.segments())
        } else {
            context.resolve_top_level(path.head())
        };

        // Fields of a loop item: unknown fields and nested containers read as
        // the empty string.
        if path.is_dotted() && context.is_loop_variable(path.head()) {
            return chain.apply(value);
        }

        if chain.json_encode {
            return chain.apply(value);
        }

        match value {
            None if path.is_dotted() => verbatim(node),
            Some(v) if v.is_container() && expression.is_plain() => verbatim(node),
            _ => chain.apply(value),
        }
    }

    fn render_if(&self, node: &IfBlock, context: &mut Context) -> String {
        let taken = node
            .branches
            .iter()
            .find(|branch| evaluate(&branch.condition, context));

        match (taken, &node.else_branch) {
            (Some(branch), _) => self.render_nodes(&branch.body, context),
            (None, Some(else_branch)) => self.render_nodes(else_branch, context),
            (None, None) => String::new(),
        }
    }

    fn render_for(&self, node: &ForBlock, context: &mut Context) -> String {
        let items = match context.resolve(node.collection.segments()) {
            Some(Value::Array(items)) => items.clone(),
            other => {
                let kind = other.map_or("undefined", Value::type_name);
                tracing::trace!(
                    collection = %node.collection.as_str(),
                    kind,
                    "loop collection is not a sequence, skipping"
                );
                return String::new();
            }
        };

        let mut output = String::new();
        for item in items {
            context.push_scope(node.item_ident.as_str(), item);
            let iteration = self.render_nodes(&node.body, context);
            context.pop_scope();

            output.push_str(&iteration);
        }

        output
    }
}

fn verbatim(node: &OutputNode) -> String {
    tracing::trace!(
        output = %node.source,
        line = node.location.line,
        "leaving unresolved output verbatim"
    );
    node.source.clone()
}

fn evaluate(condition: &Condition, context: &Context) -> bool {
    match condition {
        Condition::Equals { path, literal } => {
            let actual = context
                .resolve(path.segments())
                .map(Value::string_form)
                .unwrap_or_default();
            actual == *literal
        }
        Condition::Truthy(path) => context
            .resolve(path.segments())
            .map_or(false, Value::is_truthy),
    }
}
