//! Template inheritance: `{% extends %}` and `{% block %}`.
//!
//! A child that extends a parent is replaced by the parent's tree, with every
//! parent block whose name the child also defines swapped for the child's
//! block body. This is plain substitution: there is no `parent()` call, the
//! parent's own block body is dropped, and only one level is resolved.
//!
//! Child blocks the parent never mentions are discarded, as is child content
//! outside blocks. A missing parent leaves the child untouched.

use crate::template_loader::TemplateLoader;
use indexmap::IndexMap;
use std::collections::HashSet;
use ticketflow_syntax::{AstNode, BlockNode, ConditionalBranch, ForBlock, IfBlock, Template};

/// Resolve the inheritance of `template`.
pub fn resolve(template: Template, loader: &TemplateLoader) -> Template {
    let Some(parent_name) = template.extends().map(|e| e.parent.clone()) else {
        return template;
    };

    let Some(parent) = loader.load_parent(&parent_name) else {
        return template;
    };

    let mut overrides = IndexMap::new();
    collect_blocks(template.nodes(), &mut overrides);

    let mut parent_blocks = HashSet::new();
    collect_block_names(parent.nodes(), &mut parent_blocks);
    for name in overrides.keys().filter(|name| !parent_blocks.contains(*name)) {
        tracing::debug!(
            block = %name,
            parent = %parent_name,
            "discarding block not present in parent"
        );
    }

    let location = parent.location();
    let nodes = apply_overrides(parent.into_nodes(), &overrides);
    Template::new(nodes, location)
}

/// Gather every block in the tree by name. For repeated names the last one
/// in source order wins.
fn collect_blocks(nodes: &[AstNode], blocks: &mut IndexMap<String, Vec<AstNode>>) {
    for node in nodes {
        match node {
            AstNode::Block(block) => {
                blocks.insert(block.name.clone(), block.body.clone());
                collect_blocks(&block.body, blocks);
            }
            AstNode::For(block) => collect_blocks(&block.body, blocks),
            AstNode::If(block) => {
                for branch in &block.branches {
                    collect_blocks(&branch.body, blocks);
                }
                if let Some(body) = &block.else_branch {
                    collect_blocks(body, blocks);
                }
            }
            _ => {}
        }
    }
}

fn collect_block_names(nodes: &[AstNode], names: &mut HashSet<String>) {
    let mut blocks = IndexMap::new();
    collect_blocks(nodes, &mut blocks);
    names.extend(blocks.into_keys());
}

/// Replace overridden blocks. Replacement bodies are inserted as-is and not
/// searched for further blocks.
fn apply_overrides(nodes: Vec<AstNode>, overrides: &IndexMap<String, Vec<AstNode>>) -> Vec<AstNode> {
    nodes
        .into_iter()
        .map(|node| match node {
            AstNode::Block(block) => {
                let body = match overrides.get(&block.name) {
                    Some(body) => body.clone(),
                    None => apply_overrides(block.body, overrides),
                };
                AstNode::Block(BlockNode { body, ..block })
            }
            AstNode::For(block) => AstNode::For(ForBlock {
                body: apply_overrides(block.body, overrides),
                ..block
            }),
            AstNode::If(block) => AstNode::If(IfBlock {
                branches: block
                    .branches
                    .into_iter()
                    .map(|branch| ConditionalBranch {
                        body: apply_overrides(branch.body, overrides),
                        ..branch
                    })
                    .collect(),
                else_branch: block
                    .else_branch
                    .map(|body| apply_overrides(body, overrides)),
                location: block.location,
            }),
            other => other,
        })
        .collect()
}
