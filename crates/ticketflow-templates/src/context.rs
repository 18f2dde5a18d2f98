//! Context for variable resolution during template rendering.

use crate::value::Value;
use indexmap::IndexMap;

/// Engine-wide variables merged into every render.
pub type Globals = IndexMap<String, Value>;

/// Context for variable resolution during template rendering.
///
/// Lookups search loop bindings (innermost first), then the call data, then
/// the globals, which is the same as merging globals under call data without
/// copying them.
pub struct Context<'a> {
    globals: &'a Globals,
    root: IndexMap<String, Value>,
    local_stack: Vec<(String, Value)>,
}

impl<'a> Context<'a> {
    /// Create a context from call data. Data that is not a mapping
    /// contributes no variables.
    pub fn new(globals: &'a Globals, data: Value) -> Self {
        let root = match data {
            Value::Object(obj) => obj,
            Value::Null => IndexMap::new(),
            other => {
                tracing::debug!(
                    kind = other.type_name(),
                    "render data is not a mapping, ignoring it"
                );
                IndexMap::new()
            }
        };

        Self {
            globals,
            root,
            local_stack: Vec::new(),
        }
    }

    /// Resolve a path (e.g., ["ticket", "status"]) by walking mappings.
    pub fn resolve(&self, path: &[String]) -> Option<&Value> {
        let (name, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.resolve_name(name)?, |value, segment| value.get(segment))
    }

    /// Resolve a name from the scope stack, call data, or globals.
    pub fn resolve_name(&self, name: &str) -> Option<&Value> {
        self.local_stack
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value)
            .or_else(|| self.root.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// Resolve a name from call data or globals, ignoring loop bindings.
    pub fn resolve_top_level(&self, name: &str) -> Option<&Value> {
        self.root.get(name).or_else(|| self.globals.get(name))
    }

    /// Bind a loop variable for the duration of one iteration.
    pub fn push_scope(&mut self, name: impl Into<String>, value: Value) {
        self.local_stack.push((name.into(), value));
    }

    /// Pop the current scope
    pub fn pop_scope(&mut self) {
        self.local_stack.pop();
    }

    /// Whether `name` is bound by an enclosing loop.
    pub fn is_loop_variable(&self, name: &str) -> bool {
        self.local_stack.iter().any(|(local, _)| local == name)
    }
}
