//! Output filters: `raw`, `lower`, `upper`, `length`, `slice(start[, length])`
//! and `json_encode`.
//!
//! Filters are not applied in the order written. `json_encode` serializes
//! first, `raw` short-circuits everything else, and the remaining filters run
//! in the fixed order lower, upper, length, slice. Unknown names are ignored.

use crate::html_escape;
use crate::value::Value;
use std::borrow::Cow;
use ticketflow_syntax::Filter;

/// The set of recognized filters found in one output tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    pub raw: bool,
    pub json_encode: bool,
    pub lower: bool,
    pub upper: bool,
    pub length: bool,
    pub slice: Option<Slice>,
}

/// Arguments of `slice(start[, length])`, counted in characters. Negative
/// values count from the end of the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: i64,
    pub length: Option<i64>,
}

impl FilterChain {
    pub fn from_filters(filters: &[Filter]) -> Self {
        let mut chain = Self::default();
        for filter in filters {
            match filter.name.as_str() {
                "raw" => chain.raw = true,
                "json_encode" => chain.json_encode = true,
                "lower" => chain.lower = true,
                "upper" => chain.upper = true,
                "length" => chain.length = true,
                "slice" => chain.slice = Slice::from_args(&filter.args).or(chain.slice),
                other => tracing::trace!(filter = other, "ignoring unknown filter"),
            }
        }
        chain
    }

    /// Produce the final output text for `value`. `None` stands for an
    /// unresolved name.
    pub fn apply(&self, value: Option<&Value>) -> String {
        if self.json_encode {
            let json = match value {
                None | Some(Value::Null) => "[]".to_string(),
                Some(value) => value.to_json().to_string(),
            };
            return self.finish(json);
        }

        let text = value.map(Value::string_form).unwrap_or_default();
        if self.raw {
            return text;
        }

        let mut text = text;
        if self.lower {
            text = text.to_lowercase();
        }
        if self.upper {
            text = text.to_uppercase();
        }
        if self.length {
            let count = match value {
                Some(Value::Array(items)) => items.len(),
                Some(Value::Object(entries)) => entries.len(),
                _ => text.chars().count(),
            };
            text = count.to_string();
        }
        if let Some(slice) = self.slice {
            text = slice.apply(&text);
        }
        self.finish(text)
    }

    fn finish(&self, text: String) -> String {
        if self.raw {
            return text;
        }
        match html_escape::escape(&text) {
            Cow::Borrowed(_) => text,
            Cow::Owned(escaped) => escaped,
        }
    }
}

impl Slice {
    /// `slice(start)` or `slice(start, length)`; anything else is ignored.
    fn from_args(args: &[String]) -> Option<Self> {
        let start = args.first()?.parse().ok()?;
        let length = match args.get(1) {
            Some(arg) => Some(arg.parse().ok()?),
            None => None,
        };
        Some(Self { start, length })
    }

    fn apply(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len() as i64;
        let start = if self.start < 0 {
            total.saturating_add(self.start).max(0)
        } else {
            self.start.min(total)
        };
        let end = match self.length {
            Some(length) if length < 0 => total.saturating_add(length).max(start),
            Some(length) => start.saturating_add(length).min(total),
            None => total,
        };
        chars[start as usize..end as usize].iter().collect()
    }
}
