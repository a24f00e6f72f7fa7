//! `__NAME__` templates filled from a typed variable set.
//!
//! Substitution is a single pass over the template text, so a value that
//! itself contains `__NAME__` is inserted as is and never expanded.

use std::borrow::Cow;
use std::marker::PhantomData;

/// Values for the placeholders of one template.
pub trait TemplateVars {
    /// Value for placeholder `name` (without underscores), if this set has one.
    fn get(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Compile-time template text bound to its variable type.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    /// Fill every known placeholder. Unknown ones are left in place.
    pub fn render(&self, vars: &V) -> String {
        let mut out = String::with_capacity(self.content.len() * 2);
        let mut rest = self.content;

        while let Some(start) = rest.find("__") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let value = after
                .find("__")
                .map(|end| &after[..end])
                .filter(|name| is_placeholder_name(name))
                .and_then(|name| vars.get(name).map(|v| (name.len(), v)));

            match value {
                Some((len, value)) => {
                    out.push_str(&value);
                    rest = &after[len + 2..];
                }
                None => {
                    out.push_str("__");
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_uppercase() || b == b'_')
}
