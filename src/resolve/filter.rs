//! Expansion predicates.
//!
//! A predicate sees the [`SymbolMetadata`] of a named type or a property and
//! decides whether the resolver expands it. `false` keeps the node but stops
//! at a `Reference` (or `Generic` for instantiated library types).
use std::collections::HashSet;

use crate::metadata::SymbolMetadata;

pub trait FilterPredicate: Sync {
    fn expand(&self, symbol: &SymbolMetadata) -> bool;
}

impl<F> FilterPredicate for F
where
    F: Fn(&SymbolMetadata) -> bool + Sync,
{
    fn expand(&self, symbol: &SymbolMetadata) -> bool {
        self(symbol)
    }
}

/// Expand what the consumer declared; stop at `node_modules` and lib files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilter;

impl FilterPredicate for DefaultFilter {
    fn expand(&self, symbol: &SymbolMetadata) -> bool {
        !symbol.is_in_node_modules
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandAll;

impl FilterPredicate for ExpandAll {
    fn expand(&self, _: &SymbolMetadata) -> bool {
        true
    }
}

/// [`DefaultFilter`] plus an allow-list of external names to expand anyway.
#[derive(Debug, Clone, Default)]
pub struct ExpandNamed {
    names: HashSet<String>,
}

impl ExpandNamed {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }
}

impl FilterPredicate for ExpandNamed {
    fn expand(&self, symbol: &SymbolMetadata) -> bool {
        !symbol.is_in_node_modules || self.names.contains(&symbol.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, external: bool) -> SymbolMetadata {
        SymbolMetadata {
            name: name.into(),
            file_path: None,
            position: None,
            is_optional: false,
            is_readonly: false,
            is_in_node_modules: external,
            description: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn default_policy_stops_at_external_symbols() {
        assert!(DefaultFilter.expand(&meta("Props", false)));
        assert!(!DefaultFilter.expand(&meta("HTMLAttributes", true)));
        assert!(ExpandAll.expand(&meta("HTMLAttributes", true)));
    }

    #[test]
    fn closures_and_allow_lists() {
        let only_children = |s: &SymbolMetadata| s.name == "children";
        assert!(only_children.expand(&meta("children", true)));
        assert!(!only_children.expand(&meta("className", false)));

        let named = ExpandNamed::new(["CSSProperties"]);
        assert!(named.expand(&meta("CSSProperties", true)));
        assert!(!named.expand(&meta("Promise", true)));
        assert!(named.expand(&meta("Local", false)));
    }
}
