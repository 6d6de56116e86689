//! Name-to-constructor lookup for rule types.

use super::rule::RuleRegistration;
use std::collections::BTreeMap;

/// An explicit, compiled-in map from rule name to its registration.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: BTreeMap<&'static str, RuleRegistration>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every builtin rule.
    pub fn builtin() -> Self {
        crate::rules::builtin()
            .into_iter()
            .fold(Self::new(), Self::with_rule)
    }

    /// Adds a rule type, replacing any previous registration of the same name.
    pub fn with_rule(mut self, registration: RuleRegistration) -> Self {
        self.rules.insert(registration.descriptor.name, registration);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RuleRegistration> {
        self.rules.get(name)
    }

    /// Registrations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleRegistration> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = Registry::builtin();
        let no_null = registry.get("no-null").unwrap();
        assert_eq!(no_null.descriptor.pretty_name, "No null");
        assert!(registry.get("keys-that-start-with-is-or-has").is_none());

        let names: Vec<_> = registry.iter().map(|r| r.descriptor.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
