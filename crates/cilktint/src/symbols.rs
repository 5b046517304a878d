use std::collections::HashSet;

/// Per-pass symbol table: the set of user type names learned so far plus the
/// stack of template parameter lists currently in scope.
///
/// `learned_types` only grows for the lifetime of one annotation pass.
/// A template parameter list is visible while it sits anywhere on the stack,
/// so nested template instantiations see all enclosing parameters.
#[derive(Debug, Default)]
pub struct SymbolTable {
    learned_types: HashSet<String>,
    template_params: Vec<Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first whitespace-delimited word of `content`, the unit all type
    /// lookups operate on.
    pub fn first_word(content: &str) -> Option<&str> {
        content.trim().split_whitespace().next()
    }

    /// If `content` starts with a known type name, return that name.
    pub fn known_type<'c>(&self, content: &'c str) -> Option<&'c str> {
        let word = Self::first_word(content)?;
        let known = self.learned_types.contains(word)
            || self
                .template_params
                .iter()
                .any(|params| params.iter().any(|param| param == word));
        known.then_some(word)
    }

    pub fn is_known_type(&self, content: &str) -> bool {
        self.known_type(content).is_some()
    }

    pub fn learn(&mut self, name: &str) {
        self.learned_types.insert(name.trim().to_string());
    }

    pub fn push_template_params(&mut self, params: Vec<String>) {
        self.template_params.push(params);
    }

    /// Lock-step partner of popping a `template` state. Tolerates an empty
    /// stack: a parameter clause that captured nothing never pushed a list.
    pub fn pop_template_params(&mut self) {
        self.template_params.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_use_the_first_word_only() {
        let mut symbols = SymbolTable::new();
        symbols.learn("  Foo ");
        assert_eq!(symbols.known_type("Foo bar baz"), Some("Foo"));
        assert_eq!(symbols.known_type("  Foo"), Some("Foo"));
        assert_eq!(symbols.known_type("bar Foo"), None);
        assert_eq!(symbols.known_type("   "), None);
    }

    #[test]
    fn duplicate_learning_is_harmless() {
        let mut symbols = SymbolTable::new();
        symbols.learn("Foo");
        symbols.learn("Foo");
        assert!(symbols.is_known_type("Foo"));
    }

    #[test]
    fn template_parameters_are_visible_from_any_stack_level() {
        let mut symbols = SymbolTable::new();
        symbols.push_template_params(vec!["T".to_string(), "U".to_string()]);
        symbols.push_template_params(vec!["V".to_string()]);
        assert!(symbols.is_known_type("T"));
        assert!(symbols.is_known_type("U"));
        assert!(symbols.is_known_type("V"));

        symbols.pop_template_params();
        assert!(symbols.is_known_type("T"));
        assert!(!symbols.is_known_type("V"));

        symbols.pop_template_params();
        assert!(!symbols.is_known_type("T"));
        // Popping past the bottom must not disturb learned types.
        symbols.pop_template_params();
        assert!(!symbols.is_known_type("T"));
    }

    #[test]
    fn learned_types_survive_template_pops() {
        let mut symbols = SymbolTable::new();
        symbols.learn("Grid");
        symbols.push_template_params(vec!["T".to_string()]);
        symbols.pop_template_params();
        assert!(symbols.is_known_type("Grid"));
    }
}
