use std::collections::HashMap;

/// Flat per-function symbol table.
///
/// A redeclaration pushes on top of the earlier entry and masks it for later
/// lookups; nothing is popped until the table is cleared for the next
/// function.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    entries: HashMap<String, Vec<T>>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        SymbolTable {
            entries: HashMap::new(),
        }
    }
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, name: &str, value: T) {
        self.entries.entry(name.to_string()).or_default().push(value);
    }

    /// The most recent declaration of `name`.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).and_then(|stack| stack.last())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
