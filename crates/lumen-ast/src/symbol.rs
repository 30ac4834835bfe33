//! Identifier interning.

use std::collections::HashMap;
use std::fmt;

/// An interned identifier.
///
/// Equal text yields an equal symbol within one [`SymbolTable`]; symbols
/// from different tables are not comparable.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Symbol(u32);

impl Symbol {
    /// Returns the raw table index of this symbol.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Maps identifier text to [`Symbol`]s and back.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    map: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning the existing symbol if it is already known.
    pub fn register(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.map.get(name) {
            return sym;
        }
        let sym = Symbol(
            u32::try_from(self.names.len())
                .unwrap_or_else(|_| panic!("symbol table overflow: {} names", self.names.len())),
        );
        self.names.push(name.to_owned());
        self.map.insert(name.to_owned(), sym);
        sym
    }

    /// Looks up a symbol without interning.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.map.get(name).copied()
    }

    /// Returns the text of `symbol`.
    ///
    /// A symbol from another table yields `"<invalid>"` when it is out of
    /// range for this one.
    pub fn name_for(&self, symbol: Symbol) -> &str {
        self.names
            .get(symbol.index())
            .map(String::as_str)
            .unwrap_or("<invalid>")
    }

    /// Interns a name derived from `prefix` that is not yet in the table:
    /// `prefix` itself if free, otherwise `prefix_1`, `prefix_2`, ...
    pub fn new_unique(&mut self, prefix: &str) -> Symbol {
        if self.get(prefix).is_none() {
            return self.register(prefix);
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{prefix}_{n}");
            if self.get(&candidate).is_none() {
                return self.register(&candidate);
            }
            n += 1;
        }
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing was interned yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(symbol, text)` in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (Symbol(i as u32), n.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_text_equal_symbol() {
        let mut table = SymbolTable::new();
        let a = table.register("main");
        let b = table.register("other");
        let c = table.register("main");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(table.name_for(b), "other");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unique_names_skip_taken_ones() {
        let mut table = SymbolTable::new();
        table.register("x");
        table.register("x_1");
        let fresh = table.new_unique("x");
        assert_eq!(table.name_for(fresh), "x_2");
        let free = table.new_unique("y");
        assert_eq!(table.name_for(free), "y");
    }

    #[test]
    fn lookup_does_not_intern() {
        let table = SymbolTable::new();
        assert_eq!(table.get("nope"), None);
        assert!(table.is_empty());
    }
}
