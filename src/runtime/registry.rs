//! The three pieces of configuration the rewrite engine reads: the operator
//! registry, the precedence table, and the operand environment.
//!
//! All three use persistent `im` collections so a [`Context`](super::context::Context)
//! can be cloned cheaply (REPL snapshots, shadowed scopes for operator bodies).

use crate::ast::Expr;
use crate::atoms::{resolve_builtin, OperatorKind};
use crate::errors::{DeffixError, ErrorKind};
use im::{HashMap, Vector};
use log::debug;

// ============================================================================
// OPERATOR REGISTRY
// ============================================================================

/// Insertion-ordered, duplicate-free set of custom operator symbols.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    order: Vector<String>,
    kinds: HashMap<String, OperatorKind>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds each symbol not already present, in encounter order. The kind is
    /// fixed here: builtin names keep their builtin kind, anything else is a
    /// user operator.
    pub fn register<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for symbol in symbols {
            let name = symbol.into();
            if self.kinds.contains_key(&name) {
                continue;
            }
            let kind = resolve_builtin(&name).unwrap_or_else(|| OperatorKind::User(name.clone()));
            debug!("registered operator '{}' as {}", name, kind);
            self.order.push_back(name.clone());
            self.kinds.insert(name, kind);
        }
    }

    /// Registers `name` with an explicit kind, replacing the kind of an
    /// existing entry without moving it.
    pub(crate) fn define(&mut self, name: &str, kind: OperatorKind) {
        if !self.kinds.contains_key(name) {
            self.order.push_back(name.to_string());
        }
        self.kinds.insert(name.to_string(), kind);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.kinds.contains_key(symbol)
    }

    pub fn kind(&self, symbol: &str) -> Option<&OperatorKind> {
        self.kinds.get(symbol)
    }

    /// Symbols in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ============================================================================
// PRECEDENCE TABLE
// ============================================================================

/// Ordered, duplicate-free tie-break table: earlier entries bind first.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceTable {
    entries: Vector<String>,
}

impl PrecedenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the table, then appends each new symbol in encounter order.
    pub fn set<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.clear();
        self.extend(symbols);
    }

    /// Appends each symbol not already present, without clearing.
    pub fn extend<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for symbol in symbols {
            let name = symbol.into();
            if !self.contains(&name) {
                self.entries.push_back(name);
            }
        }
        debug!("precedence table is now {:?}", self.as_sequence());
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|entry| entry == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    pub fn as_sequence(&self) -> Vec<&str> {
        self.entries.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// OPERAND ENVIRONMENT
// ============================================================================

/// Symbols bound to substitution values.
#[derive(Debug, Clone, Default)]
pub struct OperandEnvironment {
    bindings: HashMap<String, Expr>,
}

impl OperandEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds alternating `name value` pairs and returns the value of the
    /// first pair (`Nil` when no pairs are given).
    ///
    /// Nothing is bound unless every name is a symbol and the argument count
    /// is even.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deffix::ast::Expr;
    /// use deffix::runtime::registry::OperandEnvironment;
    /// let mut env = OperandEnvironment::new();
    /// let pairs = [Expr::symbol("x"), Expr::number(1.0), Expr::symbol("y"), Expr::number(2.0)];
    /// assert_eq!(env.define(&pairs).unwrap(), Expr::number(1.0));
    /// assert_eq!(env.lookup("y"), Some(&Expr::number(2.0)));
    /// assert!(env.define(&pairs[..3]).is_err());
    /// ```
    pub fn define(&mut self, pairs: &[Expr]) -> Result<Expr, DeffixError> {
        if pairs.len() % 2 != 0 {
            return Err(DeffixError::new(ErrorKind::OddArity { count: pairs.len() }));
        }

        let mut staged = Vec::with_capacity(pairs.len() / 2);
        for pair in pairs.chunks_exact(2) {
            let Some(name) = pair[0].as_symbol() else {
                return Err(DeffixError::new(ErrorKind::InvalidOperandName {
                    found: pair[0].pretty(),
                }));
            };
            staged.push((name.to_string(), pair[1].clone()));
        }

        let first = staged.first().map(|(_, value)| value.clone()).unwrap_or(Expr::Nil);
        for (name, value) in staged {
            debug!("bound operand '{}' to {}", name, value);
            self.bindings.insert(name, value);
        }
        Ok(first)
    }

    pub fn lookup(&self, symbol: &str) -> Option<&Expr> {
        self.bindings.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.bindings.contains_key(symbol)
    }

    pub(crate) fn remove(&mut self, symbol: &str) {
        self.bindings.remove(symbol);
    }

    /// Bindings sorted by name, for display.
    pub fn sorted(&self) -> Vec<(&String, &Expr)> {
        let mut entries: Vec<_> = self.bindings.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::BuiltinOperator;

    #[test]
    fn registration_is_idempotent_and_ordered() {
        let mut registry = OperatorRegistry::new();
        registry.register(["and", "or"]);
        registry.register(["or", "xor", "and"]);
        let symbols: Vec<_> = registry.symbols().cloned().collect();
        assert_eq!(symbols, vec!["and", "or", "xor"]);
        assert!(registry.contains("xor"));
        assert!(!registry.contains("nand"));
    }

    #[test]
    fn registering_a_builtin_name_keeps_its_kind() {
        let mut registry = OperatorRegistry::new();
        registry.register(["*", "implies"]);
        assert_eq!(registry.kind("*"), Some(&OperatorKind::Builtin(BuiltinOperator::Mul)));
        assert_eq!(registry.kind("implies"), Some(&OperatorKind::User("implies".into())));
    }

    #[test]
    fn define_overrides_kind_in_place() {
        let mut registry = OperatorRegistry::new();
        registry.register(["+", "-"]);
        registry.define("+", OperatorKind::User("+".into()));
        let symbols: Vec<_> = registry.symbols().cloned().collect();
        assert_eq!(symbols, vec!["+", "-"]);
        assert_eq!(registry.kind("+"), Some(&OperatorKind::User("+".into())));
    }

    #[test]
    fn precedence_set_resets_and_extend_appends() {
        let mut table = PrecedenceTable::new();
        table.set(["times"]);
        table.set(["plus"]);
        assert_eq!(table.as_sequence(), vec!["plus"]);

        table.set(["times"]);
        table.extend(["plus", "times"]);
        assert_eq!(table.as_sequence(), vec!["times", "plus"]);
    }

    #[test]
    fn precedence_set_deduplicates() {
        let mut table = PrecedenceTable::new();
        table.set(["*", "/", "*", "+"]);
        assert_eq!(table.as_sequence(), vec!["*", "/", "+"]);
        table.set(Vec::<String>::new());
        assert!(table.is_empty());
    }

    #[test]
    fn odd_operand_count_binds_nothing() {
        let mut env = OperandEnvironment::new();
        let err = env
            .define(&[Expr::symbol("x"), Expr::number(1.0), Expr::symbol("y")])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OddArity { count: 3 });
        assert!(env.is_empty());
    }

    #[test]
    fn non_symbol_operand_name_is_rejected() {
        let mut env = OperandEnvironment::new();
        let err = env
            .define(&[Expr::symbol("x"), Expr::number(1.0), Expr::number(2.0), Expr::number(3.0)])
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidOperandName { .. }));
        assert!(!env.contains("x"));
    }

    #[test]
    fn later_definitions_rebind() {
        let mut env = OperandEnvironment::new();
        env.define(&[Expr::symbol("x"), Expr::number(1.0)]).unwrap();
        env.define(&[Expr::symbol("x"), Expr::number(2.0)]).unwrap();
        assert_eq!(env.lookup("x"), Some(&Expr::number(2.0)));
        assert_eq!(env.define(&[]).unwrap(), Expr::Nil);
    }
}
