//! Symbol table
//!
//! Entries live in one arena and are addressed by [`SymbolId`]. Name lookup
//! goes through a global scope plus one named scope per function (and one
//! for `main`). While a scope is open, `has_id` and `lookup` try it before the
//! globals. Record fields are entries owned by their record type and are
//! reached through [`SymbolTable::field`], never through name lookup.

use crate::parser::token::Token;
use rustc_hash::FxHashMap;
use std::fmt;
use thiserror::Error;

/// Index of an entry in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Program,
    Constant,
    RecordType,
    ArrayType,
    Field,
    Array,
    Variable,
    Parameter,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Real,
    Boolean,
    Void,
    /// A user-declared record or array type
    Named(String),
    /// Not yet known, or could not be determined after an error
    Unknown,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Real)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "integer"),
            DataType::Real => write!(f, "real"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Void => write!(f, "void"),
            DataType::Named(name) => write!(f, "{}", name),
            DataType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Everything the front end knows about one declared name.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub data_type: DataType,
    /// Current known value as literal text (`"5"`, `"2.5"`, `"true"`)
    pub value: Option<String>,
    pub line: usize,
    pub col: usize,
    pub token: Token,
    /// Field entries, for record types
    pub fields: Vec<SymbolId>,
    /// Declared parameter types, for functions
    pub param_types: Vec<DataType>,
    /// Element record type name and folded size, for array types
    pub element: Option<String>,
    pub size: Option<i64>,
}

impl TableEntry {
    /// Entry declared at `token`, whose lexeme is the name.
    pub fn new(kind: SymbolKind, token: &Token, data_type: DataType) -> Self {
        Self {
            name: token.text().to_string(),
            kind,
            data_type,
            value: None,
            line: token.line,
            col: token.col,
            token: token.clone(),
            fields: Vec::new(),
            param_types: Vec::new(),
            element: None,
            size: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("'{name}' is already declared at line {line}, column {col}")]
    Duplicate { name: String, line: usize, col: usize },
}

type Scope = FxHashMap<String, SymbolId>;

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<TableEntry>,
    globals: Scope,
    scopes: FxHashMap<String, Scope>,
    current: Option<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reopen) the named local scope.
    pub fn enter_scope(&mut self, name: &str) {
        self.scopes.entry(name.to_string()).or_default();
        self.current = Some(name.to_string());
    }

    /// Return to the global scope.
    pub fn exit_scope(&mut self) {
        self.current = None;
    }

    fn local(&self) -> Option<&Scope> {
        self.current.as_ref().and_then(|name| self.scopes.get(name))
    }

    pub fn has_global_id(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// Visible from the current scope: local first, then global.
    pub fn has_id(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.local()
            .and_then(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
            .copied()
    }

    pub fn lookup_global(&self, name: &str) -> Option<SymbolId> {
        self.globals.get(name).copied()
    }

    pub fn get_entry(&self, name: &str) -> Option<&TableEntry> {
        self.lookup(name).map(|id| self.entry(id))
    }

    pub fn entry(&self, id: SymbolId) -> &TableEntry {
        &self.entries[id.0]
    }

    fn entry_mut(&mut self, id: SymbolId) -> &mut TableEntry {
        &mut self.entries[id.0]
    }

    /// Declare `entry` in the current scope.
    pub fn add_symbol(&mut self, entry: TableEntry) -> Result<SymbolId, SymbolError> {
        let id = SymbolId(self.entries.len());
        let scope = match &self.current {
            Some(name) => self.scopes.entry(name.clone()).or_default(),
            None => &mut self.globals,
        };

        if let Some(existing) = scope.get(&entry.name) {
            let prior = &self.entries[existing.0];
            return Err(SymbolError::Duplicate {
                name: entry.name,
                line: prior.line,
                col: prior.col,
            });
        }

        tracing::trace!(name = %entry.name, kind = ?entry.kind, scope = ?self.current, "declared");
        scope.insert(entry.name.clone(), id);
        self.entries.push(entry);
        Ok(id)
    }

    /// Declare a field of record type `record`.
    pub fn add_field(&mut self, record: SymbolId, entry: TableEntry) -> Result<SymbolId, SymbolError> {
        if let Some(existing) = self.field(record, &entry.name) {
            let prior = self.entry(existing);
            return Err(SymbolError::Duplicate {
                name: entry.name,
                line: prior.line,
                col: prior.col,
            });
        }

        let id = SymbolId(self.entries.len());
        self.entries.push(entry);
        self.entry_mut(record).fields.push(id);
        Ok(id)
    }

    pub fn field(&self, record: SymbolId, name: &str) -> Option<SymbolId> {
        self.entry(record)
            .fields
            .iter()
            .copied()
            .find(|&id| self.entry(id).name == name)
    }

    /// Resolve an array variable to its element record type.
    pub fn element_record(&self, array: SymbolId) -> Option<SymbolId> {
        let DataType::Named(type_name) = &self.entry(array).data_type else {
            return None;
        };
        let array_type = self.lookup_global(type_name)?;
        let element = self.entry(array_type).element.as_ref()?;
        let record = self.lookup_global(element)?;
        (self.entry(record).kind == SymbolKind::RecordType).then_some(record)
    }

    pub fn update_value(&mut self, id: SymbolId, value: impl Into<String>) {
        let value = value.into();
        tracing::trace!(name = %self.entry(id).name, %value, "value updated");
        self.entry_mut(id).value = Some(value);
    }

    pub fn clear_value(&mut self, id: SymbolId) {
        self.entry_mut(id).value = None;
    }

    pub fn set_type(&mut self, id: SymbolId, data_type: DataType) {
        self.entry_mut(id).data_type = data_type;
    }

    pub fn set_array_type(&mut self, id: SymbolId, element: String, size: Option<i64>) {
        let entry = self.entry_mut(id);
        entry.element = Some(element);
        entry.size = size;
    }

    /// Record the next parameter type of `function`.
    pub fn add_param_type(&mut self, function: SymbolId, data_type: DataType) {
        self.entry_mut(function).param_types.push(data_type);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::TokenKind;

    fn ident(name: &str, line: usize) -> Token {
        Token::with_lexeme(TokenKind::Identifier, line, 1, name)
    }

    #[test]
    fn test_scopes_shadow_globals() {
        let mut table = SymbolTable::new();
        let global = table
            .add_symbol(TableEntry::new(SymbolKind::Variable, &ident("x", 1), DataType::Integer))
            .expect("global");

        table.enter_scope("f");
        let local = table
            .add_symbol(TableEntry::new(SymbolKind::Variable, &ident("x", 5), DataType::Real))
            .expect("local");

        assert_eq!(table.lookup("x"), Some(local));
        assert!(table.has_global_id("x"));
        table.exit_scope();
        assert_eq!(table.lookup("x"), Some(global));
        assert_eq!(table.get_entry("x").map(|e| e.line), Some(1));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(TableEntry::new(SymbolKind::Constant, &ident("n", 2), DataType::Integer))
            .expect("first");
        let err = table
            .add_symbol(TableEntry::new(SymbolKind::Variable, &ident("n", 3), DataType::Real))
            .unwrap_err();
        assert!(matches!(err, SymbolError::Duplicate { line: 2, .. }));
    }

    #[test]
    fn test_record_fields_and_array_element() {
        let mut table = SymbolTable::new();
        let point = table
            .add_symbol(TableEntry::new(SymbolKind::RecordType, &ident("Point", 1), DataType::Void))
            .expect("record");
        table
            .add_field(point, TableEntry::new(SymbolKind::Field, &ident("x", 1), DataType::Real))
            .expect("field");
        assert!(table
            .add_field(point, TableEntry::new(SymbolKind::Field, &ident("x", 1), DataType::Real))
            .is_err());

        let points = table
            .add_symbol(TableEntry::new(SymbolKind::ArrayType, &ident("Points", 2), DataType::Void))
            .expect("array type");
        table.set_array_type(points, "Point".into(), Some(10));

        let arr = table
            .add_symbol(TableEntry::new(
                SymbolKind::Array,
                &ident("pts", 3),
                DataType::Named("Points".into()),
            ))
            .expect("array");

        assert_eq!(table.element_record(arr), Some(point));
        assert!(table.field(point, "x").is_some());
        assert!(table.field(point, "y").is_none());
        assert!(!table.has_id("x"));
    }

    #[test]
    fn test_value_and_param_updates() {
        let mut table = SymbolTable::new();
        let f = table
            .add_symbol(TableEntry::new(SymbolKind::Function, &ident("f", 1), DataType::Void))
            .expect("function");
        table.add_param_type(f, DataType::Integer);
        table.add_param_type(f, DataType::Named("Points".into()));
        assert_eq!(table.entry(f).param_types.len(), 2);

        let v = table
            .add_symbol(TableEntry::new(SymbolKind::Variable, &ident("v", 2), DataType::Integer))
            .expect("variable");
        table.update_value(v, "7");
        assert_eq!(table.entry(v).value.as_deref(), Some("7"));
        table.clear_value(v);
        assert!(table.entry(v).value.is_none());
    }
}
