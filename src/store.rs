//! The binding store: named matrices and tables shared between commands.

use std::{
    collections::HashMap,
    fmt,
    sync::LazyLock,
};

use log::debug;
use regex::Regex;

use crate::{config::Limits, value::Value};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name pattern is valid"));

/// Errors raised when validating names or inserting bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Name is empty or whitespace
    EmptyName,

    /// Name exceeds the configured maximum length
    NameTooLong { name: String, max: usize },

    /// Name contains characters outside `[A-Za-z0-9_]` or starts with a digit
    InvalidName(String),

    /// The matrix ceiling has been reached
    MatrixLimit(usize),

    /// The table ceiling has been reached
    TableLimit(usize),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::EmptyName => write!(f, "Name can't be empty"),
            StoreError::NameTooLong { name, max } => write!(
                f,
                "Name '{}' is too long ({} characters, at most {} allowed)",
                name,
                name.chars().count(),
                max
            ),
            StoreError::InvalidName(name) => write!(
                f,
                "Invalid name '{}': use letters, digits and '_', not starting with a digit",
                name
            ),
            StoreError::MatrixLimit(max) => {
                write!(f, "Matrix limit reached: at most {} matrices can be stored", max)
            }
            StoreError::TableLimit(max) => {
                write!(f, "Table limit reached: at most {} tables can be stored", max)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Checks only the identifier syntax, not the length.
pub fn is_identifier(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

pub fn is_valid_name(name: &str, max_length: usize) -> bool {
    validate_name(name, max_length).is_ok()
}

/// Like [`is_valid_name`], but reports why a name was rejected.
pub fn validate_name(name: &str, max_length: usize) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    if name.chars().count() > max_length {
        return Err(StoreError::NameTooLong {
            name: name.to_string(),
            max: max_length,
        });
    }
    if !is_identifier(name) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Name -> matrix/table map with capacity ceilings.
///
/// A command evaluates against its own copy of the store; the session
/// keeps the copy only when the command didn't fail.
#[derive(Debug, Clone, Default)]
pub struct BindingStore {
    entries: HashMap<String, Value>,
    limits: Limits,
}

impl BindingStore {
    pub fn new(limits: Limits) -> Self {
        BindingStore {
            entries: HashMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `(matrix_count, table_count)`.
    pub fn count_by_category(&self) -> (usize, usize) {
        let tables = self.entries.values().filter(|v| v.is_table()).count();
        (self.entries.len() - tables, tables)
    }

    /// Adds a new binding after validating the name and the ceiling for the
    /// value's category. Inserting an existing name replaces it instead.
    pub fn insert(&mut self, name: &str, value: Value) -> Result<(), StoreError> {
        if self.contains(name) {
            self.replace(name, value);
            return Ok(());
        }

        validate_name(name, self.limits.max_name_length)?;

        let (matrices, tables) = self.count_by_category();
        if value.is_table() {
            if tables >= self.limits.max_tables {
                return Err(StoreError::TableLimit(self.limits.max_tables));
            }
        } else if matrices >= self.limits.max_matrices {
            return Err(StoreError::MatrixLimit(self.limits.max_matrices));
        }

        debug!("binding new {} '{}'", value.type_name(), name);
        self.entries.insert(name.to_string(), value);
        Ok(())
    }

    /// Overwrites an existing binding; returns false if the name is unknown.
    pub fn replace(&mut self, name: &str, value: Value) -> bool {
        match self.entries.get_mut(name) {
            Some(slot) => {
                debug!("replacing '{}' with a {}", name, value.type_name());
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    /// Binding names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Matrix, Table};

    fn limits(max_matrices: usize, max_tables: usize) -> Limits {
        Limits {
            max_matrices,
            max_tables,
            max_name_length: 8,
            ..Limits::default()
        }
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("A_1", 8));
        assert_eq!(validate_name("", 8), Err(StoreError::EmptyName));
        assert_eq!(validate_name("1abc", 8), Err(StoreError::InvalidName("1abc".into())));
        assert!(matches!(
            validate_name("abcdefghij", 8),
            Err(StoreError::NameTooLong { max: 8, .. })
        ));
    }

    #[test]
    fn test_ceilings_are_per_category() {
        let mut store = BindingStore::new(limits(1, 1));
        store.insert("a", Matrix::scalar(1.0).into()).unwrap();
        assert_eq!(
            store.insert("b", Matrix::scalar(2.0).into()),
            Err(StoreError::MatrixLimit(1))
        );

        let table = Table::from_matrix(Matrix::scalar(3.0));
        store.insert("t", table.clone().into()).unwrap();
        assert_eq!(store.insert("u", table.into()), Err(StoreError::TableLimit(1)));
        assert_eq!(store.count_by_category(), (1, 1));
    }

    #[test]
    fn test_replacing_does_not_count() {
        let mut store = BindingStore::new(limits(1, 0));
        store.insert("a", Matrix::scalar(1.0).into()).unwrap();
        store.insert("a", Matrix::scalar(5.0).into()).unwrap();
        assert_eq!(store.get("a"), Some(&Value::Matrix(Matrix::scalar(5.0))));
        assert!(!store.replace("missing", Matrix::scalar(0.0).into()));
    }
}
