use super::vm::Segment;
use crate::error::CodegenError;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Static,
    Field,
    Argument,
    Local,
}

impl StorageClass {
    /// The VM memory segment variables of this class live in.
    pub fn segment(self) -> Segment {
        match self {
            Self::Static => Segment::Static,
            Self::Field => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local => Segment::Local,
        }
    }

    fn counter_slot(self) -> usize {
        match self {
            Self::Static => 0,
            Self::Field => 1,
            Self::Argument => 2,
            Self::Local => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// The declared type name, `int` or a class name.
    pub typ: String,
    pub storage: StorageClass,
    pub index: usize,
}

/// Names declared in one scope. Indices are handed out per storage class, starting at 0, in
/// declaration order, and are never reused until the table is cleared.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    /// Used to label errors, e.g. `Main` or `Main.run`.
    scope: String,
    symbols: HashMap<String, Symbol>,
    counters: [usize; 4],
}

impl SymbolTable {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            symbols: HashMap::new(),
            counters: [0; 4],
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Declares `name` and returns the slot it was given. Declaring a name twice in the same
    /// table is an error.
    pub fn add(
        &mut self,
        name: &str,
        typ: &str,
        storage: StorageClass,
    ) -> Result<usize, CodegenError> {
        if self.symbols.contains_key(name) {
            return Err(CodegenError::DuplicateSymbol {
                name: name.to_owned(),
                scope: self.scope.clone(),
            });
        }
        let counter = &mut self.counters[storage.counter_slot()];
        let index = *counter;
        *counter += 1;
        self.symbols.insert(
            name.to_owned(),
            Symbol {
                name: name.to_owned(),
                typ: typ.to_owned(),
                storage,
                index,
            },
        );
        Ok(index)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// How many symbols of the given storage class have been declared.
    pub fn count(&self, storage: StorageClass) -> usize {
        self.counters[storage.counter_slot()]
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.counters = [0; 4];
    }

    /// Clears the table and relabels it for a new scope.
    pub fn reset(&mut self, scope: impl Into<String>) {
        self.clear();
        self.scope = scope.into();
    }
}
