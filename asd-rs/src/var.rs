//! Script variable store.
//!
//! One store exists per script run.  Entries are created by assignment or by
//! statements that auto-initialise a missing counter to `0`; nothing removes
//! them.  Names are case-sensitive identifiers.

use std::collections::BTreeMap;

use crate::script::value::Value;

/// Reserved name holding the lines loaded by `READFILE`.
pub const FILE_VAR: &str = "__FILE__";

/// Identifier → [`Value`] mapping, iterated in name order.
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    vars: BTreeMap<String, Value>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Mutable access, creating the variable as `0` when it does not exist.
    pub fn get_or_zero(&mut self, name: &str) -> &mut Value {
        self.vars.entry(name.to_owned()).or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
