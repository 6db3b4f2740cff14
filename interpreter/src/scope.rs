use std::collections::HashMap;

use crate::runtime_value::{NativeFunction, RuntimeValue};

/// The mutable variable mapping code runs against.
///
/// One scope is threaded through every code segment of a document, so later
/// segments see what earlier ones defined. Nothing resets it mid-render.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, RuntimeValue>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    /// A scope pre-populated with every entry of a JSON object.
    pub fn from_json(entries: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut scope = Scope::new();
        for (name, value) in entries {
            scope.set(name.clone(), RuntimeValue::from(value.clone()));
        }
        scope
    }

    pub fn get(&self, name: &str) -> Option<&RuntimeValue> {
        self.variables.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: RuntimeValue) {
        self.variables.insert(name.into(), value);
    }

    pub fn define_native(&mut self, function: NativeFunction) {
        self.variables
            .insert(function.name().to_string(), RuntimeValue::Native(function));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }
}
