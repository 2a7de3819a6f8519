//! Built-in aggregate functions

pub mod math;

use ahash::AHashMap;
use linksheet_core::{CellRange, CellStore};

use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;

/// Function implementation signature
///
/// Functions receive the range exactly as written and read the store
/// through its row chains.
pub type FunctionImpl = fn(&CellRange, &CellStore) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|def| def.name).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "SUM",
            implementation: math::fn_sum,
        });
        self.register(FunctionDef {
            name: "MIN",
            implementation: math::fn_min,
        });
        self.register(FunctionDef {
            name: "MAX",
            implementation: math::fn_max,
        });
        self.register(FunctionDef {
            name: "AVG",
            implementation: math::fn_avg,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
