//! The engine seam.
//!
//! Everything the harness needs from a module-execution engine fits in
//! one trait: verdicts, handles, export sets, invocation. The harness
//! treats all of it as a black box; categorizing failures is the one
//! obligation the trait places on an implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::value::Value;

/// Two-level import namespace: module name -> named export set.
pub type Imports<X> = BTreeMap<String, X>;

/// Namespace name of the built-in testing export set.
pub const SPECTEST: &str = "spectest";

/// A raw export looked up without invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportValue {
    /// An exported global's current value.
    Global(Value),
    /// An exported memory, reported by its current page count.
    Memory { pages: u64 },
    /// An exported table, reported by its current element count.
    Table { size: u64 },
    /// An exported function (not invoked here).
    Func,
}

/// Narrow surface of an external compile/validate/instantiate/execute
/// pipeline.
#[async_trait]
pub trait ModuleEngine: Send + Sync + 'static {
    /// Opaque validated-module artifact. Exists only if validation
    /// succeeded.
    type Module: Clone + Send + Sync + 'static;
    /// Opaque instance artifact bound to a module and an import object.
    type Instance: Clone + Send + Sync + 'static;
    /// Named export set of an instance (or of a synthetic host module).
    type Exports: Clone + Send + Sync + 'static;

    /// Validation verdict for a byte payload. An `Err` return is a
    /// harness-internal failure, not a `false` verdict.
    async fn validate(&self, bytes: &[u8]) -> Result<bool, EngineError>;

    /// Full parse/compile. Rejects with [`EngineError::Compile`] on
    /// malformed or invalid input.
    async fn compile(&self, bytes: &[u8]) -> Result<Self::Module, EngineError>;

    /// Instantiate a module against an import object. Rejects with
    /// [`EngineError::Link`] on import mismatch or
    /// [`EngineError::Runtime`] on a trap during start.
    async fn instantiate(
        &self,
        module: &Self::Module,
        imports: &Imports<Self::Exports>,
    ) -> Result<Self::Instance, EngineError>;

    /// The named export set of an instance.
    fn exports(&self, instance: &Self::Instance) -> Self::Exports;

    /// Invoke a function export with positional arguments. Rejects with
    /// [`EngineError::Runtime`] on trap, [`EngineError::Internal`] on an
    /// unknown or non-function export.
    async fn invoke(
        &self,
        exports: &Self::Exports,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, EngineError>;

    /// Look up a raw export without invoking it.
    async fn get(&self, exports: &Self::Exports, name: &str) -> Result<ExportValue, EngineError>;

    /// The fixed built-in testing export set: a print function, an i32
    /// const global of 666, a funcref table (10, max 20) and a memory
    /// (1 page, max 2).
    fn spectest(&self) -> Result<Self::Exports, EngineError>;
}
