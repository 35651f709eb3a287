//! Conformance-directive harness.
//!
//! Bridges declarative module-conformance directives ("these bytes must
//! fail to validate", "invoking this export must return this value") to
//! a native Wasm engine reached through the [`engine::ModuleEngine`]
//! seam. The harness sequences the pipeline and asserts on observable
//! outcomes; it owns no parsing, validation or execution semantics.

pub mod builders;
pub mod context;
pub mod engine;
pub mod error;
pub mod harness;
pub mod payload;
pub mod probe;
pub mod runner;
pub mod script;
pub mod value;
pub mod wasmtime_engine;

pub use builders::{build_instance, build_module, call, exports_of, get, ImportSource};
pub use context::TestContext;
pub use engine::{ExportValue, Imports, ModuleEngine, SPECTEST};
pub use error::{EngineError, ErrorKind, TrapSignature};
pub use harness::{assert_error_message, Harness, HarnessConfig, MessageTest};
pub use probe::{ExhaustionProbe, RecursionProbe};
pub use runner::{ensure, CaseReport, CaseStatus, RunReport, Runner};
pub use script::{run_script, ActionSpec, Script, ScriptValue, Stmt};
pub use value::{format_values, Value};
pub use wasmtime_engine::WasmtimeEngine;
