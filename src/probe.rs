//! Resource-exhaustion capability probe.
//!
//! Which trap category a platform reports for exhausted call stacks is
//! not assumed: it is detected once at harness startup by provoking
//! unbounded recursion and capturing the category the engine reports.
//! Platforms without stack-overflow-as-trap semantics supply their own
//! probe implementation.

use async_trait::async_trait;

use crate::engine::{Imports, ModuleEngine};
use crate::error::{EngineError, TrapSignature};

/// One-shot detection of the platform's exhaustion trap category.
#[async_trait]
pub trait ExhaustionProbe<E: ModuleEngine>: Send + Sync {
    async fn detect(&self, engine: &E) -> Result<TrapSignature, EngineError>;
}

/// Hand-encoded module with a single self-recursive export:
/// `(module (func (export "overflow") call 0))`.
const RECURSION_MODULE: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: [] -> []
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x0c, 0x01, 0x08, 0x6f, 0x76, 0x65, 0x72, 0x66, 0x6c, 0x6f, 0x77, 0x00,
    0x00, // export "overflow"
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x10, 0x00, 0x0b, // body: call 0
];

/// Default probe: run the recursive module until the stack gives out and
/// capture the trap signature of the resulting runtime error.
pub struct RecursionProbe;

#[async_trait]
impl<E: ModuleEngine> ExhaustionProbe<E> for RecursionProbe {
    async fn detect(&self, engine: &E) -> Result<TrapSignature, EngineError> {
        let module = engine.compile(RECURSION_MODULE).await?;
        let instance = engine.instantiate(&module, &Imports::new()).await?;
        let exports = engine.exports(&instance);
        match engine.invoke(&exports, "overflow", &[]).await {
            Err(EngineError::Runtime {
                trap: Some(signature),
                ..
            }) => {
                tracing::debug!(target: "wast_harness", %signature, "exhaustion signature probed");
                Ok(signature)
            }
            Err(EngineError::Runtime { trap: None, message }) => Err(EngineError::internal(
                format!("exhaustion probe trapped without a category: {message}"),
            )),
            Err(other) => Err(EngineError::internal(format!(
                "exhaustion probe failed before trapping: {other}"
            ))),
            Ok(_) => Err(EngineError::internal(
                "exhaustion probe returned instead of trapping",
            )),
        }
    }
}
