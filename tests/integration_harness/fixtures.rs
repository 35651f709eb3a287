//! Hand-encoded module payloads and harness helpers shared by the suite.
//!
//! Payload comments give the text-format equivalent of each binary.

use std::future::Future;
use std::sync::Arc;

use wast_harness::{
    EngineError, Harness, HarnessConfig, ModuleEngine, RecursionProbe, Value, WasmtimeEngine,
};

pub type Instance = <WasmtimeEngine as ModuleEngine>::Instance;

/// (module)
pub const EMPTY: &[u8] = &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

/// Truncated header: not even a magic number.
pub const MALFORMED: &[u8] = &[0x00, 0x61, 0x73, 0x6d];

/// Well-formed grammar, invalid types: a `[] -> [i32]` function whose
/// body leaves nothing on the stack.
pub const INVALID: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: [] -> [i32]
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b, // body: (empty)
];

/// (module (func (export "life") (result i32) i32.const 42))
pub const CONST42: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: [] -> [i32]
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x08, 0x01, 0x04, 0x6c, 0x69, 0x66, 0x65, 0x00, 0x00, // export "life"
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x41, 0x2a, 0x0b, // body: i32.const 42
];

/// (module (func (export "crash") unreachable))
pub const CRASH: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: [] -> []
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x09, 0x01, 0x05, 0x63, 0x72, 0x61, 0x73, 0x68, 0x00, 0x00, // export "crash"
    0x0a, 0x05, 0x01, 0x03, 0x00, 0x00, 0x0b, // body: unreachable
];

/// (module (func unreachable) (start 0)) - links fine, traps in start.
pub const START_TRAP: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: [] -> []
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x08, 0x01, 0x00, // start func 0
    0x0a, 0x05, 0x01, 0x03, 0x00, 0x00, 0x0b, // body: unreachable
];

/// (module (import "missing" "f" (func))) - nothing exports that.
pub const UNLINKABLE: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: [] -> []
    0x02, 0x0d, 0x01, 0x07, 0x6d, 0x69, 0x73, 0x73, 0x69, 0x6e, 0x67, 0x01, 0x66, 0x00,
    0x00, // import "missing" "f" (func 0)
];

/// (module (func (export "overflow") call 0)) - unbounded recursion.
pub const OVERFLOW: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: [] -> []
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x0c, 0x01, 0x08, 0x6f, 0x76, 0x65, 0x72, 0x66, 0x6c, 0x6f, 0x77, 0x00,
    0x00, // export "overflow"
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x10, 0x00, 0x0b, // body: call 0
];

/// (module (import "spectest" "global" (global i32))
///   (func (export "read") (result i32) global.get 0))
pub const SPECTEST_GLOBAL: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: [] -> [i32]
    0x02, 0x14, 0x01, 0x08, 0x73, 0x70, 0x65, 0x63, 0x74, 0x65, 0x73, 0x74, 0x06, 0x67, 0x6c,
    0x6f, 0x62, 0x61, 0x6c, 0x03, 0x7f, 0x00, // import "spectest" "global" (global i32 const)
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x08, 0x01, 0x04, 0x72, 0x65, 0x61, 0x64, 0x00, 0x00, // export "read"
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x23, 0x00, 0x0b, // body: global.get 0
];

/// (module (import "spectest" "print" (func (param i32)))
///   (func (export "log") i32.const 42 call 0))
pub const SPECTEST_PRINT: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x08, 0x02, 0x60, 0x01, 0x7f, 0x00, 0x60, 0x00, 0x00, // types: [i32]->[], []->[]
    0x02, 0x12, 0x01, 0x08, 0x73, 0x70, 0x65, 0x63, 0x74, 0x65, 0x73, 0x74, 0x05, 0x70, 0x72,
    0x69, 0x6e, 0x74, 0x00, 0x00, // import "spectest" "print" (func type 0)
    0x03, 0x02, 0x01, 0x01, // func 1 uses type 1
    0x07, 0x07, 0x01, 0x03, 0x6c, 0x6f, 0x67, 0x00, 0x01, // export "log" (func 1)
    0x0a, 0x08, 0x01, 0x06, 0x00, 0x41, 0x2a, 0x10, 0x00, 0x0b, // body: i32.const 42, call 0
];

/// (module (func (export "answer") (result i32) i32.const 42))
pub const CHAIN_A: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: [] -> [i32]
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x0a, 0x01, 0x06, 0x61, 0x6e, 0x73, 0x77, 0x65, 0x72, 0x00, 0x00, // export "answer"
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x41, 0x2a, 0x0b, // body: i32.const 42
];

/// (module (import "mod_a" "answer" (func (result i32)))
///   (func (export "relay") (result i32) call 0))
pub const CHAIN_B: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: [] -> [i32]
    0x02, 0x10, 0x01, 0x05, 0x6d, 0x6f, 0x64, 0x5f, 0x61, 0x06, 0x61, 0x6e, 0x73, 0x77, 0x65,
    0x72, 0x00, 0x00, // import "mod_a" "answer" (func type 0)
    0x03, 0x02, 0x01, 0x00, // func 1 uses type 0
    0x07, 0x09, 0x01, 0x05, 0x72, 0x65, 0x6c, 0x61, 0x79, 0x00, 0x01, // export "relay" (func 1)
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x10, 0x00, 0x0b, // body: call 0
];

/// (module (func (export "nan") (result f64) f64.const nan))
pub const NAN_F64: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7c, // type: [] -> [f64]
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x07, 0x01, 0x03, 0x6e, 0x61, 0x6e, 0x00, 0x00, // export "nan"
    0x0a, 0x0d, 0x01, 0x0b, 0x00, 0x44, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x7f,
    0x0b, // body: f64.const nan
];

/// (module (func (export "negz") (result f64) f64.const -0.0))
pub const NEG_ZERO: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7c, // type: [] -> [f64]
    0x03, 0x02, 0x01, 0x00, // func 0 uses type 0
    0x07, 0x08, 0x01, 0x04, 0x6e, 0x65, 0x67, 0x7a, 0x00, 0x00, // export "negz"
    0x0a, 0x0d, 0x01, 0x0b, 0x00, 0x44, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80,
    0x0b, // body: f64.const -0.0
];

/// Harness with a fresh engine, default (lenient) configuration.
pub async fn harness() -> Harness<WasmtimeEngine> {
    Harness::with_engine(
        Arc::new(WasmtimeEngine::new().expect("engine")),
        &RecursionProbe,
        HarnessConfig::default(),
    )
    .await
    .expect("harness")
}

/// Harness with soft validation enabled.
pub async fn strict_soft_harness() -> Harness<WasmtimeEngine> {
    Harness::with_engine(
        Arc::new(WasmtimeEngine::new().expect("engine")),
        &RecursionProbe,
        HarnessConfig {
            soft_validate: true,
        },
    )
    .await
    .expect("harness")
}

/// A `'static` action invoking a nullary export, for directive handlers.
pub fn invoke0(
    engine: &Arc<WasmtimeEngine>,
    instance: &Instance,
    field: &str,
) -> impl Future<Output = Result<Vec<Value>, EngineError>> + Send + 'static {
    let engine = Arc::clone(engine);
    let instance = instance.clone();
    let field = field.to_string();
    async move {
        let exports = engine.exports(&instance);
        engine.invoke(&exports, &field, &[]).await
    }
}
