//! Module and instance construction, and export access helpers.
//!
//! The documented sequencing is strict: validate, diagnose on verdict
//! mismatch, compile, resolve imports, instantiate. Any rejection
//! short-circuits the remaining steps and propagates.

use std::fmt::Write as _;
use std::future::Future;

use futures_util::future::BoxFuture;

use crate::context::TestContext;
use crate::engine::{ExportValue, Imports, ModuleEngine};
use crate::error::EngineError;
use crate::value::Value;

/// Where an instantiation's import object comes from.
pub enum ImportSource<E: ModuleEngine> {
    /// Snapshot of the context registry at instantiation time.
    Registry,
    /// A fixed import object.
    Static(Imports<E::Exports>),
    /// A producer resolved only after the module handle exists.
    Deferred(Box<dyn FnOnce() -> BoxFuture<'static, Result<Imports<E::Exports>, EngineError>> + Send>),
}

/// Validate then compile a payload, expecting the given verdict.
///
/// A validator call that itself fails is a harness-internal error. A
/// verdict that contradicts `expected_valid` rejects with a diagnostic
/// enriched by a best-effort compile. A compile failure forwards the
/// engine's own error only when the payload was expected to be invalid;
/// otherwise it is wrapped as an unexpected failure.
pub async fn build_module<E: ModuleEngine>(
    engine: &E,
    payload: &[u8],
    expected_valid: bool,
) -> Result<E::Module, EngineError> {
    let verdict = engine
        .validate(payload)
        .await
        .map_err(|err| EngineError::internal(format!("validator failed: {err}")))?;

    if verdict != expected_valid {
        let mut diagnostic =
            format!("validate returned {verdict}, expected {expected_valid}");
        if let Err(err) = engine.compile(payload).await {
            let _ = write!(diagnostic, "; compile said: {err}");
        }
        return Err(EngineError::internal(diagnostic));
    }

    match engine.compile(payload).await {
        Ok(module) => Ok(module),
        Err(err) if expected_valid => Err(EngineError::internal(format!(
            "unexpected compile failure: {err}"
        ))),
        Err(err) => Err(err),
    }
}

/// Build a module (expected valid), resolve the import source, then
/// instantiate. The deferred producer is not invoked until the module
/// handle exists.
pub async fn build_instance<E: ModuleEngine>(
    engine: &E,
    ctx: &TestContext<E>,
    payload: &[u8],
    source: ImportSource<E>,
) -> Result<E::Instance, EngineError> {
    let module = build_module(engine, payload, true).await?;
    let imports = match source {
        ImportSource::Registry => ctx.snapshot(),
        ImportSource::Static(imports) => imports,
        ImportSource::Deferred(producer) => producer().await?,
    };
    engine.instantiate(&module, &imports).await
}

/// Await an instance, then invoke one of its function exports.
pub async fn call<E, F>(
    engine: &E,
    instance: F,
    name: &str,
    args: &[Value],
) -> Result<Vec<Value>, EngineError>
where
    E: ModuleEngine,
    F: Future<Output = Result<E::Instance, EngineError>>,
{
    let instance = instance.await?;
    let exports = engine.exports(&instance);
    engine.invoke(&exports, name, args).await
}

/// Await an instance, then read one of its exports without invocation.
pub async fn get<E, F>(engine: &E, instance: F, name: &str) -> Result<ExportValue, EngineError>
where
    E: ModuleEngine,
    F: Future<Output = Result<E::Instance, EngineError>>,
{
    let instance = instance.await?;
    let exports = engine.exports(&instance);
    engine.get(&exports, name).await
}

/// Await an instance and stage its export set under `name`, ready to be
/// merged into a later instantiation's import object.
pub async fn exports_of<E, F>(
    engine: &E,
    name: &str,
    instance: F,
) -> Result<Imports<E::Exports>, EngineError>
where
    E: ModuleEngine,
    F: Future<Output = Result<E::Instance, EngineError>>,
{
    let instance = instance.await?;
    let mut imports = Imports::new();
    imports.insert(name.to_string(), engine.exports(&instance));
    Ok(imports)
}
