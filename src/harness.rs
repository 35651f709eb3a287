//! Directive handlers.
//!
//! Each handler registers exactly one async case with the runner and
//! asserts a specific terminal outcome: a rejection of a particular
//! kind, or a resolution matching an expected value. Handlers never
//! retry and are not cancellable; diagnostics always carry
//! expected-vs-observed text.

use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use regex::Regex;

use crate::builders::build_module;
use crate::context::TestContext;
use crate::engine::{Imports, ModuleEngine};
use crate::error::{EngineError, ErrorKind, TrapSignature};
use crate::probe::{ExhaustionProbe, RecursionProbe};
use crate::runner::{ensure, Runner};
use crate::value::{format_values, Value};
use crate::wasmtime_engine::WasmtimeEngine;

/// Harness configuration.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Engine-leniency shim: when off, `assert_soft_invalid` passes
    /// unconditionally. Preserved as configuration, not inferred intent.
    pub soft_validate: bool,
}

impl HarnessConfig {
    /// Load configuration from the environment.
    ///
    /// - WAST_HARNESS_SOFT_VALIDATE: enable strict soft-invalid checks
    ///   (default: off)
    pub fn from_env() -> Self {
        let raw = std::env::var("WAST_HARNESS_SOFT_VALIDATE").unwrap_or_default();
        Self {
            soft_validate: matches!(raw.as_str(), "1" | "true" | "TRUE" | "yes" | "on"),
        }
    }
}

/// One directive suite against one engine: the engine handle, the
/// namespace registry, the probed exhaustion signature and the config.
pub struct Harness<E: ModuleEngine> {
    engine: Arc<E>,
    context: TestContext<E>,
    exhaustion: TrapSignature,
    config: HarnessConfig,
}

impl Harness<WasmtimeEngine> {
    /// Wasmtime-backed harness with the default recursion probe and
    /// env-loaded configuration.
    pub async fn new() -> anyhow::Result<Self> {
        let engine = Arc::new(WasmtimeEngine::new()?);
        let harness =
            Self::with_engine(engine, &RecursionProbe, HarnessConfig::from_env()).await?;
        Ok(harness)
    }
}

impl<E: ModuleEngine> Harness<E> {
    pub async fn with_engine(
        engine: Arc<E>,
        probe: &dyn ExhaustionProbe<E>,
        config: HarnessConfig,
    ) -> Result<Self, EngineError> {
        let context = TestContext::new(engine.as_ref())?;
        let exhaustion = probe.detect(engine.as_ref()).await?;
        Ok(Self {
            engine,
            context,
            exhaustion,
            config,
        })
    }

    pub fn engine(&self) -> Arc<E> {
        Arc::clone(&self.engine)
    }

    pub fn context(&self) -> &TestContext<E> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TestContext<E> {
        &mut self.context
    }

    pub fn exhaustion_signature(&self) -> &TrapSignature {
        &self.exhaustion
    }

    /// The payload must fail validation and compilation.
    pub async fn assert_invalid(&self, runner: &mut Runner, name: &str, payload: &[u8]) -> bool {
        let engine = Arc::clone(&self.engine);
        let payload = payload.to_vec();
        runner
            .case(name, async move {
                match build_module(engine.as_ref(), &payload, false).await {
                    Err(err) if err.kind() == ErrorKind::Compile => Ok(()),
                    Err(err) => Err(anyhow!(
                        "expected a compile error, observed {} ({err})",
                        err.code()
                    )),
                    Ok(_) => Err(anyhow!("expected a compile error, module was built")),
                }
            })
            .await
            .passed()
    }

    /// Same drive and expectation as [`Harness::assert_invalid`]; kept as
    /// a separate directive name because scripts distinguish grammar
    /// failures from validation failures.
    pub async fn assert_malformed(&self, runner: &mut Runner, name: &str, payload: &[u8]) -> bool {
        self.assert_invalid(runner, name, payload).await
    }

    /// With soft validation on, behaves as `assert_invalid`; with it off
    /// the directive passes regardless of the builder's outcome.
    pub async fn assert_soft_invalid(
        &self,
        runner: &mut Runner,
        name: &str,
        payload: &[u8],
    ) -> bool {
        if self.config.soft_validate {
            return self.assert_invalid(runner, name, payload).await;
        }
        let engine = Arc::clone(&self.engine);
        let payload = payload.to_vec();
        runner
            .case(name, async move {
                let _ = build_module(engine.as_ref(), &payload, false).await;
                Ok(())
            })
            .await
            .passed()
    }

    /// The payload must compile but fail to link against the registry.
    pub async fn assert_unlinkable(&self, runner: &mut Runner, name: &str, payload: &[u8]) -> bool {
        let engine = Arc::clone(&self.engine);
        let imports = self.context.snapshot();
        let payload = payload.to_vec();
        runner
            .case(name, async move {
                match instantiate_with(engine, imports, payload).await {
                    Err(err) if err.kind() == ErrorKind::Link => Ok(()),
                    Err(err) => Err(anyhow!(
                        "expected a link error, observed {} ({err})",
                        err.code()
                    )),
                    Ok(_) => Err(anyhow!("expected a link error, instance was built")),
                }
            })
            .await
            .passed()
    }

    /// The payload must link but trap while instantiating.
    pub async fn assert_uninstantiable(
        &self,
        runner: &mut Runner,
        name: &str,
        payload: &[u8],
    ) -> bool {
        let engine = Arc::clone(&self.engine);
        let imports = self.context.snapshot();
        let payload = payload.to_vec();
        runner
            .case(name, async move {
                match instantiate_with(engine, imports, payload).await {
                    Err(err) if err.kind() == ErrorKind::Runtime => Ok(()),
                    Err(err) => Err(anyhow!(
                        "expected a runtime error, observed {} ({err})",
                        err.code()
                    )),
                    Ok(_) => Err(anyhow!("expected a runtime error, instance was built")),
                }
            })
            .await
            .passed()
    }

    /// The action must reject with a runtime error.
    pub async fn assert_trap<F>(&self, runner: &mut Runner, name: &str, action: F) -> bool
    where
        F: Future<Output = Result<Vec<Value>, EngineError>> + Send + 'static,
    {
        runner
            .case(name, async move {
                match action.await {
                    Err(err) if err.kind() == ErrorKind::Runtime => Ok(()),
                    Err(err) => Err(anyhow!(
                        "expected a runtime error, observed {} ({err})",
                        err.code()
                    )),
                    Ok(values) => Err(anyhow!(
                        "expected a runtime error, action resolved with {}",
                        format_values(&values)
                    )),
                }
            })
            .await
            .passed()
    }

    /// The action must reject with the probed exhaustion signature.
    pub async fn assert_exhaustion<F>(&self, runner: &mut Runner, name: &str, action: F) -> bool
    where
        F: Future<Output = Result<Vec<Value>, EngineError>> + Send + 'static,
    {
        let expected = self.exhaustion.clone();
        runner
            .case(name, async move {
                match action.await {
                    Err(EngineError::Runtime {
                        trap: Some(signature),
                        ..
                    }) => ensure(
                        signature == expected,
                        format!(
                            "expected exhaustion signature `{expected}`, observed `{signature}`"
                        ),
                    ),
                    Err(err) => Err(anyhow!(
                        "expected exhaustion `{expected}`, observed {} ({err})",
                        err.code()
                    )),
                    Ok(values) => Err(anyhow!(
                        "expected exhaustion, action resolved with {}",
                        format_values(&values)
                    )),
                }
            })
            .await
            .passed()
    }

    /// The action must resolve with results identical to `expected`
    /// under same-value semantics.
    pub async fn assert_return<F>(
        &self,
        runner: &mut Runner,
        name: &str,
        action: F,
        expected: Vec<Value>,
    ) -> bool
    where
        F: Future<Output = Result<Vec<Value>, EngineError>> + Send + 'static,
    {
        runner
            .case(name, async move {
                let observed = action.await.map_err(|err| {
                    anyhow!(
                        "expected {}, action rejected: {err}",
                        format_values(&expected)
                    )
                })?;
                let matches = observed.len() == expected.len()
                    && observed
                        .iter()
                        .zip(&expected)
                        .all(|(obs, exp)| obs.same_value(exp));
                ensure(
                    matches,
                    format!(
                        "expected {}, observed {}",
                        format_values(&expected),
                        format_values(&observed)
                    ),
                )
            })
            .await
            .passed()
    }

    /// The action must resolve with a single NaN.
    pub async fn assert_return_nan<F>(&self, runner: &mut Runner, name: &str, action: F) -> bool
    where
        F: Future<Output = Result<Vec<Value>, EngineError>> + Send + 'static,
    {
        runner
            .case(name, async move {
                let observed = action
                    .await
                    .map_err(|err| anyhow!("expected NaN, action rejected: {err}"))?;
                ensure(
                    observed.len() == 1 && observed[0].is_nan(),
                    format!("expected NaN, observed {}", format_values(&observed)),
                )
            })
            .await
            .passed()
    }
}

async fn instantiate_with<E: ModuleEngine>(
    engine: Arc<E>,
    imports: Imports<E::Exports>,
    payload: Vec<u8>,
) -> Result<E::Instance, EngineError> {
    let module = build_module(engine.as_ref(), &payload, true).await?;
    engine.instantiate(&module, &imports).await
}

/// How an expected error message is checked.
pub enum MessageTest {
    Literal(String),
    Pattern(Regex),
}

/// Synchronous variant: `f` must return an error of the given kind whose
/// message satisfies `test`. A successful return fails immediately.
pub fn assert_error_message<T>(
    f: impl FnOnce() -> Result<T, EngineError>,
    kind: ErrorKind,
    test: &MessageTest,
) -> anyhow::Result<()> {
    match f() {
        Ok(_) => Err(anyhow!("expected a {kind} error, call succeeded")),
        Err(err) => {
            ensure(
                err.kind() == kind,
                format!("expected a {kind} error, observed {} ({err})", err.kind()),
            )?;
            let message = err.message();
            match test {
                MessageTest::Literal(text) => ensure(
                    message == text,
                    format!("expected message `{text}`, observed `{message}`"),
                ),
                MessageTest::Pattern(pattern) => ensure(
                    pattern.is_match(message),
                    format!("expected message matching `{pattern}`, observed `{message}`"),
                ),
            }
        }
    }
}
