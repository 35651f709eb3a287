//! JSON directive scripts.
//!
//! A script is a sequence of statements executed in order against one
//! harness: instantiate a module, register it under a namespace, and
//! assert on invocation outcomes. Module payloads are embedded either as
//! code-point text or base64.

use std::collections::HashMap;
use std::future::{ready, Future};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::future::Either;
use serde::Deserialize;

use crate::builders::{build_instance, ImportSource};
use crate::engine::{ExportValue, ModuleEngine};
use crate::error::EngineError;
use crate::harness::Harness;
use crate::payload;
use crate::runner::Runner;
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default = "default_suite")]
    pub suite: String,
    pub statements: Vec<Stmt>,
}

fn default_suite() -> String {
    "wast".to_string()
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse script JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read script: {}", path.display()))?;
        Self::from_json(&text)
    }
}

/// An embedded module payload: code-point text or base64. Text wins if
/// both are present.
#[derive(Debug, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub base64: Option<String>,
}

impl Payload {
    pub fn decode(&self) -> Result<Vec<u8>> {
        match (&self.text, &self.base64) {
            (Some(text), _) => Ok(payload::decode(text)),
            (None, Some(b64)) => payload::decode_base64(b64),
            (None, None) => bail!("statement carries no payload"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpec {
    Invoke {
        #[serde(default)]
        module: Option<String>,
        field: String,
        #[serde(default)]
        args: Vec<ScriptValue>,
    },
    Get {
        #[serde(default)]
        module: Option<String>,
        field: String,
    },
}

impl ActionSpec {
    fn module(&self) -> Option<&str> {
        match self {
            ActionSpec::Invoke { module, .. } | ActionSpec::Get { module, .. } => module.as_deref(),
        }
    }

    fn field(&self) -> &str {
        match self {
            ActionSpec::Invoke { field, .. } | ActionSpec::Get { field, .. } => field,
        }
    }
}

/// A typed immediate. Floats carry bit patterns as decimal strings so
/// NaN payloads and signed zeros survive JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptValue {
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

impl ScriptValue {
    pub fn to_value(&self) -> Result<Value> {
        let raw = self.value.as_str();
        match self.ty.as_str() {
            "i32" => {
                let bits = raw
                    .parse::<u32>()
                    .or_else(|_| raw.parse::<i32>().map(|v| v as u32))
                    .with_context(|| format!("parse i32 immediate `{raw}`"))?;
                Ok(Value::I32(bits as i32))
            }
            "i64" => {
                let bits = raw
                    .parse::<u64>()
                    .or_else(|_| raw.parse::<i64>().map(|v| v as u64))
                    .with_context(|| format!("parse i64 immediate `{raw}`"))?;
                Ok(Value::I64(bits as i64))
            }
            "f32" => {
                let bits = raw
                    .parse::<u32>()
                    .with_context(|| format!("parse f32 bit pattern `{raw}`"))?;
                Ok(Value::F32(bits))
            }
            "f64" => {
                let bits = raw
                    .parse::<u64>()
                    .with_context(|| format!("parse f64 bit pattern `{raw}`"))?;
                Ok(Value::F64(bits))
            }
            other => bail!("unknown value type `{other}`"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stmt {
    Module {
        #[serde(default)]
        name: Option<String>,
        #[serde(flatten)]
        payload: Payload,
    },
    Register {
        #[serde(rename = "as")]
        alias: String,
        #[serde(default)]
        name: Option<String>,
    },
    Action {
        action: ActionSpec,
    },
    AssertReturn {
        action: ActionSpec,
        #[serde(default)]
        expected: Vec<ScriptValue>,
    },
    AssertReturnNan {
        action: ActionSpec,
    },
    AssertTrap {
        action: ActionSpec,
    },
    AssertExhaustion {
        action: ActionSpec,
    },
    AssertInvalid {
        #[serde(flatten)]
        payload: Payload,
    },
    AssertMalformed {
        #[serde(flatten)]
        payload: Payload,
    },
    AssertSoftInvalid {
        #[serde(flatten)]
        payload: Payload,
    },
    AssertUnlinkable {
        #[serde(flatten)]
        payload: Payload,
    },
    AssertUninstantiable {
        #[serde(flatten)]
        payload: Payload,
    },
}

fn resolve_instance<'a, I>(
    module: Option<&str>,
    current: &'a Option<I>,
    named: &'a HashMap<String, I>,
) -> Result<&'a I> {
    match module {
        Some(name) => named
            .get(name)
            .ok_or_else(|| anyhow!("unknown module name `{name}`")),
        None => current
            .as_ref()
            .ok_or_else(|| anyhow!("no module instantiated yet")),
    }
}

fn action_future<E: ModuleEngine>(
    engine: Arc<E>,
    instance: E::Instance,
    action: &ActionSpec,
) -> Result<impl Future<Output = Result<Vec<Value>, EngineError>> + Send + 'static> {
    match action {
        ActionSpec::Invoke { field, args, .. } => {
            let field = field.clone();
            let args: Vec<Value> = args
                .iter()
                .map(ScriptValue::to_value)
                .collect::<Result<_>>()?;
            Ok(Either::Left(async move {
                let exports = engine.exports(&instance);
                engine.invoke(&exports, &field, &args).await
            }))
        }
        ActionSpec::Get { field, .. } => {
            let field = field.clone();
            Ok(Either::Right(async move {
                let exports = engine.exports(&instance);
                match engine.get(&exports, &field).await? {
                    ExportValue::Global(value) => Ok(vec![value]),
                    other => Err(EngineError::internal(format!(
                        "get target `{field}` is not a global ({other:?})"
                    ))),
                }
            }))
        }
    }
}

/// Execute every statement in order. Assertion directives record cases
/// on the runner; a failing `module`/`register`/`action` statement is a
/// script error and aborts the run.
pub async fn run_script<E: ModuleEngine>(
    harness: &mut Harness<E>,
    runner: &mut Runner,
    script: &Script,
) -> Result<()> {
    let engine = harness.engine();
    let mut current: Option<E::Instance> = None;
    let mut named: HashMap<String, E::Instance> = HashMap::new();

    for (index, stmt) in script.statements.iter().enumerate() {
        match stmt {
            Stmt::Module { name, payload } => {
                let bytes = payload
                    .decode()
                    .with_context(|| format!("statement {index}: module payload"))?;
                let instance = build_instance(
                    engine.as_ref(),
                    harness.context(),
                    &bytes,
                    ImportSource::Registry,
                )
                .await
                .map_err(|err| anyhow!("statement {index}: module failed: {err}"))?;
                if let Some(name) = name {
                    named.insert(name.clone(), instance.clone());
                }
                current = Some(instance);
            }
            Stmt::Register { alias, name } => {
                let instance = resolve_instance(name.as_deref(), &current, &named)
                    .with_context(|| format!("statement {index}: register"))?
                    .clone();
                harness
                    .context_mut()
                    .register(engine.as_ref(), alias, ready(Ok(instance)))
                    .await
                    .map_err(|err| anyhow!("statement {index}: register failed: {err}"))?;
            }
            Stmt::Action { action } => {
                let instance = resolve_instance(action.module(), &current, &named)
                    .with_context(|| format!("statement {index}: action"))?
                    .clone();
                action_future(Arc::clone(&engine), instance, action)?
                    .await
                    .map_err(|err| anyhow!("statement {index}: action failed: {err}"))?;
            }
            Stmt::AssertReturn { action, expected } => {
                let instance = resolve_instance(action.module(), &current, &named)
                    .with_context(|| format!("statement {index}: assert_return"))?
                    .clone();
                let expected: Vec<Value> = expected
                    .iter()
                    .map(ScriptValue::to_value)
                    .collect::<Result<_>>()?;
                let name = format!("{index}: assert_return {}", action.field());
                let fut = action_future(Arc::clone(&engine), instance, action)?;
                harness.assert_return(runner, &name, fut, expected).await;
            }
            Stmt::AssertReturnNan { action } => {
                let instance = resolve_instance(action.module(), &current, &named)
                    .with_context(|| format!("statement {index}: assert_return_nan"))?
                    .clone();
                let name = format!("{index}: assert_return_nan {}", action.field());
                let fut = action_future(Arc::clone(&engine), instance, action)?;
                harness.assert_return_nan(runner, &name, fut).await;
            }
            Stmt::AssertTrap { action } => {
                let instance = resolve_instance(action.module(), &current, &named)
                    .with_context(|| format!("statement {index}: assert_trap"))?
                    .clone();
                let name = format!("{index}: assert_trap {}", action.field());
                let fut = action_future(Arc::clone(&engine), instance, action)?;
                harness.assert_trap(runner, &name, fut).await;
            }
            Stmt::AssertExhaustion { action } => {
                let instance = resolve_instance(action.module(), &current, &named)
                    .with_context(|| format!("statement {index}: assert_exhaustion"))?
                    .clone();
                let name = format!("{index}: assert_exhaustion {}", action.field());
                let fut = action_future(Arc::clone(&engine), instance, action)?;
                harness.assert_exhaustion(runner, &name, fut).await;
            }
            Stmt::AssertInvalid { payload } => {
                let bytes = payload
                    .decode()
                    .with_context(|| format!("statement {index}: assert_invalid payload"))?;
                let name = format!("{index}: assert_invalid");
                harness.assert_invalid(runner, &name, &bytes).await;
            }
            Stmt::AssertMalformed { payload } => {
                let bytes = payload
                    .decode()
                    .with_context(|| format!("statement {index}: assert_malformed payload"))?;
                let name = format!("{index}: assert_malformed");
                harness.assert_malformed(runner, &name, &bytes).await;
            }
            Stmt::AssertSoftInvalid { payload } => {
                let bytes = payload
                    .decode()
                    .with_context(|| format!("statement {index}: assert_soft_invalid payload"))?;
                let name = format!("{index}: assert_soft_invalid");
                harness.assert_soft_invalid(runner, &name, &bytes).await;
            }
            Stmt::AssertUnlinkable { payload } => {
                let bytes = payload
                    .decode()
                    .with_context(|| format!("statement {index}: assert_unlinkable payload"))?;
                let name = format!("{index}: assert_unlinkable");
                harness.assert_unlinkable(runner, &name, &bytes).await;
            }
            Stmt::AssertUninstantiable { payload } => {
                let bytes = payload
                    .decode()
                    .with_context(|| format!("statement {index}: assert_uninstantiable payload"))?;
                let name = format!("{index}: assert_uninstantiable");
                harness.assert_uninstantiable(runner, &name, &bytes).await;
            }
        }
    }

    Ok(())
}
