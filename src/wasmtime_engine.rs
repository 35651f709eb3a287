//! Wasmtime-backed implementation of the engine seam.
//!
//! One `Engine` plus one shared `Store` for the whole suite run, so
//! instances registered under a namespace can satisfy the imports of
//! modules instantiated later. The store lock is never held across an
//! await point; every engine call completes synchronously inside it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use wasmtime::{
    Config, Engine, Extern, Func, Global, GlobalType, Instance, Memory, MemoryType, Module,
    Mutability, Ref, RefType, Store, Table, TableType, Trap, Val, ValType,
};

use crate::engine::{ExportValue, Imports, ModuleEngine};
use crate::error::{EngineError, TrapSignature};
use crate::value::Value;

/// Named export set: the concrete `Exports` type of this engine.
pub type ExportMap = BTreeMap<String, Extern>;

pub struct WasmtimeEngine {
    engine: Engine,
    store: Mutex<Store<()>>,
}

impl WasmtimeEngine {
    pub fn new() -> Result<Self, EngineError> {
        let cfg = Config::new();
        let engine = Engine::new(&cfg)
            .map_err(|err| EngineError::internal(format!("init wasm engine: {err:#}")))?;
        let store = Store::new(&engine, ());
        Ok(Self {
            engine,
            store: Mutex::new(store),
        })
    }
}

/// Instantiation failures split on whether the engine reported a trap:
/// a trap means the start function ran and failed (runtime), anything
/// else is an import problem (link).
fn classify_instantiate_error(err: anyhow::Error) -> EngineError {
    match err.downcast_ref::<Trap>() {
        Some(trap) => EngineError::runtime(
            Some(TrapSignature::new(format!("{trap:?}"))),
            format!("{err:#}"),
        ),
        None => EngineError::link(format!("{err:#}")),
    }
}

fn classify_call_error(err: anyhow::Error) -> EngineError {
    let trap = err
        .downcast_ref::<Trap>()
        .map(|trap| TrapSignature::new(format!("{trap:?}")));
    EngineError::runtime(trap, format!("{err:#}"))
}

fn val_from(value: &Value) -> Val {
    match *value {
        Value::I32(v) => Val::I32(v),
        Value::I64(v) => Val::I64(v),
        Value::F32(bits) => Val::F32(bits),
        Value::F64(bits) => Val::F64(bits),
    }
}

fn value_from_val(val: &Val) -> Result<Value, EngineError> {
    match val {
        Val::I32(v) => Ok(Value::I32(*v)),
        Val::I64(v) => Ok(Value::I64(*v)),
        Val::F32(bits) => Ok(Value::F32(*bits)),
        Val::F64(bits) => Ok(Value::F64(*bits)),
        other => Err(EngineError::internal(format!(
            "unsupported result type: {other:?}"
        ))),
    }
}

#[async_trait]
impl ModuleEngine for WasmtimeEngine {
    type Module = Module;
    type Instance = Instance;
    type Exports = ExportMap;

    async fn validate(&self, bytes: &[u8]) -> Result<bool, EngineError> {
        Ok(Module::validate(&self.engine, bytes).is_ok())
    }

    async fn compile(&self, bytes: &[u8]) -> Result<Module, EngineError> {
        Module::new(&self.engine, bytes).map_err(|err| EngineError::compile(format!("{err:#}")))
    }

    async fn instantiate(
        &self,
        module: &Module,
        imports: &Imports<ExportMap>,
    ) -> Result<Instance, EngineError> {
        // Resolve the two-level namespace into the positional import list
        // the engine expects, failing loud on any unknown name.
        let mut externs = Vec::with_capacity(module.imports().len());
        for import in module.imports() {
            let module_name = import.module();
            let field = import.name();
            let set = imports.get(module_name).ok_or_else(|| {
                EngineError::link(format!("unknown import module `{module_name}`"))
            })?;
            let ext = set.get(field).cloned().ok_or_else(|| {
                EngineError::link(format!("unknown import `{module_name}.{field}`"))
            })?;
            externs.push(ext);
        }

        let mut store = self.store.lock();
        Instance::new(&mut *store, module, &externs).map_err(classify_instantiate_error)
    }

    fn exports(&self, instance: &Instance) -> ExportMap {
        let mut store = self.store.lock();
        let mut map = ExportMap::new();
        for export in instance.exports(&mut *store) {
            let name = export.name().to_string();
            map.insert(name, export.into_extern());
        }
        map
    }

    async fn invoke(
        &self,
        exports: &ExportMap,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, EngineError> {
        let func = match exports.get(name) {
            Some(Extern::Func(func)) => *func,
            Some(_) => {
                return Err(EngineError::internal(format!(
                    "export `{name}` is not a function"
                )))
            }
            None => return Err(EngineError::internal(format!("no export named `{name}`"))),
        };

        let mut store = self.store.lock();
        let ty = func.ty(&*store);
        let params: Vec<Val> = args.iter().map(val_from).collect();
        let mut results = vec![Val::I32(0); ty.results().len()];
        func.call(&mut *store, &params, &mut results)
            .map_err(classify_call_error)?;
        results.iter().map(value_from_val).collect()
    }

    async fn get(&self, exports: &ExportMap, name: &str) -> Result<ExportValue, EngineError> {
        let ext = exports
            .get(name)
            .ok_or_else(|| EngineError::internal(format!("no export named `{name}`")))?;
        let mut store = self.store.lock();
        match ext {
            Extern::Global(global) => {
                let val = global.get(&mut *store);
                Ok(ExportValue::Global(value_from_val(&val)?))
            }
            Extern::Memory(memory) => Ok(ExportValue::Memory {
                pages: memory.size(&*store),
            }),
            Extern::Table(table) => Ok(ExportValue::Table {
                size: table.size(&*store) as u64,
            }),
            Extern::Func(_) => Ok(ExportValue::Func),
            other => Err(EngineError::internal(format!(
                "unsupported export kind: {other:?}"
            ))),
        }
    }

    fn spectest(&self) -> Result<ExportMap, EngineError> {
        let mut store = self.store.lock();
        let mut map = ExportMap::new();

        let print = Func::wrap(&mut *store, |value: i32| {
            tracing::info!(target: "spectest", value, "print");
        });
        map.insert("print".to_string(), Extern::Func(print));

        let global = Global::new(
            &mut *store,
            GlobalType::new(ValType::I32, Mutability::Const),
            Val::I32(666),
        )
        .map_err(|err| EngineError::internal(format!("build spectest global: {err:#}")))?;
        map.insert("global".to_string(), Extern::Global(global));

        let table = Table::new(
            &mut *store,
            TableType::new(RefType::FUNCREF, 10, Some(20)),
            Ref::Func(None),
        )
        .map_err(|err| EngineError::internal(format!("build spectest table: {err:#}")))?;
        map.insert("table".to_string(), Extern::Table(table));

        let memory = Memory::new(&mut *store, MemoryType::new(1, Some(2)))
            .map_err(|err| EngineError::internal(format!("build spectest memory: {err:#}")))?;
        map.insert("memory".to_string(), Extern::Memory(memory));

        Ok(map)
    }
}
