//! Per-suite test context.
//!
//! The namespace-to-exports mapping used to wire cross-module imports.
//! Explicitly owned by one suite run rather than process-global; seeded
//! with the `spectest` entry at construction and never cleared mid-run.
//! Registration under an existing name is last write wins.

use std::future::Future;

use crate::engine::{Imports, ModuleEngine, SPECTEST};
use crate::error::EngineError;

pub struct TestContext<E: ModuleEngine> {
    registry: Imports<E::Exports>,
}

impl<E: ModuleEngine> TestContext<E> {
    pub fn new(engine: &E) -> Result<Self, EngineError> {
        let mut registry = Imports::new();
        registry.insert(SPECTEST.to_string(), engine.spectest()?);
        Ok(Self { registry })
    }

    /// Clone of the current mapping, used as the default import object.
    pub fn snapshot(&self) -> Imports<E::Exports> {
        self.registry.clone()
    }

    pub fn get(&self, name: &str) -> Option<&E::Exports> {
        self.registry.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, exports: E::Exports) {
        self.registry.insert(name.into(), exports);
    }

    /// Wait for an instance, then publish its exports under `name`.
    /// A rejected instance future propagates unchanged and publishes
    /// nothing.
    pub async fn register<F>(
        &mut self,
        engine: &E,
        name: &str,
        instance: F,
    ) -> Result<E::Instance, EngineError>
    where
        F: Future<Output = Result<E::Instance, EngineError>>,
    {
        let instance = instance.await?;
        self.insert(name, engine.exports(&instance));
        Ok(instance)
    }
}
