//! Async case runner and run reporting.
//!
//! Each directive registers exactly one case. A case passes when its
//! future resolves `Ok`, fails with a diagnostic when it resolves `Err`,
//! and a panic inside a case fails that case without taking down the
//! run. Cases execute to completion exactly once; nothing retries.

use std::future::Future;
use std::time::Instant;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The `assert_true` primitive: `Ok` or a diagnostic-carrying `Err`.
pub fn ensure(condition: bool, message: impl Into<String>) -> anyhow::Result<()> {
    if condition {
        Ok(())
    } else {
        Err(anyhow!(message.into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub duration_ms: u64,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<CaseReport>,
}

pub struct Runner {
    suite: String,
    started_at: DateTime<Utc>,
    cases: Vec<CaseReport>,
}

impl Runner {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            started_at: Utc::now(),
            cases: Vec::new(),
        }
    }

    /// Run one async case to completion and record its verdict. The case
    /// runs on its own task so a panic is contained to this case.
    pub async fn case<F>(&mut self, name: &str, case: F) -> &CaseReport
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let start = Instant::now();
        let joined = tokio::spawn(case).await;
        let (status, diagnostic) = match joined {
            Ok(Ok(())) => (CaseStatus::Passed, None),
            Ok(Err(err)) => (CaseStatus::Failed, Some(format!("{err:#}"))),
            Err(join_err) if join_err.is_panic() => {
                let payload = join_err.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                (CaseStatus::Failed, Some(format!("case panicked: {message}")))
            }
            Err(_) => (CaseStatus::Failed, Some("case was cancelled".to_string())),
        };

        match status {
            CaseStatus::Passed => {
                tracing::info!(target: "wast_harness", case = name, "passed");
            }
            CaseStatus::Failed => {
                tracing::warn!(
                    target: "wast_harness",
                    case = name,
                    diagnostic = diagnostic.as_deref().unwrap_or(""),
                    "failed"
                );
            }
        }

        self.cases.push(CaseReport {
            name: name.to_string(),
            status,
            diagnostic,
            duration_ms: start.elapsed().as_millis() as u64,
        });
        self.cases.last().expect("case just pushed")
    }

    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed()).count()
    }

    pub fn report(self) -> RunReport {
        let passed = self.cases.iter().filter(|c| c.passed()).count();
        let failed = self.cases.len() - passed;
        RunReport {
            suite: self.suite,
            started_at: self.started_at,
            passed,
            failed,
            cases: self.cases,
        }
    }
}
