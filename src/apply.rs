//! Plan and apply a configuration document.
//!
//! A [`Plan`] holds one [`DomainPlan`] per settings domain, built before
//! anything touches the preference store. Execution then walks the domains
//! in order:
//!
//! - within a domain, the batch stops at the first failing command
//! - a failed domain never prevents the next one from running
//! - restarts run only after a non-empty batch succeeds
//! - the deadline is checked before every domain and every command; once it
//!   fires, remaining domains are not attempted
//!
//! Failures are collected into a single [`DomainFailures`] error.

use std::fmt;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::config::Document;
use crate::defaults::raw::{self, RAW_DOMAIN};
use crate::defaults::{Batch, PreferenceStore, Restart, StoreOp};
use crate::registry::Registry;
use crate::sys::Deadline;
use crate::{Error, Result, ValidationError};

/// Planned work for one domain.
#[derive(Debug, Clone)]
pub struct DomainPlan {
    pub name: String,
    /// The batch, or the first validation error found while building it.
    pub batch: std::result::Result<Batch, ValidationError>,
    pub restarts: Vec<Restart>,
    /// Raw entries are shown to the user before they run.
    pub requires_approval: bool,
}

impl DomainPlan {
    /// True when there is something to execute.
    pub fn has_work(&self) -> bool {
        self.batch.as_ref().is_ok_and(|batch| !batch.is_empty())
    }
}

/// Every domain's planned work, in execution order.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub domains: Vec<DomainPlan>,
}

impl Plan {
    /// Build the plan for `document`: typed domains first, then raw entries.
    pub fn build(document: &Document, registry: &Registry) -> Result<Self> {
        let mut domains = Vec::new();

        for (name, options) in document.macos.typed_domains() {
            let schema = registry
                .get(name)
                .ok_or_else(|| Error::Other(format!("unknown settings domain: {}", name)))?;
            let batch = registry.synthesize(name, options)?.into_batch();
            domains.push(DomainPlan {
                name: name.to_string(),
                batch,
                restarts: schema.restarts.clone(),
                requires_approval: false,
            });
        }

        domains.push(DomainPlan {
            name: RAW_DOMAIN.to_string(),
            batch: raw::raw_batch(&document.macos.defaults_raw),
            restarts: Vec::new(),
            requires_approval: true,
        });

        Ok(Self { domains })
    }

    /// Whether any domain needing approval has commands to run.
    pub fn requires_approval(&self) -> bool {
        self.domains
            .iter()
            .any(|domain| domain.requires_approval && domain.has_work())
    }

    /// Operations needing approval, in execution order.
    pub fn operations_requiring_approval(&self) -> Vec<StoreOp> {
        self.domains
            .iter()
            .filter(|domain| domain.requires_approval)
            .filter_map(|domain| domain.batch.as_ref().ok())
            .filter_map(|batch| batch.operations().ok())
            .flatten()
            .collect()
    }

    /// Domains whose batch could not be built.
    pub fn invalid_domains(&self) -> Vec<(&str, &ValidationError)> {
        self.domains
            .iter()
            .filter_map(|domain| match &domain.batch {
                Err(err) => Some((domain.name.as_str(), err)),
                Ok(_) => None,
            })
            .collect()
    }

    /// Execute every domain against `store`.
    pub fn execute(&self, store: &dyn PreferenceStore, deadline: &Deadline) -> ApplyReport {
        let mut report = ApplyReport::default();

        for domain in &self.domains {
            if let Err(err) = deadline.check() {
                warn!(domain = %domain.name, error = %err, "Stopping before domain");
                report.failures.push(DomainFailure::new(&domain.name, err));
                break;
            }

            let _span = info_span!("domain", name = %domain.name).entered();
            match execute_domain(domain, store, deadline) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err) => {
                    warn!(error = %err, "Domain failed");
                    let interrupted = err.is_interruption();
                    report.failures.push(DomainFailure::new(&domain.name, err));
                    if interrupted {
                        break;
                    }
                }
            }
        }

        report
    }
}

fn execute_domain(
    plan: &DomainPlan,
    store: &dyn PreferenceStore,
    deadline: &Deadline,
) -> Result<DomainOutcome> {
    let batch = plan.batch.as_ref().map_err(|err| Error::Validation(err.clone()))?;
    let mut outcome = DomainOutcome {
        domain: plan.name.clone(),
        applied: 0,
        restarted: Vec::new(),
    };
    if batch.is_empty() {
        return Ok(outcome);
    }

    info!(commands = batch.len(), "Applying domain");
    outcome.applied = batch.execute(store, deadline)?;
    info!(applied = outcome.applied, "Applied domain");

    for restart in &plan.restarts {
        deadline.check()?;
        if restart.execute(store)? {
            outcome.restarted.push(restart.process.to_string());
        }
    }
    Ok(outcome)
}

/// A domain that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainOutcome {
    pub domain: String,
    pub applied: usize,
    pub restarted: Vec<String>,
}

/// A domain that failed, with the reason.
#[derive(Debug)]
pub struct DomainFailure {
    pub domain: String,
    pub error: Error,
}

impl DomainFailure {
    pub fn new(domain: impl Into<String>, error: Error) -> Self {
        Self {
            domain: domain.into(),
            error,
        }
    }
}

/// One or more domains failed.
#[derive(Debug)]
pub struct DomainFailures(pub Vec<DomainFailure>);

impl fmt::Display for DomainFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        write!(
            f,
            "{} domain{} failed: ",
            count,
            if count == 1 { "" } else { "s" }
        )?;
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "[{}] {}: {}", index + 1, failure.domain, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for DomainFailures {}

/// What happened during [`Plan::execute`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<DomainOutcome>,
    pub failures: Vec<DomainFailure>,
}

impl ApplyReport {
    /// Domains that were started, successfully or not.
    pub fn attempted(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    /// Total commands applied by domains that completed.
    pub fn applied(&self) -> usize {
        self.outcomes.iter().map(|o| o.applied).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok` with the outcomes, or every failure as one error.
    pub fn into_result(self) -> Result<Vec<DomainOutcome>> {
        if self.failures.is_empty() {
            Ok(self.outcomes)
        } else {
            Err(Error::Domains(DomainFailures(self.failures)))
        }
    }
}
