//! Command implementations for the fjrd CLI.
//!
//! Each command returns a value implementing [`CommandResult`] so the binary
//! can print it either for humans or as JSON (`--json`):
//! - `fetch` - resolve a location and return the raw document text
//! - `plan` - everything `apply` would do, without doing it
//! - `apply` - execute the plan against a preference store
//! - `domains` - the typed domain catalog

use serde::Serialize;
use tracing::info;

use crate::apply::{DomainOutcome, Plan};
use crate::config::Document;
use crate::defaults::{PreferenceStore, StoreCall, StoreOp};
use crate::registry::Registry;
use crate::source::ResourceResolver;
use crate::sys::Deadline;
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_of<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

// === Fetch ===

#[derive(Debug, Serialize)]
pub struct FetchOutput {
    pub location: String,
    pub content: String,
}

impl CommandResult for FetchOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        self.content.trim_end_matches('\n').to_string()
    }
}

/// Resolve `location` to document text.
pub fn fetch(resolver: &ResourceResolver, location: &str) -> Result<FetchOutput> {
    let content = resolver.resolve(location)?;
    Ok(FetchOutput {
        location: location.to_string(),
        content,
    })
}

/// Resolve, parse and plan the document at `location`.
pub fn load_plan(
    resolver: &ResourceResolver,
    registry: &Registry,
    location: &str,
) -> Result<Plan> {
    let text = resolver.resolve(location)?;
    let document = Document::parse(&text)?;
    let plan = Plan::build(&document, registry)?;
    info!(
        domains = plan.domains.iter().filter(|d| d.has_work()).count(),
        "Planned configuration"
    );
    Ok(plan)
}

// === Plan ===

#[derive(Debug, Serialize)]
pub struct DomainPlanSummary {
    pub domain: String,
    pub operations: Vec<StoreOp>,
    pub restarts: Vec<String>,
    pub requires_approval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub location: String,
    pub domains: Vec<DomainPlanSummary>,
}

impl PlanOutput {
    pub fn from_plan(location: &str, plan: &Plan) -> Self {
        let domains = plan
            .domains
            .iter()
            .map(|domain| {
                let (operations, error) = match &domain.batch {
                    Ok(batch) => match batch.operations() {
                        Ok(ops) => (ops, None),
                        Err(err) => (Vec::new(), Some(err.to_string())),
                    },
                    Err(err) => (Vec::new(), Some(err.to_string())),
                };
                let restarts = if operations.is_empty() {
                    Vec::new()
                } else {
                    domain
                        .restarts
                        .iter()
                        .map(|r| {
                            if r.only_if_running {
                                format!("{} (if running)", r.process)
                            } else {
                                r.process.to_string()
                            }
                        })
                        .collect()
                };
                DomainPlanSummary {
                    domain: domain.name.clone(),
                    operations,
                    restarts,
                    requires_approval: domain.requires_approval,
                    error,
                }
            })
            .collect();
        Self {
            location: location.to_string(),
            domains,
        }
    }

    /// Number of domains that failed validation.
    pub fn invalid_count(&self) -> usize {
        self.domains.iter().filter(|d| d.error.is_some()).count()
    }
}

impl CommandResult for PlanOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for domain in &self.domains {
            if let Some(err) = &domain.error {
                lines.push(format!("[{}] invalid: {}", domain.domain, err));
                continue;
            }
            if domain.operations.is_empty() {
                continue;
            }
            let suffix = if domain.requires_approval {
                " (requires approval)"
            } else {
                ""
            };
            lines.push(format!("[{}]{}", domain.domain, suffix));
            lines.extend(domain.operations.iter().map(|op| format!("  {}", op)));
            lines.extend(domain.restarts.iter().map(|p| format!("  restart {}", p)));
        }
        if lines.is_empty() {
            "Nothing to apply.".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Describe what `apply` would do for `location`.
pub fn plan(resolver: &ResourceResolver, registry: &Registry, location: &str) -> Result<PlanOutput> {
    let plan = load_plan(resolver, registry, location)?;
    Ok(PlanOutput::from_plan(location, &plan))
}

// === Apply ===

#[derive(Debug, Serialize)]
pub struct ApplyOutput {
    pub dry_run: bool,
    pub applied: usize,
    pub domains: Vec<DomainOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<StoreCall>,
}

impl CommandResult for ApplyOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for call in &self.calls {
            lines.push(match call {
                StoreCall::Write {
                    domain,
                    key,
                    kind,
                    value,
                } => StoreOp::Write {
                    domain: domain.clone(),
                    key: key.clone(),
                    kind: *kind,
                    value: value.clone(),
                }
                .to_string(),
                StoreCall::Delete { domain, key } => StoreOp::Delete {
                    domain: domain.clone(),
                    key: key.clone(),
                }
                .to_string(),
                StoreCall::Signal { process } => format!("killall {}", process),
            });
        }
        let touched: Vec<&DomainOutcome> =
            self.domains.iter().filter(|d| d.applied > 0).collect();
        let verb = if self.dry_run { "Would apply" } else { "Applied" };
        lines.push(format!(
            "{} {} setting{} across {} domain{}.",
            verb,
            self.applied,
            if self.applied == 1 { "" } else { "s" },
            touched.len(),
            if touched.len() == 1 { "" } else { "s" }
        ));
        for outcome in touched {
            if !outcome.restarted.is_empty() {
                lines.push(format!(
                    "  {}: restarted {}",
                    outcome.domain,
                    outcome.restarted.join(", ")
                ));
            }
        }
        lines.join("\n")
    }
}

/// Ask `ask` about the plan's raw operations, if it has any.
///
/// Returns whether execution may go ahead. A cancellation that arrives while
/// the question is pending wins over the answer.
pub fn approve<F>(plan: &Plan, deadline: &Deadline, ask: F) -> Result<bool>
where
    F: FnOnce(&[StoreOp]) -> Result<bool>,
{
    if !plan.requires_approval() {
        return Ok(true);
    }
    let approved = ask(&plan.operations_requiring_approval())?;
    if deadline.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if !approved {
        info!("Raw defaults declined, nothing applied");
    }
    Ok(approved)
}

/// Execute `plan` against `store`.
///
/// Failed domains are returned as one [`Error::Domains`] error after every
/// domain has been attempted.
pub fn apply(plan: &Plan, store: &dyn PreferenceStore, deadline: &Deadline) -> Result<ApplyOutput> {
    let report = plan.execute(store, deadline);
    let applied = report.applied();
    let domains = report.into_result()?;
    Ok(ApplyOutput {
        dry_run: false,
        applied,
        domains,
        calls: Vec::new(),
    })
}

// === Domains ===

#[derive(Debug, Serialize)]
pub struct FieldSummary {
    pub tag: &'static str,
    pub domain: &'static str,
    pub key: &'static str,
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DomainSummary {
    pub name: &'static str,
    pub fields: Vec<FieldSummary>,
    pub restarts: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DomainsOutput {
    pub domains: Vec<DomainSummary>,
}

impl CommandResult for DomainsOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for domain in &self.domains {
            if domain.restarts.is_empty() {
                lines.push(format!("{}:", domain.name));
            } else {
                lines.push(format!(
                    "{}: (restarts {})",
                    domain.name,
                    domain.restarts.join(", ")
                ));
            }
            for field in &domain.fields {
                let mut line = format!(
                    "  {:<28} {} {} ({})",
                    field.tag, field.domain, field.key, field.kind
                );
                if !field.values.is_empty() {
                    line.push_str(&format!(" [{}]", field.values.join(", ")));
                }
                if let Some(range) = &field.range {
                    line.push_str(&format!(" {}", range));
                }
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

/// List the typed domains of `registry`.
pub fn domains(registry: &Registry) -> DomainsOutput {
    let domains = registry
        .domains()
        .map(|schema| DomainSummary {
            name: schema.name,
            fields: schema
                .fields
                .iter()
                .map(|field| FieldSummary {
                    tag: field.tag,
                    domain: field.domain,
                    key: field.key,
                    kind: field.kind.to_string(),
                    values: field.enum_values.to_vec(),
                    range: field.rule.map(|r| r.to_string()),
                })
                .collect(),
            restarts: schema.restarts.iter().map(|r| r.process).collect(),
        })
        .collect();
    DomainsOutput { domains }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::builtin_registry;
    use crate::test_utils::{FakeGit, FakeTransport, ScriptedStore};
    use std::time::Duration;
    use std::fs;
    use tempfile::TempDir;

    fn offline_resolver() -> ResourceResolver {
        ResourceResolver::new(
            Box::new(FakeTransport::offline()),
            Box::new(FakeGit::new()),
            Deadline::none(),
        )
    }

    fn write_document(dir: &TempDir, text: &str) -> String {
        let path = dir.path().join("fjrd.toml");
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    const DOCUMENT: &str = r#"
version = 1

[macos.dock]
autohide = true

[macos.defaultsRaw."com.apple.finder.ShowPathbar"]
value = true
type = "bool"
"#;

    // ==================== Fetch Tests ====================

    #[test]
    fn test_fetch_local_document() {
        let dir = TempDir::new().unwrap();
        let location = write_document(&dir, DOCUMENT);
        let output = fetch(&offline_resolver(), &location).unwrap();
        assert_eq!(output.content, DOCUMENT);
        assert!(output.to_json().contains("\"content\""));
    }

    // ==================== Plan Tests ====================

    #[test]
    fn test_plan_output_lists_operations() {
        let dir = TempDir::new().unwrap();
        let location = write_document(&dir, DOCUMENT);
        let registry = builtin_registry().unwrap();
        let output = plan(&offline_resolver(), &registry, &location).unwrap();

        assert_eq!(output.invalid_count(), 0);
        let human = output.to_human();
        assert!(human.contains("[dock]\n  defaults write com.apple.dock autohide -bool true\n  restart Dock"));
        assert!(human.contains("[defaults-raw] (requires approval)"));
        assert!(human.contains("defaults write com.apple.finder ShowPathbar -bool true"));
        assert!(!human.contains("[finder]"));
    }

    #[test]
    fn test_plan_output_reports_invalid_domains() {
        let dir = TempDir::new().unwrap();
        let location = write_document(
            &dir,
            "version = 1\n[macos.finder]\npreferred-view-style = \"coverflow\"\n",
        );
        let registry = builtin_registry().unwrap();
        let output = plan(&offline_resolver(), &registry, &location).unwrap();
        assert_eq!(output.invalid_count(), 1);
        assert!(output.to_human().starts_with("[finder] invalid: "));
    }

    #[test]
    fn test_empty_plan() {
        let dir = TempDir::new().unwrap();
        let location = write_document(&dir, "version = 1\n");
        let registry = builtin_registry().unwrap();
        let output = plan(&offline_resolver(), &registry, &location).unwrap();
        assert_eq!(output.to_human(), "Nothing to apply.");
    }

    // ==================== Apply Tests ====================

    fn dock_and_raw_plan() -> Plan {
        let document = Document::parse(DOCUMENT).unwrap();
        Plan::build(&document, &builtin_registry().unwrap()).unwrap()
    }

    #[test]
    fn test_approve_declined_lists_raw_operations() {
        let mut asked = Vec::new();
        let approved = approve(&dock_and_raw_plan(), &Deadline::none(), |ops| {
            asked = ops.to_vec();
            Ok(false)
        })
        .unwrap();

        assert!(!approved);
        assert_eq!(asked.len(), 1);
        assert!(asked[0].to_string().contains("ShowPathbar"));
    }

    #[test]
    fn test_approve_without_raw_entries_never_asks() {
        let document = Document::parse("version = 1\n[macos.dock]\ntilesize = 40\n").unwrap();
        let plan = Plan::build(&document, &builtin_registry().unwrap()).unwrap();
        let approved = approve(&plan, &Deadline::none(), |_| {
            panic!("approval should not be requested")
        })
        .unwrap();
        assert!(approved);
    }

    #[test]
    fn test_cancel_while_asking_wins_over_answer() {
        let deadline = Deadline::none();
        let result = approve(&dock_and_raw_plan(), &deadline, |_| {
            deadline.cancel();
            Ok(true)
        });
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_slow_approval_does_not_eat_execution_time() {
        let plan = dock_and_raw_plan();
        let deadline = Deadline::after(Duration::from_millis(100));
        let approved = approve(&plan, &deadline, |_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(true)
        })
        .unwrap();
        assert!(approved);

        let store = ScriptedStore::new();
        let execution = deadline.renewed(Duration::from_secs(30));
        let output = apply(&plan, &store, &execution).unwrap();
        assert_eq!(output.applied, 2);
        assert_eq!(store.calls().len(), 3);
    }

    #[test]
    fn test_apply_runs_everything() {
        let store = ScriptedStore::new();
        let output = apply(&dock_and_raw_plan(), &store, &Deadline::none()).unwrap();
        assert_eq!(output.applied, 2);
        assert_eq!(store.calls().len(), 3);
        assert!(output.to_human().contains("Applied 2 settings across 2 domains."));
    }

    #[test]
    fn test_apply_aggregates_failures() {
        let store = ScriptedStore::new().fail_write("com.apple.dock", "autohide");
        let err = apply(&dock_and_raw_plan(), &store, &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Domains(_)));
        assert!(err.to_string().starts_with("1 domain failed: [1] dock: "));
        // The raw entry still ran.
        assert_eq!(store.calls().len(), 1);
    }

    // ==================== Domains Tests ====================

    #[test]
    fn test_domains_listing() {
        let registry = builtin_registry().unwrap();
        let output = domains(&registry);
        assert_eq!(output.domains.len(), 10);
        let human = output.to_human();
        assert!(human.starts_with("dock: (restarts Dock)"));
        assert!(human.contains("click-weight"));
        assert!(human.contains("0..=3"));
        assert!(output.to_json().contains("\"mission-control\""));
    }
}
