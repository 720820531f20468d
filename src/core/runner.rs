//! Note runner
//!
//! Drives notes through inspect, optimise and apply for each CLI action.
//! Notes run one after another; a failing note is recorded and the
//! remaining notes still run.

use super::state::SnapshotStore;
use crate::error::{Result, SaptuneError};
use crate::note::Note;
use crate::param::value::{diff, ApplyReport, Location, ParameterChange, ParameterValue};
use crate::system::Host;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// What to do with the selected notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Show the changes apply would make
    Simulate,
    /// Write the optimised values
    Apply,
    /// Check that the host already matches
    Verify,
    /// Restore the values saved before the first apply
    Revert,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Simulate => "Simulate",
            Action::Apply => "Apply",
            Action::Verify => "Verify",
            Action::Revert => "Revert",
        };
        f.write_str(name)
    }
}

/// Result of one note
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NoteOutcome {
    /// Changes apply would make
    Simulated { changes: Vec<ParameterChange> },
    /// Changes made and what was written
    Applied {
        changes: Vec<ParameterChange>,
        report: ApplyReport,
    },
    /// Host matches the optimised values
    Compliant,
    /// Host deviates from the optimised values
    NonCompliant { changes: Vec<ParameterChange> },
    /// Saved values written back
    Reverted { report: ApplyReport },
    /// The note stopped at an error
    Failed { error: String },
}

impl NoteOutcome {
    fn label(&self) -> &'static str {
        match self {
            NoteOutcome::Simulated { .. } => "simulated",
            NoteOutcome::Applied { .. } => "applied",
            NoteOutcome::Compliant => "compliant",
            NoteOutcome::NonCompliant { .. } => "non-compliant",
            NoteOutcome::Reverted { .. } => "reverted",
            NoteOutcome::Failed { .. } => "failed",
        }
    }
}

/// Outcome of one note
#[derive(Debug, Clone, Serialize)]
pub struct NoteResult {
    /// Note id
    pub id: String,
    /// Note title
    pub name: String,
    /// What happened
    pub outcome: NoteOutcome,
}

/// Outcome of a run over several notes
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Action performed
    pub action: Action,
    /// Per-note results, in run order
    pub results: Vec<NoteResult>,
    /// Wall time of the run
    pub duration: Duration,
}

impl RunReport {
    /// No note failed, and for verify every note is compliant
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| {
            !matches!(
                r.outcome,
                NoteOutcome::Failed { .. } | NoteOutcome::NonCompliant { .. }
            )
        })
    }

    /// Results that stopped at an error
    pub fn failures(&self) -> impl Iterator<Item = &NoteResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, NoteOutcome::Failed { .. }))
    }

    /// Print a human readable summary
    pub fn print_summary(&self) {
        println!("\n=== {} Summary ===", self.action);
        for result in &self.results {
            println!("{:<9} {:<14} {}", result.id, result.outcome.label(), result.name);
            match &result.outcome {
                NoteOutcome::Simulated { changes }
                | NoteOutcome::NonCompliant { changes } => print_changes(changes),
                NoteOutcome::Applied { changes, report } => {
                    print_changes(changes);
                    print_skipped(report);
                }
                NoteOutcome::Reverted { report } => {
                    println!("    {} parameters restored", report.written.len());
                    print_skipped(report);
                }
                NoteOutcome::Compliant => {}
                NoteOutcome::Failed { error } => println!("    {}", error),
            }
        }
        println!("Duration:        {:.2?}", self.duration);

        let failed = self.failures().count();
        if failed > 0 {
            println!("\nFailures: {}", failed);
        }
    }
}

fn print_changes(changes: &[ParameterChange]) {
    for change in changes {
        let current = match &change.current {
            Some(value) => display_value(&change.location, value),
            None => "-".to_string(),
        };
        println!(
            "    {:<40} {} -> {}",
            change.location.to_string(),
            current,
            display_value(&change.location, &change.expected)
        );
    }
}

fn print_skipped(report: &ApplyReport) {
    for skipped in &report.skipped {
        println!("    skipped {} ({})", skipped.location, skipped.reason);
    }
}

// Mount sizes are carried in MiB
fn display_value(location: &Location, value: &ParameterValue) -> String {
    match (location, value) {
        (Location::Mount { .. }, ParameterValue::Unsigned(mb)) => {
            humansize::format_size(mb.saturating_mul(1024 * 1024), humansize::BINARY)
        }
        _ => value.to_string(),
    }
}

/// Runs notes against a host
pub struct NoteRunner<'a> {
    host: &'a Host,
    store: Option<SnapshotStore>,
}

impl<'a> NoteRunner<'a> {
    /// Runner without a snapshot store; apply does not save state
    pub fn new(host: &'a Host) -> Self {
        Self { host, store: None }
    }

    /// Save and restore snapshots in `store`
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Perform `action` for every note
    pub fn run(&self, action: Action, notes: &[Box<dyn Note>]) -> RunReport {
        let start = Instant::now();
        let mut results = Vec::with_capacity(notes.len());

        for note in notes {
            tracing::info!("{} note {} ({})", action, note.id(), note.name());
            let outcome = match self.run_note(action, note.as_ref()) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Note {} failed: {}", note.id(), e);
                    NoteOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(NoteResult {
                id: note.id().to_string(),
                name: note.name().to_string(),
                outcome,
            });
        }

        RunReport {
            action,
            results,
            duration: start.elapsed(),
        }
    }

    fn run_note(&self, action: Action, note: &dyn Note) -> Result<NoteOutcome> {
        match action {
            Action::Simulate => {
                let (_, _, changes) = self.plan(note)?;
                Ok(NoteOutcome::Simulated { changes })
            }
            Action::Verify => {
                let (_, _, changes) = self.plan(note)?;
                if changes.is_empty() {
                    Ok(NoteOutcome::Compliant)
                } else {
                    Ok(NoteOutcome::NonCompliant { changes })
                }
            }
            Action::Apply => {
                let (inspected, optimised, changes) = self.plan(note)?;
                if let Some(store) = &self.store {
                    store.save(inspected.as_ref())?;
                }
                let report = optimised.apply(self.host)?;
                Ok(NoteOutcome::Applied { changes, report })
            }
            Action::Revert => {
                let store = self.store.as_ref().ok_or_else(|| {
                    SaptuneError::UnsupportedOperation("revert without a state directory".to_string())
                })?;
                let snapshot = store.load(note.id())?;
                let saved = note.restore(snapshot.values)?;
                let report = saved.apply(self.host)?;
                store.remove(note.id())?;
                Ok(NoteOutcome::Reverted { report })
            }
        }
    }

    fn plan(&self, note: &dyn Note) -> Result<(Box<dyn Note>, Box<dyn Note>, Vec<ParameterChange>)> {
        let inspected = note.inspect(self.host)?;
        let optimised = inspected.optimise(self.host)?;
        let changes = diff(&inspected.parameters(), &optimised.parameters());
        tracing::debug!("Note {}: {} parameters to change", note.id(), changes.len());
        Ok((inspected, optimised, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{registry, AfterInstallation, VmwareGuestIoElevator};
    use crate::system::fake::FakeSystem;
    use tempfile::TempDir;

    fn notes() -> Vec<Box<dyn Note>> {
        vec![
            Box::new(AfterInstallation::default()),
            Box::new(VmwareGuestIoElevator::default()),
        ]
    }

    #[test]
    fn test_simulate_writes_nothing() {
        let fake = FakeSystem::new();
        fake.add_device("sda", "cfq");
        let host = fake.host();

        let report = NoteRunner::new(&host).run(Action::Simulate, &notes());
        assert!(report.is_success());
        assert_eq!(fake.writes(), 0);
        assert!(fake.service_calls().is_empty());
        match &report.results[1].outcome {
            NoteOutcome::Simulated { changes } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].expected, ParameterValue::from("noop"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_apply_then_verify() {
        let fake = FakeSystem::new();
        fake.add_device("sda", "cfq");
        let host = fake.host();
        let runner = NoteRunner::new(&host);

        let verify = runner.run(Action::Verify, &notes());
        assert!(!verify.is_success());

        let apply = runner.run(Action::Apply, &notes());
        assert!(apply.is_success());
        assert_eq!(fake.device("sda").as_deref(), Some("noop"));

        let verify = runner.run(Action::Verify, &notes());
        assert!(verify.is_success());
        assert!(verify
            .results
            .iter()
            .all(|r| matches!(r.outcome, NoteOutcome::Compliant)));
    }

    #[test]
    fn test_failed_note_does_not_stop_the_run() {
        let fake = FakeSystem::new();
        fake.break_limits_file();
        fake.add_device("sda", "cfq");
        let host = fake.host();

        let notes = registry::select(&[]).unwrap();
        let report = NoteRunner::new(&host).run(Action::Apply, &notes);

        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.failures().next().unwrap().id, "1275776");
        assert_eq!(fake.device("sda").as_deref(), Some("noop"));
        assert!(fake.service_running("uuidd.socket"));
    }

    #[test]
    fn test_apply_and_revert() {
        let dir = TempDir::new().unwrap();
        let fake = FakeSystem::new();
        fake.add_device("sda", "cfq");
        fake.set_service("uuidd.socket", false);
        let host = fake.host();
        let runner = NoteRunner::new(&host).with_store(SnapshotStore::new(dir.path()));

        assert!(runner.run(Action::Apply, &notes()).is_success());
        // a second apply must not overwrite the pre-tuning snapshot
        assert!(runner.run(Action::Apply, &notes()).is_success());
        assert_eq!(fake.device("sda").as_deref(), Some("noop"));

        let revert = runner.run(Action::Revert, &notes());
        assert!(revert.is_success());
        assert_eq!(fake.device("sda").as_deref(), Some("cfq"));
        assert!(!fake.service_running("uuidd.socket"));
        assert!(!dir.path().join("2161991.json").exists());

        let again = runner.run(Action::Revert, &notes());
        assert_eq!(again.failures().count(), 2);
    }

    #[test]
    fn test_revert_restores_pre_tuning_limits() {
        use crate::note::PrepareForSapEnvironments;
        use crate::param::LimitBound;

        let dir = TempDir::new().unwrap();
        let fake = FakeSystem::new();
        fake.mount("/dev/shm", 4096);
        fake.set_limit("@sapsys", LimitBound::Soft, 1024);
        fake.set_sysctl("kernel.sem", "250 32000 32 128");
        fake.set_sysctl("kernel.shmmni", "4096");
        let host = fake.host();
        let notes: Vec<Box<dyn Note>> = vec![Box::new(PrepareForSapEnvironments::default())];
        let runner = NoteRunner::new(&host).with_store(SnapshotStore::new(dir.path()));

        assert!(runner.run(Action::Apply, &notes).is_success());
        assert_eq!(fake.limit("@sdba", LimitBound::Soft), Some(32800));
        assert_eq!(fake.sysctl("kernel.shmmni").as_deref(), Some("4096"));

        assert!(runner.run(Action::Revert, &notes).is_success());
        assert_eq!(fake.limit("@sdba", LimitBound::Soft), None);
        assert_eq!(fake.limit("@sdba", LimitBound::Hard), None);
        assert_eq!(fake.limit("@sapsys", LimitBound::Soft), Some(1024));
        assert_eq!(fake.limit("@sapsys", LimitBound::Hard), None);
        assert_eq!(fake.mount_size("/dev/shm"), Some(4096));
        assert_eq!(fake.sysctl("kernel.sem").as_deref(), Some("250 32000 32 128"));
    }

    #[test]
    fn test_revert_needs_store() {
        let fake = FakeSystem::new();
        let host = fake.host();
        let report = NoteRunner::new(&host).run(Action::Revert, &notes());
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn test_report_serializes() {
        let fake = FakeSystem::new();
        let host = fake.host();
        let report = NoteRunner::new(&host).run(Action::Simulate, &notes());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["action"], "simulate");
        assert_eq!(json["results"][0]["id"], "1984787");
        assert_eq!(json["results"][0]["outcome"]["status"], "simulated");
    }

    #[test]
    fn test_mount_sizes_are_human_readable() {
        let value = display_value(&Location::mount("/dev/shm"), &ParameterValue::Unsigned(12288));
        assert_eq!(value, "12 GiB");
        assert_eq!(display_value(&Location::sysctl("kernel.shmmni"), &ParameterValue::Unsigned(4096)), "4096");
    }
}
