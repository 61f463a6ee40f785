//! Progress notification port
//!
//! Defines the interface for reporting progress while a phase runs.

use council_domain::PhaseKind;

/// Callback for progress updates during a council phase
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: PhaseKind, total_tasks: usize);

    /// Called when a task starts running
    fn on_task_start(&self, _phase: PhaseKind, _agent: &str) {}

    /// Called when a task settles within a phase
    fn on_task_complete(&self, phase: PhaseKind, agent: &str, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: PhaseKind);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: PhaseKind, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: PhaseKind, _agent: &str, _success: bool) {}
    fn on_phase_complete(&self, _phase: PhaseKind) {}
}
