//! Diagnostic sinks for structural problems found in brush meshes.
//!
//! Validation and normalization never fail loudly: they recover by clearing
//! or dropping the offending mesh and describe what happened to a sink.

use tracing::warn;

/// Receiver for per-mesh structural problems.
///
/// Implement this trait to route problems to a log, a UI panel or a test.
pub trait DiagnosticSink {
    /// Called once per problem with the index of the mesh inside its brush set.
    fn report_error(&mut self, mesh_index: usize, message: &str);
}

/// A sink that forwards every report to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report_error(&mut self, mesh_index: usize, message: &str) {
        warn!(mesh = mesh_index, "{message}");
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub mesh_index: usize,
    pub message: String,
}

/// A sink that keeps every report.
#[derive(Debug, Default)]
pub struct CollectingSink {
    collected: Vec<Diagnostic>,
}

impl CollectingSink {
    /// Creates a new empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected reports.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.collected
    }

    /// Returns a reference to the collected reports.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.collected
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report_error(&mut self, mesh_index: usize, message: &str) {
        self.collected.push(Diagnostic {
            mesh_index,
            message: message.to_owned(),
        });
    }
}

/// A sink that calls a closure for each report.
pub struct FnSink<F>
where
    F: FnMut(usize, &str),
{
    func: F,
}

impl<F> FnSink<F>
where
    F: FnMut(usize, &str),
{
    /// Creates a new sink from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> DiagnosticSink for FnSink<F>
where
    F: FnMut(usize, &str),
{
    fn report_error(&mut self, mesh_index: usize, message: &str) {
        (self.func)(mesh_index, message);
    }
}
