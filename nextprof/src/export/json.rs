use serde::Serialize;
use std::io::Write;

use crate::analysis::{build_call_graph, function_rows, CallGraph, CallGraphParams, FunctionRow};
use crate::domain::{ExportError, ThreadId};
use crate::profiling::Profile;

/// Serializable snapshot of a profile and its call graph
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub main_thread_id: Option<ThreadId>,
    pub total_hits: u64,
    pub functions: Vec<FunctionRow>,
    pub call_graph: CallGraph,
}

impl ProfileReport {
    /// Build a report; functions keep the profile's first-hit order
    #[must_use]
    pub fn new(profile: &Profile, params: &CallGraphParams) -> Self {
        Self {
            main_thread_id: profile.main_thread_id(),
            total_hits: profile.total_hits(),
            functions: function_rows(profile),
            call_graph: build_call_graph(profile, params),
        }
    }

    /// Export the report to any writer (file, stdout, buffer)
    ///
    /// # Errors
    /// Returns `ExportError::Json` if serialization or the writer fails.
    pub fn export<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
