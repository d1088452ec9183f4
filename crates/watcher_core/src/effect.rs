use crate::service::DiagnosticsPatterns;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartCollection { groups: Vec<String>, min_days: u32 },
    /// Cooperative: honoured once the in-flight group finishes.
    CancelCollection,
    StartDiagnostics { patterns: DiagnosticsPatterns },
    /// Aborts the in-flight diagnostics call.
    AbortDiagnostics,
}
