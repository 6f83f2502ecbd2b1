//! Validation diagnostic types.

use serde::{Deserialize, Serialize};

/// Severity level of a validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
    pub node_id: Option<String>,
    pub port: Option<String>,
}

impl Diagnostic {
    pub(crate) fn error(code: &str, message: String, node_id: Option<&str>, port: Option<&str>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Error,
            code: code.to_string(),
            message,
            node_id: node_id.map(str::to_string),
            port: port.map(str::to_string),
        }
    }

    pub(crate) fn warning(code: &str, message: String, node_id: Option<&str>, port: Option<&str>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Warning,
            ..Diagnostic::error(code, message, node_id, port)
        }
    }
}

/// Aggregated result of flow validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let is_valid = diagnostics.iter().all(|d| d.level != DiagnosticLevel::Error);
        ValidationReport {
            is_valid,
            diagnostics,
        }
    }

    /// Return only the error-level diagnostics.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .collect()
    }

    /// Return only the warning-level diagnostics.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_report_empty_is_valid() {
        let report = ValidationReport::from_diagnostics(vec![]);
        assert!(report.is_valid);
        assert!(report.errors().is_empty());
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let report = ValidationReport::from_diagnostics(vec![Diagnostic::warning(
            "W202",
            "unused".into(),
            Some("outputnode"),
            Some("V1"),
        )]);
        assert!(report.is_valid);
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.warnings()[0].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn test_validation_report_mixed() {
        let report = ValidationReport::from_diagnostics(vec![
            Diagnostic::error("E201", "cycle".into(), None, None),
            Diagnostic::warning("W201", "isolated".into(), Some("a"), None),
            Diagnostic::error("E203", "kind".into(), Some("b"), Some("in_file")),
        ]);
        assert!(!report.is_valid);
        assert_eq!(report.errors().len(), 2);
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.errors()[1].port.as_deref(), Some("in_file"));
    }

    #[test]
    fn test_validation_report_serializes() {
        let report = ValidationReport::from_diagnostics(vec![Diagnostic::error(
            "E202",
            "missing port".into(),
            Some("n1"),
            Some("p"),
        )]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["diagnostics"][0]["code"], "E202");
    }
}
