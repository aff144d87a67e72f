//! Acceptance-harness configuration and test records
//!
//! The harness hands these to an external report sink; rendering (JSON/HTML)
//! is the sink's business.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;

/// Harness configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("report_path cannot be empty when report generation is enabled")]
    EmptyReportPath,

    #[error("html_path cannot be empty when report generation is enabled")]
    EmptyHtmlPath,

    #[error("report_path and html_path must differ, both are '{0}'")]
    SameReportPaths(String),
}

/// Report settings passed to the harness at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub generate_report: bool,
    pub report_path: PathBuf,
    pub html_path: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            generate_report: false,
            report_path: PathBuf::from(defaults::DEFAULT_REPORT_PATH),
            html_path: PathBuf::from(defaults::DEFAULT_HTML_PATH),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.generate_report {
            return Ok(());
        }
        if self.report_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyReportPath);
        }
        if self.html_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyHtmlPath);
        }
        if self.report_path == self.html_path {
            return Err(ConfigError::SameReportPaths(
                self.report_path.display().to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a single harness step
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
}

/// One `{name, status, duration, error}` record for the report sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    pub status: TestStatus,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestRecord {
    pub fn pass(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Pass,
            duration_secs: duration.as_secs_f64(),
            error: None,
        }
    }

    pub fn fail(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Fail,
            duration_secs: duration.as_secs_f64(),
            error: Some(error.into()),
        }
    }

    pub fn skip(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Skip,
            duration_secs: 0.0,
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_harness_flags() {
        let config = HarnessConfig::default();
        assert!(!config.generate_report);
        assert_eq!(config.report_path, PathBuf::from("test-report.json"));
        assert_eq!(config.html_path, PathBuf::from("test-report.html"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_only_checks_paths_when_enabled() {
        let mut config = HarnessConfig {
            generate_report: false,
            report_path: PathBuf::new(),
            html_path: PathBuf::new(),
        };
        assert!(config.validate().is_ok());

        config.generate_report = true;
        assert_eq!(config.validate(), Err(ConfigError::EmptyReportPath));

        config.report_path = PathBuf::from("out.json");
        assert_eq!(config.validate(), Err(ConfigError::EmptyHtmlPath));

        config.html_path = PathBuf::from("out.json");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SameReportPaths(_))
        ));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: HarnessConfig = serde_json::from_str(r#"{"generate_report": true}"#).unwrap();
        assert!(config.generate_report);
        assert_eq!(config.report_path, PathBuf::from("test-report.json"));
    }

    #[test]
    fn record_serialization() {
        let record = TestRecord::fail("teardown", Duration::from_millis(1500), "delete failed");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"FAIL\""));
        assert!(json.contains("\"duration_secs\":1.5"));
        assert!(json.contains("\"error\":\"delete failed\""));

        let pass = serde_json::to_string(&TestRecord::pass("teardown", Duration::ZERO)).unwrap();
        assert!(!pass.contains("error"));
    }
}
