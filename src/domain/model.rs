use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// 啟動流程的狀態機。每個階段由對應的 boot step 推進，
/// `AppRunning` 與 `Fatal` 為終止狀態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootPhase {
    NotStarted,
    SshStarting,
    SshReady,
    /// sshd 啟動失敗，但預設不致命，流程繼續
    SshFailed,
    ExtensionsValidating,
    ExtensionsOk,
    AppRunning,
    Fatal,
}

impl BootPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootPhase::AppRunning | BootPhase::Fatal)
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootPhase::NotStarted => "NOT_STARTED",
            BootPhase::SshStarting => "SSH_STARTING",
            BootPhase::SshReady => "SSH_READY",
            BootPhase::SshFailed => "SSH_FAILED",
            BootPhase::ExtensionsValidating => "EXTENSIONS_VALIDATING",
            BootPhase::ExtensionsOk => "EXTENSIONS_OK",
            BootPhase::AppRunning => "APP_RUNNING",
            BootPhase::Fatal => "FATAL",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Completed,
    FailedNonFatal,
    Skipped,
}

/// 單一步驟的執行結果
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step_name: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StepReport {
    pub fn new(step_name: &str, status: StepStatus) -> Self {
        Self {
            step_name: step_name.to_string(),
            status,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            metadata: HashMap::new(),
        }
    }
}

/// 整個啟動流程的彙總
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_steps: usize,
    pub completed: usize,
    pub failed_non_fatal: usize,
    pub skipped: usize,
    pub total_duration_ms: u128,
    pub executed_steps: Vec<String>,
}

impl RunSummary {
    pub fn from_reports(reports: &[StepReport]) -> Self {
        let completed = reports
            .iter()
            .filter(|r| r.status == StepStatus::Completed)
            .count();
        let failed_non_fatal = reports
            .iter()
            .filter(|r| r.status == StepStatus::FailedNonFatal)
            .count();
        let skipped = reports
            .iter()
            .filter(|r| r.status == StepStatus::Skipped)
            .count();

        Self {
            total_steps: reports.len(),
            completed,
            failed_non_fatal,
            skipped,
            total_duration_ms: reports.iter().map(|r| r.duration.as_millis()).sum(),
            executed_steps: reports
                .iter()
                .filter(|r| r.status != StepStatus::Skipped)
                .map(|r| r.step_name.clone())
                .collect(),
        }
    }
}
