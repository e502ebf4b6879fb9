use crate::domain::model::{BootPhase, StepReport};
use std::collections::HashMap;

/// 啟動流程的執行上下文，用於在步驟間傳遞狀態
#[derive(Debug, Clone)]
pub struct BootContext {
    pub execution_id: String,
    pub phase: BootPhase,
    pub reports: Vec<StepReport>,
    shared_data: HashMap<String, serde_json::Value>,
}

impl BootContext {
    pub fn new(execution_id: String) -> Self {
        Self {
            execution_id,
            phase: BootPhase::NotStarted,
            reports: Vec::new(),
            shared_data: HashMap::new(),
        }
    }

    /// 推進狀態機並記錄轉移
    pub fn set_phase(&mut self, phase: BootPhase) {
        tracing::debug!("Boot phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// 獲取上一個步驟的報告
    pub fn last_report(&self) -> Option<&StepReport> {
        self.reports.last()
    }

    /// 獲取指定名稱步驟的報告
    pub fn report_by_name(&self, name: &str) -> Option<&StepReport> {
        self.reports.iter().find(|r| r.step_name == name)
    }

    pub fn add_report(&mut self, report: StepReport) {
        self.reports.push(report);
    }

    /// 添加共享數據
    pub fn add_shared_data(&mut self, key: String, value: serde_json::Value) {
        self.shared_data.insert(key, value);
    }

    /// 獲取共享數據
    pub fn get_shared_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.shared_data.get(key)
    }
}
