use crate::core::context::BootContext;
use crate::domain::model::{BootPhase, RunSummary, StepReport, StepStatus};
use crate::domain::ports::BootStep;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::time::Instant;

/// 依序執行具名步驟的監督器。
///
/// 每個失敗不是被忽略（非致命的服務啟動）就是致命的（在交棒給應用前中止）；
/// 任何步驟都不重試。
pub struct BootSupervisor {
    steps: Vec<Box<dyn BootStep>>,
    monitor: Option<SystemMonitor>,
    monitor_enabled: bool,
    execution_id: String,
}

impl BootSupervisor {
    pub fn new(execution_id: String) -> Self {
        Self {
            steps: Vec::new(),
            monitor: None,
            monitor_enabled: false,
            execution_id,
        }
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor_enabled = enabled;
        if enabled {
            self.monitor = Some(SystemMonitor::new(enabled));
        }
        self
    }

    /// 添加步驟（依加入順序執行）
    pub fn add_step(&mut self, step: Box<dyn BootStep>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// 依序執行所有步驟。
    ///
    /// 致命步驟的錯誤立即中止並回傳；非致命步驟的錯誤記錄為
    /// `FailedNonFatal` 後繼續。成功跑完（或被 exec 取代）前的
    /// 上下文會累積每一步的報告。
    pub async fn execute_all(&self) -> Result<BootContext> {
        let mut context = BootContext::new(self.execution_id.clone());

        for step in &self.steps {
            let start_time = Instant::now();

            if !step.should_run(&context) {
                tracing::info!("⏭️ Skipping step: {} (condition not met)", step.name());
                context.add_report(StepReport::new(step.name(), StepStatus::Skipped));
                continue;
            }

            tracing::info!("▶️ Running step: {}", step.name());

            match step.run(&mut context).await {
                Ok(metadata) => {
                    let mut report = StepReport::new(step.name(), StepStatus::Completed);
                    report.duration = start_time.elapsed();
                    report.metadata = metadata;

                    tracing::info!(
                        "✅ Step completed: {} (duration: {:?})",
                        step.name(),
                        report.duration
                    );

                    if let Some(monitor) = &self.monitor {
                        monitor.log_stats(step.name());
                    }

                    context.add_report(report);
                }
                Err(e) if step.fatal() => {
                    context.set_phase(BootPhase::Fatal);
                    tracing::error!("❌ Fatal step failed: {} - {}", step.name(), e);
                    return Err(e);
                }
                Err(e) => {
                    // 與應用錯誤區分開的服務啟動失敗日誌
                    tracing::warn!(
                        "⚠️ Non-fatal step failed: {} - {} (continuing)",
                        step.name(),
                        e
                    );

                    let mut report = StepReport::new(step.name(), StepStatus::FailedNonFatal);
                    report.duration = start_time.elapsed();
                    report
                        .metadata
                        .insert("error".to_string(), serde_json::json!(e.to_string()));
                    context.add_report(report);
                }
            }
        }

        Ok(context)
    }

    pub fn summarize(context: &BootContext) -> RunSummary {
        RunSummary::from_reports(&context.reports)
    }
}
