use crate::core::context::BootContext;
use crate::domain::model::BootPhase;
use crate::domain::ports::{BootStep, ProcessRunner};
use crate::utils::error::{BootError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// 以背景 daemon 啟動 sshd 的步驟。
///
/// 啟動後不再監督其生命週期；預設失敗不致命（遠端 shell 僅為
/// 運維便利），`required = true` 時改為致命。
pub struct SshStep {
    daemon: String,
    args: Vec<String>,
    port: u16,
    enabled: bool,
    required: bool,
    runner: Arc<dyn ProcessRunner>,
}

impl SshStep {
    pub fn new(
        daemon: String,
        args: Vec<String>,
        port: u16,
        enabled: bool,
        required: bool,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            daemon,
            args,
            port,
            enabled,
            required,
            runner,
        }
    }
}

#[async_trait::async_trait]
impl BootStep for SshStep {
    fn name(&self) -> &str {
        "ssh-daemon"
    }

    fn fatal(&self) -> bool {
        self.required
    }

    fn should_run(&self, _context: &BootContext) -> bool {
        self.enabled
    }

    async fn run(
        &self,
        context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        context.set_phase(BootPhase::SshStarting);

        tracing::info!("🔐 Starting sshd on port {}", self.port);

        match self.runner.spawn_daemon(&self.daemon, &self.args).await {
            Ok(pid) => {
                context.set_phase(BootPhase::SshReady);
                context.add_shared_data("sshd_pid".to_string(), serde_json::json!(pid));

                let mut metadata = HashMap::new();
                metadata.insert("pid".to_string(), serde_json::json!(pid));
                metadata.insert("port".to_string(), serde_json::json!(self.port));
                Ok(metadata)
            }
            Err(e) => {
                context.set_phase(BootPhase::SshFailed);
                Err(BootError::ServiceStartError {
                    service: "sshd".to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
