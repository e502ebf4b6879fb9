use crate::core::context::BootContext;
use crate::domain::model::BootPhase;
use crate::domain::ports::BootStep;
use crate::utils::error::{BootError, Result};
use std::collections::HashMap;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

/// 終端步驟：以 exec 語義把行程讓給真正的應用。
///
/// 成功時本行程被完全取代，應用的退出碼就是容器的退出碼；
/// `run` 只有在 exec 失敗時才會返回。
pub struct HandoffStep {
    entrypoint: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl HandoffStep {
    pub fn new(
        entrypoint: String,
        args: Vec<String>,
        working_dir: Option<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            entrypoint,
            args,
            working_dir,
            env,
        }
    }

    /// Build the command to exec. Split out so the construction is testable
    /// without replacing the test process.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.entrypoint);
        cmd.args(&self.args);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd
    }
}

#[async_trait::async_trait]
impl BootStep for HandoffStep {
    fn name(&self) -> &str {
        "app-handoff"
    }

    async fn run(
        &self,
        context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        context.set_phase(BootPhase::AppRunning);

        tracing::info!(
            "🚀 Handing off to application: {} {}",
            self.entrypoint,
            self.args.join(" ")
        );

        // exec 只在失敗時返回；成功時以下程式碼不再執行
        let err = self.command().exec();

        Err(BootError::HandoffError {
            entrypoint: self.entrypoint.clone(),
            reason: err.to_string(),
        })
    }
}
