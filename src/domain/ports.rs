use crate::core::context::BootContext;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Captured result of a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Seam over external process execution so steps can be driven by a real
/// shell in production and by canned outputs in tests.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command to completion and capture its output.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Run a command to completion, feeding `input` to its stdin.
    async fn run_with_input(
        &self,
        program: &str,
        args: &[String],
        input: &str,
    ) -> Result<CommandOutput>;

    /// Start a long-lived background daemon and return its pid. The daemon is
    /// not supervised after this call.
    async fn spawn_daemon(&self, program: &str, args: &[String]) -> Result<u32>;
}

/// 單一具名啟動步驟。由 supervisor 依序執行。
#[async_trait]
pub trait BootStep: Send + Sync {
    /// 用於日誌與報告的步驟名稱
    fn name(&self) -> &str;

    /// 失敗時是否中止整個流程
    fn fatal(&self) -> bool {
        true
    }

    /// 根據上下文決定是否執行
    fn should_run(&self, _context: &BootContext) -> bool {
        true
    }

    /// 執行步驟，成功時回傳要記錄在報告中的 metadata
    async fn run(&self, context: &mut BootContext)
        -> Result<HashMap<String, serde_json::Value>>;
}

pub trait ConfigProvider: Send + Sync {
    fn ssh_enabled(&self) -> bool;
    fn ssh_required(&self) -> bool;
    fn ssh_port(&self) -> u16;
    fn extension_paths(&self) -> Vec<String>;
    fn entrypoint(&self) -> &str;
}
