use crate::domain::ports::{CommandOutput, ProcessRunner};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Production `ProcessRunner` backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn to_output(output: std::process::Output) -> CommandOutput {
        CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!("Running command: {} {}", program, args.join(" "));

        let output = Command::new(program).args(args).output().await?;
        Ok(Self::to_output(output))
    }

    async fn run_with_input(
        &self,
        program: &str,
        args: &[String],
        input: &str,
    ) -> Result<CommandOutput> {
        tracing::debug!("Running command with stdin: {}", program);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
            // 關閉 stdin，讓子行程讀到 EOF
        }

        let output = child.wait_with_output().await?;
        Ok(Self::to_output(output))
    }

    async fn spawn_daemon(&self, program: &str, args: &[String]) -> Result<u32> {
        tracing::debug!("Spawning daemon: {} {}", program, args.join(" "));

        // The daemon outlives this process handle; it is not supervised and
        // must not be killed when the handle is dropped.
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(false)
            .spawn()?;

        Ok(child.id().unwrap_or(0))
    }
}
