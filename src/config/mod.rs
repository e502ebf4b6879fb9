pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

/// 啟動器 (`boot`) 的命令列參數
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "boot")]
#[command(about = "Container bootstrap launcher: validate the runtime, then exec the app")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "boot-config.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log per-step CPU/memory stats
    #[arg(long)]
    pub monitor: bool,

    /// Show the step plan without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip starting the ssh daemon regardless of config
    #[arg(long)]
    pub skip_ssh: bool,

    /// Emit JSON logs instead of the compact format
    #[arg(long)]
    pub json_logs: bool,
}
