use boot_runner::adapters::{build_provision_steps, runner::ShellRunner};
use boot_runner::utils::error::ErrorSeverity;
use boot_runner::utils::{logger, validation::Validate};
use boot_runner::{BootConfig, BootSupervisor};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;

/// 建置期佈建工具：把 Dockerfile 的隱式順序變成具名步驟
#[derive(Debug, Clone, Parser)]
#[command(name = "provision")]
#[command(about = "Provision the container image: packages, dependencies, sshd, staged files")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "boot-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log per-step CPU/memory stats
    #[arg(long)]
    monitor: bool,

    /// Show the step plan without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🔧 Starting image provisioning");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match BootConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置（含佈建專用欄位）
    if let Err(e) = config.validate().and_then(|_| config.validate_provision()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    let execution_id = format!("provision-{}", Utc::now().format("%Y%m%d%H%M%S"));
    let runner = Arc::new(ShellRunner::new());

    let mut supervisor = BootSupervisor::new(execution_id).with_monitoring(args.monitor);
    for step in build_provision_steps(&config, runner)? {
        supervisor.add_step(step);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no steps will be executed");
        println!("Provisioning plan for '{}':", config.bootstrap.name);
        for (index, name) in supervisor.step_names().iter().enumerate() {
            println!("  {}. {}", index + 1, name);
        }
        return Ok(());
    }

    match supervisor.execute_all().await {
        Ok(context) => {
            let summary = BootSupervisor::summarize(&context);
            tracing::info!(
                "✅ Provisioning completed: {}/{} steps in {}ms",
                summary.completed,
                summary.total_steps,
                summary.total_duration_ms
            );
            println!("✅ Provisioning completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Provisioning failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 建置失敗一律非零退出，不產生可用的映像
            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::High => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}
