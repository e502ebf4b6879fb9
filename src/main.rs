use boot_runner::adapters::{build_boot_steps, runner::ShellRunner};
use boot_runner::utils::error::ErrorSeverity;
use boot_runner::utils::{logger, validation::Validate};
use boot_runner::{BootConfig, BootSupervisor, CliConfig};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting container bootstrap");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match BootConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if args.skip_ssh {
        config.disable_ssh();
        tracing::info!("🔧 SSH daemon disabled by --skip-ssh");
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    let execution_id = format!("boot-{}", Utc::now().format("%Y%m%d%H%M%S"));
    let runner = Arc::new(ShellRunner::new());

    let mut supervisor = BootSupervisor::new(execution_id).with_monitoring(args.monitor);
    for step in build_boot_steps(&config, runner) {
        supervisor.add_step(step);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no steps will be executed");
        println!("Boot plan for '{}':", config.bootstrap.name);
        for (index, name) in supervisor.step_names().iter().enumerate() {
            println!("  {}. {}", index + 1, name);
        }
        return Ok(());
    }

    // 成功路徑以 exec 結束，只有失敗才會回到這裡
    match supervisor.execute_all().await {
        Ok(context) => {
            // 只有在交棒步驟被跳過或序列為空時才會走到這裡
            let summary = BootSupervisor::summarize(&context);
            tracing::warn!(
                "Bootstrap finished without handing off (steps executed: {:?})",
                summary.executed_steps
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Bootstrap failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 致命錯誤一律非零退出；依嚴重程度區分退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::High => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}
