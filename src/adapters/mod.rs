// Adapters layer: concrete boot/provision steps and the process runner that
// backs them.

pub mod extensions;
pub mod handoff;
pub mod provision;
pub mod runner;
pub mod ssh;

use crate::config::toml_config::BootConfig;
use crate::domain::ports::{BootStep, ConfigProvider, ProcessRunner};
use crate::utils::error::{BootError, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// 依固定順序組出啟動序列：sshd → 擴充套件驗證 → 交棒
pub fn build_boot_steps(
    config: &BootConfig,
    runner: Arc<dyn ProcessRunner>,
) -> Vec<Box<dyn BootStep>> {
    let ssh = ssh::SshStep::new(
        config.ssh_daemon(),
        config.ssh_args(),
        config.ssh_port(),
        config.ssh_enabled(),
        config.ssh_required(),
        runner,
    );

    let extensions = extensions::ExtensionStep::new(
        config.database.path.as_ref().map(PathBuf::from),
        config
            .extension_paths()
            .iter()
            .map(PathBuf::from)
            .collect(),
    );

    let handoff = handoff::HandoffStep::new(
        config.app.entrypoint.clone(),
        config.app.args.clone().unwrap_or_default(),
        config.app.working_dir.as_ref().map(PathBuf::from),
        config.app.env.clone().unwrap_or_default(),
    );

    vec![Box::new(ssh), Box::new(extensions), Box::new(handoff)]
}

/// 組出建置期的佈建序列。順序即正確性：manifest 安裝先於
/// 檔案佈署，sshd 設定先於映像定稿。
pub fn build_provision_steps(
    config: &BootConfig,
    runner: Arc<dyn ProcessRunner>,
) -> Result<Vec<Box<dyn BootStep>>> {
    config.validate_provision()?;

    let provision = config
        .provision
        .as_ref()
        .ok_or(BootError::MissingConfigError {
            field: "provision".to_string(),
        })?;

    let packages = provision.packages.clone().unwrap_or_default();
    let manifest = provision
        .requirements
        .as_ref()
        .map(PathBuf::from)
        .ok_or(BootError::MissingConfigError {
            field: "provision.requirements".to_string(),
        })?;
    let password = provision
        .root_password
        .clone()
        .ok_or(BootError::MissingConfigError {
            field: "provision.root_password".to_string(),
        })?;

    let steps: Vec<Box<dyn BootStep>> = vec![
        Box::new(provision::OsPackageStep::new(packages, runner.clone())),
        Box::new(provision::PythonDepsStep::new(manifest, runner.clone())),
        Box::new(provision::SshdConfigStep::new(
            PathBuf::from(config.sshd_config_path()),
            config.ssh_port(),
            password,
            runner,
        )),
        Box::new(provision::StageFilesStep::new(
            provision.copies.clone().unwrap_or_default(),
            provision
                .executables
                .clone()
                .unwrap_or_default()
                .iter()
                .map(PathBuf::from)
                .collect(),
        )),
    ];

    Ok(steps)
}
