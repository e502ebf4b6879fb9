//! Build-time provisioning steps. The Dockerfile's implicit RUN ordering is
//! made explicit here: each step is named, fatal, and executed in sequence by
//! the same supervisor that drives the boot sequence.

pub mod sshd_config;

use crate::config::toml_config::CopySpec;
use crate::core::context::BootContext;
use crate::domain::ports::{BootStep, ProcessRunner};
use crate::utils::error::{BootError, Result};
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 安裝 OS 套件（sqlite3、openssh-server、框架套件等）
pub struct OsPackageStep {
    packages: Vec<String>,
    runner: Arc<dyn ProcessRunner>,
}

impl OsPackageStep {
    pub fn new(packages: Vec<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { packages, runner }
    }
}

#[async_trait::async_trait]
impl BootStep for OsPackageStep {
    fn name(&self) -> &str {
        "os-packages"
    }

    fn should_run(&self, _context: &BootContext) -> bool {
        !self.packages.is_empty()
    }

    async fn run(
        &self,
        _context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        tracing::info!("📦 Installing {} OS package(s)", self.packages.len());

        let update = self
            .runner
            .run("apt-get", &["update".to_string()])
            .await?;
        if !update.success() {
            return Err(BootError::CommandFailed {
                command: "apt-get update".to_string(),
                status: update.status.unwrap_or(-1),
                stderr: update.stderr,
            });
        }

        let mut args = vec![
            "install".to_string(),
            "-y".to_string(),
            "--no-install-recommends".to_string(),
        ];
        args.extend(self.packages.iter().cloned());

        let install = self.runner.run("apt-get", &args).await?;
        if !install.success() {
            return Err(BootError::CommandFailed {
                command: format!("apt-get install {}", self.packages.join(" ")),
                status: install.status.unwrap_or(-1),
                stderr: install.stderr,
            });
        }

        let mut metadata = HashMap::new();
        metadata.insert("packages".to_string(), serde_json::json!(self.packages));
        Ok(metadata)
    }
}

/// 從 manifest 安裝 Python 依賴；manifest 不存在即失敗
pub struct PythonDepsStep {
    manifest: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl PythonDepsStep {
    pub fn new(manifest: PathBuf, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { manifest, runner }
    }
}

#[async_trait::async_trait]
impl BootStep for PythonDepsStep {
    fn name(&self) -> &str {
        "python-deps"
    }

    async fn run(
        &self,
        _context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        // manifest 必須先於安裝步驟存在（對應建置時的複製順序）
        if !self.manifest.exists() {
            return Err(BootError::ProvisionError {
                step: self.name().to_string(),
                reason: format!(
                    "dependency manifest not found: {}",
                    self.manifest.display()
                ),
            });
        }

        tracing::info!(
            "🐍 Installing Python dependencies from {}",
            self.manifest.display()
        );

        let args = vec![
            "install".to_string(),
            "--no-cache-dir".to_string(),
            "-r".to_string(),
            self.manifest.display().to_string(),
        ];

        let output = self.runner.run("pip", &args).await?;
        if !output.success() {
            // pip 的 stderr 會指出無法安裝的套件名稱
            return Err(BootError::CommandFailed {
                command: format!("pip install -r {}", self.manifest.display()),
                status: output.status.unwrap_or(-1),
                stderr: output.stderr,
            });
        }

        let mut metadata = HashMap::new();
        metadata.insert(
            "manifest".to_string(),
            serde_json::json!(self.manifest.display().to_string()),
        );
        Ok(metadata)
    }
}

/// 重寫 sshd_config（root 登入、連接埠重綁定）並設定 root 密碼
pub struct SshdConfigStep {
    config_path: PathBuf,
    port: u16,
    root_password: String,
    runner: Arc<dyn ProcessRunner>,
}

impl SshdConfigStep {
    pub fn new(
        config_path: PathBuf,
        port: u16,
        root_password: String,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            config_path,
            port,
            root_password,
            runner,
        }
    }
}

#[async_trait::async_trait]
impl BootStep for SshdConfigStep {
    fn name(&self) -> &str {
        "sshd-config"
    }

    async fn run(
        &self,
        _context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        tracing::info!(
            "🔧 Rewriting {} (root login, port {})",
            self.config_path.display(),
            self.port
        );

        let content = std::fs::read_to_string(&self.config_path)?;
        let rewritten = sshd_config::permit_root_login(&sshd_config::rebind_port(
            &content, self.port,
        ));

        if rewritten != content {
            std::fs::write(&self.config_path, &rewritten)?;
        }

        // root 憑證由外部提供，不寫死在映像裡
        let input = format!("root:{}\n", self.root_password);
        let output = self.runner.run_with_input("chpasswd", &[], &input).await?;
        if !output.success() {
            return Err(BootError::ProvisionError {
                step: self.name().to_string(),
                reason: format!("chpasswd failed: {}", output.stderr.trim()),
            });
        }

        let mut metadata = HashMap::new();
        metadata.insert("port".to_string(), serde_json::json!(self.port));
        metadata.insert(
            "config_path".to_string(),
            serde_json::json!(self.config_path.display().to_string()),
        );
        Ok(metadata)
    }
}

/// 複製啟動資產與應用原始碼，並標記可執行檔
pub struct StageFilesStep {
    copies: Vec<CopySpec>,
    executables: Vec<PathBuf>,
}

impl StageFilesStep {
    pub fn new(copies: Vec<CopySpec>, executables: Vec<PathBuf>) -> Self {
        Self { copies, executables }
    }

    fn copy_recursively(src: &Path, dest: &Path) -> Result<u64> {
        if src.is_dir() {
            std::fs::create_dir_all(dest)?;
            let mut copied = 0;
            for entry in std::fs::read_dir(src)? {
                let entry = entry?;
                copied += Self::copy_recursively(&entry.path(), &dest.join(entry.file_name()))?;
            }
            Ok(copied)
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(src, dest)?;
            Ok(1)
        }
    }
}

#[async_trait::async_trait]
impl BootStep for StageFilesStep {
    fn name(&self) -> &str {
        "stage-files"
    }

    fn should_run(&self, _context: &BootContext) -> bool {
        !self.copies.is_empty() || !self.executables.is_empty()
    }

    async fn run(
        &self,
        _context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        let mut total = 0u64;

        for copy in &self.copies {
            let src = Path::new(&copy.src);
            if !src.exists() {
                return Err(BootError::ProvisionError {
                    step: self.name().to_string(),
                    reason: format!("copy source does not exist: {}", copy.src),
                });
            }

            tracing::info!("📁 Copying {} -> {}", copy.src, copy.dest);
            total += Self::copy_recursively(src, Path::new(&copy.dest))?;
        }

        for path in &self.executables {
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(path, perms)?;
            tracing::debug!("Marked executable: {}", path.display());
        }

        let mut metadata = HashMap::new();
        metadata.insert("files_copied".to_string(), serde_json::json!(total));
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CommandOutput;
    use std::sync::Mutex;

    /// Canned-output runner recording every invocation.
    struct MockRunner {
        outputs: Mutex<Vec<CommandOutput>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockRunner {
        fn with_outputs(outputs: Vec<CommandOutput>) -> Arc<Self> {
            Arc::new(Self {
                outputs: Mutex::new(outputs),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn ok() -> CommandOutput {
            CommandOutput {
                status: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }
        }

        fn failed(status: i32, stderr: &str) -> CommandOutput {
            CommandOutput {
                status: Some(status),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }
        }

        fn next(&self, call: String) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(call);
            let mut outputs = self.outputs.lock().unwrap();
            Ok(if outputs.is_empty() {
                Self::ok()
            } else {
                outputs.remove(0)
            })
        }
    }

    #[async_trait::async_trait]
    impl ProcessRunner for MockRunner {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.next(format!("{} {}", program, args.join(" ")))
        }

        async fn run_with_input(
            &self,
            program: &str,
            _args: &[String],
            input: &str,
        ) -> Result<CommandOutput> {
            self.next(format!("{} <<< {}", program, input.trim()))
        }

        async fn spawn_daemon(&self, program: &str, _args: &[String]) -> Result<u32> {
            self.calls.lock().unwrap().push(program.to_string());
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_os_packages_runs_update_then_install() {
        let runner = MockRunner::with_outputs(vec![]);
        let step = OsPackageStep::new(
            vec!["sqlite3".to_string(), "openssh-server".to_string()],
            runner.clone(),
        );
        let mut context = BootContext::new("test".to_string());

        step.run(&mut context).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0], "apt-get update");
        assert!(calls[1].contains("install -y --no-install-recommends sqlite3 openssh-server"));
    }

    #[tokio::test]
    async fn test_os_package_failure_carries_stderr() {
        let runner = MockRunner::with_outputs(vec![
            MockRunner::ok(),
            MockRunner::failed(100, "E: Unable to locate package no-such-pkg"),
        ]);
        let step = OsPackageStep::new(vec!["no-such-pkg".to_string()], runner);
        let mut context = BootContext::new("test".to_string());

        let err = step.run(&mut context).await.unwrap_err();

        assert!(err.to_string().contains("no-such-pkg"));
    }

    #[tokio::test]
    async fn test_python_deps_missing_manifest_fails_before_pip() {
        let runner = MockRunner::with_outputs(vec![]);
        let step = PythonDepsStep::new(PathBuf::from("/nonexistent/requirements.txt"), runner.clone());
        let mut context = BootContext::new("test".to_string());

        let err = step.run(&mut context).await.unwrap_err();

        assert!(err.to_string().contains("/nonexistent/requirements.txt"));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_python_deps_failure_names_offending_package() {
        let dir = tempfile::TempDir::new().unwrap();
        let manifest = dir.path().join("requirements.txt");
        std::fs::write(&manifest, "definitely-not-on-pypi==1.0\n").unwrap();

        let runner = MockRunner::with_outputs(vec![MockRunner::failed(
            1,
            "ERROR: No matching distribution found for definitely-not-on-pypi==1.0",
        )]);
        let step = PythonDepsStep::new(manifest, runner);
        let mut context = BootContext::new("test".to_string());

        let err = step.run(&mut context).await.unwrap_err();

        assert!(err.to_string().contains("definitely-not-on-pypi"));
    }

    #[tokio::test]
    async fn test_sshd_config_step_rewrites_file_and_sets_password() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("sshd_config");
        std::fs::write(
            &config_path,
            "#Port 22\n#PermitRootLogin prohibit-password\n",
        )
        .unwrap();

        let runner = MockRunner::with_outputs(vec![]);
        let step = SshdConfigStep::new(config_path.clone(), 2222, "secret".to_string(), runner.clone());
        let mut context = BootContext::new("test".to_string());

        step.run(&mut context).await.unwrap();

        let rewritten = std::fs::read_to_string(&config_path).unwrap();
        assert!(rewritten.contains("Port 2222"));
        assert!(rewritten.contains("PermitRootLogin yes"));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0], "chpasswd <<< root:secret");
    }

    #[tokio::test]
    async fn test_stage_files_missing_source_fails() {
        let step = StageFilesStep::new(
            vec![CopySpec {
                src: "/nonexistent/startup.sh".to_string(),
                dest: "/tmp/boot".to_string(),
            }],
            vec![],
        );
        let mut context = BootContext::new("test".to_string());

        let err = step.run(&mut context).await.unwrap_err();

        assert!(err.to_string().contains("/nonexistent/startup.sh"));
    }

    #[tokio::test]
    async fn test_stage_files_copies_tree_and_marks_executable() {
        let dir = tempfile::TempDir::new().unwrap();
        let src_dir = dir.path().join("src");
        std::fs::create_dir_all(src_dir.join("nested")).unwrap();
        std::fs::write(src_dir.join("main.py"), "print('hi')\n").unwrap();
        std::fs::write(src_dir.join("nested").join("util.py"), "\n").unwrap();

        let dest_dir = dir.path().join("app").join("src");
        let script = dir.path().join("startup.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();

        let step = StageFilesStep::new(
            vec![CopySpec {
                src: src_dir.display().to_string(),
                dest: dest_dir.display().to_string(),
            }],
            vec![script.clone()],
        );
        let mut context = BootContext::new("test".to_string());

        let metadata = step.run(&mut context).await.unwrap();

        assert_eq!(metadata.get("files_copied").unwrap(), &serde_json::json!(2));
        assert!(dest_dir.join("main.py").exists());
        assert!(dest_dir.join("nested").join("util.py").exists());

        let mode = std::fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
