use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BootError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 啟動與佈建流程的完整設定檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootConfig {
    pub bootstrap: BootstrapSection,
    pub ssh: Option<SshSection>,
    pub database: DatabaseSection,
    pub app: AppSection,
    pub provision: Option<ProvisionSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshSection {
    pub enabled: Option<bool>,
    /// 失敗是否致命；預設 false，遠端 shell 僅為運維便利
    pub required: Option<bool>,
    pub port: Option<u16>,
    pub daemon: Option<String>,
    pub args: Option<Vec<String>>,
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// 省略時使用 in-memory session 做驗證
    pub path: Option<String>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    pub entrypoint: String,
    pub args: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub env: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionSection {
    pub packages: Option<Vec<String>>,
    pub requirements: Option<String>,
    pub root_password: Option<String>,
    pub copies: Option<Vec<CopySpec>>,
    pub executables: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySpec {
    pub src: String,
    pub dest: String,
}

/// 映像中預期存在的四個 SQLite 擴充套件
pub const DEFAULT_EXTENSIONS: [&str; 4] = [
    "/usr/lib/sqlite3/pcompress",
    "/usr/lib/sqlite3/pjson1",
    "/usr/lib/sqlite3/pdbstat",
    "/usr/lib/sqlite3/psqlite_db_config",
];

pub const DEFAULT_SSH_PORT: u16 = 2222;

impl BootConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BootError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BootError::ConfigParseError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ROOT_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("bootstrap.name", &self.bootstrap.name)?;
        validation::validate_path("app.entrypoint", &self.app.entrypoint)?;
        validation::validate_non_empty_string("app.entrypoint", &self.app.entrypoint)?;

        // 驗證 sshd 連接埠（絕不可停在 22）
        validation::validate_service_port("ssh.port", self.ssh_port())?;

        // 驗證擴充套件清單
        let extensions = self.extension_paths();
        validation::validate_non_empty_list("database.extensions", &extensions)?;
        for path in &extensions {
            validation::validate_absolute_path("database.extensions", path)?;
        }

        if let Some(db_path) = &self.database.path {
            validation::validate_absolute_path("database.path", db_path)?;
        }

        Ok(())
    }

    /// 佈建專用的額外驗證（root 密碼必須由外部提供）
    pub fn validate_provision(&self) -> Result<()> {
        let provision = self.provision.as_ref().ok_or(BootError::MissingConfigError {
            field: "provision".to_string(),
        })?;

        let requirements =
            validation::validate_required_field("provision.requirements", &provision.requirements)?;
        validation::validate_non_empty_string("provision.requirements", requirements)?;

        let password =
            validation::validate_required_field("provision.root_password", &provision.root_password)?;
        validation::validate_non_empty_string("provision.root_password", password)?;
        validation::validate_resolved_value("provision.root_password", password)?;

        if let Some(packages) = &provision.packages {
            validation::validate_non_empty_list("provision.packages", packages)?;
        }

        Ok(())
    }

    /// 停用 sshd 步驟；`[ssh]` 區段不存在時會先建立，
    /// 否則預設的 enabled = true 會蓋過停用意圖
    pub fn disable_ssh(&mut self) {
        self.ssh.get_or_insert_with(Default::default).enabled = Some(false);
    }

    pub fn ssh_daemon(&self) -> String {
        self.ssh
            .as_ref()
            .and_then(|s| s.daemon.clone())
            .unwrap_or_else(|| "/usr/sbin/sshd".to_string())
    }

    pub fn ssh_args(&self) -> Vec<String> {
        self.ssh
            .as_ref()
            .and_then(|s| s.args.clone())
            .unwrap_or_default()
    }

    pub fn sshd_config_path(&self) -> String {
        self.ssh
            .as_ref()
            .and_then(|s| s.config_path.clone())
            .unwrap_or_else(|| "/etc/ssh/sshd_config".to_string())
    }
}

impl ConfigProvider for BootConfig {
    fn ssh_enabled(&self) -> bool {
        self.ssh
            .as_ref()
            .and_then(|s| s.enabled)
            .unwrap_or(true)
    }

    fn ssh_required(&self) -> bool {
        self.ssh
            .as_ref()
            .and_then(|s| s.required)
            .unwrap_or(false)
    }

    fn ssh_port(&self) -> u16 {
        self.ssh
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SSH_PORT)
    }

    fn extension_paths(&self) -> Vec<String> {
        self.database
            .extensions
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect())
    }

    fn entrypoint(&self) -> &str {
        &self.app.entrypoint
    }
}

impl Validate for BootConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[bootstrap]
name = "workout-tracker-boot"

[database]

[app]
entrypoint = "python3"
args = ["src/main.py"]
"#;

    #[test]
    fn test_parse_minimal_config_with_defaults() {
        let config = BootConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.bootstrap.name, "workout-tracker-boot");
        assert_eq!(config.app.entrypoint, "python3");
        assert!(config.ssh_enabled());
        assert!(!config.ssh_required());
        assert_eq!(config.ssh_port(), 2222);
        assert_eq!(config.extension_paths(), DEFAULT_EXTENSIONS.to_vec());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[bootstrap]
name = "workout-tracker-boot"
description = "Container boot sequence"

[ssh]
enabled = true
required = true
port = 2200
daemon = "/usr/sbin/sshd"

[database]
path = "/data/app.db"
extensions = ["/usr/lib/sqlite3/pjson1"]

[app]
entrypoint = "/usr/bin/python3"
args = ["src/main.py"]
working_dir = "/app"

[app.env]
APP_ENV = "production"

[provision]
packages = ["sqlite3", "openssh-server"]
requirements = "requirements.txt"
root_password = "secret"
executables = ["/usr/local/bin/boot"]

[[provision.copies]]
src = "startup.sh"
dest = "/usr/local/bin/boot"
"#;

        let config = BootConfig::from_toml_str(toml_content).unwrap();

        assert!(config.ssh_required());
        assert_eq!(config.ssh_port(), 2200);
        assert_eq!(config.extension_paths(), vec!["/usr/lib/sqlite3/pjson1"]);
        assert_eq!(config.app.env.as_ref().unwrap().get("APP_ENV").unwrap(), "production");
        assert!(config.validate().is_ok());
        assert!(config.validate_provision().is_ok());

        let copies = config.provision.unwrap().copies.unwrap();
        assert_eq!(copies[0].src, "startup.sh");
        assert_eq!(copies[0].dest, "/usr/local/bin/boot");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_BOOT_PASSWORD", "from-env");

        let toml_content = r#"
[bootstrap]
name = "test"

[database]

[app]
entrypoint = "python3"

[provision]
requirements = "requirements.txt"
root_password = "${TEST_BOOT_PASSWORD}"
"#;

        let config = BootConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.provision.as_ref().unwrap().root_password.as_deref(),
            Some("from-env")
        );

        std::env::remove_var("TEST_BOOT_PASSWORD");
    }

    #[test]
    fn test_unresolved_password_fails_provision_validation() {
        let toml_content = r#"
[bootstrap]
name = "test"

[database]

[app]
entrypoint = "python3"

[provision]
requirements = "requirements.txt"
root_password = "${DEFINITELY_UNSET_BOOT_VAR}"
"#;

        let config = BootConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate_provision().is_err());
    }

    #[test]
    fn test_port_22_is_rejected() {
        let toml_content = r#"
[bootstrap]
name = "test"

[ssh]
port = 22

[database]

[app]
entrypoint = "python3"
"#;

        let config = BootConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_extension_path_is_rejected() {
        let toml_content = r#"
[bootstrap]
name = "test"

[database]
extensions = ["sqlite3/pjson1"]

[app]
entrypoint = "python3"
"#;

        let config = BootConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disable_ssh_without_ssh_section() {
        // 沒有 [ssh] 區段時停用也必須生效，不能落回預設的 enabled
        let mut config = BootConfig::from_toml_str(MINIMAL).unwrap();
        assert!(config.ssh_enabled());

        config.disable_ssh();

        assert!(!config.ssh_enabled());
    }

    #[test]
    fn test_disable_ssh_overrides_existing_section() {
        let toml_content = r#"
[bootstrap]
name = "test"

[ssh]
enabled = true
port = 2222

[database]

[app]
entrypoint = "python3"
"#;

        let mut config = BootConfig::from_toml_str(toml_content).unwrap();
        config.disable_ssh();

        assert!(!config.ssh_enabled());
        // 其他 ssh 欄位不受影響
        assert_eq!(config.ssh_port(), 2222);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = BootConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bootstrap.name, "workout-tracker-boot");
    }

    #[test]
    fn test_missing_provision_section() {
        let config = BootConfig::from_toml_str(MINIMAL).unwrap();
        assert!(matches!(
            config.validate_provision(),
            Err(BootError::MissingConfigError { .. })
        ));
    }
}
