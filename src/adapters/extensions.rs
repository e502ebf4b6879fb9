use crate::core::context::BootContext;
use crate::domain::model::BootPhase;
use crate::domain::ports::BootStep;
use crate::utils::error::{BootError, Result};
use rusqlite::{Connection, LoadExtensionGuard};
use std::collections::HashMap;
use std::path::PathBuf;

/// 在交棒給應用前驗證映像中的 SQLite 擴充套件。
///
/// 開啟單一 session，依序載入設定的共享函式庫；第一個失敗即致命，
/// 錯誤訊息指出缺少的擴充套件路徑。載入全部成功或中止，結果與
/// 載入順序無關。
pub struct ExtensionStep {
    db_path: Option<PathBuf>,
    extensions: Vec<PathBuf>,
}

impl ExtensionStep {
    pub fn new(db_path: Option<PathBuf>, extensions: Vec<PathBuf>) -> Self {
        Self {
            db_path,
            extensions,
        }
    }

    fn open_session(&self) -> Result<Connection> {
        let conn = match &self.db_path {
            Some(path) => Connection::open(path)?,
            // 驗證只需要一個活的 session，不需要應用的資料庫
            None => Connection::open_in_memory()?,
        };
        Ok(conn)
    }

    fn load_all(&self, conn: &Connection) -> Result<()> {
        // Scoped enable: extension loading is switched off again when the
        // guard drops, before any application code runs.
        let _guard = unsafe { LoadExtensionGuard::new(conn)? };

        for path in &self.extensions {
            unsafe { conn.load_extension(path, None) }.map_err(|e| {
                BootError::ExtensionLoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            tracing::debug!("Loaded SQLite extension: {}", path.display());
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl BootStep for ExtensionStep {
    fn name(&self) -> &str {
        "sqlite-extensions"
    }

    async fn run(
        &self,
        context: &mut BootContext,
    ) -> Result<HashMap<String, serde_json::Value>> {
        context.set_phase(BootPhase::ExtensionsValidating);

        tracing::info!(
            "🧩 Validating {} SQLite extension(s)",
            self.extensions.len()
        );

        let conn = self.open_session()?;
        self.load_all(&conn)?;

        context.set_phase(BootPhase::ExtensionsOk);

        let loaded: Vec<String> = self
            .extensions
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let mut metadata = HashMap::new();
        metadata.insert("loaded".to_string(), serde_json::json!(loaded));
        Ok(metadata)
    }
}
