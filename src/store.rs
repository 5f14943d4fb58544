use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use crate::time_entry::{Client, Project, Task, TimeEntry};

/// スナップショットのパスを指定する環境変数。
pub const SNAPSHOT_ENV: &str = "HOURLY_SNAPSHOT";
/// 集計対象のユーザーを指定する環境変数。
pub const USER_ENV: &str = "HOURLY_USER";

/// 集計に使うエントリー・プロジェクト・クライアントの一式。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub entries: Vec<TimeEntry>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// スナップショットを読み込むためのtrait。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotRepository {
    /// スナップショットを読み込む。
    ///
    /// エントリーは対象ユーザーのものに絞り込まれている。
    async fn read_snapshot(&self) -> Result<Snapshot>;
}

/// JSONファイルからスナップショットを読み込む。
///
/// # Examples
///
/// ```ignore
/// let store = JsonFileStore::from_env(None).unwrap();
/// let snapshot = store.read_snapshot().await.unwrap();
/// ```
pub struct JsonFileStore {
    path: PathBuf,
    user_id: Option<String>,
}

impl JsonFileStore {
    /// 新しい`JsonFileStore`を返す。
    ///
    /// # Arguments
    ///
    /// * `path` - スナップショットのJSONファイル
    /// * `user_id` - 集計対象のユーザー。`None`の場合は全ユーザー
    pub fn new(path: impl Into<PathBuf>, user_id: Option<String>) -> Self {
        Self {
            path: path.into(),
            user_id,
        }
    }

    /// 引数と環境変数から`JsonFileStore`を返す。
    ///
    /// パスは引数、環境変数`HOURLY_SNAPSHOT`、データディレクトリの`hourly/snapshot.json`の順で決める。
    pub fn from_env(path: Option<PathBuf>) -> Result<Self> {
        let path = match path.or_else(|| env::var_os(SNAPSHOT_ENV).map(PathBuf::from)) {
            Some(path) => path,
            None => dirs::data_dir()
                .context("Failed to find data directory")?
                .join("hourly")
                .join("snapshot.json"),
        };
        let user_id = env::var(USER_ENV).ok().filter(|user_id| !user_id.is_empty());

        Ok(Self::new(path, user_id))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotRepository for JsonFileStore {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        let mut snapshot: Snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))?;
        info!("length of time entries: {}", snapshot.entries.len());

        if let Some(user_id) = &self.user_id {
            snapshot.entries.retain(|entry| &entry.user_id == user_id);
            info!("time entries for {}: {}", user_id, snapshot.entries.len());
        }

        Ok(snapshot)
    }
}
