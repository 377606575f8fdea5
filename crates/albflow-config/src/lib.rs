pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_PATH_ENV: &str = "ALBFLOW_CONFIG_PATH";
const CANDIDATES: [&str; 4] = [
    "albflow.local.yaml",
    ".albflow.local.yaml",
    "albflow.yaml",
    ".albflow.yaml",
];

/// albflow の実行設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbflowConfig {
    /// ジョブに付与するクラウドプロバイダ名
    pub cloud_provider: String,

    /// クラウド状態の参照に使うサービスアカウント
    pub service_account: String,

    /// スナップショットの保存先
    pub snapshot_dir: PathBuf,
}

impl Default for AlbflowConfig {
    fn default() -> Self {
        Self {
            cloud_provider: "aws".to_string(),
            service_account: "albflow".to_string(),
            snapshot_dir: PathBuf::from(".albflow"),
        }
    }
}

/// グローバル設定ファイルのパス (~/.config/albflow/albflow.yaml)
pub fn global_config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("albflow")
        .join("albflow.yaml"))
}

/// プロジェクトの設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 ALBFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: albflow.local.yaml, .albflow.local.yaml, albflow.yaml, .albflow.yaml
/// 3. ./.albflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/albflow/albflow.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_in(&current_dir) {
        return Ok(path);
    }

    let albflow_dir = current_dir.join(".albflow");
    if albflow_dir.is_dir()
        && let Some(path) = find_in(&albflow_dir)
    {
        return Ok(path);
    }

    if let Ok(global_config) = global_config_path()
        && global_config.exists()
    {
        return Ok(global_config);
    }

    Err(ConfigError::ConfigFileNotFound)
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|filename| dir.join(filename))
        .find(|path| path.exists())
}

/// 指定パスの設定ファイルを読み込む
pub fn load_config_from(path: &Path) -> Result<AlbflowConfig> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AlbflowConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// 設定を読み込む。設定ファイルが無ければデフォルト値を使う
pub fn load_config() -> Result<AlbflowConfig> {
    match find_config_file() {
        Ok(path) => load_config_from(&path),
        Err(ConfigError::ConfigFileNotFound) => Ok(AlbflowConfig::default()),
        Err(e) => Err(e),
    }
}
