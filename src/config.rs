//! 配置模块，负责加载JSON配置文件

use crate::dialect::DialectKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 编译器配置
///
/// ```json
/// { "dialect": "postgres", "strict": false, "catalog": "catalog.json" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// 生成 SQL 使用的方言
    pub dialect: DialectKind,
    /// 严格模式：语义错误直接失败，而不是丢弃该条件
    pub strict: bool,
    /// 元数据目录快照的路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl CompilerConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    /// 目录路径相对于配置文件所在目录解析
    pub fn catalog_path(&self, config_path: &Path) -> Option<PathBuf> {
        let catalog = self.catalog.as_ref()?;
        if catalog.is_absolute() {
            return Some(catalog.clone());
        }
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(catalog))
    }
}
