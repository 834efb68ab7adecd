//! 错误类型定义
//!
//! 公司行动采集链路上的各类错误：配置、抓取、解析、汇总与持久化

use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误（采集器构造阶段即失败）
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件不存在或无法读取
    #[error("无法读取配置文件 {path}: {source}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件格式错误
    #[error("配置文件 {path} 格式错误: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// 输出目录无法创建
    #[error("无法创建输出目录 {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 抓取错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// 网络层失败（连接、超时、读取响应体）
    #[error("网络错误: {0}")]
    Network(String),

    /// 非 2xx 状态码
    #[error("HTTP 状态码 {0}")]
    HttpStatus(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if !status.is_success() => FetchError::HttpStatus(status.as_u16()),
            _ => FetchError::Network(err.to_string()),
        }
    }
}

/// 解析错误（内容存在但结构无法识别）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// JSON 语法错误或结构不符
    #[error("JSON 解析失败: {0}")]
    Json(String),

    /// HTML 中未找到公司行动表格
    #[error("未找到公司行动数据表格")]
    MissingTable,
}

/// 汇总错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// 四类公司行动均无数据
    #[error("未找到 {0} 的任何公司行动数据")]
    NoData(String),
}

/// 持久化错误
#[derive(Debug, Error)]
pub enum PersistError {
    /// 不支持的导出格式
    #[error("不支持的文件格式: {0}")]
    UnsupportedFormat(String),

    /// 空结果集不允许落盘
    #[error("{0} 的公司行动结果为空，拒绝写入")]
    EmptyBundle(String),

    /// 文件系统错误
    #[error("读写文件 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 序列化 / 反序列化失败
    #[error("序列化失败: {0}")]
    Serialize(String),
}

impl PersistError {
    /// serde_json 错误：底层 I/O 失败归为 `Io`，其余为 `Serialize`
    pub fn from_json(path: &Path, err: serde_json::Error) -> Self {
        if err.is_io() {
            PersistError::Io {
                path: path.to_path_buf(),
                source: err.into(),
            }
        } else {
            PersistError::Serialize(err.to_string())
        }
    }

    /// csv 错误：底层 I/O 失败归为 `Io`，其余为 `Serialize`
    pub fn from_csv(path: &Path, err: csv::Error) -> Self {
        if !err.is_io_error() {
            return PersistError::Serialize(err.to_string());
        }
        match err.into_kind() {
            csv::ErrorKind::Io(source) => PersistError::Io {
                path: path.to_path_buf(),
                source,
            },
            kind => PersistError::Serialize(format!("{:?}", kind)),
        }
    }
}
