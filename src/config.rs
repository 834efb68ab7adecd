//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置与数据源配置（股票代码映射、公司行动数据源）

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::ActionKind;

/// 默认浏览器标识
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// NSE 公司行动接口（按股票代码查询）
pub const NSE_CORPORATE_ACTIONS_URL: &str =
    "https://www.nseindia.com/api/corporates-corporateActions?index=equities&symbol={symbol}";

/// URL 模板中的股票代码占位符
pub const SYMBOL_PLACEHOLDER: &str = "{symbol}";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 外部请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 请求头中的浏览器标识
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 公司行动采集器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 数据源配置文件路径
    #[serde(default = "default_data_sources")]
    pub data_sources: PathBuf,
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 外部请求配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 采集器配置
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }
fn default_data_sources() -> PathBuf { PathBuf::from("config/data_sources.json") }
fn default_output_dir() -> PathBuf { PathBuf::from("data/raw/corporate_actions") }
fn default_log_level() -> String { "info".to_string() }
fn default_source() -> String { NSE_CORPORATE_ACTIONS_URL.to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            data_sources: default_data_sources(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 此时日志系统尚未初始化，结果以消息形式返回，由调用方在初始化日志后输出
    pub fn load() -> (Self, String) {
        let config_paths = ["config.json", "config/config.json"];
        let mut notes = Vec::new();

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => return (config, format!("从 {} 加载配置成功", path)),
                    Err(e) => notes.push(format!("加载配置文件 {} 失败: {}", path, e)),
                }
            }
        }

        notes.push("使用默认配置".to_string());
        (Self::default(), notes.join("; "))
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ==================== 数据源配置 ====================

/// 股票代码映射表：内部代码 -> 交易所代码
///
/// 加载后只读，未命中时原样返回内部代码
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolMap(HashMap<String, String>);

impl SymbolMap {
    #[cfg(test)]
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self(entries)
    }

    /// 解析交易所代码，映射表中不存在时返回原代码
    pub fn resolve<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.0.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// 各类公司行动的数据源 URL 模板，`{symbol}` 替换为交易所代码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTemplates {
    #[serde(default = "default_source")]
    pub dividends: String,
    #[serde(default = "default_source")]
    pub splits: String,
    #[serde(default = "default_source")]
    pub rights: String,
    #[serde(default = "default_source")]
    pub bonus: String,
}

impl Default for SourceTemplates {
    fn default() -> Self {
        Self {
            dividends: default_source(),
            splits: default_source(),
            rights: default_source(),
            bonus: default_source(),
        }
    }
}

impl SourceTemplates {
    pub fn template(&self, kind: ActionKind) -> &str {
        match kind {
            ActionKind::Dividends => &self.dividends,
            ActionKind::Splits => &self.splits,
            ActionKind::Rights => &self.rights,
            ActionKind::Bonus => &self.bonus,
        }
    }

    /// 用（已 URL 编码的）交易所代码渲染模板
    pub fn render(&self, kind: ActionKind, symbol: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(symbol.as_bytes()).collect();
        self.template(kind).replace(SYMBOL_PLACEHOLDER, &encoded)
    }
}

/// 数据源配置文件（默认 config/data_sources.json）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSources {
    /// NSE 股票代码映射
    #[serde(default)]
    pub nse_symbols: SymbolMap,
    /// 公司行动数据源
    #[serde(default)]
    pub corporate_actions: SourceTemplates,
}

impl DataSources {
    /// 从 JSON 文件加载数据源配置
    ///
    /// 文件缺失返回 `ConfigError::Missing`，JSON 非法或模板缺少占位符返回 `ConfigError::Malformed`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Missing {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|reason| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_json(content: &str) -> Result<Self, String> {
        let sources: DataSources = serde_json::from_str(content).map_err(|e| e.to_string())?;

        for kind in ActionKind::ALL {
            if !sources.corporate_actions.template(kind).contains(SYMBOL_PLACEHOLDER) {
                return Err(format!("{} 数据源 URL 缺少 {} 占位符", kind, SYMBOL_PLACEHOLDER));
            }
        }

        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_falls_back_to_internal_symbol() {
        let sources = DataSources::from_json(r#"{"nse_symbols": {"TCS": "TCS.NS"}}"#).unwrap();

        assert_eq!(sources.nse_symbols.resolve("TCS"), "TCS.NS");
        for symbol in ["INFY", "RELIANCE", "M&M", ""] {
            assert_eq!(sources.nse_symbols.resolve(symbol), symbol);
        }
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let sources = DataSources::from_json("{}").unwrap();

        assert_eq!(sources.nse_symbols.len(), 0);
        assert_eq!(sources.corporate_actions.dividends, NSE_CORPORATE_ACTIONS_URL);
        assert_eq!(sources.corporate_actions.bonus, NSE_CORPORATE_ACTIONS_URL);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = DataSources::from_file("/nonexistent/data_sources.json").unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let file = write_temp(r#"{"nse_symbols": {"TCS": "#);
        let err = DataSources::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let err = DataSources::from_json(
            r#"{"corporate_actions": {"splits": "https://example.com/splits"}}"#,
        )
        .unwrap_err();
        assert!(err.contains("splits"));
    }

    #[test]
    fn test_render_encodes_symbol() {
        let templates = SourceTemplates::default();
        let url = templates.render(ActionKind::Bonus, "M&M");

        assert!(url.ends_with("symbol=M%26M"));
    }

    #[test]
    fn test_app_config_partial_file() {
        let file = write_temp(r#"{"server": {"port": 9000}, "collector": {"output_dir": "out"}}"#);
        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.collector.output_dir, PathBuf::from("out"));
        assert_eq!(config.collector.data_sources, PathBuf::from("config/data_sources.json"));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.log.level, "info");
    }
}
