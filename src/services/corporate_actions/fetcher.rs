//! HTTP 抓取
//!
//! 统一的浏览器请求头、超时和字符集解码；非 2xx 状态码作为 `FetchError::HttpStatus` 返回

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::Client;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::FetchError;

use super::common::LOG_TARGET;

/// NSE 要求带 Referer
const NSE_REFERER: &str = "https://www.nseindia.com/";

/// 抓取到的页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP 状态码（2xx）
    pub status: u16,
    /// 解码后的响应体
    pub body: String,
}

/// 页面抓取接口
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET 指定 URL，非 2xx 返回 `FetchError::HttpStatus`
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// 基于 reqwest 的抓取实现
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// 按配置构建客户端（超时、连接超时、浏览器标识、cookie）
    pub fn new(config: &ApiConfig) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static(NSE_REFERER));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        log::debug!(target: LOG_TARGET, "请求公司行动数据 URL: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(FetchedPage {
            status: status.as_u16(),
            body: decode_body(&bytes, content_type.as_deref()),
        })
    }
}

/// 按 Content-Type 中的 charset 解码，缺省或无法识别时按 UTF-8
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(|ct| {
            ct.split(';')
                .filter_map(|part| part.trim().split_once('='))
                .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
                .map(|(_, value)| value.trim().trim_matches('"').to_string())
        })
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    encoding.decode(bytes).0.into_owned()
}
