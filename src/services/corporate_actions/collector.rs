//! 公司行动采集器
//!
//! 对单只股票依次采集分红、拆股、配股、送股四类数据。每一类独立完成
//! “解析代码 -> 渲染 URL -> 抓取 -> 解析”，某一类失败只记录日志，
//! 不影响其他类型；四类均无数据时才返回 `CollectionError::NoData`。

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DataSources;
use crate::error::{CollectionError, ConfigError, FetchError, PersistError};
use crate::models::{
    ActionKind, ActionsBundle, CollectionReport, CorporateAction, KindReport, KindStatus,
};

use super::common::LOG_TARGET;
use super::parser::parse_action;
use super::persister::{PersistFormat, Persister};
use super::{FetchedPage, Fetcher};

/// 公司行动采集器
///
/// 构造后只读，可在多个请求间共享
pub struct CorporateActionsCollector {
    sources: DataSources,
    fetcher: Arc<dyn Fetcher>,
    persister: Persister,
}

impl CorporateActionsCollector {
    /// 创建采集器，同时确保输出目录存在
    pub fn new<P: Into<PathBuf>>(
        sources: DataSources,
        fetcher: Arc<dyn Fetcher>,
        output_dir: P,
    ) -> Result<Self, ConfigError> {
        let persister = Persister::new(output_dir)?;
        log::info!(
            target: LOG_TARGET,
            "公司行动采集器已初始化: {} 个代码映射, 输出目录 {}",
            sources.nse_symbols.len(),
            persister.output_dir().display()
        );

        Ok(Self {
            sources,
            fetcher,
            persister,
        })
    }

    /// 内部代码 -> 交易所代码
    pub fn resolve<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.sources.nse_symbols.resolve(symbol)
    }

    /// 采集公司行动，四类均无数据时返回 `CollectionError::NoData`
    pub async fn collect(&self, symbol: &str) -> Result<ActionsBundle, CollectionError> {
        let (_, bundle) = self.collect_report(symbol).await;
        bundle.ok_or_else(|| CollectionError::NoData(symbol.to_string()))
    }

    /// 采集公司行动并返回逐类明细
    pub async fn collect_report(&self, symbol: &str) -> (CollectionReport, Option<ActionsBundle>) {
        let resolved = self.resolve(symbol).to_string();
        let mut kinds = Vec::with_capacity(ActionKind::ALL.len());
        let mut actions = Vec::new();

        for kind in ActionKind::ALL {
            let url = self.sources.corporate_actions.render(kind, &resolved);
            let (status, action) = self.collect_kind(kind, symbol, &url).await;

            if let Some(action) = action {
                actions.push(action);
            }
            kinds.push(KindReport { kind, url, status });
        }

        let bundle = ActionsBundle::from_actions(actions);
        match &bundle {
            Some(bundle) => log::info!(
                target: LOG_TARGET,
                "成功采集 {} 的公司行动数据: {:?}",
                symbol,
                bundle.kinds()
            ),
            None => log::warn!(target: LOG_TARGET, "未找到 {} 的任何公司行动数据", symbol),
        }

        let report = CollectionReport {
            symbol: symbol.to_string(),
            resolved_symbol: resolved,
            kinds,
        };
        (report, bundle)
    }

    /// 单类采集，错误在此降级为“无数据”
    async fn collect_kind(
        &self,
        kind: ActionKind,
        symbol: &str,
        url: &str,
    ) -> (KindStatus, Option<CorporateAction>) {
        let FetchedPage { status, body } = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(FetchError::HttpStatus(code)) => {
                log::warn!(
                    target: LOG_TARGET,
                    "获取 {} 的 {} 数据失败: 状态码 {}",
                    symbol,
                    kind,
                    code
                );
                return (KindStatus::HttpStatus { code }, None);
            }
            Err(FetchError::Network(message)) => {
                log::warn!(target: LOG_TARGET, "获取 {} 的 {} 数据失败: {}", symbol, kind, message);
                return (KindStatus::Network { message }, None);
            }
        };

        log::debug!(
            target: LOG_TARGET,
            "{} 的 {} 数据源返回状态码 {}，{} 字节",
            symbol,
            kind,
            status,
            body.len()
        );

        match parse_action(kind, &body, symbol) {
            Ok(Some(action)) => {
                log::debug!(target: LOG_TARGET, "{} 的 {} 数据: {} 条", symbol, kind, action.len());
                (KindStatus::Collected { rows: action.len() }, Some(action))
            }
            Ok(None) => {
                log::info!(target: LOG_TARGET, "{} 没有 {} 记录", symbol, kind);
                (KindStatus::Empty, None)
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "解析 {} 的 {} 数据失败: {}", symbol, kind, e);
                (KindStatus::ParseError { message: e.to_string() }, None)
            }
        }
    }

    /// 按格式名落盘；格式不支持时不写入任何文件
    pub fn persist(
        &self,
        bundle: &ActionsBundle,
        symbol: &str,
        format: &str,
    ) -> Result<Vec<PathBuf>, PersistError> {
        let format: PersistFormat = format.parse()?;
        self.persister.persist(bundle, symbol, format)
    }

    /// 读取已保存的合并 JSON
    pub fn load(&self, symbol: &str) -> Result<ActionsBundle, PersistError> {
        self.persister.load(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceTemplates, SymbolMap};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 按 URL 返回预设结果，未登记的 URL 返回 404
    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, result: Result<&str, FetchError>) -> Self {
            self.pages.insert(url.to_string(), result.map(str::to_string));
            self
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(FetchedPage { status: 200, body: body.clone() }),
                Some(Err(e)) => Err(e.clone()),
                None => Err(FetchError::HttpStatus(404)),
            }
        }
    }

    fn sources(symbols: &[(&str, &str)]) -> DataSources {
        DataSources {
            nse_symbols: SymbolMap::new(
                symbols.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ),
            corporate_actions: SourceTemplates {
                dividends: "https://nse.test/dividends?symbol={symbol}".to_string(),
                splits: "https://nse.test/splits?symbol={symbol}".to_string(),
                rights: "https://nse.test/rights?symbol={symbol}".to_string(),
                bonus: "https://nse.test/bonus?symbol={symbol}".to_string(),
            },
        }
    }

    const TWO_DIVIDENDS: &str = r#"[
        {"subject": "Interim Dividend - Rs 18 Per Share", "exDate": "19-Jan-2024"},
        {"subject": "Final Dividend - Rs 24 Per Share", "exDate": "16-Jun-2023"}
    ]"#;

    #[tokio::test]
    async fn test_partial_results_with_symbol_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(
            StubFetcher::default().with("https://nse.test/dividends?symbol=TCS.NS", Ok(TWO_DIVIDENDS)),
        );
        let collector =
            CorporateActionsCollector::new(sources(&[("TCS", "TCS.NS")]), fetcher.clone(), tmp.path()).unwrap();

        let bundle = collector.collect("TCS").await.unwrap();
        assert_eq!(bundle.kinds(), vec![ActionKind::Dividends]);
        assert_eq!(bundle.row_count(ActionKind::Dividends), 2);
        assert!(bundle.dividends().unwrap().iter().all(|r| r.symbol == "TCS"));

        let requested = fetcher.requested.lock().unwrap().clone();
        assert_eq!(requested.len(), 4);
        assert!(requested.iter().all(|url| url.ends_with("symbol=TCS.NS")));

        let files = collector.persist(&bundle, "TCS", "json").unwrap();
        assert_eq!(files.len(), 1);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["dividends".to_string()]);
        assert_eq!(json["dividends"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_all_kinds_missing_is_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let collector =
            CorporateActionsCollector::new(sources(&[]), Arc::new(StubFetcher::default()), tmp.path()).unwrap();

        let err = collector.collect("XYZ").await.unwrap_err();
        assert_eq!(err, CollectionError::NoData("XYZ".to_string()));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_markup_downgraded_to_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .with("https://nse.test/dividends?symbol=ABC", Ok("<html><body><div>broken"));
        let collector = CorporateActionsCollector::new(sources(&[]), Arc::new(fetcher), tmp.path()).unwrap();

        let (report, bundle) = collector.collect_report("ABC").await;
        assert!(bundle.is_none());
        assert!(matches!(
            report.status(ActionKind::Dividends),
            Some(KindStatus::ParseError { .. })
        ));
        assert_eq!(
            collector.collect("ABC").await,
            Err(CollectionError::NoData("ABC".to_string()))
        );
    }

    #[tokio::test]
    async fn test_report_distinguishes_failure_from_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .with("https://nse.test/dividends?symbol=INFY", Ok(TWO_DIVIDENDS))
            .with("https://nse.test/splits?symbol=INFY", Ok("[]"))
            .with(
                "https://nse.test/rights?symbol=INFY",
                Err(FetchError::Network("operation timed out".to_string())),
            );
        let collector = CorporateActionsCollector::new(sources(&[]), Arc::new(fetcher), tmp.path()).unwrap();

        let (report, bundle) = collector.collect_report("INFY").await;
        assert_eq!(report.resolved_symbol, "INFY");
        assert_eq!(report.status(ActionKind::Dividends), Some(&KindStatus::Collected { rows: 2 }));
        assert_eq!(report.status(ActionKind::Splits), Some(&KindStatus::Empty));
        assert!(matches!(report.status(ActionKind::Rights), Some(KindStatus::Network { .. })));
        assert_eq!(report.status(ActionKind::Bonus), Some(&KindStatus::HttpStatus { code: 404 }));
        assert_eq!(bundle.unwrap().kinds(), vec![ActionKind::Dividends]);
    }

    #[tokio::test]
    async fn test_unsupported_format_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .with("https://nse.test/bonus?symbol=WIPRO", Ok(r#"[{"subject": "Bonus 1:1", "exDate": "05-Dec-2019"}]"#));
        let collector = CorporateActionsCollector::new(sources(&[]), Arc::new(fetcher), tmp.path()).unwrap();

        let bundle = collector.collect("WIPRO").await.unwrap();
        for format in ["xml", "parquet", ""] {
            let err = collector.persist(&bundle, "WIPRO", format).unwrap_err();
            assert!(matches!(err, PersistError::UnsupportedFormat(_)));
        }
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

        let files = collector.persist(&bundle, "WIPRO", "csv").unwrap();
        assert_eq!(files, vec![tmp.path().join("WIPRO_bonus.csv")]);
    }
}
