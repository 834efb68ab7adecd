//! 公司行动数据服务
//!
//! 从交易所公告中采集分红、拆股、配股、送股数据并落盘
//!
//! ## 数据流程
//! - 代码映射：内部代码 -> NSE 代码（未配置时原样使用）
//! - 抓取：带浏览器标识的 GET 请求，每类独立
//! - 解析：JSON 接口或 HTML 公告表格，纯函数
//! - 汇总：只保留有数据的类型
//! - 落盘：合并 JSON 或按类型 CSV

mod collector;
mod common;
mod fetcher;
mod parser;
mod persister;

pub use collector::CorporateActionsCollector;
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher};
pub use persister::PersistFormat;
