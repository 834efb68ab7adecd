//! 股票数据模型
//!
//! 定义股票列表与公司行动接口相关的数据结构

use serde::{Deserialize, Serialize};

use super::{ActionsBundle, CollectionReport};

/// 股票基本信息
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StockListing {
    /// 股票代码
    pub symbol: String,
    /// 公司名称
    pub name: String,
    /// 所属行业
    pub sector: String,
}

/// 公司行动持久化查询参数
#[derive(Debug, Deserialize)]
pub struct PersistQuery {
    /// 导出格式：json / csv，缺省为 json
    pub format: Option<String>,
}

/// 公司行动采集响应
#[derive(Debug, Serialize)]
pub struct CorporateActionsResponse {
    /// 内部股票代码
    pub symbol: String,
    /// 交易所股票代码
    pub resolved_symbol: String,
    /// 采集结果
    pub actions: ActionsBundle,
    /// 逐类采集明细
    pub report: CollectionReport,
}

/// 公司行动持久化响应
#[derive(Debug, Serialize)]
pub struct PersistResponse {
    pub symbol: String,
    pub format: String,
    /// 写入的文件
    pub files: Vec<String>,
}
