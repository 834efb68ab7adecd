//! 公司行动数据模型
//!
//! 分红、拆股、配股、送股四类记录，以及按类型汇总的结果集和采集报告

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 公司行动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Dividends,
    Splits,
    Rights,
    Bonus,
}

impl ActionKind {
    /// 采集顺序
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Dividends,
        ActionKind::Splits,
        ActionKind::Rights,
        ActionKind::Bonus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Dividends => "dividends",
            ActionKind::Splits => "splits",
            ActionKind::Rights => "rights",
            ActionKind::Bonus => "bonus",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 配股 / 送股比例，如 `1:6` 表示每持有 6 股获得 1 股
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u32,
    pub denominator: u32,
}

impl Ratio {
    pub fn new(numerator: u32, denominator: u32) -> Option<Self> {
        if numerator == 0 || denominator == 0 {
            return None;
        }
        Some(Self { numerator, denominator })
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

impl FromStr for Ratio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (n, d) = s.split_once(':').ok_or_else(|| format!("无效的比例: {}", s))?;
        let numerator = n.trim().parse::<u32>().map_err(|e| format!("无效的比例 {}: {}", s, e))?;
        let denominator = d.trim().parse::<u32>().map_err(|e| format!("无效的比例 {}: {}", s, e))?;
        Ratio::new(numerator, denominator).ok_or_else(|| format!("比例不能为 0: {}", s))
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 分红记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// 除息日
    pub ex_date: NaiveDate,
    /// 股权登记日
    pub record_date: Option<NaiveDate>,
    /// 每股分红金额
    pub amount: f64,
    /// 股票代码
    pub symbol: String,
    /// 公告原文
    pub purpose: String,
}

/// 拆股记录（面值拆分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub ex_date: NaiveDate,
    pub record_date: Option<NaiveDate>,
    /// 拆分前面值
    pub old_face_value: f64,
    /// 拆分后面值
    pub new_face_value: f64,
    /// 拆分倍数（旧面值 / 新面值）
    pub split_factor: f64,
    pub symbol: String,
    pub purpose: String,
}

/// 配股记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightsRecord {
    pub ex_date: NaiveDate,
    pub record_date: Option<NaiveDate>,
    /// 配股比例（配售:持有）
    pub ratio: Ratio,
    /// 每股溢价
    pub premium: Option<f64>,
    pub symbol: String,
    pub purpose: String,
}

/// 送股记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRecord {
    pub ex_date: NaiveDate,
    pub record_date: Option<NaiveDate>,
    /// 送股比例（送:持有）
    pub ratio: Ratio,
    pub symbol: String,
    pub purpose: String,
}

/// 单一类型的公司行动记录集（按除权日升序）
#[derive(Debug, Clone, PartialEq)]
pub enum CorporateAction {
    Dividends(Vec<DividendRecord>),
    Splits(Vec<SplitRecord>),
    Rights(Vec<RightsRecord>),
    Bonus(Vec<BonusRecord>),
}

impl CorporateAction {
    pub fn len(&self) -> usize {
        match self {
            CorporateAction::Dividends(rows) => rows.len(),
            CorporateAction::Splits(rows) => rows.len(),
            CorporateAction::Rights(rows) => rows.len(),
            CorporateAction::Bonus(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 单只股票一次采集得到的公司行动汇总
///
/// 只包含有数据的类型；缺失的类型不会以空数组形式出现
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dividends: Option<Vec<DividendRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    splits: Option<Vec<SplitRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rights: Option<Vec<RightsRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bonus: Option<Vec<BonusRecord>>,
}

impl ActionsBundle {
    /// 过滤空记录集后构造结果，全部为空时返回 `None`
    pub fn from_actions<I>(actions: I) -> Option<Self>
    where
        I: IntoIterator<Item = CorporateAction>,
    {
        let mut bundle = Self::default();

        for action in actions.into_iter().filter(|a| !a.is_empty()) {
            match action {
                CorporateAction::Dividends(rows) => bundle.dividends = Some(rows),
                CorporateAction::Splits(rows) => bundle.splits = Some(rows),
                CorporateAction::Rights(rows) => bundle.rights = Some(rows),
                CorporateAction::Bonus(rows) => bundle.bonus = Some(rows),
            }
        }

        if bundle.is_empty() {
            None
        } else {
            Some(bundle)
        }
    }

    pub fn dividends(&self) -> Option<&[DividendRecord]> {
        self.dividends.as_deref().filter(|rows| !rows.is_empty())
    }

    pub fn splits(&self) -> Option<&[SplitRecord]> {
        self.splits.as_deref().filter(|rows| !rows.is_empty())
    }

    pub fn rights(&self) -> Option<&[RightsRecord]> {
        self.rights.as_deref().filter(|rows| !rows.is_empty())
    }

    pub fn bonus(&self) -> Option<&[BonusRecord]> {
        self.bonus.as_deref().filter(|rows| !rows.is_empty())
    }

    /// 指定类型的记录数，缺失为 0
    pub fn row_count(&self, kind: ActionKind) -> usize {
        match kind {
            ActionKind::Dividends => self.dividends().map_or(0, <[_]>::len),
            ActionKind::Splits => self.splits().map_or(0, <[_]>::len),
            ActionKind::Rights => self.rights().map_or(0, <[_]>::len),
            ActionKind::Bonus => self.bonus().map_or(0, <[_]>::len),
        }
    }

    /// 有数据的类型（按采集顺序）
    pub fn kinds(&self) -> Vec<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .filter(|kind| self.row_count(*kind) > 0)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }
}

/// 单类公司行动的采集结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KindStatus {
    /// 采集到数据
    Collected { rows: usize },
    /// 数据源正常返回，但没有该类记录
    Empty,
    /// 数据源返回非 2xx 状态码
    HttpStatus { code: u16 },
    /// 网络失败或超时
    Network { message: String },
    /// 内容无法解析
    ParseError { message: String },
}

/// 单类采集明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: ActionKind,
    pub url: String,
    #[serde(flatten)]
    pub status: KindStatus,
}

/// 一次采集的逐类明细，用于区分“数据源异常”和“确实没有该类行动”
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub symbol: String,
    pub resolved_symbol: String,
    pub kinds: Vec<KindReport>,
}

#[cfg(test)]
impl CollectionReport {
    pub fn status(&self, kind: ActionKind) -> Option<&KindStatus> {
        self.kinds.iter().find(|r| r.kind == kind).map(|r| &r.status)
    }
}
