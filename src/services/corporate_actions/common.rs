//! 公共常量和辅助函数
//!
//! 公告（filing）提取：NSE 接口返回 JSON，公司公告页面返回 HTML 表格，
//! 两者统一为 [`Filing`] 后再交给各类型解析器

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;

/// 日志 target
pub const LOG_TARGET: &str = "corporate_actions";

/// 支持的日期格式（NSE 常用 15-Jan-2024）
const DATE_FORMATS: [&str; 6] = [
    "%d-%b-%Y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d %b %Y",
    "%d-%B-%Y",
];

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("无效的选择器: table"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("无效的选择器: tr"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("无效的选择器: th, td"));

/// 金额，如 "Rs 24"、"Rs.2.50"、"Re 0.50"、"₹ 11"
pub static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\b(?:rs|re|inr)\.?|₹)\s*([0-9]+(?:\.[0-9]+)?)").expect("无效的金额正则")
});

/// 百分比，如 "150%"
pub static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*%").expect("无效的百分比正则"));

/// 比例，如 "1:6"
pub static RATIO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*:\s*(\d+)").expect("无效的比例正则"));

/// 面值拆分，如 "From Rs 10/- Per Share To Rs 2/- Per Share"
pub static SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bfrom\s*(?:(?:rs|re|inr)\.?|₹)?\s*([0-9]+(?:\.[0-9]+)?).*?\bto\s*(?:(?:rs|re|inr)\.?|₹)?\s*([0-9]+(?:\.[0-9]+)?)",
    )
    .expect("无效的拆股正则")
});

/// 配股溢价，如 "@ Premium Rs 1600/-"
pub static PREMIUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bpremium\s*(?:of\s*)?(?:(?:rs|re|inr)\.?|₹)?\s*([0-9]+(?:\.[0-9]+)?)")
        .expect("无效的溢价正则")
});

/// 统一后的单条公告
#[derive(Debug, Clone, PartialEq)]
pub struct Filing {
    /// 公告事由（purpose / subject）
    pub purpose: String,
    /// 除权除息日
    pub ex_date: Option<NaiveDate>,
    /// 股权登记日
    pub record_date: Option<NaiveDate>,
    /// 面值
    pub face_value: Option<f64>,
}

/// NSE 接口中的单条记录
#[derive(Debug, Deserialize)]
struct RawFiling {
    #[serde(default, alias = "SUBJECT")]
    subject: Option<String>,
    #[serde(default, alias = "PURPOSE")]
    purpose: Option<String>,
    #[serde(default, rename = "exDate", alias = "ex_date", alias = "exdate", alias = "EX-DATE")]
    ex_date: Option<String>,
    #[serde(default, rename = "recDate", alias = "record_date", alias = "RECORD DATE")]
    record_date: Option<String>,
    #[serde(default, rename = "faceVal", alias = "face_value", alias = "FACE VALUE")]
    face_value: Option<Value>,
}

impl From<RawFiling> for Filing {
    fn from(raw: RawFiling) -> Self {
        let face_value = raw.face_value.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_number(&s),
            _ => None,
        });

        Filing {
            purpose: purpose_text(raw.subject, raw.purpose),
            ex_date: raw.ex_date.as_deref().and_then(parse_date),
            record_date: raw.record_date.as_deref().and_then(parse_date),
            face_value,
        }
    }
}

/// subject 优先，为空时退回 purpose
fn purpose_text(subject: Option<String>, purpose: Option<String>) -> String {
    [subject, purpose]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// 解析日期，"-"、空串或无法识别的格式返回 `None`
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// 解析数字，去掉千分位逗号和不间断空格
pub fn parse_number(s: &str) -> Option<f64> {
    s.replace('\u{a0}', "")
        .replace(',', "")
        .trim()
        .parse::<f64>()
        .ok()
}

/// 四舍五入到 4 位小数，避免累加产生的浮点噪声
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// 从原始内容中提取公告列表
///
/// - 空内容：`Ok(None)`
/// - JSON：数组，或带 `data` 数组的对象
/// - HTML：表头同时包含 PURPOSE 与 EX-DATE 的第一个表格，找不到时返回 `ParseError::MissingTable`
pub fn extract_filings(raw: &str) -> Result<Option<Vec<Filing>>, ParseError> {
    let content = raw.trim_start_matches('\u{feff}').trim();
    if content.is_empty() {
        return Ok(None);
    }

    if content.starts_with('[') || content.starts_with('{') {
        return extract_json_filings(content).map(Some);
    }

    extract_html_filings(content).map(Some)
}

fn extract_json_filings(content: &str) -> Result<Vec<Filing>, ParseError> {
    let json: Value = serde_json::from_str(content).map_err(|e| ParseError::Json(e.to_string()))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(ParseError::Json("缺少 data 数组".to_string())),
        },
        _ => return Err(ParseError::Json("顶层既不是数组也不是对象".to_string())),
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<RawFiling>(item)
                .map(Filing::from)
                .map_err(|e| ParseError::Json(e.to_string()))
        })
        .collect()
}

/// 表头归一化："Ex-Date" -> "EXDATE"
fn normalize_header(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

fn cell_texts(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SELECTOR)
        .map(|cell| {
            cell.text()
                .collect::<Vec<_>>()
                .join(" ")
                .replace('\u{a0}', " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// 表格列位置
struct Columns {
    purpose: usize,
    ex_date: usize,
    record_date: Option<usize>,
    face_value: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Option<Self> {
        let headers: Vec<String> = cells.iter().map(|c| normalize_header(c)).collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        Some(Columns {
            purpose: position("PURPOSE").or_else(|| position("SUBJECT"))?,
            ex_date: position("EXDATE")?,
            record_date: position("RECORDDATE"),
            face_value: position("FACEVALUE"),
        })
    }
}

fn extract_html_filings(content: &str) -> Result<Vec<Filing>, ParseError> {
    let document = Html::parse_document(content);

    for table in document.select(&TABLE_SELECTOR) {
        let mut rows = table.select(&ROW_SELECTOR).map(cell_texts);

        let columns = loop {
            match rows.next() {
                Some(cells) => {
                    if let Some(columns) = Columns::from_header(&cells) {
                        break Some(columns);
                    }
                }
                None => break None,
            }
        };

        let Some(columns) = columns else {
            continue;
        };

        let filings = rows
            .filter(|cells| cells.len() > columns.purpose.max(columns.ex_date))
            .map(|cells| {
                let optional = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(String::as_str);
                Filing {
                    purpose: cells[columns.purpose].clone(),
                    ex_date: parse_date(&cells[columns.ex_date]),
                    record_date: optional(columns.record_date).and_then(parse_date),
                    face_value: optional(columns.face_value).and_then(parse_number),
                }
            })
            .collect();

        return Ok(filings);
    }

    Err(ParseError::MissingTable)
}
