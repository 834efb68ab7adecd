//! 公司行动解析器
//!
//! 纯函数：输入已抓取的原始内容和股票代码，输出对应类型的记录集。
//! 不做任何网络请求。内容中没有相关记录时返回 `Ok(None)`，
//! 只有内容结构无法识别时才返回 `ParseError`。

use chrono::NaiveDate;

use crate::error::ParseError;
use crate::models::{
    ActionKind, BonusRecord, CorporateAction, DividendRecord, Ratio, RightsRecord, SplitRecord,
};

use super::common::{
    extract_filings, parse_number, round4, Filing, AMOUNT_RE, PERCENT_RE, PREMIUM_RE, RATIO_RE,
    SPLIT_RE,
};

/// 按类型分发解析
pub fn parse_action(
    kind: ActionKind,
    raw: &str,
    symbol: &str,
) -> Result<Option<CorporateAction>, ParseError> {
    match kind {
        ActionKind::Dividends => parse_dividends(raw, symbol),
        ActionKind::Splits => parse_splits(raw, symbol),
        ActionKind::Rights => parse_rights(raw, symbol),
        ActionKind::Bonus => parse_bonus(raw, symbol),
    }
}

/// 解析分红记录
pub fn parse_dividends(raw: &str, symbol: &str) -> Result<Option<CorporateAction>, ParseError> {
    let rows = collect_rows(raw, |filing| {
        let amount = dividend_amount(&filing.purpose, filing.face_value)?;
        Some(DividendRecord {
            ex_date: filing.ex_date?,
            record_date: filing.record_date,
            amount,
            symbol: symbol.to_string(),
            purpose: filing.purpose.clone(),
        })
    }, |row: &DividendRecord| row.ex_date)?;

    Ok(rows.map(CorporateAction::Dividends))
}

/// 解析拆股记录
pub fn parse_splits(raw: &str, symbol: &str) -> Result<Option<CorporateAction>, ParseError> {
    let rows = collect_rows(raw, |filing| {
        let purpose = filing.purpose.to_lowercase();
        if !purpose.contains("split") && !purpose.contains("sub-division") {
            return None;
        }

        let caps = SPLIT_RE.captures(&filing.purpose)?;
        let old_face_value = parse_number(&caps[1])?;
        let new_face_value = parse_number(&caps[2])?;
        if old_face_value <= 0.0 || new_face_value <= 0.0 {
            return None;
        }

        Some(SplitRecord {
            ex_date: filing.ex_date?,
            record_date: filing.record_date,
            old_face_value,
            new_face_value,
            split_factor: round4(old_face_value / new_face_value),
            symbol: symbol.to_string(),
            purpose: filing.purpose.clone(),
        })
    }, |row: &SplitRecord| row.ex_date)?;

    Ok(rows.map(CorporateAction::Splits))
}

/// 解析配股记录
pub fn parse_rights(raw: &str, symbol: &str) -> Result<Option<CorporateAction>, ParseError> {
    let rows = collect_rows(raw, |filing| {
        if !filing.purpose.to_lowercase().contains("rights") {
            return None;
        }

        Some(RightsRecord {
            ex_date: filing.ex_date?,
            record_date: filing.record_date,
            ratio: extract_ratio(&filing.purpose)?,
            premium: PREMIUM_RE
                .captures(&filing.purpose)
                .and_then(|caps| parse_number(&caps[1])),
            symbol: symbol.to_string(),
            purpose: filing.purpose.clone(),
        })
    }, |row: &RightsRecord| row.ex_date)?;

    Ok(rows.map(CorporateAction::Rights))
}

/// 解析送股记录
pub fn parse_bonus(raw: &str, symbol: &str) -> Result<Option<CorporateAction>, ParseError> {
    let rows = collect_rows(raw, |filing| {
        if !filing.purpose.to_lowercase().contains("bonus") {
            return None;
        }

        Some(BonusRecord {
            ex_date: filing.ex_date?,
            record_date: filing.record_date,
            ratio: extract_ratio(&filing.purpose)?,
            symbol: symbol.to_string(),
            purpose: filing.purpose.clone(),
        })
    }, |row: &BonusRecord| row.ex_date)?;

    Ok(rows.map(CorporateAction::Bonus))
}

/// 提取公告、逐条转换、按除权日排序并去重；没有记录时返回 `None`
fn collect_rows<T, F, K>(raw: &str, convert: F, ex_date: K) -> Result<Option<Vec<T>>, ParseError>
where
    T: PartialEq,
    F: Fn(&Filing) -> Option<T>,
    K: Fn(&T) -> NaiveDate,
{
    let Some(filings) = extract_filings(raw)? else {
        return Ok(None);
    };

    let mut rows: Vec<T> = filings.iter().filter_map(convert).collect();
    rows.sort_by_key(|row| ex_date(row));

    let mut unique: Vec<T> = Vec::with_capacity(rows.len());
    for row in rows {
        if !unique.contains(&row) {
            unique.push(row);
        }
    }

    if unique.is_empty() {
        Ok(None)
    } else {
        Ok(Some(unique))
    }
}

/// 每股分红金额
///
/// 一条公告可能包含多段分红（如 "Final Dividend - Rs 8 Per Share/Special Dividend - Rs 10 Per Share"），
/// 金额累加；按百分比公告时用面值换算
fn dividend_amount(purpose: &str, face_value: Option<f64>) -> Option<f64> {
    let mut total = 0.0;
    let mut found = false;

    for segment in purpose.split('/') {
        if !segment.to_lowercase().contains("dividend") {
            continue;
        }

        let amount = AMOUNT_RE
            .captures(segment)
            .and_then(|caps| parse_number(&caps[1]))
            .or_else(|| {
                let pct = PERCENT_RE.captures(segment).and_then(|caps| parse_number(&caps[1]))?;
                Some(face_value? * pct / 100.0)
            });

        if let Some(amount) = amount {
            total += amount;
            found = true;
        }
    }

    if found && total > 0.0 {
        Some(round4(total))
    } else {
        None
    }
}

fn extract_ratio(purpose: &str) -> Option<Ratio> {
    let caps = RATIO_RE.captures(purpose)?;
    Ratio::new(caps[1].parse().ok()?, caps[2].parse().ok()?)
}
