use crate::models::StockListing;

/// 模拟股票列表（代码, 名称, 行业）
const MOCK_STOCKS: [(&str, &str, &str); 5] = [
    ("RELIANCE", "Reliance Industries Ltd.", "Energy"),
    ("TCS", "Tata Consultancy Services Ltd.", "Technology"),
    ("HDFCBANK", "HDFC Bank Ltd.", "Banking"),
    ("INFY", "Infosys Ltd.", "Technology"),
    ("SBIN", "State Bank of India", "Banking"),
];

pub fn list_stocks() -> Vec<StockListing> {
    MOCK_STOCKS
        .iter()
        .map(|(symbol, name, sector)| StockListing {
            symbol: symbol.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
        })
        .collect()
}

/// 校验并规范化路径中的股票代码（大写，仅允许字母数字和 & . _ -）
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    let valid_chars = symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '&' | '.' | '_' | '-'));

    if symbol.is_empty() || symbol.len() > 20 || !valid_chars || symbol.contains("..") {
        return None;
    }
    Some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_stocks() {
        let stocks = list_stocks();
        assert_eq!(stocks.len(), 5);
        assert!(stocks.iter().any(|s| s.symbol == "TCS" && s.sector == "Technology"));
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("tcs").as_deref(), Some("TCS"));
        assert_eq!(normalize_symbol("M&M").as_deref(), Some("M&M"));
        assert_eq!(normalize_symbol("BAJAJ-AUTO").as_deref(), Some("BAJAJ-AUTO"));
        assert_eq!(normalize_symbol("TCS.NS").as_deref(), Some("TCS.NS"));
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("../etc"), None);
        assert_eq!(normalize_symbol("A/B"), None);
        assert_eq!(normalize_symbol("ABCDEFGHIJKLMNOPQRSTUVWXYZ"), None);
    }
}
