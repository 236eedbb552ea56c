//! 价格格式化

/// 数字统一保留两位小数，其余原样保留；有币种且尚未以其开头时加上币种前缀
pub fn format_price(raw: &str, currency: Option<&str>) -> String {
    let raw = raw.trim();
    let formatted = match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{value:.2}"),
        _ => raw.to_string(),
    };

    match currency.map(str::trim).filter(|c| !c.is_empty()) {
        Some(currency) => {
            let currency = currency.to_uppercase();
            if formatted.starts_with(&currency) {
                formatted
            } else {
                format!("{currency} {formatted}")
            }
        }
        None => formatted,
    }
}
