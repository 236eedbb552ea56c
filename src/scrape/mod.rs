//! 零售商识别与价格抓取
//!
//! 两者都是尽力而为：任何失败都以 `None` 返回，不会向调用方传播错误。

pub mod fetch;
pub mod format;
pub mod price;
pub mod retailer;

pub use fetch::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use format::format_price;
pub use price::{extract_price, PriceExtractor};
pub use retailer::{guess_retailer, RetailerTable};

/// 去除首尾空白；没有 `scheme://` 前缀时补上 `http://`
pub(crate) fn with_scheme(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    if has_scheme(url) {
        Some(url.to_string())
    } else {
        Some(format!("http://{url}"))
    }
}

fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_scheme() {
        assert_eq!(with_scheme("  "), None);
        assert_eq!(
            with_scheme(" www.argos.co.uk/x ").as_deref(),
            Some("http://www.argos.co.uk/x")
        );
        assert_eq!(
            with_scheme("HTTPS://shop.example").as_deref(),
            Some("HTTPS://shop.example")
        );
        assert_eq!(
            with_scheme("ftp://www.argos.co.uk/x").as_deref(),
            Some("ftp://www.argos.co.uk/x")
        );
        // 路径中的 `://` 不算协议
        assert_eq!(
            with_scheme("shop.example/redirect?to=http://x").as_deref(),
            Some("http://shop.example/redirect?to=http://x")
        );
    }
}
