//! Wishlist 数据模型

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 商品记录
///
/// 时间戳为不带时区的 UTC 时间，与早期数据文件保持兼容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub link: String,
    /// 空字符串表示没有图片
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retailer: Option<String>,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_checked_at: Option<NaiveDateTime>,
}

impl Product {
    pub fn new(name: String, link: String, image: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            link,
            image,
            price: None,
            retailer: None,
            purchased: false,
            purchased_at: None,
            reserved: false,
            price_checked_at: None,
        }
    }

    pub fn mark_purchased(&mut self, at: NaiveDateTime) {
        self.purchased = true;
        self.purchased_at = Some(at);
    }

    pub fn clear_status(&mut self) {
        self.purchased = false;
        self.purchased_at = None;
        self.reserved = false;
    }

    /// 设置价格；与原价格不同才更新检查时间
    pub fn set_price(&mut self, price: String, at: NaiveDateTime) {
        if self.price.as_deref() != Some(price.as_str()) {
            self.price = Some(price);
            self.price_checked_at = Some(at);
        }
    }

    /// 记录抓取到的价格，无论是否变化都更新检查时间
    pub fn record_fetched_price(&mut self, price: String, at: NaiveDateTime) {
        self.price = Some(price);
        self.price_checked_at = Some(at);
    }
}

/// 添加或编辑商品时提交的内容
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub link: String,
    pub image: String,
    pub price: String,
    pub retailer: String,
    /// 是否抓取链接页面上的价格
    pub fetch_price: bool,
}

/// 一次价格抓取的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceLookup {
    /// 没有请求抓取，或者没有链接
    Skipped,
    Found,
    NotFound,
}

/// 写操作的结果
#[derive(Debug, Clone)]
pub struct Saved {
    pub product: Product,
    pub price_lookup: PriceLookup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_set_price_stamps_only_on_change() {
        let mut product = Product::new("Cot".to_string(), String::new(), String::new());
        product.set_price("85".to_string(), at(9));
        assert_eq!(product.price_checked_at, Some(at(9)));

        product.set_price("85".to_string(), at(10));
        assert_eq!(product.price.as_deref(), Some("85"));
        assert_eq!(product.price_checked_at, Some(at(9)));

        product.set_price("90".to_string(), at(11));
        assert_eq!(product.price.as_deref(), Some("90"));
        assert_eq!(product.price_checked_at, Some(at(11)));
    }

    #[test]
    fn test_fetched_price_always_stamps() {
        let mut product = Product::new("Cot".to_string(), String::new(), String::new());
        product.record_fetched_price("GBP 19.99".to_string(), at(9));
        product.record_fetched_price("GBP 19.99".to_string(), at(10));
        assert_eq!(product.price_checked_at, Some(at(10)));
    }
}
