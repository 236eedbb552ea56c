//! 从商品页面提取价格
//!
//! 按优先级依次尝试，先找到的方法胜出：
//! 1. `application/ld+json` 结构化数据中的 `offers`
//! 2. `og:price:amount` 等 meta 标签
//! 3. 任意带 `content` 属性的 `itemprop="price"` 元素
//! 4. `itemprop="price"` 元素文本中带货币符号的数字
//!
//! 多个报价时直接取第一个，不比较币种也不挑最低价。

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::fetch::PageFetcher;
use super::format::format_price;
use super::with_scheme;

/// meta 标签中的价格，按优先级排列
const PRICE_META: &[(&str, &str)] = &[
    ("property", "og:price:amount"),
    ("property", "product:price:amount"),
    ("name", "price"),
    ("itemprop", "price"),
];

const CURRENCY_META: &[(&str, &str)] = &[
    ("property", "og:price:currency"),
    ("property", "product:price:currency"),
    ("itemprop", "priceCurrency"),
    ("name", "currency"),
];

lazy_static! {
    static ref VISIBLE_PRICE: Regex =
        Regex::new(r"[£€$]\s*\d[\d,]*(?:\.\d+)?|\d[\d,]*(?:\.\d+)?\s*[£€$]")
            .expect("valid price pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
}

pub struct PriceExtractor<F> {
    fetcher: F,
    deadline: Duration,
}

impl<F: PageFetcher> PriceExtractor<F> {
    pub fn new(fetcher: F, deadline: Duration) -> Self {
        Self { fetcher, deadline }
    }

    /// 抓取页面并提取价格；网络错误、超时、非 2xx 或找不到价格都返回 `None`
    pub async fn fetch_price(&self, url: &str) -> Option<String> {
        let url = with_scheme(url)?;

        let page = match tokio::time::timeout(self.deadline, self.fetcher.get(&url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                warn!("抓取价格失败 {}: {}", url, e);
                return None;
            }
            Err(_) => {
                warn!("抓取价格超时 {} ({:?})", url, self.deadline);
                return None;
            }
        };

        if !page.is_success() {
            info!("抓取价格返回状态 {} : {}", page.status, url);
            return None;
        }

        let price = extract_price(&page.body);
        match &price {
            Some(price) => info!("在 {} 找到价格 {}", url, price),
            None => info!("在 {} 未找到价格", url),
        }
        price
    }
}

/// 从 HTML 中提取价格
pub fn extract_price(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    price_from_json_ld(&document)
        .or_else(|| price_from_meta(&document))
        .or_else(|| price_from_itemprop_content(&document))
        .or_else(|| price_from_visible_text(&document))
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn price_from_json_ld(document: &Html) -> Option<String> {
    let scripts = selector(r#"script[type="application/ld+json"]"#)?;

    for script in document.select(&scripts) {
        let text: String = script.text().collect();
        let data: Value = match serde_json::from_str(text.trim()) {
            Ok(data) => data,
            Err(e) => {
                debug!("跳过无法解析的 JSON-LD: {}", e);
                continue;
            }
        };

        if let Some(price) = ld_nodes(&data).into_iter().find_map(price_from_offers) {
            return Some(price);
        }
    }
    None
}

/// 顶层对象、数组成员以及 `@graph` 成员
fn ld_nodes(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(ld_nodes).collect(),
        Value::Object(obj) => {
            let mut nodes = vec![value];
            if let Some(Value::Array(graph)) = obj.get("@graph") {
                nodes.extend(graph.iter().flat_map(ld_nodes));
            }
            nodes
        }
        _ => Vec::new(),
    }
}

fn price_from_offers(node: &Value) -> Option<String> {
    match node.get("offers")? {
        Value::Array(offers) => offers.iter().find_map(price_from_offer),
        offer => price_from_offer(offer),
    }
}

fn price_from_offer(offer: &Value) -> Option<String> {
    let spec = match offer.get("priceSpecification") {
        Some(Value::Array(specs)) => specs.first(),
        other => other,
    };
    let field = |name: &str| {
        offer
            .get(name)
            .and_then(json_text)
            .or_else(|| spec.and_then(|s| s.get(name)).and_then(json_text))
    };

    let price = field("price")?;
    let currency = field("priceCurrency");
    Some(format_price(&price, currency.as_deref()))
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn meta_content(document: &Html, attr: &str, key: &str) -> Option<String> {
    let sel = selector(&format!(r#"meta[{attr}="{key}"][content]"#))?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn currency(document: &Html) -> Option<String> {
    CURRENCY_META
        .iter()
        .find_map(|(attr, key)| meta_content(document, attr, key))
        .or_else(|| {
            let sel = selector(r#"[itemprop="priceCurrency"][content]"#)?;
            document
                .select(&sel)
                .filter_map(|el| el.value().attr("content"))
                .map(str::trim)
                .find(|c| !c.is_empty())
                .map(str::to_string)
        })
}

fn price_from_meta(document: &Html) -> Option<String> {
    let price = PRICE_META
        .iter()
        .find_map(|(attr, key)| meta_content(document, attr, key))?;
    Some(format_price(&price, currency(document).as_deref()))
}

fn price_from_itemprop_content(document: &Html) -> Option<String> {
    let sel = selector(r#"[itemprop="price"][content]"#)?;
    let price = document
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())?
        .to_string();
    Some(format_price(&price, currency(document).as_deref()))
}

fn price_from_visible_text(document: &Html) -> Option<String> {
    let sel = selector(r#"[itemprop="price"]"#)?;
    document.select(&sel).find_map(|el| {
        let text: String = el.text().collect();
        let text = WHITESPACE.replace_all(text.trim(), " ");
        VISIBLE_PRICE
            .find(&text)
            .map(|m| m.as_str().trim().to_string())
    })
}
