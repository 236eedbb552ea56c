//! 根据链接猜测零售商名称

use lazy_static::lazy_static;
use tracing::warn;
use url::Url;

use super::with_scheme;
use crate::infrastructure::config::RetailerEntry;

/// 内置零售商表：(域名后缀, 展示名称)，按顺序匹配
pub const KNOWN_RETAILERS: &[(&str, &str)] = &[
    ("amazon.co.uk", "Amazon"),
    ("amazon.com", "Amazon"),
    ("argos.co.uk", "Argos"),
    ("johnlewis.com", "John Lewis"),
    ("boots.com", "Boots"),
    ("mothercare.com", "Mothercare"),
    ("mamasandpapas.com", "Mamas & Papas"),
    ("jojomamanbebe.co.uk", "JoJo Maman Bébé"),
    ("next.co.uk", "Next"),
    ("marksandspencer.com", "M&S"),
    ("smythstoys.com", "Smyths"),
    ("ikea.com", "IKEA"),
    ("ebay.co.uk", "eBay"),
    ("ebay.com", "eBay"),
    ("etsy.com", "Etsy"),
    ("tesco.com", "Tesco"),
    ("asda.com", "Asda"),
    ("very.co.uk", "Very"),
    ("dunelm.com", "Dunelm"),
    ("target.com", "Target"),
    ("walmart.com", "Walmart"),
];

/// 国家顶级域下常见的二级标签，例如 `co.uk` 中的 `co`
const GENERIC_SECOND_LEVEL: &[&str] = &["co", "com", "org", "net", "ac", "gov"];

lazy_static! {
    static ref DEFAULT_TABLE: RetailerTable = RetailerTable::builtin();
}

/// 有序的零售商表，首个匹配的后缀胜出
#[derive(Debug, Clone)]
pub struct RetailerTable {
    entries: Vec<(String, String)>,
}

impl RetailerTable {
    /// 构建表；重复的后缀只保留第一条并记录警告
    pub fn new<I, S, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: AsRef<str>,
        N: Into<String>,
    {
        let (table, duplicates) = Self::collect(entries);
        for suffix in duplicates {
            warn!("零售商表中存在重复的后缀 {}，已忽略后面的条目", suffix);
        }
        table
    }

    fn collect<I, S, N>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (S, N)>,
        S: AsRef<str>,
        N: Into<String>,
    {
        let mut table = Self {
            entries: Vec::new(),
        };
        let mut duplicates = Vec::new();
        for (suffix, name) in entries {
            let suffix = suffix.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if suffix.is_empty() {
                continue;
            }
            if table.has_suffix(&suffix) {
                duplicates.push(suffix);
                continue;
            }
            table.entries.push((suffix, name.into()));
        }
        (table, duplicates)
    }

    fn has_suffix(&self, suffix: &str) -> bool {
        self.entries.iter().any(|(s, _)| s == suffix)
    }

    pub fn builtin() -> Self {
        Self::new(KNOWN_RETAILERS.iter().copied())
    }

    /// 配置中的条目排在内置表之前，并覆盖同名后缀的内置条目
    pub fn with_extra(extra: &[RetailerEntry]) -> Self {
        let mut table = Self::new(extra.iter().map(|e| (e.suffix.as_str(), e.name.clone())));
        for (suffix, name) in KNOWN_RETAILERS {
            if !table.has_suffix(suffix) {
                table.entries.push((suffix.to_string(), name.to_string()));
            }
        }
        table
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// 根据链接猜测零售商；任何失败都返回 `None`
    pub fn guess(&self, url: &str) -> Option<String> {
        let host = host_of(url)?;

        let matched = self.entries.iter().find(|(suffix, _)| {
            host == *suffix
                || host
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        });
        if let Some((_, name)) = matched {
            return Some(name.clone());
        }

        registrable_label(&host).map(capitalize)
    }
}

impl Default for RetailerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 使用内置表猜测零售商
pub fn guess_retailer(url: &str) -> Option<String> {
    DEFAULT_TABLE.guess(url)
}

/// 补全协议后解析出小写域名；IP 地址不算域名
fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(&with_scheme(url)?).ok()?;
    let domain = parsed.domain()?.trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

fn registrable_label(host: &str) -> Option<&str> {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    if labels.len() >= 3 && tld.len() == 2 && GENERIC_SECOND_LEVEL.contains(&second) {
        return Some(labels[labels.len() - 3]);
    }
    Some(second)
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
