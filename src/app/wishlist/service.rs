//! Wishlist 业务服务
//!
//! 每个写操作都是：读取整个列表 → 修改一条 → 写回整个列表。
//! 价格抓取在读取列表之前完成，避免在慢请求期间持有旧数据。

use chrono::{NaiveDateTime, Utc};
use tracing::info;

use super::model::{PriceLookup, Product, ProductDraft, Saved};
use crate::infrastructure::store::{JsonFileStore, StoreError};
use crate::scrape::{PageFetcher, PriceExtractor, RetailerTable};

pub struct WishlistService<F> {
    store: JsonFileStore,
    extractor: PriceExtractor<F>,
    retailers: RetailerTable,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl<F: PageFetcher> WishlistService<F> {
    pub fn new(store: JsonFileStore, extractor: PriceExtractor<F>, retailers: RetailerTable) -> Self {
        Self {
            store,
            extractor,
            retailers,
        }
    }

    pub fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.store.load_all()
    }

    pub async fn add(&self, draft: ProductDraft) -> Result<Saved, StoreError> {
        let (fetched, price_lookup) = self.lookup_price(&draft).await;

        let mut products = self.store.load_all()?;
        let mut product = Product::new(String::new(), String::new(), String::new());
        self.apply_draft(&mut product, &draft, fetched);
        products.push(product.clone());
        self.store.save_all(&products)?;

        info!("添加商品 {} ({})", product.name, product.id);
        Ok(Saved {
            product,
            price_lookup,
        })
    }

    pub async fn update(&self, id: &str, draft: ProductDraft) -> Result<Option<Saved>, StoreError> {
        let (fetched, price_lookup) = self.lookup_price(&draft).await;

        let mut products = self.store.load_all()?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        self.apply_draft(product, &draft, fetched);
        let product = product.clone();
        self.store.save_all(&products)?;

        info!("更新商品 {} ({})", product.name, product.id);
        Ok(Some(Saved {
            product,
            price_lookup,
        }))
    }

    pub fn delete(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let mut products = self.store.load_all()?;
        let Some(index) = products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let removed = products.remove(index);
        self.store.save_all(&products)?;

        info!("删除商品 {} ({})", removed.name, removed.id);
        Ok(Some(removed))
    }

    pub fn mark_purchased(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.modify(id, |product| product.mark_purchased(now()))
    }

    /// 已购买的商品不会再被标记为预留
    pub fn mark_reserved(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.modify(id, |product| {
            if !product.purchased {
                product.reserved = true;
            }
        })
    }

    pub fn clear_status(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.modify(id, Product::clear_status)
    }

    /// 重新抓取已有商品的价格；没有链接时不发起请求
    pub async fn refresh_price(&self, id: &str) -> Result<Option<Saved>, StoreError> {
        let Some(link) = self
            .store
            .load_all()?
            .into_iter()
            .find(|p| p.id == id)
            .map(|p| p.link)
        else {
            return Ok(None);
        };

        let fetched = if link.trim().is_empty() {
            None
        } else {
            Some(self.extractor.fetch_price(&link).await)
        };

        let mut products = self.store.load_all()?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        let price_lookup = match fetched {
            None => PriceLookup::Skipped,
            Some(None) => PriceLookup::NotFound,
            Some(Some(price)) => {
                product.record_fetched_price(price, now());
                PriceLookup::Found
            }
        };
        let product = product.clone();
        if price_lookup == PriceLookup::Found {
            self.store.save_all(&products)?;
        }

        Ok(Some(Saved {
            product,
            price_lookup,
        }))
    }

    fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut Product),
    ) -> Result<Option<Product>, StoreError> {
        let mut products = self.store.load_all()?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        change(product);
        let product = product.clone();
        self.store.save_all(&products)?;
        Ok(Some(product))
    }

    async fn lookup_price(&self, draft: &ProductDraft) -> (Option<String>, PriceLookup) {
        if !draft.fetch_price || draft.link.trim().is_empty() {
            return (None, PriceLookup::Skipped);
        }
        match self.extractor.fetch_price(&draft.link).await {
            Some(price) => (Some(price), PriceLookup::Found),
            None => (None, PriceLookup::NotFound),
        }
    }

    fn apply_draft(&self, product: &mut Product, draft: &ProductDraft, fetched: Option<String>) {
        let at = now();

        product.name = draft.name.trim().to_string();
        product.link = draft.link.trim().to_string();
        product.image = draft.image.trim().to_string();

        let retailer = draft.retailer.trim();
        product.retailer = if !retailer.is_empty() {
            Some(retailer.to_string())
        } else {
            self.retailers.guess(&product.link)
        };

        let price = draft.price.trim();
        if price.is_empty() {
            product.price = None;
        } else {
            product.set_price(price.to_string(), at);
        }

        if let Some(price) = fetched {
            product.record_fetched_price(price, at);
        }
    }
}
