//! Wishlist 处理器

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::{Html, Json, Redirect},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::model::{PriceLookup, Product, ProductDraft, Saved};
use super::service::WishlistService;
use super::view;
use crate::core::error::CoreError;
use crate::core::response::{prefixed, ApiResponse};
use crate::core::session::{FlashLevel, Session, SessionStore};
use crate::infrastructure::config::Config;
use crate::infrastructure::store::JsonFileStore;
use crate::scrape::{PageFetcher, PriceExtractor, RetailerTable};

pub struct AppState<F> {
    pub service: Arc<WishlistService<F>>,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: Arc::clone(&self.config),
            sessions: self.sessions.clone(),
        }
    }
}

impl<F: PageFetcher> AppState<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        let store = JsonFileStore::new(config.app.data_file.clone());
        let extractor =
            PriceExtractor::new(fetcher, Duration::from_secs(config.scrape.timeout_seconds));
        let retailers = RetailerTable::with_extra(&config.scrape.retailers);
        info!("零售商表共 {} 条", retailers.len());

        Self {
            service: Arc::new(WishlistService::new(store, extractor, retailers)),
            config: Arc::new(config),
            sessions: SessionStore::new(),
        }
    }

    fn redirect(&self, path: &str) -> Redirect {
        Redirect::to(&prefixed(&self.config.app.prefix, path))
    }
}

/// `/admin` 表单：登录、退出、编辑（带 `edit_id`）或添加
#[derive(Debug, Default, Deserialize)]
pub struct AdminForm {
    pub login: Option<String>,
    pub logout: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub edit_id: Option<String>,
    pub name: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub price: Option<String>,
    pub retailer: Option<String>,
    pub fetch_price: Option<String>,
}

impl AdminForm {
    fn draft(&self) -> ProductDraft {
        let text = |field: &Option<String>| field.as_deref().unwrap_or("").trim().to_string();
        ProductDraft {
            name: text(&self.name),
            link: text(&self.link),
            image: text(&self.image),
            price: text(&self.price),
            retailer: text(&self.retailer),
            fetch_price: self.fetch_price.is_some(),
        }
    }
}

fn flash_price_lookup(session: &Session, saved: &Saved) {
    match saved.price_lookup {
        PriceLookup::Found => session.flash(
            FlashLevel::Success,
            format!(
                "Price found: {}",
                saved.product.price.as_deref().unwrap_or_default()
            ),
        ),
        PriceLookup::NotFound => {
            session.flash(FlashLevel::Info, "Could not find a price for that link.")
        }
        PriceLookup::Skipped => {}
    }
}

pub async fn index<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, CoreError> {
    let products = state.service.list()?;
    Ok(Html(view::index_page(
        &state.config.app.prefix,
        &products,
        &session.take_flashes(),
    )))
}

pub async fn admin_page<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, CoreError> {
    let logged_in = session.is_logged_in();
    let products = if logged_in {
        state.service.list()?
    } else {
        Vec::new()
    };
    Ok(Html(view::admin_page(
        &state.config.app.prefix,
        &products,
        &session.take_flashes(),
        logged_in,
    )))
}

pub async fn admin_submit<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
    Form(form): Form<AdminForm>,
) -> Result<Redirect, CoreError> {
    if form.login.is_some() {
        let auth = &state.config.auth;
        let valid = form.username.as_deref() == Some(auth.username.as_str())
            && form.password.as_deref() == Some(auth.password.as_str());
        if valid {
            session.log_in();
            session.flash(FlashLevel::Info, "Logged in successfully.");
            info!("管理员登录成功");
        } else {
            session.flash(FlashLevel::Danger, "Invalid credentials.");
            warn!("管理员登录失败，用户名: {:?}", form.username);
        }
        return Ok(state.redirect("/admin"));
    }

    if form.logout.is_some() {
        session.log_out();
        session.flash(FlashLevel::Info, "Logged out.");
        return Ok(state.redirect("/admin"));
    }

    if !session.is_logged_in() {
        session.flash(FlashLevel::Warning, "Please log in to manage items.");
        return Ok(state.redirect("/admin"));
    }

    let draft = form.draft();
    if draft.name.is_empty() {
        session.flash(FlashLevel::Warning, "A product name is required.");
        return Ok(state.redirect("/admin"));
    }

    match form.edit_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => match state.service.update(id, draft).await? {
            Some(saved) => {
                session.flash(FlashLevel::Info, "Product updated.");
                flash_price_lookup(&session, &saved);
            }
            None => session.flash(FlashLevel::Warning, "That product no longer exists."),
        },
        None => {
            let saved = state.service.add(draft).await?;
            session.flash(FlashLevel::Info, "Product added.");
            flash_price_lookup(&session, &saved);
        }
    }

    Ok(state.redirect("/admin"))
}

pub async fn mark_purchased<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Redirect, CoreError> {
    match state.service.mark_purchased(&id)? {
        Some(product) => session.flash(
            FlashLevel::Success,
            format!("Thanks! '{}' marked as purchased.", product.name),
        ),
        None => session.flash(FlashLevel::Warning, "That item could not be found."),
    }
    Ok(state.redirect("/"))
}

pub async fn mark_reserved<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Redirect, CoreError> {
    match state.service.mark_reserved(&id)? {
        Some(product) if product.purchased => session.flash(
            FlashLevel::Info,
            format!("'{}' has already been purchased.", product.name),
        ),
        Some(product) => session.flash(
            FlashLevel::Success,
            format!("Thanks! '{}' is now reserved.", product.name),
        ),
        None => session.flash(FlashLevel::Warning, "That item could not be found."),
    }
    Ok(state.redirect("/"))
}

pub async fn delete_product<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Redirect, CoreError> {
    if !session.is_logged_in() {
        session.flash(FlashLevel::Warning, "Please log in to delete items.");
        return Ok(state.redirect("/admin"));
    }

    match state.service.delete(&id)? {
        Some(_) => session.flash(FlashLevel::Warning, "Product deleted."),
        None => session.flash(FlashLevel::Warning, "That product no longer exists."),
    }
    Ok(state.redirect("/admin"))
}

pub async fn clear_status<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Redirect, CoreError> {
    if !session.is_logged_in() {
        session.flash(FlashLevel::Warning, "Please log in to clear product status.");
        return Ok(state.redirect("/admin"));
    }

    match state.service.clear_status(&id)? {
        Some(product) => session.flash(
            FlashLevel::Info,
            format!("Status for '{}' has been cleared.", product.name),
        ),
        None => session.flash(FlashLevel::Warning, "That product no longer exists."),
    }
    Ok(state.redirect("/admin"))
}

pub async fn refresh_price<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Redirect, CoreError> {
    if !session.is_logged_in() {
        session.flash(FlashLevel::Warning, "Please log in to update prices.");
        return Ok(state.redirect("/admin"));
    }

    match state.service.refresh_price(&id).await? {
        Some(Saved {
            product,
            price_lookup: PriceLookup::Found,
        }) => session.flash(
            FlashLevel::Success,
            format!(
                "Price for '{}' updated to {}.",
                product.name,
                product.price.as_deref().unwrap_or_default()
            ),
        ),
        Some(Saved {
            product,
            price_lookup: PriceLookup::NotFound,
        }) => session.flash(
            FlashLevel::Info,
            format!("Could not find a price for '{}'.", product.name),
        ),
        Some(Saved {
            product,
            price_lookup: PriceLookup::Skipped,
        }) => session.flash(
            FlashLevel::Info,
            format!("'{}' has no link to check.", product.name),
        ),
        None => session.flash(FlashLevel::Warning, "That product no longer exists."),
    }
    Ok(state.redirect("/admin"))
}

pub async fn list_products<F: PageFetcher>(
    State(state): State<AppState<F>>,
) -> Result<Json<ApiResponse<Vec<Product>>>, CoreError> {
    let products = state.service.list()?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn not_found() -> CoreError {
    CoreError::NotFound("Page not found.".to_string())
}
