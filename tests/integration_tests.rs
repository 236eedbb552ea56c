use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use wishlist::infrastructure::config::Config;
use wishlist::scrape::{FetchError, FetchedPage, PageFetcher};
use wishlist::{build_router, AppState, Product};

const PRICED_PAGE: &str = r#"<html><head>
<script type="application/ld+json">{"@type":"Product","offers":{"price":"19.99","priceCurrency":"GBP"}}</script>
</head><body><h1>Cot</h1></body></html>"#;

struct FixturePage(&'static str);

impl PageFetcher for FixturePage {
    async fn get(&self, _url: &str) -> Result<FetchedPage, FetchError> {
        Ok(FetchedPage {
            status: 200,
            body: self.0.to_string(),
        })
    }
}

fn test_app(prefix: &str) -> (Router, TempDir) {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.app.prefix = prefix.to_string();
    config.app.data_file = dir.path().join("data").join("products.json");
    config.app.static_dir = dir.path().join("static");
    config.auth.password = "secret".to_string();
    config.validate().unwrap();

    let app = build_router(AppState::new(config, FixturePage(PRICED_PAGE)));
    (app, dir)
}

fn stored(dir: &TempDir) -> Vec<Product> {
    let path = dir.path().join("data").join("products.json");
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap(),
        Err(_) => Vec::new(),
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
}

fn session_cookie(resp: &Response<Body>) -> String {
    resp.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn login(app: &Router) -> String {
    let resp = send(app, post("/admin", None, "login=1&username=admin&password=secret")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");
    session_cookie(&resp)
}

#[tokio::test]
async fn test_cookie_only_issued_when_session_is_written() {
    let (app, _dir) = test_app("");
    let resp = send(&app, get("/", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert!(text(resp).await.contains("Nothing on the list yet."));

    for uri in ["/api/products", "/admin", "/nowhere"] {
        let resp = send(&app, get(uri, None)).await;
        assert!(resp.headers().get(header::SET_COOKIE).is_none(), "{uri}");
    }

    let resp = send(&app, post("/mark/unknown", None, "")).await;
    assert!(session_cookie(&resp).starts_with("wishlist_session="));
}

#[tokio::test]
async fn test_bad_login_is_flashed() {
    let (app, _dir) = test_app("");
    let resp = send(&app, post("/admin", None, "login=1&username=admin&password=nope")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&resp);

    let page = text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Invalid credentials."));
    assert!(page.contains("name=\"password\""));

    // 提示只显示一次
    let page = text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(!page.contains("Invalid credentials."));
}

#[tokio::test]
async fn test_changes_require_login() {
    let (app, dir) = test_app("");
    let resp = send(&app, post("/admin", None, "name=Cot&link=")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&resp);
    assert!(stored(&dir).is_empty());

    let page = text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Please log in to manage items."));
}

#[tokio::test]
async fn test_admin_workflow() {
    let (app, dir) = test_app("");
    let cookie = login(&app).await;

    let page = text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Logged in successfully."));

    let resp = send(
        &app,
        post(
            "/admin",
            Some(&cookie),
            "name=Cot&link=https%3A%2F%2Fwww.argos.co.uk%2Fproduct%2F1&image=&price=&retailer=&fetch_price=1",
        ),
    )
    .await;
    assert_eq!(location(&resp), "/admin");

    let products = stored(&dir);
    assert_eq!(products.len(), 1);
    let cot = &products[0];
    assert_eq!(cot.name, "Cot");
    assert_eq!(cot.retailer.as_deref(), Some("Argos"));
    assert_eq!(cot.price.as_deref(), Some("GBP 19.99"));
    assert!(cot.price_checked_at.is_some());

    let page = text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Product added."));
    assert!(page.contains("Price found: GBP 19.99"));

    // 访客标记为已购买
    let resp = send(&app, post(&format!("/mark/{}", cot.id), None, "")).await;
    assert_eq!(location(&resp), "/");
    let visitor = session_cookie(&resp);
    let page = text(send(&app, get("/", Some(&visitor))).await).await;
    assert!(page.contains("Thanks! &#x27;Cot&#x27; marked as purchased."));
    assert!(stored(&dir)[0].purchased);
    assert!(stored(&dir)[0].purchased_at.is_some());

    // 访客不能清除状态或删除
    let resp = send(&app, post(&format!("/clear/{}", cot.id), Some(&visitor), "")).await;
    assert_eq!(location(&resp), "/admin");
    assert!(stored(&dir)[0].purchased);
    send(&app, post(&format!("/delete/{}", cot.id), Some(&visitor), "")).await;
    assert_eq!(stored(&dir).len(), 1);

    send(&app, post(&format!("/clear/{}", cot.id), Some(&cookie), "")).await;
    let cleared = &stored(&dir)[0];
    assert!(!cleared.purchased);
    assert_eq!(cleared.purchased_at, None);

    let resp = send(
        &app,
        post(
            "/admin",
            Some(&cookie),
            &format!("edit_id={}&name=Cot+bed&link=&image=&price=85&retailer=", cot.id),
        ),
    )
    .await;
    assert_eq!(location(&resp), "/admin");
    let edited = &stored(&dir)[0];
    assert_eq!(edited.id, cot.id);
    assert_eq!(edited.name, "Cot bed");
    assert_eq!(edited.price.as_deref(), Some("85"));
    assert_eq!(edited.retailer, None);

    send(&app, post(&format!("/delete/{}", cot.id), Some(&cookie), "")).await;
    assert!(stored(&dir).is_empty());

    send(&app, post("/admin", Some(&cookie), "logout=1")).await;
    let page = text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Logged out."));
    assert!(page.contains("name=\"password\""));
}

#[tokio::test]
async fn test_reserve_and_unknown_ids() {
    let (app, dir) = test_app("");
    let cookie = login(&app).await;
    send(&app, post("/admin", Some(&cookie), "name=Sling")).await;
    let id = stored(&dir)[0].id.clone();

    let resp = send(&app, post(&format!("/reserve/{id}"), None, "")).await;
    assert_eq!(location(&resp), "/");
    assert!(stored(&dir)[0].reserved);

    let resp = send(&app, post("/mark/does-not-exist", None, "")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let visitor = session_cookie(&resp);
    let page = text(send(&app, get("/", Some(&visitor))).await).await;
    assert!(page.contains("That item could not be found."));
    assert!(!stored(&dir)[0].purchased);
}

#[tokio::test]
async fn test_refresh_price() {
    let (app, dir) = test_app("");
    let cookie = login(&app).await;
    send(
        &app,
        post("/admin", Some(&cookie), "name=Monitor&link=shop.example%2Fmonitor"),
    )
    .await;
    let product = stored(&dir)[0].clone();
    assert_eq!(product.price, None);
    assert_eq!(product.retailer.as_deref(), Some("Shop"));

    send(&app, post(&format!("/refresh-price/{}", product.id), Some(&cookie), "")).await;
    assert_eq!(stored(&dir)[0].price.as_deref(), Some("GBP 19.99"));
}

#[tokio::test]
async fn test_prefixed_routes() {
    let (app, dir) = test_app("/baby");

    let resp = send(&app, get("/baby", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = text(resp).await;
    assert!(page.contains("href=\"/baby/admin\""));

    let resp = send(&app, post("/baby/admin", None, "login=1&username=admin&password=secret")).await;
    assert_eq!(location(&resp), "/baby/admin");
    let cookie = session_cookie(&resp);

    send(&app, post("/baby/admin", Some(&cookie), "name=Bath")).await;
    let id = stored(&dir)[0].id.clone();
    let resp = send(&app, post(&format!("/baby/mark/{id}"), None, "")).await;
    assert_eq!(location(&resp), "/baby");

    let resp = send(&app, get("/admin", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_products_and_static_files() {
    let (app, dir) = test_app("");
    let cookie = login(&app).await;
    send(&app, post("/admin", Some(&cookie), "name=Blanket")).await;

    let resp = send(&app, get("/api/products", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&text(resp).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["name"], "Blanket");
    assert_eq!(json["data"][0]["purchased"], false);

    std::fs::create_dir_all(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static").join("style.css"), "body {}").unwrap();
    let resp = send(&app, get("/static/style.css", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "body {}");
}

#[tokio::test]
async fn test_unknown_page() {
    let (app, _dir) = test_app("");
    let resp = send(&app, get("/nowhere", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(text(resp).await.contains("Page not found."));
}
