use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use wishlist::infrastructure::logger::Logger;
use wishlist::scrape::HttpFetcher;
use wishlist::{build_router, load_config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 文件可选，环境变量也可以由外部设置
    dotenvy::dotenv().ok();

    let config = load_config().context("加载配置失败")?;
    let _log_guard = Logger::init(&config.logging).context("初始化日志失败")?;

    info!("启动心愿单服务器...");
    info!(
        "路径前缀: {:?}, 数据文件: {}",
        config.app.prefix,
        config.app.data_file.display()
    );

    let fetcher = HttpFetcher::new(&config.scrape).context("创建 HTTP 客户端失败")?;
    let addr = config.listen_addr();
    let prefix = config.app.prefix.clone();
    let app = build_router(AppState::new(config, fetcher));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法绑定到 {addr}"))?;

    info!("🚀 服务器运行在 http://{}{}", addr, prefix);
    info!("📖 页面:");
    info!("   GET  {}/          - 心愿单", prefix);
    info!("   GET  {}/admin     - 管理后台", prefix);
    info!("   GET  {}/api/products - 商品 JSON", prefix);

    axum::serve(listener, app).await.context("服务器运行失败")?;
    Ok(())
}
