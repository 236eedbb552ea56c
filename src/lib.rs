//! # Wishlist
//!
//! 家庭心愿单网站：
//! - 商品列表保存在单个 JSON 文件中，每次请求重新读取并整体写回
//! - 访客可以标记商品为已购买或已预留
//! - 管理员登录后可以添加、编辑、删除商品并清除状态
//! - 根据商品链接猜测零售商，并可按需抓取页面上的价格

pub mod app;
pub mod core;
pub mod infrastructure;
pub mod scrape;

pub use app::build_router;
pub use app::wishlist::handler::AppState;
pub use app::wishlist::model::Product;
pub use infrastructure::config::{load_config, Config};
