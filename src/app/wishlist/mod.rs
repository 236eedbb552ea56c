//! 心愿单应用：商品列表、购买/预留标记与后台管理

pub mod handler;
pub mod model;
pub mod service;
pub mod view;
