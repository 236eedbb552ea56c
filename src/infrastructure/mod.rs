//! 基础设施层：配置、日志、数据存储

pub mod config;
pub mod logger;
pub mod store;
