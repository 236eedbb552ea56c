//! 核心层：错误处理、中间件、会话与响应工具

pub mod error;
pub mod middleware;
pub mod response;
pub mod session;
