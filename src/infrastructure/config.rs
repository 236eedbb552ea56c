//! 配置基础设施
//!
//! 启动时只解析一次：默认值 → 可选的 `config.toml` → 环境变量覆盖。

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub scrape: ScrapeConfig,
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
    /// 整个请求的超时时间（秒）
    pub timeout_seconds: u64,
}

/// 站点路径与数据位置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 所有路由挂载的路径前缀，例如 `/baby`；为空表示根路径
    pub prefix: String,
    pub data_file: PathBuf,
    pub static_dir: PathBuf,
}

/// 管理员账号
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// 价格抓取与零售商识别配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// 额外的零售商，优先于内置表匹配
    pub retailers: Vec<RetailerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerEntry {
    pub suffix: String,
    pub name: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
    /// 设置后按日期分割写入该目录
    pub log_dir: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            timeout_seconds: 30,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            data_file: PathBuf::from("data/products.json"),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password".to_string(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 6,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            retailers: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 应用环境变量覆盖
    ///
    /// `lookup` 在运行时读取进程环境，测试中可传入任意映射。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("APP_ENV").as_deref() == Some("pi") {
            self.app.prefix = "/baby".to_string();
        }
        if let Some(prefix) = lookup("APP_PREFIX") {
            self.app.prefix = prefix;
        }
        if let Some(username) = lookup("ADMIN_USERNAME") {
            self.auth.username = username;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.auth.password = password;
        }
        if let Some(path) = lookup("DATA_FILE") {
            self.app.data_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("STATIC_DIR") {
            self.app.static_dir = PathBuf::from(path);
        }
        if let Some(host) = lookup("HOST") {
            self.http.bind_address = host;
        }
        if let Some(port) = lookup("PORT") {
            self.http.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("PORT 不是有效端口: {port}")))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }
        if self.http.port == 0 {
            return Err(ConfigError::Validation("端口必须大于0".to_string()));
        }
        if self.http.timeout_seconds == 0 || self.scrape.timeout_seconds == 0 {
            return Err(ConfigError::Validation("超时时间必须大于0".to_string()));
        }

        let prefix = &self.app.prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(ConfigError::Validation(format!(
                "路径前缀必须以 '/' 开头且不能以 '/' 结尾: {prefix:?}"
            )));
        }

        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            return Err(ConfigError::Validation("管理员账号和密码不能为空".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }

    /// 监听地址 `host:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.http.bind_address, self.http.port)
    }
}

/// 从文件或默认值加载配置，再应用环境变量覆盖
pub fn load_config() -> Result<Config, ConfigError> {
    let config_paths = ["config.toml", "./config/config.toml"];

    // 日志系统依赖配置，此时尚未初始化，加载结果由调用方记录
    let mut config = match config_paths.iter().find(|p| Path::new(p).exists()) {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    config.apply_overrides(|key| env::var(key).ok().filter(|v| !v.is_empty()))?;
    config.validate()?;
    Ok(config)
}
