//! 会话与一次性提示消息
//!
//! 会话数据保存在进程内存中，浏览器只持有会话 id cookie。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

pub const SESSION_COOKIE: &str = "wishlist_session";

/// 闲置超过该时间的会话会在保存新会话时被清理
const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Info,
    Success,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Info => "info",
            FlashLevel::Success => "success",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug)]
struct SessionData {
    logged_in: bool,
    flashes: Vec<Flash>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            logged_in: false,
            flashes: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionData>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionData>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 打开 cookie 对应的会话；id 未知或缺失时分配新 id，但在第一次写入前不保存。
    /// 第二个返回值表示会话是否已存在
    pub fn open(&self, id: Option<&str>) -> (Session, bool) {
        let mut sessions = self.lock();

        if let Some(id) = id {
            if let Some(data) = sessions.get_mut(id) {
                data.last_seen = Instant::now();
                let session = Session {
                    id: id.to_string(),
                    store: self.clone(),
                };
                return (session, true);
            }
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            store: self.clone(),
        };
        (session, false)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// 只读取已保存的会话，不会新建
    fn read<R>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> R) -> Option<R> {
        self.lock().get_mut(id).map(f)
    }

    /// 写入会话；首次写入时保存，并清理过期会话
    fn write<R>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let mut sessions = self.lock();
        if !sessions.contains_key(id) {
            let now = Instant::now();
            sessions.retain(|_, data| now.duration_since(data.last_seen) < SESSION_TTL);
        }
        let data = sessions
            .entry(id.to_string())
            .or_insert_with(SessionData::new);
        f(data)
    }
}

/// 当前请求的会话句柄
#[derive(Clone)]
pub struct Session {
    id: String,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_logged_in(&self) -> bool {
        self.store
            .read(&self.id, |data| data.logged_in)
            .unwrap_or(false)
    }

    pub fn log_in(&self) {
        self.store.write(&self.id, |data| data.logged_in = true);
    }

    pub fn log_out(&self) {
        self.store.read(&self.id, |data| data.logged_in = false);
    }

    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        let message = message.into();
        self.store
            .write(&self.id, |data| data.flashes.push(Flash { level, message }));
    }

    /// 取出并清空待显示的提示
    pub fn take_flashes(&self) -> Vec<Flash> {
        self.store
            .read(&self.id, |data| std::mem::take(&mut data.flashes))
            .unwrap_or_default()
    }
}
