//! 导入会话断点
//!
//! 本地只保存一个键：当前进行中的导入会话ID

use crate::error::{AppError, AppResult};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 断点中保存会话ID的键
pub const SESSION_KEY: &str = "papers_setup_import_session_id";

/// 会话断点存储
pub trait SessionCheckpoint {
    fn load(&self) -> AppResult<Option<String>>;

    fn save(&self, session_id: &str) -> AppResult<()>;

    fn clear(&self) -> AppResult<()>;
}

/// 基于 JSON 文件的键值存储，同一文件中的其他键保持不变
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> AppResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let display = self.path.display().to_string();
        let content =
            fs::read_to_string(&self.path).map_err(|e| AppError::file_read_failed(&display, e))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)
            .map_err(|e| AppError::file_parse_failed(&display, e))?
        {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> AppResult<()> {
        let display = self.path.display().to_string();
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content).map_err(|e| AppError::file_write_failed(&display, e))
    }
}

impl SessionCheckpoint for FileCheckpoint {
    fn load(&self) -> AppResult<Option<String>> {
        let map = self.read_map()?;
        Ok(map
            .get(SESSION_KEY)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()))
    }

    fn save(&self, session_id: &str) -> AppResult<()> {
        let mut map = self.read_map()?;
        map.insert(SESSION_KEY.to_string(), Value::String(session_id.to_string()));
        self.write_map(&map)
    }

    fn clear(&self) -> AppResult<()> {
        let mut map = self.read_map()?;
        if map.remove(SESSION_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// 内存中的断点（试运行与测试）
#[derive(Default)]
pub struct MemoryCheckpoint {
    value: Mutex<Option<String>>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(session_id.into())),
        }
    }

    /// 当前保存的值
    pub fn peek(&self) -> Option<String> {
        self.value.lock().map(|v| v.clone()).unwrap_or(None)
    }
}

impl SessionCheckpoint for MemoryCheckpoint {
    fn load(&self) -> AppResult<Option<String>> {
        Ok(self.peek())
    }

    fn save(&self, session_id: &str) -> AppResult<()> {
        if let Ok(mut v) = self.value.lock() {
            *v = Some(session_id.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        if let Ok(mut v) = self.value.lock() {
            *v = None;
        }
        Ok(())
    }
}

impl<T: SessionCheckpoint + ?Sized> SessionCheckpoint for &T {
    fn load(&self) -> AppResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, session_id: &str) -> AppResult<()> {
        (**self).save(session_id)
    }

    fn clear(&self) -> AppResult<()> {
        (**self).clear()
    }
}
