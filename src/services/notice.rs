//! 操作提示
//!
//! 调用处捕获的错误统一转换为提示，不再向上传播

use crate::error::AppError;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// 给操作者看的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// 错误转换为提示：校验/业务问题是警告，其余是错误
    pub fn from_error(action: &str, err: &AppError) -> Self {
        let level = match err {
            AppError::Validation(_) | AppError::Business(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        let message = match err.backend_message() {
            Some(msg) => format!("{}失败: {}", action, msg),
            None => format!("{}失败: {}", action, err),
        };
        Self { level, message }
    }

    /// 写入日志
    pub fn emit(&self) {
        match self.level {
            NoticeLevel::Success => info!("✅ {}", self.message),
            NoticeLevel::Info => info!("💡 {}", self.message),
            NoticeLevel::Warning => warn!("⚠️ {}", self.message),
            NoticeLevel::Error => error!("❌ {}", self.message),
        }
    }

    /// 需要重新登录
    pub fn requires_sign_in(err: &AppError) -> bool {
        matches!(err, AppError::Auth(_))
    }
}
