//! 登录会话
//!
//! 令牌的获取与刷新由后端负责，这里只读取令牌并判断是否过期

use crate::config::Config;
use crate::error::{AppResult, AuthError};
use chrono::{DateTime, Utc};

/// 当前登录会话
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            user_id: None,
        }
    }

    /// 从配置读取会话，未配置令牌时返回 None
    pub fn from_config(config: &Config) -> Option<Self> {
        config.access_token.as_ref().map(|token| Self {
            access_token: token.clone(),
            expires_at: config.token_expires_at,
            user_id: config.acting_user_id.clone(),
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// 取出可用的 Bearer 令牌，过期时要求重新登录
    pub fn bearer(&self) -> AppResult<&str> {
        if self.is_expired_at(Utc::now()) {
            tracing::warn!("🔒 登录已过期，需要重新登录");
            return Err(AuthError::SessionExpired.into());
        }
        Ok(&self.access_token)
    }
}
