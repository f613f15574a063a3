use crate::error::{AppResult, ConfigError};
use chrono::{DateTime, Utc};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端服务地址
    pub backend_url: String,
    /// 后端匿名 key（apikey 头）
    pub backend_anon_key: String,
    /// 登录后的访问令牌
    pub access_token: Option<String>,
    /// 访问令牌过期时间
    pub token_expires_at: Option<DateTime<Utc>>,
    /// 当前操作的管理员用户ID
    pub acting_user_id: Option<String>,
    /// 待导入试卷文件目录
    pub import_folder: String,
    /// 导入会话断点文件（保存 papers_setup_import_session_id）
    pub checkpoint_file: String,
    /// 严重问题题目写入的文件
    pub warn_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            backend_anon_key: String::new(),
            access_token: None,
            token_expires_at: None,
            acting_user_id: None,
            import_folder: "import_papers".to_string(),
            checkpoint_file: ".edu_admin_storage.json".to_string(),
            warn_file: "warn.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            request_timeout_secs: 30,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            backend_url: std::env::var("EDU_BACKEND_URL").unwrap_or(default.backend_url),
            backend_anon_key: std::env::var("EDU_BACKEND_ANON_KEY").unwrap_or(default.backend_anon_key),
            access_token: std::env::var("EDU_ACCESS_TOKEN").ok().filter(|v| !v.is_empty()),
            token_expires_at: std::env::var("EDU_TOKEN_EXPIRES_AT").ok().and_then(|v| parse_expiry(&v).ok()),
            acting_user_id: std::env::var("EDU_ACTING_USER_ID").ok().filter(|v| !v.is_empty()),
            import_folder: std::env::var("IMPORT_FOLDER").unwrap_or(default.import_folder),
            checkpoint_file: std::env::var("CHECKPOINT_FILE").unwrap_or(default.checkpoint_file),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

/// 解析令牌过期时间，支持 RFC3339 或 Unix 秒
pub fn parse_expiry(value: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<i64>() {
        if let Some(dt) = DateTime::<Utc>::from_timestamp(secs, 0) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: "EDU_TOKEN_EXPIRES_AT".to_string(),
                value: value.to_string(),
                expected_type: "RFC3339 时间或 Unix 秒".to_string(),
            }
            .into()
        })
}
