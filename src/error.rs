use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 表单/字段校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 后端调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 登录会话错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 业务规则拒绝
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 字段级校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 必填字段为空
    #[error("{field} 不能为空")]
    Required { field: String },
    /// 字段格式不正确
    #[error("{field} 格式不正确: {reason}")]
    Invalid { field: String, reason: String },
}

/// 后端调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 后端返回非 2xx 响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 后端返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 登录会话错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 未配置访问令牌
    #[error("未登录，请先登录")]
    MissingSession,
    /// 访问令牌已过期
    #[error("登录已过期，请重新登录")]
    SessionExpired,
}

/// 业务规则错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 不能停用或删除自己的账号
    #[error("不能停用或删除自己的账号")]
    CannotModifySelf,
    /// 邮箱已被注册
    #[error("邮箱已被注册: {email}")]
    DuplicateEmail { email: String },
    /// 向导步骤尚未解锁
    #[error("请先完成前面的步骤 ({step})")]
    StepLocked { step: String },
    /// 当前没有进行中的导入会话
    #[error("当前没有进行中的导入会话")]
    NoActiveSession,
    /// 试卷中没有题目
    #[error("试卷中没有题目: {paper}")]
    EmptyPaper { paper: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 试卷文件解析失败
    #[error("试卷文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 不支持的文件类型
    #[error("不支持的文件类型: {path}")]
    UnsupportedFormat { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建必填字段错误
    pub fn required(field: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::Required {
            field: field.into(),
        })
    }

    /// 创建字段格式错误
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::Invalid {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// 创建非 2xx 响应错误
    pub fn bad_response(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        })
    }

    /// 创建空结果错误
    pub fn empty_response(endpoint: impl Into<String>) -> Self {
        AppError::Api(ApiError::EmptyResponse {
            endpoint: endpoint.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建试卷文件解析错误
    pub fn file_parse_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 后端返回的错误消息（仅 BadResponse 有）
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            AppError::Api(ApiError::BadResponse { message, .. }) => Some(message),
            _ => None,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
