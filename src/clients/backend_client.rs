/// 后端 API 客户端
///
/// 封装所有与托管后端（数据表、文件存储、云函数）的 HTTP 调用
use crate::clients::auth::AuthSession;
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};
use crate::models::FileBlob;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// 后端客户端
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Option<AuthSession>,
}

/// 构造等值过滤条件 `column=eq.value`
pub fn eq_filter(column: &str, value: impl std::fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{}", value))
}

/// 从错误响应体中提取可读消息
pub fn extract_error_message(body: &Value) -> Option<String> {
    ["message", "error_description", "error", "msg"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

impl BackendClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            anon_key: config.backend_anon_key.clone(),
            session: AuthSession::from_config(config),
        })
    }

    /// 替换登录会话
    pub fn with_session(mut self, session: AuthSession) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    fn rest_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn storage_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    /// 存储对象的公开访问地址
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    /// 带认证头的请求
    fn request(&self, method: Method, url: &str) -> AppResult<RequestBuilder> {
        let session = self.session.as_ref().ok_or(AuthError::MissingSession)?;
        let token = session.bearer()?;

        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }

    /// 非 2xx 响应转换为 BadResponse
    async fn check_response(endpoint: &str, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .as_ref()
            .and_then(extract_error_message)
            .unwrap_or(text);

        warn!("后端返回错误 ({}): {} {}", endpoint, status.as_u16(), message);
        Err(AppError::bad_response(endpoint, status.as_u16(), message))
    }

    // ========== 数据表 ==========

    /// 查询集合
    pub async fn select<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(String, String)],
        order: Option<&str>,
    ) -> AppResult<Vec<T>> {
        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        query.extend_from_slice(filters);
        if let Some(order) = order {
            query.push(("order".to_string(), order.to_string()));
        }

        debug!("查询 {}: {:?}", collection, filters);

        let response = self
            .request(Method::GET, &self.rest_url(collection))?
            .query(&query)
            .send()
            .await?;
        let response = Self::check_response(collection, response).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    /// 查询单行，不存在时返回 None
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(String, String)],
    ) -> AppResult<Option<T>> {
        let mut rows: Vec<T> = self.select(collection, filters, None).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    /// 插入一行并返回插入结果
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &B,
    ) -> AppResult<T> {
        debug!("插入 {}", collection);

        let response = self
            .request(Method::POST, &self.rest_url(collection))?
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(collection, response).await?;

        let mut rows: Vec<T> = response.json().await?;
        if rows.is_empty() {
            return Err(AppError::empty_response(collection));
        }
        Ok(rows.remove(0))
    }

    /// 批量插入，不关心返回内容
    pub async fn insert_many<B: Serialize>(&self, collection: &str, rows: &[B]) -> AppResult<()> {
        debug!("批量插入 {}: {} 行", collection, rows.len());

        let response = self
            .request(Method::POST, &self.rest_url(collection))?
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        Self::check_response(collection, response).await?;
        Ok(())
    }

    /// 按条件更新并返回更新后的行
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(String, String)],
        body: &B,
    ) -> AppResult<Vec<T>> {
        debug!("更新 {}: {:?}", collection, filters);

        let response = self
            .request(Method::PATCH, &self.rest_url(collection))?
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(collection, response).await?;
        Ok(response.json().await?)
    }

    /// 按条件删除
    pub async fn delete(&self, collection: &str, filters: &[(String, String)]) -> AppResult<()> {
        debug!("删除 {}: {:?}", collection, filters);

        let response = self
            .request(Method::DELETE, &self.rest_url(collection))?
            .query(filters)
            .send()
            .await?;
        Self::check_response(collection, response).await?;
        Ok(())
    }

    // ========== 文件存储 ==========

    /// 上传文件到存储桶，返回对象路径
    pub async fn upload_object(&self, bucket: &str, path: &str, blob: &FileBlob) -> AppResult<String> {
        debug!("上传 {}/{} ({} 字节)", bucket, path, blob.size());

        let endpoint = format!("storage/{}", bucket);
        let response = self
            .request(Method::POST, &self.storage_url(bucket, path))?
            .header("Content-Type", &blob.content_type)
            .header("x-upsert", "false")
            .body(blob.bytes.clone())
            .send()
            .await?;
        Self::check_response(&endpoint, response).await?;
        Ok(path.to_string())
    }

    /// 删除存储桶中的对象
    pub async fn remove_objects(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        debug!("删除存储对象 {}: {:?}", bucket, paths);

        let endpoint = format!("storage/{}", bucket);
        let url = format!("{}/storage/v1/object/{}", self.base_url, bucket);
        let response = self
            .request(Method::DELETE, &url)?
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::check_response(&endpoint, response).await?;
        Ok(())
    }

    // ========== 云函数 ==========

    /// 调用云函数
    pub async fn invoke_function<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        name: &str,
        body: &B,
    ) -> AppResult<T> {
        debug!("调用云函数 {}", name);

        let endpoint = format!("functions/{}", name);
        let response = self
            .request(Method::POST, &self.function_url(name))?
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(&endpoint, response).await?;
        Ok(response.json().await?)
    }
}
