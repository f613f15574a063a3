use crate::clients::{eq_filter, BackendClient};
use crate::error::{AppError, AppResult};
use crate::models::{ImportSession, ImportStatus, NewImportSession, ParsedPaperData};
use serde_json::json;

const TABLE: &str = "question_import_sessions";

/// 导入会话仓储
#[allow(async_fn_in_trait)]
pub trait ImportSessionRepository {
    /// 新建会话
    async fn create(&self, session: &NewImportSession) -> AppResult<ImportSession>;

    /// 按 ID 读取，不存在时返回 None
    async fn fetch(&self, id: &str) -> AppResult<Option<ImportSession>>;

    /// 更新解析数据与状态
    async fn update_data(
        &self,
        id: &str,
        data: &ParsedPaperData,
        status: ImportStatus,
    ) -> AppResult<ImportSession>;

    /// 试卷已创建：记录试卷ID，状态不变
    async fn attach_paper(&self, id: &str, paper_id: &str) -> AppResult<ImportSession>;

    /// 标记完成并记录生成的试卷ID
    async fn mark_completed(&self, id: &str, paper_id: &str) -> AppResult<ImportSession>;
}

impl ImportSessionRepository for BackendClient {
    async fn create(&self, session: &NewImportSession) -> AppResult<ImportSession> {
        self.insert(TABLE, session).await
    }

    async fn fetch(&self, id: &str) -> AppResult<Option<ImportSession>> {
        self.select_one(TABLE, &[eq_filter("id", id)]).await
    }

    async fn update_data(
        &self,
        id: &str,
        data: &ParsedPaperData,
        status: ImportStatus,
    ) -> AppResult<ImportSession> {
        let body = json!({
            "parsed_data": data,
            "status": status,
            "updated_at": chrono::Utc::now(),
        });
        let mut rows: Vec<ImportSession> = self.update(TABLE, &[eq_filter("id", id)], &body).await?;
        if rows.is_empty() {
            return Err(AppError::empty_response(TABLE));
        }
        Ok(rows.remove(0))
    }

    async fn attach_paper(&self, id: &str, paper_id: &str) -> AppResult<ImportSession> {
        let body = json!({
            "paper_id": paper_id,
            "updated_at": chrono::Utc::now(),
        });
        let mut rows: Vec<ImportSession> = self.update(TABLE, &[eq_filter("id", id)], &body).await?;
        if rows.is_empty() {
            return Err(AppError::empty_response(TABLE));
        }
        Ok(rows.remove(0))
    }

    async fn mark_completed(&self, id: &str, paper_id: &str) -> AppResult<ImportSession> {
        let body = json!({
            "status": ImportStatus::Completed,
            "paper_id": paper_id,
            "updated_at": chrono::Utc::now(),
        });
        let mut rows: Vec<ImportSession> = self.update(TABLE, &[eq_filter("id", id)], &body).await?;
        if rows.is_empty() {
            return Err(AppError::empty_response(TABLE));
        }
        Ok(rows.remove(0))
    }
}
