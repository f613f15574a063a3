use crate::clients::BackendClient;
use crate::error::AppResult;
use crate::models::AuditLogEntry;
use serde_json::Value;

/// 审计日志仓储
#[allow(async_fn_in_trait)]
pub trait AuditLogRepository {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()>;
}

impl AuditLogRepository for BackendClient {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()> {
        let _: Value = self.insert("audit_logs", entry).await?;
        Ok(())
    }
}
