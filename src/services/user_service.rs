/// 用户管理服务
///
/// 在调用后端前检查业务规则，并把后端的重复邮箱错误转换为业务错误
use crate::error::{AppError, AppResult, BusinessError};
use crate::models::{AdminUser, AuditLogEntry, Invitation, NewInvitation, NewUser, Role};
use crate::repositories::{AuditLogRepository, UserRepository};
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use tracing::{info, warn};

/// 用户管理服务
pub struct UserAdminService<U, A> {
    users: U,
    audit: A,
    acting_user_id: String,
}

/// 邮箱格式检查
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// 后端消息是否表示邮箱已存在
pub fn is_duplicate_email_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("duplicate")
        || (lower.contains("already") && (lower.contains("registered") || lower.contains("exists")))
}

fn map_duplicate_email(err: AppError, email: &str) -> AppError {
    match err.backend_message() {
        Some(msg) if is_duplicate_email_message(msg) => BusinessError::DuplicateEmail {
            email: email.to_string(),
        }
        .into(),
        _ => err,
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::required("email"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::invalid("email", format!("'{}' 不是有效的邮箱", email)));
    }
    Ok(email)
}

impl<U: UserRepository, A: AuditLogRepository> UserAdminService<U, A> {
    pub fn new(users: U, audit: A, acting_user_id: impl Into<String>) -> Self {
        Self {
            users,
            audit,
            acting_user_id: acting_user_id.into(),
        }
    }

    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.users.list_roles().await
    }

    pub async fn list_users(&self) -> AppResult<Vec<AdminUser>> {
        self.users.list_users().await
    }

    /// 创建用户
    pub async fn create_user(&self, user: NewUser) -> AppResult<AdminUser> {
        let email = normalize_email(&user.email)?;
        if user.full_name.trim().is_empty() {
            return Err(AppError::required("full_name"));
        }
        self.ensure_email_unused(&email).await?;

        let request = NewUser {
            email: email.clone(),
            full_name: user.full_name.trim().to_string(),
            ..user
        };
        let created = self
            .users
            .create_user(&request)
            .await
            .map_err(|e| map_duplicate_email(e, &email))?;

        info!("✓ 已创建用户 {} ({})", created.email, created.id);
        self.record("user.create", &created.id, json!({ "email": created.email }))
            .await;
        Ok(created)
    }

    /// 邀请新管理员
    pub async fn invite(&self, email: &str, role_id: Option<String>) -> AppResult<Invitation> {
        let email = normalize_email(email)?;
        self.ensure_email_unused(&email).await?;

        let invitation = NewInvitation {
            email: email.clone(),
            role_id,
            invited_by: self.acting_user_id.clone(),
        };
        let created = self
            .users
            .create_invitation(&invitation)
            .await
            .map_err(|e| map_duplicate_email(e, &email))?;

        info!("✉️ 已发送邀请: {}", created.email);
        self.record("invitation.create", &created.id, json!({ "email": created.email }))
            .await;
        Ok(created)
    }

    /// 启用或停用用户，不能停用自己
    pub async fn set_active(&self, user_id: &str, active: bool) -> AppResult<AdminUser> {
        if !active {
            self.ensure_not_self(user_id)?;
        }
        let updated = self.users.set_active(user_id, active).await?;

        let action = if active { "user.activate" } else { "user.deactivate" };
        self.record(action, user_id, json!({ "is_active": active })).await;
        Ok(updated)
    }

    /// 删除用户，不能删除自己
    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        self.ensure_not_self(user_id)?;
        self.users.delete_user(user_id).await?;

        info!("🗑️ 已删除用户 {}", user_id);
        self.record("user.delete", user_id, json!({})).await;
        Ok(())
    }

    fn ensure_not_self(&self, user_id: &str) -> AppResult<()> {
        if user_id == self.acting_user_id {
            return Err(BusinessError::CannotModifySelf.into());
        }
        Ok(())
    }

    async fn ensure_email_unused(&self, email: &str) -> AppResult<()> {
        let users = self.users.list_users().await?;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(BusinessError::DuplicateEmail {
                email: email.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// 写审计日志，失败只记录
    async fn record(&self, action: &str, target_id: &str, details: serde_json::Value) {
        let target_type = if action.starts_with("invitation") {
            "invitation"
        } else {
            "user"
        };
        let entry = AuditLogEntry::new(&self.acting_user_id, action, target_type, target_id, details);
        if let Err(e) = self.audit.append(&entry).await {
            warn!("⚠️ 审计日志写入失败 ({}): {}", action, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("teacher@school.edu"));
        assert!(!is_valid_email("teacher@school"));
        assert!(!is_valid_email("no spaces@x.com"));
    }

    #[test]
    fn duplicate_messages() {
        assert!(is_duplicate_email_message("User already registered"));
        assert!(is_duplicate_email_message("duplicate key value violates unique constraint"));
        assert!(is_duplicate_email_message("A user with this email address already exists"));
        assert!(!is_duplicate_email_message("permission denied"));
    }

    #[test]
    fn only_duplicate_backend_errors_are_mapped() {
        let mapped = map_duplicate_email(
            AppError::bad_response("functions/create-user", 422, "User already registered"),
            "a@b.cn",
        );
        assert!(matches!(mapped, AppError::Business(BusinessError::DuplicateEmail { .. })));

        let kept = map_duplicate_email(AppError::bad_response("x", 500, "boom"), "a@b.cn");
        assert!(matches!(kept, AppError::Api(_)));
    }
}
