use crate::clients::{eq_filter, BackendClient};
use crate::error::{AppError, AppResult};
use crate::models::{AdminUser, Invitation, NewInvitation, NewUser, Role};
use serde::Deserialize;
use serde_json::{json, Value};

const USERS_TABLE: &str = "admin_users";

/// create-user 云函数的返回
#[derive(Debug, Deserialize)]
struct CreateUserResponse {
    user: AdminUser,
}

/// 用户与角色仓储
#[allow(async_fn_in_trait)]
pub trait UserRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    async fn list_users(&self) -> AppResult<Vec<AdminUser>>;

    async fn find_user(&self, id: &str) -> AppResult<Option<AdminUser>>;

    /// 通过云函数创建账号
    async fn create_user(&self, user: &NewUser) -> AppResult<AdminUser>;

    /// 写入邀请记录并触发邀请邮件
    async fn create_invitation(&self, invitation: &NewInvitation) -> AppResult<Invitation>;

    async fn set_active(&self, id: &str, active: bool) -> AppResult<AdminUser>;

    /// 通过云函数删除账号
    async fn delete_user(&self, id: &str) -> AppResult<()>;
}

impl UserRepository for BackendClient {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.select("roles", &[], Some("name.asc")).await
    }

    async fn list_users(&self) -> AppResult<Vec<AdminUser>> {
        self.select(USERS_TABLE, &[], Some("created_at.desc")).await
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<AdminUser>> {
        self.select_one(USERS_TABLE, &[eq_filter("id", id)]).await
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<AdminUser> {
        let response: CreateUserResponse = self.invoke_function("create-user", user).await?;
        Ok(response.user)
    }

    async fn create_invitation(&self, invitation: &NewInvitation) -> AppResult<Invitation> {
        let created: Invitation = self.insert("admin_invitations", invitation).await?;

        let _: Value = self
            .invoke_function(
                "send-invitation",
                &json!({ "invitation_id": created.id, "email": created.email }),
            )
            .await?;

        Ok(created)
    }

    async fn set_active(&self, id: &str, active: bool) -> AppResult<AdminUser> {
        let mut rows: Vec<AdminUser> = self
            .update(USERS_TABLE, &[eq_filter("id", id)], &json!({ "is_active": active }))
            .await?;
        if rows.is_empty() {
            return Err(AppError::empty_response(USERS_TABLE));
        }
        Ok(rows.remove(0))
    }

    async fn delete_user(&self, id: &str) -> AppResult<()> {
        let _: Value = self
            .invoke_function("delete-user", &json!({ "user_id": id }))
            .await?;
        Ok(())
    }
}
