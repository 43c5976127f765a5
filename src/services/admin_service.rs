use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::Admin;
use crate::store::Store;
use crate::types::admin_types::{CreateAdminRequest, UpdateAdminRequest};
use crate::types::auth_types::LoginAdminInput;
use crate::utils::jwt::JwtKeys;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const SELF_DELETE: &str = "Cannot delete your own account";

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub admin: Admin,
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    jwt: JwtKeys,
    bcrypt_cost: u32,
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// A stored hash bcrypt cannot parse is a server fault, not a wrong password.
async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to verify password: {e}")))
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtKeys, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost,
        }
    }

    /// `username` may also be the admin's e-mail.
    pub async fn login(&self, input: LoginAdminInput) -> AppResult<LoginResponse> {
        let admin = self
            .store
            .find_admin_by_login(input.username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

        if !verify_password(input.password, admin.password_hash.clone()).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let token = self.jwt.create_jwt(admin.id, &admin.username)?;
        info!("Admin signed in: admin_id={}", admin.id);

        Ok(LoginResponse { token, admin })
    }

    pub async fn find_by_id(&self, admin_id: i64) -> AppResult<Admin> {
        self.store
            .find_admin(admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin", admin_id))
    }

    pub async fn list(&self) -> AppResult<Vec<Admin>> {
        self.store.list_admins().await
    }

    pub async fn create(&self, input: CreateAdminRequest) -> AppResult<Admin> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();
        let hash = hash_password(input.password, self.bcrypt_cost).await?;

        let admin = self.store.create_admin(&username, &email, &hash).await?;
        info!("Admin created: admin_id={}, username={}", admin.id, admin.username);
        Ok(admin)
    }

    pub async fn update(&self, admin_id: i64, input: UpdateAdminRequest) -> AppResult<Admin> {
        let (mut changes, password) = input.into_changes()?;
        if let Some(password) = password {
            changes.password_hash = Some(hash_password(password, self.bcrypt_cost).await?);
        }

        let admin = self.store.update_admin(admin_id, &changes).await?;
        info!("Admin updated: admin_id={}", admin.id);
        Ok(admin)
    }

    /// An admin cannot remove the account they are signed in with.
    pub async fn delete(&self, admin_id: i64, acting_admin_id: i64) -> AppResult<()> {
        if admin_id == acting_admin_id {
            return Err(AppError::conflict(SELF_DELETE));
        }

        self.store.delete_admin(admin_id).await?;
        info!("Admin deleted: admin_id={admin_id}, by admin_id={acting_admin_id}");
        Ok(())
    }

    /// Creates the admin unless one with this username already exists.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Admin> {
        if let Some(existing) = self.store.find_admin_by_login(username).await? {
            return Ok(existing);
        }

        let hash = hash_password(password.to_owned(), self.bcrypt_cost).await?;
        let admin = self.store.create_admin(username, email, &hash).await?;
        info!(
            "Bootstrapped admin account: admin_id={}, username={}",
            admin.id, admin.username
        );
        Ok(admin)
    }
}
