// SPDX-License-Identifier: MIT

//! User persistence: OAuth upsert and profile updates.

use crate::db::Db;
use crate::error::AppError;
use crate::models::{Role, User};
use uuid::Uuid;

/// Fields a user may change on their own profile. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub role: Option<Role>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Db {
    /// Get a user by id.
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, image, role, phone, lat, lng, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(user)
    }

    /// Get a user by email (the OAuth identity key).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, image, role, phone, lat, lng, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(user)
    }

    /// Find the user matching an OAuth profile, creating one on first login.
    /// New users default to the VICTIM role.
    pub async fn upsert_oauth_user(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, AppError> {
        if let Some(existing) = self.get_user_by_email(email).await? {
            return Ok(existing);
        }

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, name, image, role)
             VALUES ($1, $2, $3, $4, 'VICTIM')
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
             RETURNING id, email, name, image, role, phone, lat, lng, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(image)
        .fetch_one(self.pool()?)
        .await?;

        tracing::info!(user_id = %user.id, "Created user on first OAuth login");

        Ok(user)
    }

    /// Apply a profile update (role switch, location, phone, name) and return
    /// the refreshed row.
    pub async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET
                 role  = COALESCE($2, role),
                 name  = COALESCE($3, name),
                 phone = COALESCE($4, phone),
                 lat   = COALESCE($5, lat),
                 lng   = COALESCE($6, lng)
             WHERE id = $1
             RETURNING id, email, name, image, role, phone, lat, lng, created_at",
        )
        .bind(id)
        .bind(update.role.map(Role::as_str))
        .bind(update.name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.lat)
        .bind(update.lng)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(user)
    }
}
