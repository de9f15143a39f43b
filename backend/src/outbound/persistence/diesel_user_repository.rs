//! PostgreSQL-backed [`UserRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{UserRow, UserWriteRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;
use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{UserId, UserProfile, UserRecord, Username};

/// Diesel adapter for the `users` table.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::Query(message) => UserPersistenceError::query(message),
        DieselFailure::UniqueViolation { constraint } => {
            UserPersistenceError::duplicate(duplicate_field(constraint.as_deref()))
        }
    }
}

fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.contains("email") => "email",
        _ => "username",
    }
}

/// Escape `LIKE` metacharacters so the fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn rows_to_profiles(rows: Vec<UserRow>) -> Result<Vec<UserProfile>, UserPersistenceError> {
    rows.into_iter()
        .map(|row| row.into_profile().map_err(UserPersistenceError::query))
        .collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, record: &UserRecord) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(UserWriteRow::from(record))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, record: &UserRecord) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*record.profile.id.as_uuid()))
            .set(UserWriteRow::from(record))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(UserPersistenceError::query(format!(
                "user {} does not exist",
                record.profile.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_record().map_err(UserPersistenceError::query))
            .transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_record().map_err(UserPersistenceError::query))
            .transpose()
    }

    async fn search(&self, fragment: &str) -> Result<Vec<UserProfile>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = users::table
            .filter(users::username.ilike(like_pattern(fragment)))
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_profiles(rows)
    }

    async fn list(&self) -> Result<Vec<UserProfile>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = users::table
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_profiles(rows)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ana", "%ana%")]
    #[case("50%_off", "%50\\%\\_off%")]
    #[case("back\\slash", "%back\\\\slash%")]
    #[case("", "%%")]
    fn like_patterns_escape_metacharacters(#[case] fragment: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(fragment), expected);
    }

    #[rstest]
    #[case(Some("users_email_key"), "email")]
    #[case(Some("users_username_key"), "username")]
    #[case(None, "username")]
    fn unique_constraints_name_the_field(#[case] constraint: Option<&str>, #[case] field: &str) {
        assert_eq!(duplicate_field(constraint), field);
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let error = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(error, UserPersistenceError::connection("timed out"));
    }
}
