//! PostgreSQL-backed [`RouteRepository`] over `routes` and `user_routes`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewRouteRow, NewUserRouteRow, RouteRow};
use super::pool::{DbPool, PoolError};
use super::schema::{routes, user_routes};
use crate::domain::ports::{RoutePersistenceError, RouteRepository};
use crate::domain::{Route, RouteName, UserId};

/// Diesel adapter for route rows and their user links.
#[derive(Clone)]
pub struct DieselRouteRepository {
    pool: DbPool,
}

impl DieselRouteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RoutePersistenceError {
    RoutePersistenceError::connection(error.into_message())
}

/// `inserting` names the route whose primary key a unique violation refers to.
fn map_diesel_error(
    error: diesel::result::Error,
    inserting: Option<&RouteName>,
) -> RoutePersistenceError {
    match (classify_diesel_error(error), inserting) {
        (DieselFailure::UniqueViolation { .. }, Some(name)) => {
            RoutePersistenceError::duplicate(name.as_ref())
        }
        (DieselFailure::UniqueViolation { .. }, None) => {
            RoutePersistenceError::query("unique constraint violated")
        }
        (DieselFailure::Connection(message), _) => RoutePersistenceError::connection(message),
        (DieselFailure::Query(message), _) => RoutePersistenceError::query(message),
    }
}

fn rows_to_routes(rows: Vec<RouteRow>) -> Result<Vec<Route>, RoutePersistenceError> {
    rows.into_iter()
        .map(|row| row.into_route().map_err(RoutePersistenceError::query))
        .collect()
}

#[async_trait]
impl RouteRepository for DieselRouteRepository {
    async fn insert(&self, route: &Route, owner: &UserId) -> Result<(), RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewRouteRow::from(route);
        let link = NewUserRouteRow {
            user_id: *owner.as_uuid(),
            route_name: route.name.as_ref(),
        };
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(routes::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(user_routes::table)
                    .values(&link)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, Some(&route.name)))
    }

    async fn find(&self, name: &RouteName) -> Result<Option<Route>, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = routes::table
            .find(name.as_ref())
            .select(RouteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        row.map(|row| row.into_route().map_err(RoutePersistenceError::query))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Route>, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = routes::table
            .order((routes::created_at.desc(), routes::name.asc()))
            .select(RouteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows_to_routes(rows)
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Route>, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = routes::table
            .inner_join(user_routes::table)
            .filter(user_routes::user_id.eq(*user.as_uuid()))
            .order((routes::created_at.desc(), routes::name.asc()))
            .select(RouteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows_to_routes(rows)
    }

    async fn link(&self, user: &UserId, name: &RouteName) -> Result<(), RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(user_routes::table)
            .values(NewUserRouteRow {
                user_id: *user.as_uuid(),
                route_name: name.as_ref(),
                })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        Ok(())
    }

    async fn unlink(&self, user: &UserId, name: &RouteName) -> Result<bool, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            user_routes::table
                .filter(user_routes::user_id.eq(*user.as_uuid()))
                .filter(user_routes::route_name.eq(name.as_ref())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, None))?;
        Ok(removed > 0)
    }

    async fn owner_count(&self, name: &RouteName) -> Result<usize, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = user_routes::table
            .filter(user_routes::route_name.eq(name.as_ref()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        usize::try_from(count).map_err(|_| RoutePersistenceError::query("negative owner count"))
    }

    async fn delete(&self, name: &RouteName) -> Result<bool, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let key = name.as_ref().to_owned();
        conn.transaction(|conn| {
            async move {
                diesel::delete(user_routes::table.filter(user_routes::route_name.eq(&key)))
                    .execute(conn)
                    .await?;
                let removed = diesel::delete(routes::table.find(&key))
                    .execute(conn)
                    .await?;
                Ok(removed > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, None))
    }

    async fn memberships(&self) -> Result<Vec<(UserId, RouteName)>, RoutePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, String)> = user_routes::table
            .select((user_routes::user_id, user_routes::route_name))
            .order((user_routes::user_id.asc(), user_routes::route_name.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows.into_iter()
            .map(|(user, route)| {
                RouteName::new(&route)
                    .map(|name| (UserId::from_uuid(user), name))
                    .map_err(|err| {
                        RoutePersistenceError::query(format!("stored route name `{route}`: {err}"))
                    })
            })
            .collect()
    }
}
