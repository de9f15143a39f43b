//! Diesel row structs. Internal to the persistence layer; repositories
//! convert them to domain records at the boundary.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{routes, user_routes, users};
use crate::domain::{
    EmailAddress, PasswordHash, Route, RouteName, UserId, UserProfile, UserRecord, Username,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
}

impl UserRow {
    /// Rebuild the domain record, re-validating the stored identifiers.
    pub(crate) fn into_record(self) -> Result<UserRecord, String> {
        let password_hash = PasswordHash::new(self.password_hash.clone());
        Ok(UserRecord {
            profile: self.into_profile()?,
            password_hash,
        })
    }

    pub(crate) fn into_profile(self) -> Result<UserProfile, String> {
        let username = Username::new(&self.username)
            .map_err(|err| format!("stored username `{}` is invalid: {err}", self.username))?;
        let email = EmailAddress::new(&self.email)
            .map_err(|err| format!("stored email for `{}` is invalid: {err}", self.username))?;
        Ok(UserProfile {
            id: UserId::from_uuid(self.id),
            username,
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            phone: self.phone,
            birth_date: self.birth_date,
            city: self.city,
            registered_at: self.registered_at,
        })
    }
}

/// Insert and full-overwrite payload for the users table.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserWriteRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<&'a str>,
    pub password_hash: &'a str,
    pub registered_at: DateTime<Utc>,
}

impl<'a> From<&'a UserRecord> for UserWriteRow<'a> {
    fn from(record: &'a UserRecord) -> Self {
        let profile = &record.profile;
        Self {
            id: *profile.id.as_uuid(),
            username: profile.username.as_ref(),
            first_name: &profile.first_name,
            last_name: &profile.last_name,
            email: profile.email.as_ref(),
            phone: profile.phone.as_deref(),
            birth_date: profile.birth_date,
            city: profile.city.as_deref(),
            password_hash: record.password_hash.as_str(),
            registered_at: profile.registered_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RouteRow {
    pub name: String,
    pub origin: String,
    pub waypoints: Vec<String>,
    pub destination: String,
    pub mode: String,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
    pub creator: Option<String>,
}

impl RouteRow {
    pub(crate) fn into_route(self) -> Result<Route, String> {
        let name = RouteName::new(&self.name)
            .map_err(|err| format!("stored route name `{}` is invalid: {err}", self.name))?;
        let mode = self
            .mode
            .parse()
            .map_err(|err| format!("route `{}` has unknown mode: {err}", self.name))?;
        let difficulty = self
            .difficulty
            .parse()
            .map_err(|err| format!("route `{}` has unknown difficulty: {err}", self.name))?;
        let creator = self
            .creator
            .as_deref()
            .map(Username::new)
            .transpose()
            .map_err(|err| format!("route `{}` has invalid creator: {err}", self.name))?;
        Ok(Route {
            name,
            origin: self.origin,
            waypoints: self.waypoints,
            destination: self.destination,
            mode,
            distance_km: self.distance_km,
            duration_hours: self.duration_hours,
            difficulty,
            created_at: self.created_at,
            creator,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routes)]
pub(crate) struct NewRouteRow<'a> {
    pub name: &'a str,
    pub origin: &'a str,
    pub waypoints: &'a [String],
    pub destination: &'a str,
    pub mode: &'static str,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub difficulty: &'static str,
    pub created_at: DateTime<Utc>,
    pub creator: Option<&'a str>,
}

impl<'a> From<&'a Route> for NewRouteRow<'a> {
    fn from(route: &'a Route) -> Self {
        Self {
            name: route.name.as_ref(),
            origin: &route.origin,
            waypoints: &route.waypoints,
            destination: &route.destination,
            mode: route.mode.as_str(),
            distance_km: route.distance_km,
            duration_hours: route.duration_hours,
            difficulty: route.difficulty.as_str(),
            created_at: route.created_at,
            creator: route.creator.as_ref().map(AsRef::as_ref),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_routes)]
pub(crate) struct NewUserRouteRow<'a> {
    pub user_id: Uuid,
    pub route_name: &'a str,
}
