//! Diesel table definitions; kept in step with `backend/migrations`.

diesel::table! {
    /// Registered users. `username` and `email` carry unique constraints
    /// named `users_username_key` and `users_email_key`.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        birth_date -> Nullable<Date>,
        city -> Nullable<Varchar>,
        /// Argon2 PHC string.
        password_hash -> Text,
        registered_at -> Timestamptz,
    }
}

diesel::table! {
    /// Saved routes keyed by their unique name.
    routes (name) {
        name -> Varchar,
        origin -> Text,
        waypoints -> Array<Text>,
        destination -> Text,
        /// `walk`, `bike` or `drive`.
        mode -> Varchar,
        distance_km -> Float8,
        duration_hours -> Float8,
        /// `low`, `medium` or `high`.
        difficulty -> Varchar,
        created_at -> Timestamptz,
        creator -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Many-to-many membership between users and routes.
    user_routes (user_id, route_name) {
        user_id -> Uuid,
        route_name -> Varchar,
        /// Defaults to `now()` on insert.
        linked_at -> Timestamptz,
    }
}

diesel::joinable!(user_routes -> users (user_id));
diesel::joinable!(user_routes -> routes (route_name));

diesel::allow_tables_to_appear_in_same_query!(users, routes, user_routes);
