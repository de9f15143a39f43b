//! Port bundle shared by every HTTP handler through `web::Data`.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, LoginService, RouteCommand, RouteQuery, UsersQuery, WeatherQuery,
};

/// Driving ports the handlers depend on; cheap to clone.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn AccountCommand>,
    pub users: Arc<dyn UsersQuery>,
    pub route_commands: Arc<dyn RouteCommand>,
    pub routes: Arc<dyn RouteQuery>,
    pub weather: Arc<dyn WeatherQuery>,
}

impl HttpState {
    /// Bundle the three domain services, each serving every port it implements.
    pub fn new<A, R, W>(accounts: Arc<A>, routes: Arc<R>, weather: Arc<W>) -> Self
    where
        A: LoginService + AccountCommand + UsersQuery + 'static,
        R: RouteCommand + RouteQuery + 'static,
        W: WeatherQuery + 'static,
    {
        Self {
            login: accounts.clone(),
            accounts: accounts.clone(),
            users: accounts,
            route_commands: routes.clone(),
            routes,
            weather,
        }
    }
}
