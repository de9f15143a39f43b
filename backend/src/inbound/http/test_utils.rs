//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::test as actix_test;
use serde::de::DeserializeOwned;

use super::state::HttpState;
use crate::domain::ports::{
    MockAccountCommand, MockLoginService, MockRouteCommand, MockRouteQuery, MockUsersQuery,
    MockWeatherQuery,
};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler state made of mocks; ports left unset reject every call.
#[derive(Default)]
pub struct MockedState {
    login: Option<MockLoginService>,
    accounts: Option<MockAccountCommand>,
    users: Option<MockUsersQuery>,
    route_commands: Option<MockRouteCommand>,
    routes: Option<MockRouteQuery>,
    weather: Option<MockWeatherQuery>,
}

pub fn mocked_state() -> MockedState {
    MockedState::default()
}

impl MockedState {
    pub fn login(mut self, mock: MockLoginService) -> Self {
        self.login = Some(mock);
        self
    }

    pub fn accounts(mut self, mock: MockAccountCommand) -> Self {
        self.accounts = Some(mock);
        self
    }

    pub fn users(mut self, mock: MockUsersQuery) -> Self {
        self.users = Some(mock);
        self
    }

    pub fn route_commands(mut self, mock: MockRouteCommand) -> Self {
        self.route_commands = Some(mock);
        self
    }

    pub fn routes(mut self, mock: MockRouteQuery) -> Self {
        self.routes = Some(mock);
        self
    }

    pub fn weather(mut self, mock: MockWeatherQuery) -> Self {
        self.weather = Some(mock);
        self
    }

    pub fn build(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login.unwrap_or_default()),
            accounts: Arc::new(self.accounts.unwrap_or_default()),
            users: Arc::new(self.users.unwrap_or_default()),
            route_commands: Arc::new(self.route_commands.unwrap_or_default()),
            routes: Arc::new(self.routes.unwrap_or_default()),
            weather: Arc::new(self.weather.unwrap_or_default()),
        }
    }
}

/// Decode a JSON response body.
pub async fn read_json<B, T>(response: ServiceResponse<B>) -> T
where
    B: MessageBody,
    T: DeserializeOwned,
{
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON response body")
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}
