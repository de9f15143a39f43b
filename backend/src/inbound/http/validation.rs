//! Translate domain validation failures into `invalid_request` errors.
//!
//! Every error carries `details.field` (the JSON or query field name) and a
//! machine-readable `details.code`.

use serde_json::json;

use crate::domain::{
    Error, LoginValidationError, RouteFilterError, RouteName, RouteValidationError,
    TransportMode, UserValidationError, Username,
};

fn invalid(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

pub(crate) fn missing_field_error(field: &str) -> Error {
    invalid(
        field,
        "missing_field",
        format!("missing required field: {field}"),
    )
}

pub(crate) fn login_validation_error(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyUsername => ("username", "empty_username"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
        LoginValidationError::PasswordTooLong { .. } => ("password", "password_too_long"),
    };
    invalid(field, code, err.to_string())
}

pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    if let UserValidationError::Password(inner) = err {
        return login_validation_error(inner);
    }
    let code = match &err {
        UserValidationError::InvalidId => "invalid_id",
        UserValidationError::EmptyUsername => "empty_username",
        UserValidationError::UsernameLength { .. } => "username_length",
        UserValidationError::UsernameInvalidCharacters => "username_invalid_characters",
        UserValidationError::EmptyEmail => "empty_email",
        UserValidationError::InvalidEmail => "invalid_email",
        UserValidationError::EmptyField { .. } => "empty_field",
        UserValidationError::FieldTooLong { .. } => "field_too_long",
        UserValidationError::InvalidBirthDate => "invalid_birth_date",
        UserValidationError::Password(_) => "invalid_password",
    };
    invalid(err.field(), code, err.to_string())
}

pub(crate) fn route_validation_error(err: RouteValidationError) -> Error {
    let (field, code) = match &err {
        RouteValidationError::UnknownMode(_) => ("mode", "unknown_mode"),
        RouteValidationError::UnknownModeFilter(_) => ("mode", "unknown_mode"),
        RouteValidationError::UnknownDifficulty(_) => ("difficulty", "unknown_difficulty"),
        RouteValidationError::EmptyName => ("name", "empty_name"),
        RouteValidationError::NameTooLong { .. } => ("name", "name_too_long"),
        RouteValidationError::NameInvalidCharacters => ("name", "name_invalid_characters"),
        RouteValidationError::EmptyAddress { field } => (*field, "empty_address"),
    };
    invalid(field, code, err.to_string())
}

pub(crate) fn route_filter_error(err: RouteFilterError) -> Error {
    match err {
        RouteFilterError::Value(inner) => route_validation_error(inner),
        bound @ RouteFilterError::InvalidBound { .. } => {
            invalid(bound.field(), "invalid_bound", bound.to_string())
        }
    }
}

/// Parse a username taken from the request path.
pub(crate) fn path_username(raw: &str) -> Result<Username, Error> {
    Username::new(raw).map_err(user_validation_error)
}

/// Parse a route name taken from the request path.
pub(crate) fn path_route_name(raw: &str) -> Result<RouteName, Error> {
    RouteName::new(raw).map_err(route_validation_error)
}

/// Parse an optional transport mode, defaulting to walking.
pub(crate) fn transport_mode(raw: Option<&str>) -> Result<TransportMode, Error> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.parse().map_err(route_validation_error),
        None => Ok(TransportMode::Walk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details().and_then(|d| d.get(key)).and_then(|v| v.as_str())
    }

    #[rstest]
    fn password_problems_point_at_the_password_field() {
        let error = user_validation_error(UserValidationError::Password(
            LoginValidationError::EmptyPassword,
        ));
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(detail(&error, "field"), Some("password"));
        assert_eq!(detail(&error, "code"), Some("empty_password"));
    }

    #[rstest]
    #[case(UserValidationError::InvalidEmail, "email", "invalid_email")]
    #[case(UserValidationError::InvalidBirthDate, "birthDate", "invalid_birth_date")]
    #[case(UserValidationError::EmptyField { field: "firstName" }, "firstName", "empty_field")]
    fn user_errors_name_their_field(
        #[case] err: UserValidationError,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let error = user_validation_error(err);
        assert_eq!(detail(&error, "field"), Some(field));
        assert_eq!(detail(&error, "code"), Some(code));
    }

    #[rstest]
    #[case(Some("BIKE"), TransportMode::Bike)]
    #[case(Some("  "), TransportMode::Walk)]
    #[case(None, TransportMode::Walk)]
    fn transport_mode_defaults_to_walking(#[case] raw: Option<&str>, #[case] expected: TransportMode) {
        assert_eq!(transport_mode(raw).expect("mode"), expected);
    }

    #[rstest]
    fn unknown_modes_are_rejected() {
        let error = transport_mode(Some("teleport")).expect_err("unknown");
        assert_eq!(detail(&error, "field"), Some("mode"));
        assert_eq!(detail(&error, "code"), Some("unknown_mode"));
    }

    #[rstest]
    fn filter_bounds_name_the_query_parameter() {
        let err = RouteFilterError::InvalidBound { field: "maxKm" };
        let error = route_filter_error(err);
        assert_eq!(detail(&error, "field"), Some("maxKm"));
    }
}
