//! Request method allow-list

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// HTTP methods accepted by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Every allowed method, in the order reported to callers
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    /// Validate an optional method name, defaulting to `GET` when absent
    ///
    /// Matching is exact: `get` is rejected just like `HEAD`.
    pub fn validate(method: Option<&str>) -> Result<Self, ValidationError> {
        match method {
            None => Ok(Method::default()),
            Some(method) => method.parse(),
        }
    }

    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether a request body is sent with this method
    pub fn permits_body(&self) -> bool {
        !matches!(self, Method::Get)
    }

    /// Allowed methods formatted for error messages
    pub(crate) fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|m| format!("{:?}", m.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedMethod {
                method: s.to_string(),
            })
    }
}

impl TryFrom<String> for Method {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_defaults_to_get() {
        assert_eq!(Method::validate(None), Ok(Method::Get));
    }

    #[test]
    fn test_validate_allowed_methods() {
        for name in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
            let method = Method::validate(Some(name)).expect("Method should be allowed");
            assert_eq!(method.as_str(), name);
        }
    }

    #[test]
    fn test_validate_rejects_unlisted_methods() {
        for name in ["HEAD", "OPTIONS", "TRACE", "CONNECT", "", "get", "Post"] {
            let result = Method::validate(Some(name));
            assert_eq!(
                result,
                Err(ValidationError::UnsupportedMethod {
                    method: name.to_string()
                })
            );
        }
    }

    #[test]
    fn test_allowed_list_is_fixed_order() {
        assert_eq!(
            Method::allowed_list(),
            r#""GET", "POST", "PUT", "PATCH", "DELETE""#
        );
    }

    #[test]
    fn test_permits_body() {
        assert!(!Method::Get.permits_body());
        assert!(Method::Post.permits_body());
        assert!(Method::Put.permits_body());
        assert!(Method::Patch.permits_body());
        assert!(Method::Delete.permits_body());
    }

    #[test]
    fn test_into_http_method() {
        assert_eq!(http::Method::from(Method::Patch), http::Method::PATCH);
        assert_eq!(http::Method::from(Method::Delete), http::Method::DELETE);
    }

    #[test]
    fn test_serde_round_trip_uses_wire_name() {
        let json = serde_json::to_string(&Method::Put).expect("Serialize should succeed");
        assert_eq!(json, r#""PUT""#);

        let err = serde_json::from_str::<Method>(r#""HEAD""#).expect_err("HEAD is not allowed");
        assert!(err.to_string().contains("not allowed"));
    }
}
