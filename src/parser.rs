//! JSON binding between wire payloads and typed values.

use crate::error::ApplicationError;

use serde::{Serialize, de::DeserializeOwned};

/// A request payload that can check its own invariants once deserialized.
///
/// ```rust
/// use lambda_commons::{error::ApplicationError, parser};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct SignUp {
///     email: String,
/// }
///
/// impl parser::ValidatedRequest for SignUp {
///     fn validate(&self) -> Result<(), ApplicationError> {
///         if self.email.contains('@') {
///             Ok(())
///         } else {
///             Err(ApplicationError::bad_request("invalid email"))
///         }
///     }
/// }
///
/// let error = parser::bind_validated_request::<SignUp>(r#"{"email": "nope"}"#).err();
/// assert_eq!(error, Some(ApplicationError::bad_request("invalid email")));
/// ```
pub trait ValidatedRequest {
    /// Check the request, returning the error to report when it is invalid.
    fn validate(&self) -> Result<(), ApplicationError>;
}

/// Deserialize a raw request body.
///
/// Malformed input is reported as a 400 carrying the parser message.
pub fn bind_request<T: DeserializeOwned>(raw: &str) -> Result<T, ApplicationError> {
    serde_json::from_str(raw).map_err(|error| ApplicationError::bad_request(error.to_string()))
}

/// Deserialize a raw request body, then validate it.
pub fn bind_validated_request<T>(raw: &str) -> Result<T, ApplicationError>
where
    T: DeserializeOwned + ValidatedRequest,
{
    let request: T = bind_request(raw)?;
    request.validate()?;
    Ok(request)
}

/// Serialize a response body.
///
/// Serialization failures are reported as a generic 500.
pub fn bind_response<T: Serialize + ?Sized>(value: &T) -> Result<String, ApplicationError> {
    serde_json::to_string(value).map_err(|_| ApplicationError::generic_internal_server_error())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use rstest::rstest;
    use serde::{Deserialize, Serializer, ser};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    impl ValidatedRequest for Payload {
        fn validate(&self) -> Result<(), ApplicationError> {
            if self.name.is_empty() {
                return Err(ApplicationError::bad_request("name is required"));
            }
            Ok(())
        }
    }

    /// Value whose serialization always fails.
    pub(crate) struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(ser::Error::custom("unserializable"))
        }
    }

    #[test]
    fn test_bind_request() {
        let actual: Payload = bind_request(r#"{"name": "a", "age": 3, "tags": ["b"]}"#).unwrap();
        let expected = Payload {
            name: "a".to_string(),
            age: 3,
            tags: vec!["b".to_string()],
        };
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::not_json("not json")]
    #[case::wrong_type(r#"{"name": "a", "age": "three", "tags": []}"#)]
    #[case::missing_field(r#"{"name": "a"}"#)]
    #[case::empty("")]
    fn test_bind_request_malformed(#[case] raw: &str) {
        let error = bind_request::<Payload>(raw).unwrap_err();
        let parser_message = serde_json::from_str::<Payload>(raw).unwrap_err().to_string();
        assert_eq!(error, ApplicationError::bad_request(parser_message));
    }

    #[test]
    fn test_bind_response() {
        let payload = Payload {
            name: "a".to_string(),
            age: 3,
            tags: vec![],
        };
        let actual = bind_response(&payload).unwrap();
        assert_eq!(actual, r#"{"name":"a","age":3,"tags":[]}"#);
        assert_eq!(bind_request::<Payload>(&actual).unwrap(), payload);
    }

    #[test]
    fn test_bind_response_failure() {
        let error = bind_response(&Unserializable).unwrap_err();
        assert_eq!(error, ApplicationError::generic_internal_server_error());
    }

    #[rstest]
    #[case::valid(r#"{"name": "a", "age": 1, "tags": []}"#, None)]
    #[case::invalid(
        r#"{"name": "", "age": 1, "tags": []}"#,
        Some(ApplicationError::bad_request("name is required"))
    )]
    fn test_bind_validated_request(#[case] raw: &str, #[case] expected: Option<ApplicationError>) {
        let actual = bind_validated_request::<Payload>(raw).err();
        assert_eq!(actual, expected);
    }
}
