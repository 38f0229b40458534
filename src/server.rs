//! Auth server wire plumbing (§6). `LoginFetch` is the sole network seam —
//! everything above it deals in `serde_json::Value` request/response bodies
//! and the typed `ErrorKind` variants `parse_reply` maps server error codes
//! onto.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// The one thing a caller must supply to talk to the auth server. `path` is
/// relative to the configured `api_base_url` (e.g. `/v2/login`).
#[async_trait]
pub trait LoginFetch: Send + Sync {
    async fn call(&self, method: HttpMethod, path: &str, body: Value) -> Result<Value, Error>;
}

/// Server error codes, as returned in the `"status"`/`"message"` envelope
/// fields of a non-2xx response body. Mapped onto `ErrorKind` by
/// `parse_reply`.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    login_id: Option<String>,
    #[serde(default)]
    voucher_id: Option<String>,
    #[serde(default)]
    voucher_auth: Option<String>,
    #[serde(default)]
    reset_token: Option<String>,
}

/// Extracts `results` from a server envelope, or translates a server error
/// code into the matching `ErrorKind`.
pub fn parse_reply(body: &Value) -> Result<Value, Error> {
    if let Some(results) = body.get("results") {
        return Ok(results.clone());
    }

    let envelope: ErrorEnvelope = serde_json::from_value(body.clone())
        .map_err(|_| ErrorKind::NetworkError("malformed server response".to_string()))?;

    let kind = match envelope.status.as_str() {
        "error: username or password error" | "PasswordError" => ErrorKind::PasswordError,
        "error: invalid pin" | "Pin2Error" => ErrorKind::Pin2Error,
        "error: invalid recovery answers" | "Recovery2Error" => ErrorKind::Recovery2Error,
        "error: username unavailable" | "UsernameError" => ErrorKind::UsernameError,
        "error: otp required" | "OtpError" => ErrorKind::OtpError {
            login_id: envelope.login_id.unwrap_or_default(),
            voucher_id: envelope.voucher_id,
            voucher_auth: envelope.voucher_auth,
            reset_token: envelope.reset_token,
        },
        _ => ErrorKind::NetworkError(if envelope.message.is_empty() {
            format!("unrecognized server status `{}`", envelope.status)
        } else {
            envelope.message
        }),
    };
    Err(kind.into())
}

/// Builds the common authenticated-request envelope: `{ ...auth, data }`.
pub fn build_request(auth: Value, data: Value) -> Value {
    let mut request = match auth {
        Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("auth".to_string(), other);
            map
        }
    };
    request.insert("data".to_string(), data);
    Value::Object(request)
}

#[async_trait]
pub trait LoginFetchExt: LoginFetch {
    async fn post(&self, path: &str, body: Value) -> Result<Value, Error> {
        let raw = self.call(HttpMethod::Post, path, body).await?;
        parse_reply(&raw)
    }
}

impl<T: LoginFetch + ?Sized> LoginFetchExt for T {}

/// Test double recording every call it receives and returning scripted
/// responses in order.
#[cfg(any(test, feature = "test-util"))]
pub struct MockLoginFetch {
    pub responses: std::sync::Mutex<std::collections::VecDeque<Result<Value, Error>>>,
    pub calls: std::sync::Mutex<Vec<(HttpMethod, String, Value)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MockLoginFetch {
    pub fn new(responses: Vec<Result<Value, Error>>) -> Self {
        MockLoginFetch {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(vec![Ok(json!({ "results": body }))])
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl LoginFetch for MockLoginFetch {
    async fn call(&self, method: HttpMethod, path: &str, body: Value) -> Result<Value, Error> {
        self.calls.lock().unwrap().push((method, path.to_string(), body));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ErrorKind::NetworkError("MockLoginFetch exhausted".to_string()).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reply_extracts_results_on_success() {
        let body = json!({ "results": { "loginId": "abc" } });
        let parsed = parse_reply(&body).unwrap();
        assert_eq!(parsed["loginId"], "abc");
    }

    #[test]
    fn parse_reply_maps_otp_error_with_voucher() {
        let body = json!({
            "status": "OtpError",
            "loginId": "abc",
            "voucherId": "v1",
            "voucherAuth": "va1",
        });
        let err = parse_reply(&body).unwrap_err();
        match err.into_kind() {
            ErrorKind::OtpError { login_id, voucher_id, .. } => {
                assert_eq!(login_id, "abc");
                assert_eq!(voucher_id.as_deref(), Some("v1"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn parse_reply_maps_unknown_status_to_network_error() {
        let body = json!({ "status": "who knows", "message": "server is confused" });
        let err = parse_reply(&body).unwrap_err();
        matches!(err.into_kind(), ErrorKind::NetworkError(_));
    }

    #[tokio::test]
    async fn mock_login_fetch_records_calls_and_returns_scripted_response() {
        let mock = MockLoginFetch::ok(json!({ "loginId": "abc" }));
        let result = mock.post("/v2/login", json!({ "otp": null })).await.unwrap();
        assert_eq!(result["loginId"], "abc");
        assert_eq!(mock.calls.lock().unwrap().len(), 1);
    }
}
