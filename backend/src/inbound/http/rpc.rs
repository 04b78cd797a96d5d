//! JSON-RPC transport for the user router.
//!
//! ```text
//! POST /rpc
//! Authorization: Bearer <token>
//! {"payload":{"params":{"endpoint":"getUser","userId":"..."}}}
//! ```
//!
//! The HTTP status mirrors the envelope status. A non-blank credential inside
//! the envelope wins over the `Authorization` header.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, post, web};
use serde_json::Value;
use tracing::debug;

use crate::domain::rpc::{ResponseEnvelope, RpcEnvelope, UNKNOWN_ENDPOINT};
use crate::domain::{Credential, Error};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

fn bearer_credential(req: &HttpRequest) -> Option<Credential> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(Credential::new)
}

/// Use the bearer header unless the envelope already names a usable credential.
fn with_transport_credential(envelope: RpcEnvelope, req: &HttpRequest) -> RpcEnvelope {
    if envelope.credential().is_some_and(|credential| !credential.is_blank()) {
        return envelope;
    }
    match bearer_credential(req) {
        Some(credential) => envelope.with_credential(Some(credential)),
        None => envelope,
    }
}

/// Best-effort endpoint name from a body that failed envelope decoding.
fn readable_endpoint(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.pointer("/payload/params/endpoint"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ENDPOINT)
        .to_owned()
}

fn envelope_response(envelope: &ResponseEnvelope) -> HttpResponse {
    let status =
        StatusCode::from_u16(envelope.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(envelope)
}

/// Route one RPC envelope.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use user_router::inbound::http::rpc::rpc;
///
/// let app = App::new().service(rpc);
/// ```
#[post("/rpc")]
pub async fn rpc(state: web::Data<HttpState>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let envelope = match serde_json::from_slice::<RpcEnvelope>(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!(error = %err, "malformed rpc envelope");
            let error = Error::invalid_request(format!("malformed rpc envelope: {err}"));
            return envelope_response(&ResponseEnvelope::failure(readable_endpoint(&body), &error));
        }
    };

    let envelope = with_transport_credential(envelope, &req);
    let response = state.router.route(&envelope).await;
    envelope_response(&response)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Bearer abc"), Some("abc"))]
    #[case(Some("Basic abc"), None)]
    #[case(None, None)]
    fn bearer_header_is_optional(#[case] header_value: Option<&str>, #[case] expected: Option<&str>) {
        let mut request = TestRequest::default();
        if let Some(value) = header_value {
            request = request.insert_header((header::AUTHORIZATION, value));
        }
        let credential = bearer_credential(&request.to_http_request());
        assert_eq!(credential.as_ref().map(Credential::expose), expected);
    }

    #[rstest]
    #[case(None, Some("header-token"))]
    #[case(Some(""), Some("header-token"))]
    #[case(Some("   "), Some("header-token"))]
    #[case(Some("body-token"), Some("body-token"))]
    fn blank_envelope_credential_falls_back_to_header(
        #[case] in_body: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let envelope = RpcEnvelope::from_json(
            serde_json::json!({ "endpoint": "getAllUsers" }),
            in_body.map(Credential::new),
        );
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer header-token"))
            .to_http_request();

        let envelope = with_transport_credential(envelope, &req);

        assert_eq!(envelope.credential().map(Credential::expose), expected);
    }

    #[rstest]
    #[case(br#"{"payload":{"params":{"endpoint":"getUser"}},"credential":7}"#.as_slice(), "getUser")]
    #[case(br#"{"payload":{"params":[]}}"#.as_slice(), "unknown")]
    #[case(b"{oops".as_slice(), "unknown")]
    fn malformed_bodies_echo_endpoint_when_readable(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(readable_endpoint(body), expected);
    }

    #[rstest]
    #[case(Error::forbidden("no"), StatusCode::FORBIDDEN)]
    #[case(Error::invalid_request("bad"), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(Error::service_unavailable("slow"), StatusCode::SERVICE_UNAVAILABLE)]
    fn http_status_mirrors_envelope(#[case] error: Error, #[case] expected: StatusCode) {
        let response = envelope_response(&ResponseEnvelope::failure("getUser", &error));
        assert_eq!(response.status(), expected);
    }
}
