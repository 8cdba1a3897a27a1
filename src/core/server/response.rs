//! Mapping of [`LdpError`] onto HTTP responses.

use crate::core::codec::RdfFormat;
use crate::core::error::LdpError;
use crate::core::protocol::headers::{self as ldp_headers, format_constrained_by, format_list};
use crate::core::types::vocab::server;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Insert `value` under `name`, skipping values that are not valid header text.
pub(crate) fn set_header(response: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            response.headers_mut().insert(name, v);
        }
        Err(_) => tracing::warn!("dropping invalid {} header value: {:?}", name, value),
    }
}

impl IntoResponse for LdpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{} ({})", self, status);
        }

        if let LdpError::NotModified { etag } = &self {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            set_header(&mut response, header::ETAG, etag);
            return response;
        }

        let mut response = (status, self.to_string()).into_response();
        match &self {
            LdpError::MethodNotAllowed { allowed, .. } => {
                set_header(&mut response, header::ALLOW, &format_list(allowed));
            }
            LdpError::PreconditionFailed(_) | LdpError::PreconditionRequired(_) => {
                set_header(
                    &mut response,
                    header::LINK,
                    &format_constrained_by(server::CONSTRAINTS.as_str()),
                );
            }
            LdpError::UnsupportedFormat(_) => {
                let offered: Vec<&str> = RdfFormat::ALL.iter().map(|f| f.media_type()).collect();
                set_header(
                    &mut response,
                    HeaderName::from_static(ldp_headers::ACCEPT_POST),
                    &format_list(&offered),
                );
            }
            _ => {}
        }
        response
    }
}
