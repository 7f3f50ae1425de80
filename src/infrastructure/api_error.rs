//! Webservice error types
//!
//! Typed outcomes of remote calls, so callers can tell a transient transport
//! failure from a rejected request or an unreadable response.

use thiserror::Error;

const MAX_BODY_IN_ERROR: usize = 500;

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("HTTP request failed: {method} {url} - {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    #[error("HTTP {status} for {method} {url}: {body}")]
    HttpStatus {
        status: u16,
        method: String,
        url: String,
        body: String,
    },

    #[error("Malformed XML: {message}")]
    MalformedXml { message: String },

    #[error("Response has no '{element}' element")]
    MissingElement { element: String },

    #[error("Local file error: {path} - {message}")]
    LocalFile { path: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ApiError {
    pub fn transport(method: &str, url: &str, message: impl ToString) -> Self {
        Self::Transport {
            method: method.to_string(),
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn http_status(status: u16, method: &str, url: &str, body: &str) -> Self {
        let body: String = body.chars().take(MAX_BODY_IN_ERROR).collect();
        Self::HttpStatus {
            status,
            method: method.to_string(),
            url: url.to_string(),
            body,
        }
    }

    pub fn malformed_xml(message: impl ToString) -> Self {
        Self::MalformedXml {
            message: message.to_string(),
        }
    }

    pub fn missing_element(element: &str) -> Self {
        Self::MissingElement {
            element: element.to_string(),
        }
    }

    pub fn configuration(message: impl ToString) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_body_truncated() {
        let body = "x".repeat(2_000);
        let err = ApiError::http_status(500, "POST", "https://shop/api/products", &body);
        match &err {
            ApiError::HttpStatus { body, .. } => assert_eq!(body.len(), MAX_BODY_IN_ERROR),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("500"));
    }
}
