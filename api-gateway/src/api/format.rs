//! JSON/XML content negotiation
//!
//! Request bodies are read as XML when `Content-Type` is `application/xml` or
//! `text/xml` and as JSON otherwise. Responses follow the `Accept` header:
//! XML when it names an XML type that is not outranked by JSON.

use std::convert::Infallible;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::error::IntoError;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ApiError;

const XML_TYPES: &[&str] = &["application/xml", "text/xml"];
const JSON_TYPES: &[&str] = &["application/json"];

/// Wire format of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// Format of an incoming body
    pub fn from_content_type(headers: &HeaderMap) -> Self {
        let media = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        match media {
            Some(m) if XML_TYPES.contains(&m.as_str()) => Format::Xml,
            _ => Format::Json,
        }
    }

    /// Format the client asked to receive
    pub fn from_accept(headers: &HeaderMap) -> Self {
        let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
            return Format::Json;
        };

        // (quality, position) of the best XML and JSON entries
        let mut xml: Option<(f32, usize)> = None;
        let mut json: Option<(f32, usize)> = None;

        for (position, entry) in accept.split(',').enumerate() {
            let mut parts = entry.split(';');
            let media = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            let slot = if XML_TYPES.contains(&media.as_str()) {
                &mut xml
            } else if JSON_TYPES.contains(&media.as_str()) {
                &mut json
            } else {
                continue;
            };
            if slot.map_or(true, |(best, _)| quality > best) {
                *slot = Some((quality, position));
            }
        }

        match (xml, json) {
            (Some((xq, _)), _) if xq <= 0.0 => Format::Json,
            (Some(_), None) => Format::Xml,
            (Some((xq, xp)), Some((jq, jp))) if xq > jq || (xq == jq && xp < jp) => Format::Xml,
            _ => Format::Json,
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Format
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Format::from_accept(&parts.headers))
    }
}

/// Decode a body in the given format. An empty body decodes as an empty
/// JSON object.
pub fn decode<T: DeserializeOwned>(format: Format, body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(b"{}").map_err(json_error);
    }

    match format {
        Format::Json => serde_json::from_slice(body).map_err(json_error),
        Format::Xml => {
            let text = std::str::from_utf8(body)
                .map_err(|e| ApiError::BadRequest(format!("XML body is not UTF-8: {}", e)))?;
            quick_xml::de::from_str(text)
                .map_err(|e| ApiError::BadRequest(format!("Malformed XML body: {}", e)))
        }
    }
}

fn json_error(e: serde_json::Error) -> ApiError {
    use serde_json::error::Category;

    match e.classify() {
        Category::Data => ApiError::UnprocessableEntity(format!("Invalid JSON body: {}", e)),
        Category::Syntax | Category::Eof | Category::Io => {
            ApiError::BadRequest(format!("Malformed JSON body: {}", e))
        }
    }
}

/// Request body in either JSON or XML, chosen by `Content-Type`
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let format = Format::from_content_type(req.headers());
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        decode(format, &body).map(Payload)
    }
}

/// Response body rendered in the negotiated format. `root` names the XML
/// document element.
pub struct Negotiated<T> {
    format: Format,
    status: StatusCode,
    root: &'static str,
    body: T,
}

impl<T: Serialize> Negotiated<T> {
    pub fn new(format: Format, root: &'static str, body: T) -> Self {
        Self {
            format,
            status: StatusCode::OK,
            root,
            body,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for Negotiated<T> {
    fn into_response(self) -> Response {
        match self.format {
            Format::Json => (self.status, Json(self.body)).into_response(),
            Format::Xml => match quick_xml::se::to_string_with_root(self.root, &self.body) {
                Ok(xml) => (
                    self.status,
                    [(header::CONTENT_TYPE, self.format.content_type())],
                    xml,
                )
                    .into_response(),
                Err(e) => ApiError::from(e.into_error("Failed to encode XML response")).into_response(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use common::model::AccountDto;
    use common::query::FilterCriteria;

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accept_negotiation() {
        assert_eq!(Format::from_accept(&HeaderMap::new()), Format::Json);
        assert_eq!(Format::from_accept(&accept("*/*")), Format::Json);
        assert_eq!(Format::from_accept(&accept("application/xml")), Format::Xml);
        assert_eq!(Format::from_accept(&accept("text/xml;q=0.9, */*;q=0.1")), Format::Xml);
        assert_eq!(Format::from_accept(&accept("application/json, application/xml")), Format::Json);
        assert_eq!(Format::from_accept(&accept("application/json;q=0.5, application/xml")), Format::Xml);
        assert_eq!(Format::from_accept(&accept("application/xml;q=0")), Format::Json);
    }

    #[test]
    fn content_type_ignores_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"));
        assert_eq!(Format::from_content_type(&headers), Format::Xml);
    }

    #[test]
    fn json_errors_are_classified() {
        assert!(matches!(
            decode::<AccountDto>(Format::Json, b"{\"name\":"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            decode::<AccountDto>(Format::Json, b"{\"openDate\":\"yesterday\"}"),
            Err(ApiError::UnprocessableEntity(_))
        ));
    }

    #[test]
    fn empty_body_is_empty_object() {
        let criteria: FilterCriteria = decode(Format::Xml, b"  ").unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn xml_account_body() {
        let dto: AccountDto = decode(
            Format::Xml,
            b"<accountDto><name>Savings</name><type>SAVINGS</type><openDate>2024-01-31</openDate></accountDto>",
        )
        .unwrap();
        assert_eq!(dto.name.as_deref(), Some("Savings"));
        assert_eq!(dto.account_type.as_deref(), Some("SAVINGS"));
        assert_eq!(dto.open_date, chrono::NaiveDate::from_ymd_opt(2024, 1, 31));
    }
}
