//! PrestaShop webservice client
//!
//! XML over HTTP with the webservice key as the basic-auth user name.
//! Requests are awaited one at a time; optional pacing keeps a slow shop
//! from being flooded during large imports.

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, StatusCode};
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::constants::shop;
use crate::domain::document::Element;
use crate::domain::entities::RemoteId;
use crate::domain::repositories::{RemoteResource, Resource};
use crate::domain::value_objects::Query;
use crate::infrastructure::api_error::{ApiError, ApiResult};
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::xml_codec;

const XML_CONTENT_TYPE: &str = "application/xml";

/// HTTP client for the shop webservice
pub struct PrestashopClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl PrestashopClient {
    /// Create a client from the `api` configuration section
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::configuration("webservice key is empty"));
        }
        url::Url::parse(&config.base_url)
            .map_err(|e| ApiError::configuration(format!("invalid base URL {}: {e}", config.base_url)))?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ApiError::configuration(format!("failed to create HTTP client: {e}")))?;

        if !config.verify_tls {
            warn!("⚠️ TLS certificate verification is disabled for {}", config.base_url);
        }

        let rate_limiter = NonZeroU32::new(config.max_requests_per_second)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            rate_limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
        debug!("➡️ {} {}", method, url);
        self.client
            .request(method, url)
            .basic_auth(&self.api_key, Some(""))
    }

    /// Send a request and return the status and body, mapping transport
    /// failures to `ApiError::Transport`.
    async fn send(&self, builder: RequestBuilder, method: &Method, url: &str) -> ApiResult<(StatusCode, String)> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::transport(method.as_str(), url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(method.as_str(), url, e))?;
        debug!("⬅️ {} {} -> {}", method, url, status);
        Ok((status, body))
    }

    fn expect_success(status: StatusCode, method: &Method, url: &str, body: &str) -> ApiResult<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::http_status(status.as_u16(), method.as_str(), url, body))
        }
    }
}

/// A failed create whose body carries the known-harmless PHP notice and
/// still contains a webservice document.
fn recover_benign_notice(body: &str) -> Option<Element> {
    if !shop::BENIGN_NOTICE_MARKERS.iter().all(|marker| body.contains(marker)) {
        return None;
    }
    let start = body
        .find("<?xml")
        .or_else(|| body.find(&format!("<{}", shop::DOCUMENT_ROOT)))?;
    xml_codec::parse(&body[start..]).ok()
}

/// Entities go out wrapped in the `<prestashop>` root.
fn envelope(entity: &Element) -> Element {
    if entity.name == shop::DOCUMENT_ROOT {
        entity.clone()
    } else {
        Element::document(entity.clone())
    }
}

/// Image ids from an `images/products/{id}` listing: `<image><declination id="…"/>`.
fn image_ids(document: &Element) -> Vec<RemoteId> {
    document
        .single_item("image")
        .map(|image| {
            image
                .find_all("declination")
                .filter_map(Element::entity_id)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RemoteResource for PrestashopClient {
    async fn get(&self, resource: Resource, query: &Query) -> ApiResult<Element> {
        let method = Method::GET;
        let url = self.url(resource.path());
        let builder = self
            .request(method.clone(), &url)
            .await
            .query(&query.to_params());
        let (status, body) = self.send(builder, &method, &url).await?;
        Self::expect_success(status, &method, &url, &body)?;
        xml_codec::parse(&body)
    }

    async fn create(&self, resource: Resource, document: &Element) -> ApiResult<Element> {
        let method = Method::POST;
        let url = self.url(resource.path());
        let payload = xml_codec::serialize(&envelope(document))?;
        let builder = self
            .request(method.clone(), &url)
            .await
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(payload);
        let (status, body) = self.send(builder, &method, &url).await?;

        if !status.is_success() {
            if let Some(document) = recover_benign_notice(&body) {
                warn!("⚠️ Ignoring known PrestaShop notice on POST {}", url);
                return Ok(document);
            }
            return Err(ApiError::http_status(status.as_u16(), method.as_str(), &url, &body));
        }
        xml_codec::parse(&body)
    }

    async fn update(&self, resource: Resource, id: &RemoteId, document: &Element) -> ApiResult<()> {
        let method = Method::PUT;
        let url = self.url(&format!("{}/{}", resource.path(), id));
        let payload = xml_codec::serialize(&envelope(document))?;
        let builder = self
            .request(method.clone(), &url)
            .await
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(payload);
        let (status, body) = self.send(builder, &method, &url).await?;
        Self::expect_success(status, &method, &url, &body)
    }

    async fn delete(&self, resource: Resource, id: &RemoteId) -> ApiResult<()> {
        let method = Method::DELETE;
        let url = self.url(&format!("{}/{}", resource.path(), id));
        let builder = self.request(method.clone(), &url).await;
        let (status, body) = self.send(builder, &method, &url).await?;
        Self::expect_success(status, &method, &url, &body)
    }

    async fn list_image_ids(&self, product_id: &RemoteId) -> ApiResult<Vec<RemoteId>> {
        let method = Method::GET;
        let url = self.url(&format!("images/products/{product_id}"));
        let builder = self.request(method.clone(), &url).await;
        let (status, body) = self.send(builder, &method, &url).await?;

        // A product without images has no image resource at all.
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Self::expect_success(status, &method, &url, &body)?;
        Ok(image_ids(&xml_codec::parse(&body)?))
    }

    async fn upload_image(&self, product_id: &RemoteId, image_path: &Path) -> ApiResult<()> {
        let method = Method::POST;
        let url = self.url(&format!("images/products/{product_id}"));

        let bytes = tokio::fs::read(image_path).await.map_err(|e| ApiError::LocalFile {
            path: image_path.display().to_string(),
            message: e.to_string(),
        })?;
        let file_name = image_path
            .file_name()
            .map_or_else(|| "image.jpg".to_string(), |n| n.to_string_lossy().into_owned());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(|e| ApiError::transport(method.as_str(), &url, e))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let builder = self.request(method.clone(), &url).await.multipart(form);
        let (status, body) = self.send(builder, &method, &url).await?;
        Self::expect_success(status, &method, &url, &body)
    }

    async fn delete_image(&self, product_id: &RemoteId, image_id: &RemoteId) -> ApiResult<()> {
        let method = Method::DELETE;
        let url = self.url(&format!("images/products/{product_id}/{image_id}"));
        let builder = self.request(method.clone(), &url).await;
        let (status, body) = self.send(builder, &method, &url).await?;
        Self::expect_success(status, &method, &url, &body)
    }

    async fn ping(&self) -> ApiResult<()> {
        let method = Method::GET;
        let url = format!("{}/", self.base_url);
        let builder = self.request(method.clone(), &url).await;
        let (status, body) = self.send(builder, &method, &url).await?;
        Self::expect_success(status, &method, &url, &body)
    }
}
