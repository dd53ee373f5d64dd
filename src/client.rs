//! Typed client for the link API.
//!
//! Used by `linkstore-cli`; dump and restore round-trip names, URLs and
//! timestamps unchanged.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::http::response::{
    ErrorResponse, OkResponse, RouteBody, RouteResponse, RoutesResponse, UrlRequest,
};

/// Characters escaped in a route name path segment. `/` stays literal; a
/// backslash must be escaped or http URLs treat it as a separator.
const NAME: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Page size used when walking a full listing.
const DUMP_PAGE: usize = 1000;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Outcome of [`LinkClient::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub stored: usize,
    /// Names that could not be stored, with the server's reason.
    pub failed: Vec<(String, String)>,
}

pub struct LinkClient {
    client: Client,
    base: String,
}

impl LinkClient {
    pub fn new(base: &str) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/api/url/{}", self.base, utf8_percent_encode(name, NAME))
    }

    pub async fn get(&self, name: &str) -> Result<RouteResponse, ClientError> {
        let res = self.client.get(self.url_for(name)).send().await?;
        parse(res).await
    }

    /// Store `url` under `name`. `time` keeps a timestamp from a dump.
    pub async fn put(
        &self,
        name: &str,
        url: &str,
        time: Option<u64>,
    ) -> Result<RouteResponse, ClientError> {
        let res = self
            .client
            .post(self.url_for(name))
            .json(&UrlRequest {
                url: url.to_string(),
                time,
            })
            .send()
            .await?;
        parse(res).await
    }

    pub async fn delete(&self, name: &str) -> Result<OkResponse, ClientError> {
        let res = self.client.delete(self.url_for(name)).send().await?;
        parse(res).await
    }

    pub async fn list(
        &self,
        cursor: &str,
        limit: Option<usize>,
        include_generated: bool,
    ) -> Result<RoutesResponse, ClientError> {
        let mut query: Vec<(&str, String)> = vec![("cursor", cursor.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if include_generated {
            query.push(("include-generated-names", "true".to_string()));
        }

        let res = self
            .client
            .get(format!("{}/api/urls", self.base))
            .query(&query)
            .send()
            .await?;
        parse(res).await
    }

    /// Every route, generated names included, in key order.
    pub async fn dump(&self) -> Result<Vec<RouteBody>, ClientError> {
        let mut routes = Vec::new();
        let mut cursor = String::new();
        loop {
            let page = self.list(&cursor, Some(DUMP_PAGE), true).await?;
            routes.extend(page.routes);
            match page.next {
                Some(next) => cursor = next,
                None => return Ok(routes),
            }
        }
    }

    /// Store every route of a dump under its original name and time.
    ///
    /// Rejected routes are reported, not fatal; transport errors abort.
    pub async fn load(&self, routes: &[RouteBody]) -> Result<LoadReport, ClientError> {
        let mut report = LoadReport::default();
        for route in routes {
            match self.put(&route.name, &route.url, Some(route.time)).await {
                Ok(_) => report.stored += 1,
                Err(ClientError::Status { message, .. }) => {
                    report.failed.push((route.name.clone(), message));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}

async fn parse<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }

    let text = res.text().await?;
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
