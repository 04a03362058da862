//! Minimal client for the catalog's paginated JSON API.
//!
//! A [`Query`] is a base URL plus parameters; it owns its most recent
//! response so that `send` + `parse` behave as one logical request.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use csvharvest_core::DatasetPage;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{EngineError, NavigationError, QueryError};

const DATASETS_ENDPOINT: &str = "datasets/";

/// Entry point to the endpoints the pipeline needs.
#[derive(Debug, Clone)]
pub struct Api {
    base: Url,
    datasets: Url,
    client: reqwest::Client,
}

impl Api {
    pub fn new(base_url: &str, client: reqwest::Client) -> Result<Self, EngineError> {
        let invalid = |message: String| EngineError::ApiBase {
            url: base_url.to_string(),
            message,
        };
        let mut base = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("url cannot be used as a base".into()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let datasets = base
            .join(DATASETS_ENDPOINT)
            .map_err(|err| invalid(err.to_string()))?;
        Ok(Self {
            base,
            datasets,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Query an arbitrary endpoint relative to the base URL.
    pub fn query<K, V>(
        &self,
        resource: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Query, EngineError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let url = self
            .base
            .join(resource)
            .map_err(|err| EngineError::ApiBase {
                url: format!("{}{}", self.base, resource),
                message: err.to_string(),
            })?;
        Ok(Query::new(self.client.clone(), url.as_str(), params))
    }

    /// `datasets/?format=csv&page_size=N&page=P`
    pub fn datasets(&self, page_size: u32, page: u64) -> Query {
        Query::new(
            self.client.clone(),
            self.datasets.as_str(),
            [
                ("format", "csv".to_string()),
                ("page_size", page_size.to_string()),
                ("page", page.to_string()),
            ],
        )
    }
}

pub struct Query {
    client: reqwest::Client,
    base_url: String,
    parameters: BTreeMap<String, String>,
    status_code: Option<u16>,
    body: Option<Bytes>,
    data: Option<Value>,
}

impl Query {
    pub fn new<K, V>(
        client: reqwest::Client,
        base_url: impl Into<String>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            client,
            base_url: base_url.into(),
            parameters: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            status_code: None,
            body: None,
            data: None,
        }
    }

    /// Split `uri` into base URL and decoded parameters. Later duplicates of a
    /// parameter win.
    pub fn from_uri(client: reqwest::Client, uri: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(uri)?;
        let base_url = parsed[..url::Position::AfterPath].to_string();
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        Ok(Self::new(client, base_url, params))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn uri(&self) -> String {
        if self.parameters.is_empty() {
            return self.base_url.clone();
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.parameters.iter())
            .finish();
        format!("{}?{}", self.base_url, encoded)
    }

    /// Issue the GET. Anything but HTTP 200 is an error.
    pub async fn send(&mut self) -> Result<(), QueryError> {
        let uri = self.uri();
        self.status_code = None;
        self.body = None;
        self.data = None;

        let transport = |err: reqwest::Error| QueryError::Transport {
            uri: uri.clone(),
            message: err.to_string(),
        };
        let response = self.client.get(&uri).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        self.status_code = Some(status);
        if status != 200 {
            return Err(QueryError::Status {
                uri: uri.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        self.body = Some(body);
        Ok(())
    }

    /// Decode the last response body as JSON and cache it.
    pub fn parse(&mut self) -> Result<&Value, QueryError> {
        let Some(body) = self.body.as_ref() else {
            return Err(QueryError::NoResponse { uri: self.uri() });
        };
        let value: Value = serde_json::from_slice(body).map_err(|err| QueryError::Json {
            uri: self.uri(),
            message: err.to_string(),
        })?;
        Ok(self.data.insert(value))
    }

    pub async fn get(&mut self) -> Result<&Value, QueryError> {
        self.send().await?;
        self.parse()
    }

    /// Typed view of the parsed data as a datasets page.
    pub fn dataset_page(&self) -> Result<DatasetPage, QueryError> {
        let Some(data) = self.data.as_ref() else {
            return Err(QueryError::NoResponse { uri: self.uri() });
        };
        DatasetPage::deserialize(data).map_err(|err| QueryError::Json {
            uri: self.uri(),
            message: err.to_string(),
        })
    }

    /// Query for the server-supplied continuation link.
    ///
    /// `Ok(None)` means the last page was reached.
    pub fn next_page(&self) -> Result<Option<Query>, NavigationError> {
        let Some(data) = self.data.as_ref() else {
            return Err(NavigationError::NotParsed { uri: self.uri() });
        };
        match data.get("next_page") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(link)) => Query::from_uri(self.client.clone(), link)
                .map(Some)
                .map_err(|err| NavigationError::InvalidLink {
                    uri: self.uri(),
                    link: link.clone(),
                    message: err.to_string(),
                }),
            Some(other) => Err(NavigationError::InvalidLink {
                uri: self.uri(),
                link: other.to_string(),
                message: "next_page is not a string".into(),
            }),
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("uri", &self.uri())
            .field("status_code", &self.status_code)
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "<Query {} [{}]>", self.uri(), status),
            None => write!(f, "<Query {} [-]>", self.uri()),
        }
    }
}
