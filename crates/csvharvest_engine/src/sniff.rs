use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decode::decode_line;
use crate::dialect::{infer_dialect, parse_headers, Dialect};
use crate::SniffError;

/// Keys every profile carries; caller metadata cannot shadow them.
pub const PROFILE_KEYS: [&str; 6] = [
    "headers",
    "charset",
    "url",
    "firstline",
    "delimiter",
    "quotechar",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnifferState {
    Unopened,
    Opened,
    Parsed,
    Failed,
}

/// Serializable snapshot of a sniffed resource. Unset fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvProfile {
    pub headers: Option<Vec<String>>,
    pub charset: Option<String>,
    pub url: String,
    pub firstline: Option<String>,
    pub delimiter: Option<char>,
    pub quotechar: Option<char>,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

/// Reads just the first line of a remote CSV and infers its charset, dialect
/// and headers.
#[derive(Debug)]
pub struct CsvSniffer {
    url: String,
    meta: Map<String, Value>,
    state: SnifferState,
    charset: Option<String>,
    firstline: Option<String>,
    dialect: Option<Dialect>,
    headers: Option<Vec<String>>,
}

impl CsvSniffer {
    pub fn new<K, V>(url: impl Into<String>, meta: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let meta = meta
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _): &(String, Value)| !PROFILE_KEYS.contains(&k.as_str()))
            .collect();
        Self {
            url: url.into(),
            meta,
            state: SnifferState::Unopened,
            charset: None,
            firstline: None,
            dialect: None,
            headers: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SnifferState {
        self.state
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Fetch the first line and detect its charset.
    ///
    /// The response is dropped before this returns, whatever the outcome.
    pub async fn open(
        &mut self,
        client: &reqwest::Client,
        max_line_bytes: usize,
    ) -> Result<(), SniffError> {
        let result = self.try_open(client, max_line_bytes).await;
        if result.is_err() {
            self.state = SnifferState::Failed;
        }
        result
    }

    async fn try_open(
        &mut self,
        client: &reqwest::Client,
        max_line_bytes: usize,
    ) -> Result<(), SniffError> {
        let raw = read_first_line(client, &self.url, max_line_bytes).await?;
        if raw.is_empty() {
            return Err(SniffError::format(&self.url, "no readable first line"));
        }
        let decoded =
            decode_line(&raw).map_err(|err| SniffError::format(&self.url, err.to_string()))?;
        self.charset = Some(decoded.charset);
        self.firstline = Some(decoded.text);
        self.state = SnifferState::Opened;
        Ok(())
    }

    /// Infer the dialect of the first line and split it into headers.
    pub fn parse(&mut self) -> Result<&[String], SniffError> {
        let Some(line) = self.firstline.as_deref() else {
            self.state = SnifferState::Failed;
            return Err(SniffError::format(&self.url, "resource was not opened"));
        };
        let dialect = infer_dialect(line);
        let headers = match parse_headers(line, &dialect) {
            Ok(headers) => headers,
            Err(err) => {
                self.state = SnifferState::Failed;
                return Err(SniffError::format(&self.url, err.to_string()));
            }
        };

        self.dialect = Some(dialect);
        self.state = SnifferState::Parsed;
        let headers: &[String] = self.headers.insert(headers);
        Ok(headers)
    }

    /// `open` then `parse`, returning the resulting profile.
    pub async fn sniff(
        &mut self,
        client: &reqwest::Client,
        max_line_bytes: usize,
    ) -> Result<CsvProfile, SniffError> {
        self.open(client, max_line_bytes).await?;
        self.parse()?;
        Ok(self.snapshot())
    }

    /// Never fails, including on a sniffer that was never opened.
    pub fn snapshot(&self) -> CsvProfile {
        CsvProfile {
            headers: self.headers.clone(),
            charset: self.charset.clone(),
            url: self.url.clone(),
            firstline: self.firstline.clone(),
            delimiter: self.dialect.map(|d| d.delimiter),
            quotechar: self.dialect.map(|d| d.quotechar),
            meta: self.meta.clone(),
        }
    }
}

/// Stream the body only until the first `\n` or `\r`, capped at `max_bytes`.
async fn read_first_line(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, SniffError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| SniffError::resource(url, err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SniffError::resource(
            url,
            format!("http status {}", status.as_u16()),
        ));
    }

    let mut line = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| SniffError::resource(url, err.to_string()))?;
        if let Some(end) = chunk.iter().position(|b| matches!(*b, b'\n' | b'\r')) {
            line.extend_from_slice(&chunk[..end]);
            break;
        }
        line.extend_from_slice(&chunk);
        if line.len() >= max_bytes {
            break;
        }
    }
    line.truncate(max_bytes);
    Ok(line)
}
