/// Header line of the intermediate fetch file.
pub const RECORD_HEADER: &str = "dataset|id|url";
pub const RECORD_SEPARATOR: char = '|';

/// One accepted resource, as written by the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub dataset: String,
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `dataset|id|url`, got {line:?}")]
pub struct RecordParseError {
    pub line: String,
}

impl ResourceRecord {
    pub fn new(
        dataset: impl Into<String>,
        id: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            id: id.into(),
            url: url.into(),
        }
    }

    /// Render as a newline-terminated record line.
    pub fn to_line(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}\n",
            self.dataset,
            self.id,
            self.url,
            sep = RECORD_SEPARATOR
        )
    }

    /// Parse a record line. The URL keeps any `|` it may contain.
    pub fn parse_line(line: &str) -> Result<Self, RecordParseError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let mut parts = trimmed.splitn(3, RECORD_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(dataset), Some(id), Some(url)) if !url.is_empty() => {
                Ok(Self::new(dataset, id, url))
            }
            _ => Err(RecordParseError {
                line: trimmed.to_string(),
            }),
        }
    }
}
