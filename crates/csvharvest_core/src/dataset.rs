use serde::{Deserialize, Serialize};

/// One catalog entry as reported by a `/datasets` page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// A downloadable file attached to a dataset.
///
/// `mime` is whatever the catalog declares; upstream sometimes reports `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub mime: Option<String>,
}

impl Resource {
    pub fn mime(&self) -> &str {
        self.mime.as_deref().unwrap_or("")
    }
}

/// JSON envelope of one API page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetPage {
    #[serde(default)]
    pub data: Vec<Dataset>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl DatasetPage {
    /// Number of pages of `page_size` items needed to cover `total`.
    pub fn pages_to_fetch(&self, page_size: u32) -> u64 {
        let total = self.total.unwrap_or(0);
        let page_size = u64::from(page_size.max(1));
        total.div_ceil(page_size)
    }
}
