use std::collections::HashSet;

use crate::{Dataset, Resource, ResourceRecord};

/// The only mime type the fetch pipeline keeps.
pub const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceVerdict<'a> {
    Accepted(ResourceRecord),
    NotCsv(&'a Resource),
    Duplicate(&'a Resource),
}

/// Classify every resource of `dataset`, in order.
///
/// Deduplication is scoped to this dataset only: the same URL appearing in two
/// different datasets is accepted twice. The mime check runs first, so a
/// non-CSV resource never claims its URL.
pub fn classify_resources(dataset: &Dataset) -> Vec<ResourceVerdict<'_>> {
    let mut seen: HashSet<&str> = HashSet::new();
    dataset
        .resources
        .iter()
        .map(|resource| {
            if resource.mime() != CSV_MIME {
                ResourceVerdict::NotCsv(resource)
            } else if !seen.insert(resource.url.as_str()) {
                ResourceVerdict::Duplicate(resource)
            } else {
                ResourceVerdict::Accepted(ResourceRecord::new(
                    dataset.id.clone(),
                    resource.id.clone(),
                    resource.url.clone(),
                ))
            }
        })
        .collect()
}
