use std::collections::VecDeque;

use csvharvest_core::Dataset;

use crate::{Api, QueryError};

/// Forward-only walk over every dataset of the catalog, one API page at a time.
///
/// The sequence ends the first time a freshly fetched page carries no data.
/// Query failures are returned as-is; retrying is up to the caller.
pub struct DatasetPager {
    api: Api,
    increment: u32,
    page: u64,
    position: usize,
    buffered: VecDeque<Dataset>,
    finished: bool,
}

impl DatasetPager {
    /// `start` is the first API page to read (pages are 1-based upstream).
    pub fn new(api: Api, increment: u32, start: u64) -> Self {
        Self {
            api,
            increment: increment.max(1),
            page: start.saturating_sub(1),
            position: 0,
            buffered: VecDeque::new(),
            finished: false,
        }
    }

    /// Page the cursor currently reads from.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Items already served from the current page.
    pub fn position(&self) -> usize {
        self.position
    }

    pub async fn next_dataset(&mut self) -> Result<Option<Dataset>, QueryError> {
        if self.finished {
            return Ok(None);
        }
        if let Some(item) = self.buffered.pop_front() {
            self.position += 1;
            return Ok(Some(item));
        }

        self.page += 1;
        self.position = 0;
        let mut query = self.api.datasets(self.increment, self.page);
        query.get().await?;
        self.buffered = query.dataset_page()?.data.into();

        match self.buffered.pop_front() {
            Some(item) => {
                self.position += 1;
                Ok(Some(item))
            }
            None => {
                self.finished = true;
                Ok(None)
            }
        }
    }

    /// Drain the pager, stopping after `limit` datasets when given.
    pub async fn collect(mut self, limit: Option<usize>) -> Result<Vec<Dataset>, QueryError> {
        let mut out = Vec::new();
        while limit.map_or(true, |limit| out.len() < limit) {
            match self.next_dataset().await? {
                Some(dataset) => out.push(dataset),
                None => break,
            }
        }
        Ok(out)
    }
}
