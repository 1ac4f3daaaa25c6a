//! DTOs for decoding collection service responses.
//!
//! Reads arrive HAL-shaped: records under `_embedded.<collection>` and
//! paging totals under `page`. Error bodies may carry a `message`.

use std::collections::HashMap;

use pagination::{Page, PageMetadata, QueryDescriptor};
use serde::Deserialize;

use crate::domain::Record;

#[derive(Debug, Deserialize)]
pub(super) struct HalPageDto {
    #[serde(rename = "_embedded", default)]
    embedded: HashMap<String, Vec<Record>>,
    page: Option<PageMetadata>,
}

impl HalPageDto {
    /// Items for `collection`, with totals taken from `page` or derived from
    /// the request when the server omits them.
    pub(super) fn into_page(mut self, collection: &str, descriptor: &QueryDescriptor) -> Page<Record> {
        let items = self.embedded.remove(collection).unwrap_or_default();
        let metadata = self.page.unwrap_or_else(|| {
            // Earlier pages are assumed full; nothing is known past this one.
            let page_index = descriptor.page_index();
            let on_page = u64::try_from(items.len()).unwrap_or(u64::MAX);
            let before = u64::from(page_index).saturating_mul(u64::from(descriptor.page_size()));
            PageMetadata {
                size: descriptor.page_size(),
                total_elements: before.saturating_add(on_page),
                total_pages: page_index.saturating_add(u32::from(!items.is_empty())),
                number: page_index,
            }
        });
        Page::new(items, metadata)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) message: Option<String>,
}
