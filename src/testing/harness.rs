//! Harness: a document, a memory fetcher and a registry wired together.

use std::rc::Rc;

use crate::config::ZephConfig;
use crate::dom::{Document, Element};
use crate::registry::Registry;

use super::MemoryFetcher;

/// A headless environment for driving component definitions in tests.
///
/// Definitions run on tokio's local task set, so the harness must be used
/// inside a [`tokio::task::LocalSet`].
///
/// ```ignore
/// LocalSet::new().run_until(async {
///     let harness = Harness::new(MemoryFetcher::new());
///     harness.registry().define("my-card", |def| def.html("<p></p>")).await?;
///     let card = harness.mount("my-card").await;
/// }).await;
/// ```
pub struct Harness {
    document: Document,
    fetcher: Rc<MemoryFetcher>,
    registry: Registry,
}

impl Harness {
    pub fn new(fetcher: MemoryFetcher) -> Self {
        Self::with_config(fetcher, ZephConfig::default())
    }

    pub fn with_config(fetcher: MemoryFetcher, config: ZephConfig) -> Self {
        let document = Document::new();
        let fetcher = Rc::new(fetcher);
        let registry = Registry::new(&document, fetcher.clone(), config);
        Self {
            document,
            fetcher,
            registry,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Requests the fetcher has seen so far.
    pub fn requests(&self) -> Vec<String> {
        self.fetcher.requests()
    }

    /// Create `tag`, append it to the body and run the queued setup and
    /// lifecycle work.
    pub async fn mount(&self, tag: &str) -> Element {
        let element = self.document.create_element(tag);
        self.document.body().append_child(&element);
        self.document.settle().await;
        element
    }

    /// Drain the document's task queue.
    pub async fn settle(&self) {
        self.document.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use tokio::task::LocalSet;

    use super::*;

    #[tokio::test]
    async fn mount_runs_setup() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new(MemoryFetcher::new());
                harness
                    .registry()
                    .define("x-mounted", |def| def.attribute("state", "idle"))
                    .await
                    .unwrap();
                let element = harness.mount("x-mounted").await;
                assert!(element.is_connected());
                assert_eq!(element.get_attribute("state").as_deref(), Some("idle"));
                assert!(harness.requests().is_empty());
            })
            .await;
    }
}
