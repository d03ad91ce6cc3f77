//! One open document and the stamp being placed on it
//!
//! Rasterizing, stamping and suggesting run as independent async tasks. Each
//! upload gets a new [`Generation`]; a task applies its result only if its
//! generation is still the current one, so a slow task for a replaced
//! document can never overwrite newer state or stamp stale bytes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::pdf::{stamp_pdf, PageRaster, PageRasterizer};
use crate::stamp::StampSpec;
use crate::suggest::TextSuggestionAdapter;

/// Identifies one uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Clone)]
struct LoadedDocument {
    generation: Generation,
    bytes: Arc<Vec<u8>>,
    raster: Arc<PageRaster>,
}

struct SessionState {
    document: Option<LoadedDocument>,
    spec: StampSpec,
}

/// Host-side state of the stamping tool: current document, its preview and the stamp
pub struct StampSession {
    config: StampConfig,
    rasterizer: PageRasterizer,
    suggester: Option<TextSuggestionAdapter>,
    /// Last generation handed out (uploads and resets both advance it)
    latest: AtomicU64,
    state: Mutex<SessionState>,
}

impl StampSession {
    pub fn new(config: StampConfig, rasterizer: PageRasterizer) -> Self {
        let spec = StampSpec::initial(&config);
        Self {
            config,
            rasterizer,
            suggester: None,
            latest: AtomicU64::new(0),
            state: Mutex::new(SessionState { document: None, spec }),
        }
    }

    /// Enable [`suggest`](Self::suggest) with the given adapter
    pub fn with_suggestions(mut self, adapter: TextSuggestionAdapter) -> Self {
        self.suggester = Some(adapter);
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // State is only replaced wholesale, so a poisoned lock still holds a consistent value
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load a new document, replacing the current one.
    ///
    /// The new document's preview is rendered off the async runtime. If
    /// another upload or a reset happens before rendering finishes, this
    /// upload is discarded with [`Error::StaleDocument`]. On success the
    /// stamp is reset to its initial value.
    pub async fn load_document(&self, pdf_bytes: Vec<u8>) -> Result<Generation> {
        let generation = Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        let bytes = Arc::new(pdf_bytes);

        let rasterizer = self.rasterizer.clone();
        let render_bytes = Arc::clone(&bytes);
        let raster = tokio::task::spawn_blocking(move || rasterizer.rasterize(&render_bytes))
            .await
            .map_err(|e| Error::General(format!("Rasterize task panicked: {}", e)))??;

        let mut state = self.state();
        let current = self.latest.load(Ordering::SeqCst);
        if current != generation.0 {
            debug!("Discarding preview for generation {}, now at {}", generation.0, current);
            return Err(Error::StaleDocument { started: generation.0, current });
        }

        state.document = Some(LoadedDocument {
            generation,
            bytes,
            raster: Arc::new(raster),
        });
        state.spec = StampSpec::initial(&self.config);

        info!("Loaded document generation {}", generation.0);
        Ok(generation)
    }

    /// Drop the current document and reset the stamp
    pub fn reset(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.document = None;
        state.spec = StampSpec::initial(&self.config);
    }

    /// Generation of the document currently loaded
    pub fn generation(&self) -> Option<Generation> {
        self.state().document.as_ref().map(|doc| doc.generation)
    }

    /// Preview of the current document
    pub fn raster(&self) -> Option<Arc<PageRaster>> {
        self.state().document.as_ref().map(|doc| Arc::clone(&doc.raster))
    }

    /// Snapshot of the current stamp
    pub fn spec(&self) -> StampSpec {
        self.state().spec.clone()
    }

    /// Replace the stamp with a new value
    pub fn set_spec(&self, spec: StampSpec) {
        self.state().spec = spec;
    }

    /// Replace the stamp with a value derived from the current one
    pub fn update_spec(&self, edit: impl FnOnce(&StampSpec) -> StampSpec) -> StampSpec {
        let mut state = self.state();
        let next = edit(&state.spec);
        state.spec = next.clone();
        next
    }

    /// Fail with [`Error::StaleDocument`] unless `started` is still the loaded document
    fn ensure_current(&self, started: Generation) -> Result<()> {
        match self.generation() {
            Some(current) if current == started => Ok(()),
            current => Err(Error::StaleDocument {
                started: started.0,
                current: current.map_or(self.latest.load(Ordering::SeqCst), |g| g.0),
            }),
        }
    }

    /// Stamp the current document with the current stamp and return the new PDF.
    ///
    /// Document bytes and stamp are captured when this is called. An empty
    /// stamp text is refused here, mirroring the host's disabled download.
    pub async fn stamp(&self) -> Result<Vec<u8>> {
        self.stamp_with(stamp_pdf).await
    }

    /// [`stamp`](Self::stamp) with the blocking stamping step supplied by the caller
    async fn stamp_with<F>(&self, stamper: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&[u8], &StampSpec) -> Result<Vec<u8>> + Send + 'static,
    {
        let (document, spec) = {
            let state = self.state();
            let document = state.document.clone()
                .ok_or_else(|| Error::General("No document loaded".to_string()))?;
            (document, state.spec.clone())
        };

        if !spec.is_stampable() {
            return Err(Error::General("Stamp text is empty".to_string()));
        }

        let bytes = Arc::clone(&document.bytes);
        let stamp_spec = spec.clone();
        let stamped = tokio::task::spawn_blocking(move || stamper(&bytes, &stamp_spec))
            .await
            .map_err(|e| Error::General(format!("Stamp task panicked: {}", e)))??;

        self.ensure_current(document.generation)?;
        Ok(stamped)
    }

    /// Ask for a suggested stamp text from the current page text.
    ///
    /// A non-empty suggestion replaces the stamp text if the same document is
    /// still loaded. Returns the suggestion ("" when there is none, when no
    /// document or adapter is present, or when the document changed).
    pub async fn suggest(&self) -> String {
        let Some(adapter) = &self.suggester else {
            return String::new();
        };
        let current = self.state().document.clone();
        let Some(document) = current else {
            return String::new();
        };

        let suggestion = adapter.suggest(&document.raster.extracted_text).await;
        if suggestion.is_empty() {
            return suggestion;
        }

        let mut state = self.state();
        let still_current = state.document.as_ref().map(|doc| doc.generation) == Some(document.generation);
        if !still_current {
            debug!("Dropping suggestion for replaced document generation {}", document.generation.0);
            return String::new();
        }

        let next = state.spec.with_text(suggestion.clone());
        state.spec = next;
        suggestion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use async_trait::async_trait;
    use image::{DynamicImage, RgbaImage};
    use crate::pdf::fixtures::{empty_pdf, simple_pdf};
    use crate::pdf::{load_document, first_page, extract_page_text, PageRenderer};
    use crate::suggest::SuggestionClient;

    /// Blank renderer that is slow for pages of a particular pixel width
    struct SlowRenderer {
        slow_width: u32,
        delay: Duration,
    }

    impl PageRenderer for SlowRenderer {
        fn render_first_page(&self, _pdf_bytes: &[u8], width_px: u32, height_px: u32) -> Result<DynamicImage> {
            if width_px == self.slow_width {
                std::thread::sleep(self.delay);
            }
            Ok(DynamicImage::ImageRgba8(RgbaImage::new(width_px, height_px)))
        }
    }

    struct FixedClient(&'static str);

    #[async_trait]
    impl SuggestionClient for FixedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn session() -> StampSession {
        let renderer = SlowRenderer { slow_width: 300, delay: Duration::from_millis(300) };
        StampSession::new(StampConfig::default(), PageRasterizer::new(Arc::new(renderer), 1.5))
    }

    #[tokio::test]
    async fn test_load_then_stamp() {
        let session = session();
        assert!(session.stamp().await.is_err());

        session.load_document(simple_pdf(&["Invoice"], 612, 792)).await.unwrap();
        let raster = session.raster().unwrap();
        assert_eq!((raster.width_px, raster.height_px), (918, 1188));
        assert_eq!(raster.extracted_text, "Invoice");

        // Empty text is not stamped by the session
        assert!(matches!(session.stamp().await, Err(Error::General(_))));

        session.update_spec(|spec| spec.with_text("PB 966753"));
        let stamped = session.stamp().await.unwrap();
        let doc = load_document(&stamped).unwrap();
        assert_eq!(extract_page_text(&doc, first_page(&doc).unwrap()).unwrap(), "Invoice PB 966753");
    }

    #[tokio::test]
    async fn test_upload_resets_stamp() {
        let session = session();
        session.load_document(simple_pdf(&["A"], 612, 792)).await.unwrap();
        session.update_spec(|spec| spec.with_text("OLD").with_position(10.0, 10.0).with_font_size(30.0));

        session.load_document(simple_pdf(&["B"], 612, 792)).await.unwrap();
        assert_eq!(session.spec(), StampSpec::initial(&StampConfig::default()));
    }

    #[tokio::test]
    async fn test_slow_upload_cannot_replace_newer_one() {
        let session = Arc::new(session());

        // 200pt wide renders at 300px, which the renderer delays
        let slow = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.load_document(simple_pdf(&["Old"], 200, 200)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fast = session.load_document(simple_pdf(&["New"], 612, 792)).await.unwrap();
        let slow_result = slow.await.unwrap();

        assert!(matches!(slow_result, Err(Error::StaleDocument { started: 1, current: 2 })));
        assert_eq!(session.generation(), Some(fast));
        assert_eq!(session.raster().unwrap().extracted_text, "New");
    }

    #[tokio::test]
    async fn test_stamp_result_for_replaced_document_is_rejected() {
        let session = session();
        let first = session.load_document(simple_pdf(&["First"], 612, 792)).await.unwrap();
        session.load_document(simple_pdf(&["Second"], 612, 792)).await.unwrap();

        assert!(matches!(
            session.ensure_current(first),
            Err(Error::StaleDocument { started: 1, current: 2 })
        ));
    }

    fn slow_stamp(bytes: &[u8], spec: &StampSpec) -> Result<Vec<u8>> {
        std::thread::sleep(Duration::from_millis(300));
        stamp_pdf(bytes, spec)
    }

    #[tokio::test]
    async fn test_upload_during_stamp_makes_result_stale() {
        let session = Arc::new(session());
        session.load_document(simple_pdf(&["First"], 612, 792)).await.unwrap();
        session.update_spec(|spec| spec.with_text("PB 1"));

        let stamping = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.stamp_with(slow_stamp).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = session.load_document(simple_pdf(&["Second"], 612, 792)).await.unwrap();
        let result = stamping.await.unwrap();

        assert!(matches!(result, Err(Error::StaleDocument { started: 1, current: 2 })));
        assert_eq!(session.generation(), Some(second));
        assert_eq!(session.raster().unwrap().extracted_text, "Second");
    }

    #[tokio::test]
    async fn test_reset_during_stamp_makes_result_stale() {
        let session = Arc::new(session());
        session.load_document(simple_pdf(&["First"], 612, 792)).await.unwrap();
        session.update_spec(|spec| spec.with_text("PB 1"));

        let stamping = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.stamp_with(slow_stamp).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        session.reset();
        let result = stamping.await.unwrap();

        assert!(matches!(result, Err(Error::StaleDocument { started: 1, current: 2 })));
        assert!(session.generation().is_none());
    }

    /// Answers after a delay, leaving time to replace the document
    struct SlowClient(&'static str);

    #[async_trait]
    impl SuggestionClient for SlowClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_suggestion_for_replaced_document_is_dropped() {
        let config = StampConfig::default();
        let adapter = TextSuggestionAdapter::new(Arc::new(SlowClient("PB 111")), &config);
        let session = Arc::new(session().with_suggestions(adapter));
        session.load_document(simple_pdf(&["Order PB 111"], 612, 792)).await.unwrap();

        let suggesting = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.suggest().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        session.load_document(simple_pdf(&["Order PB 222"], 612, 792)).await.unwrap();
        session.update_spec(|spec| spec.with_text("MANUAL"));

        assert_eq!(suggesting.await.unwrap(), "");
        assert_eq!(session.spec().text(), "MANUAL");
        assert_eq!(session.raster().unwrap().extracted_text, "Order PB 222");
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_previous_document() {
        let session = session();
        let first = session.load_document(simple_pdf(&["Kept"], 612, 792)).await.unwrap();

        assert!(matches!(session.load_document(empty_pdf()).await, Err(Error::DocumentParse(_))));
        assert_eq!(session.generation(), Some(first));
        assert_eq!(session.raster().unwrap().extracted_text, "Kept");
    }

    #[tokio::test]
    async fn test_reset_clears_document() {
        let session = session();
        session.load_document(simple_pdf(&["A"], 612, 792)).await.unwrap();
        session.reset();

        assert!(session.generation().is_none());
        assert!(session.raster().is_none());
        assert!(session.stamp().await.is_err());
    }

    #[tokio::test]
    async fn test_suggestion_fills_stamp_text() {
        let config = StampConfig::default();
        let adapter = TextSuggestionAdapter::new(Arc::new(FixedClient(" PO-2024-X ")), &config);
        let session = session().with_suggestions(adapter);

        assert_eq!(session.suggest().await, "");

        session.load_document(simple_pdf(&["Purchase order PO-2024-X"], 612, 792)).await.unwrap();
        assert_eq!(session.suggest().await, "PO-2024-X");
        assert_eq!(session.spec().text(), "PO-2024-X");
    }

    #[tokio::test]
    async fn test_empty_suggestion_keeps_text() {
        let config = StampConfig::default();
        let adapter = TextSuggestionAdapter::new(Arc::new(FixedClient("")), &config);
        let session = session().with_suggestions(adapter);

        session.load_document(simple_pdf(&["Nothing to see here"], 612, 792)).await.unwrap();
        session.update_spec(|spec| spec.with_text("MANUAL"));
        assert_eq!(session.suggest().await, "");
        assert_eq!(session.spec().text(), "MANUAL");
    }
}
