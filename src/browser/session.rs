use crate::core::{BrowserTrait, Config, Document};
use crate::dom::PageSnapshot;
use crate::errors::{MarkerError, Result};
use crate::marker::{remove_overlays, Scanner};
use crate::types::{FrameRef, MarkedElement, PageMarks};
use crate::utils::scripts::{capture_script, cleanup_script, recolor_script, replay_script};
use crate::utils::{JavaScriptRunner, ReplayReport, ReplayRequest, FILE_CHOOSER_OVERRIDE, FRAMES_SCRIPT};
use serde::de::DeserializeOwned;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// A browser tab whose interactable elements can be marked.
///
/// Each `mark_page` captures every same-origin frame into a
/// [`PageSnapshot`], runs a marking pass over it and replays the resulting
/// mutations in that frame, so the overlays and accessible-name tokens the
/// controller sees match the records returned. Ids run on across frames.
pub struct MarkingSession<B: BrowserTrait> {
    browser: B,
    tab: Option<B::TabHandle>,
    config: Config,
    marks: Option<PageMarks>,
}

struct FrameMarks {
    url: String,
    title: String,
    elements: Vec<MarkedElement>,
}

impl<B: BrowserTrait> MarkingSession<B> {
    pub async fn new(mut browser: B, config: Config) -> Result<Self> {
        browser.launch(&config).await?;
        let tab = browser.new_tab().await?;

        if config.session.install_file_chooser_override {
            browser.add_init_script(&tab, FILE_CHOOSER_OVERRIDE).await?;
            debug!("file chooser override registered");
        }

        Ok(Self {
            browser,
            tab: Some(tab),
            config,
            marks: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn tab(&self) -> Result<&B::TabHandle> {
        self.tab.as_ref().ok_or(MarkerError::NoActiveTab)
    }

    async fn run_script(&self, script: &str) -> Result<serde_json::Value> {
        JavaScriptRunner::execute_with_timeout(
            &self.browser,
            self.tab()?,
            script,
            self.config.session.script_timeout_ms,
        )
        .await
    }

    async fn run_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        JavaScriptRunner::execute_json(
            &self.browser,
            self.tab()?,
            script,
            self.config.session.script_timeout_ms,
        )
        .await
    }

    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        let target = url::Url::parse(url)
            .map_err(|e| MarkerError::NavigationFailed(format!("{}: {}", url, e)))?;

        let tab = self.tab()?;
        let timeout = tokio::time::Duration::from_millis(self.config.session.navigation_timeout_ms);
        tokio::time::timeout(timeout, self.browser.navigate(tab, target.as_str()))
            .await
            .map_err(|_| MarkerError::NavigationFailed(format!("{}: timed out", target)))??;

        self.marks = None;
        info!(url = %target, "navigated");
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        self.browser.get_url(self.tab()?).await
    }

    /// Same-origin documents of the page, top document first.
    pub async fn frames(&self) -> Result<Vec<FrameRef>> {
        let mut frames: Vec<FrameRef> = self.run_json(FRAMES_SCRIPT).await?;
        if !frames.first().is_some_and(FrameRef::is_top) {
            frames.insert(0, FrameRef::top());
        }
        Ok(frames)
    }

    /// Capture the top document without changing it.
    pub async fn capture(&self) -> Result<PageSnapshot> {
        self.capture_frame(&FrameRef::top()).await
    }

    pub async fn capture_frame(&self, frame: &FrameRef) -> Result<PageSnapshot> {
        let result = self.run_script(&capture_script(&frame.path)?).await?;
        let raw = JavaScriptRunner::expect_string(result)?;
        let snapshot = PageSnapshot::from_json_str(&raw)?;
        if snapshot.body().is_none() {
            return Err(MarkerError::NoDocument);
        }
        Ok(snapshot)
    }

    /// Mark every interactable element of the current page.
    ///
    /// A pass that finds captured elements gone at replay time is undone and
    /// rerun, up to `stale_retries` times.
    pub async fn mark_page(&mut self) -> Result<PageMarks> {
        let mut retries = 0;
        loop {
            let pass_id = Uuid::new_v4();
            let result = self
                .run_pass(pass_id)
                .instrument(info_span!("mark_page", %pass_id))
                .await;

            match result {
                Err(MarkerError::StaleSnapshot(count))
                    if retries < self.config.session.stale_retries =>
                {
                    retries += 1;
                    warn!(stale = count, retry = retries, "page changed while marking, marking again");
                }
                result => {
                    let marks = result?;
                    self.marks = Some(marks.clone());
                    return Ok(marks);
                }
            }
        }
    }

    async fn run_pass(&self, pass_id: Uuid) -> Result<PageMarks> {
        let frames = self.frames().await?;
        let mut url = String::new();
        let mut title = String::new();
        let mut elements: Vec<MarkedElement> = Vec::new();

        for frame in &frames {
            let marked = match self.mark_frame(frame, elements.len()).await {
                Ok(marked) => marked,
                Err(MarkerError::StaleSnapshot(count)) => {
                    self.clear_frames(&frames).await;
                    return Err(MarkerError::StaleSnapshot(count));
                }
                Err(e) if !frame.is_top() => {
                    warn!(frame = %frame.name, error = %e, "skipping frame");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if frame.is_top() {
                url = marked.url;
                title = marked.title;
            }
            elements.extend(marked.elements);
        }

        info!(marked = elements.len(), frames = frames.len(), url = %url, "page marked");

        Ok(PageMarks {
            url,
            title,
            pass_id,
            captured_at: chrono::Utc::now(),
            elements,
        })
    }

    async fn mark_frame(&self, frame: &FrameRef, base: usize) -> Result<FrameMarks> {
        let mut snapshot = self.capture_frame(frame).await?;
        if self.config.session.clean_before_marking {
            remove_overlays(&mut snapshot);
        }

        let mut elements = Scanner::starting_at(&self.config.marker, base).run(&mut snapshot)?;

        let request = ReplayRequest {
            frame: frame.path.clone(),
            mutations: snapshot.take_mutations(),
            markup: elements.iter().map(|e| e.node).collect(),
        };
        let report: ReplayReport = self.run_json(&replay_script(&request)?).await?;

        if !report.stale.is_empty() {
            warn!(
                frame = %frame.name,
                stale = report.stale.len(),
                "captured elements left the document before replay"
            );
            return Err(MarkerError::StaleSnapshot(report.stale.len()));
        }

        if report.markup.len() == elements.len() {
            for (element, html) in elements.iter_mut().zip(report.markup) {
                if let Some(html) = html {
                    element.html_snapshot = html;
                }
            }
        } else {
            warn!(
                expected = elements.len(),
                returned = report.markup.len(),
                "replay returned unexpected markup count, keeping captured markup"
            );
        }

        for element in &mut elements {
            element.frame = frame.clone();
        }
        debug!(frame = %frame.name, base, marked = elements.len(), "frame marked");

        Ok(FrameMarks {
            url: snapshot.url,
            title: snapshot.title,
            elements,
        })
    }

    /// Remove every border and badge from the page.
    pub async fn clear_marks(&mut self) -> Result<usize> {
        let frames = self.frames().await?;
        let removed = self.clear_frames(&frames).await;
        self.marks = None;

        debug!(removed, "cleared marks");
        Ok(removed)
    }

    async fn clear_frames(&self, frames: &[FrameRef]) -> usize {
        let mut removed = 0;
        for frame in frames {
            let result = match cleanup_script(&frame.path) {
                Ok(script) => self.run_script(&script).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(count) => removed += count.as_u64().unwrap_or(0) as usize,
                Err(e) => warn!(frame = %frame.name, error = %e, "could not remove overlays"),
            }
        }
        removed
    }

    pub fn marks(&self) -> Option<&PageMarks> {
        self.marks.as_ref()
    }

    pub fn marked_elements(&self) -> &[MarkedElement] {
        self.marks
            .as_ref()
            .map(|marks| marks.elements.as_slice())
            .unwrap_or(&[])
    }

    pub fn marked(&self, id: usize) -> Result<&MarkedElement> {
        self.marks
            .as_ref()
            .and_then(|marks| marks.get(id))
            .ok_or(MarkerError::UnknownMarkedId(id))
    }

    pub fn xpath_of(&self, id: usize) -> Result<&str> {
        Ok(self.marked(id)?.xpath.as_str())
    }

    /// Recolor the overlay of element `id` with the emphasis color.
    pub async fn emphasize(&self, id: usize) -> Result<()> {
        let color = &self.config.marker.emphasis_color;
        self.recolor(id, color, color).await
    }

    /// Give the overlay of element `id` its configured colors back.
    pub async fn restore(&self, id: usize) -> Result<()> {
        let marker = &self.config.marker;
        self.recolor(id, &marker.border_color, &marker.label_background).await
    }

    async fn recolor(&self, id: usize, border_color: &str, label_color: &str) -> Result<()> {
        let frame = &self.marked(id)?.frame;
        let script = recolor_script(&frame.path, id, border_color, label_color)?;
        let found = self.run_script(&script).await?;
        if found.as_bool() != Some(true) {
            warn!(id, "overlay for marked element is no longer on the page");
        }
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        if self.browser.is_running() && self.marks.is_some() {
            if let Err(e) = self.clear_marks().await {
                debug!(error = %e, "could not clear marks before closing");
            }
        }
        self.tab = None;
        self.browser.close().await
    }
}

#[cfg(feature = "chrome")]
impl MarkingSession<crate::browser::ChromeBrowser> {
    /// Quick builder for common use cases
    pub async fn quick_start() -> Result<Self> {
        Self::with_config(Config::default()).await
    }

    /// Quick builder with custom config
    pub async fn with_config(config: Config) -> Result<Self> {
        let browser = crate::browser::ChromeBrowser::new();
        Self::new(browser, config).await
    }
}
