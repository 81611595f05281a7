use async_trait::async_trait;
use page_marker::core::{BrowserTrait, Config};
use page_marker::dom::{Mutation, PageSnapshot};
use page_marker::testing::TestPage;
use page_marker::utils::scripts::{
    CaptureRequest, RecolorRequest, ReplayReport, CAPTURE_FUNCTION, RECOLOR_FUNCTION,
    REPLAY_FUNCTION,
};
use page_marker::utils::ReplayRequest;
use page_marker::{FrameRef, MarkerError, MarkingSession, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorded {
    scripts: Vec<String>,
    init_scripts: Vec<String>,
    replays: Vec<ReplayRequest>,
    launched: bool,
    closed: bool,
}

/// Serves fixed frame snapshots and records what the session sends to the page.
struct MockBrowser {
    frames: Vec<(FrameRef, String)>,
    truncate_markup: bool,
    /// Replays that report the first marked element as detached.
    stale_replays: usize,
    delay: Option<Duration>,
    recorded: Arc<Mutex<Recorded>>,
}

fn argument<T: DeserializeOwned>(script: &str, function: &str) -> T {
    let raw = script
        .strip_prefix(function)
        .and_then(|s| s.strip_prefix('('))
        .and_then(|s| s.strip_suffix(')'))
        .unwrap();
    serde_json::from_str(raw).unwrap()
}

impl MockBrowser {
    fn serving(snapshot: &PageSnapshot) -> (Self, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let browser = Self {
            frames: vec![(FrameRef::top(), serde_json::to_string(snapshot).unwrap())],
            truncate_markup: false,
            stale_replays: 0,
            delay: None,
            recorded: recorded.clone(),
        };
        (browser, recorded)
    }

    fn with_frame(mut self, path: Vec<usize>, name: &str, snapshot: &PageSnapshot) -> Self {
        let frame = FrameRef {
            path,
            name: name.to_string(),
        };
        self.frames
            .push((frame, serde_json::to_string(snapshot).unwrap()));
        self
    }

    fn frame_list(&self) -> Value {
        let frames: Vec<&FrameRef> = self.frames.iter().map(|(frame, _)| frame).collect();
        Value::String(serde_json::to_string(&frames).unwrap())
    }

    fn capture(&self, script: &str) -> Value {
        let request: CaptureRequest = argument(script, CAPTURE_FUNCTION);
        let (_, page) = self
            .frames
            .iter()
            .find(|(frame, _)| frame.path == request.frame)
            .unwrap();
        Value::String(page.clone())
    }

    fn replay(&self, script: &str) -> Value {
        let request: ReplayRequest = argument(script, REPLAY_FUNCTION);
        let mut recorded = self.recorded.lock().unwrap();

        let mut report = ReplayReport {
            markup: request
                .markup
                .iter()
                .map(|node| Some(format!("<live data-node=\"{}\">", node.0)))
                .collect(),
            stale: Vec::new(),
        };
        if recorded.replays.len() < self.stale_replays {
            if let Some(&first) = request.markup.first() {
                report.stale.push(first);
                report.markup[0] = None;
            }
        }
        if self.truncate_markup {
            report.markup.pop();
        }
        recorded.replays.push(request);
        Value::String(serde_json::to_string(&report).unwrap())
    }
}

#[async_trait]
impl BrowserTrait for MockBrowser {
    type TabHandle = ();

    async fn launch(&mut self, _config: &Config) -> Result<()> {
        self.recorded.lock().unwrap().launched = true;
        Ok(())
    }

    async fn new_tab(&self) -> Result<()> {
        Ok(())
    }

    async fn navigate(&self, _tab: &(), _url: &str) -> Result<()> {
        Ok(())
    }

    async fn add_init_script(&self, _tab: &(), source: &str) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .init_scripts
            .push(source.to_string());
        Ok(())
    }

    async fn execute_script(&self, _tab: &(), script: &str) -> Result<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.recorded.lock().unwrap().scripts.push(script.to_string());

        let first_line = script.lines().next().unwrap_or_default();
        let result = match first_line {
            "// page-marker:frames" => self.frame_list(),
            "// page-marker:capture" => self.capture(script),
            "// page-marker:replay" => self.replay(script),
            "// page-marker:cleanup" => Value::from(4),
            "// page-marker:recolor" => Value::Bool(true),
            other => panic!("unexpected script {:?}", other),
        };
        Ok(result)
    }

    async fn get_url(&self, _tab: &()) -> Result<String> {
        Ok("https://shop.example/".to_string())
    }

    async fn get_title(&self, _tab: &()) -> Result<String> {
        Ok("Shop".to_string())
    }

    fn is_running(&self) -> bool {
        !self.recorded.lock().unwrap().closed
    }

    async fn close(&mut self) -> Result<()> {
        self.recorded.lock().unwrap().closed = true;
        Ok(())
    }
}

fn shop_page() -> PageSnapshot {
    let page = TestPage::from_html(
        r#"<header><a id="home" href="/">Shop</a></header>
           <main><button id="buy" aria-label="Buy now">Buy</button></main>"#,
    )
    .clickable("home", 10.0, 10.0, 80.0, 24.0)
    .clickable("buy", 10.0, 200.0, 120.0, 32.0);
    let mut snapshot = page.build();
    snapshot.url = "https://shop.example/".to_string();
    snapshot.title = "Shop".to_string();
    snapshot
}

fn payment_frame() -> PageSnapshot {
    let page = TestPage::from_html(
        r#"<form><input id="card" name="card"><input id="cvc" name="cvc">
           <button id="pay">Pay</button></form>"#,
    )
    .place("card", 0.0, 0.0, 200.0, 24.0)
    .cursor("card", "text")
    .place("cvc", 0.0, 40.0, 80.0, 24.0)
    .cursor("cvc", "text")
    .clickable("pay", 0.0, 80.0, 80.0, 24.0);
    let mut snapshot = page.build();
    snapshot.url = "https://shop.example/pay".to_string();
    snapshot.title = "Payment".to_string();
    snapshot
}

#[test]
fn new_session_launches_with_no_marks() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let session =
        tokio_test::block_on(MarkingSession::new(browser, Config::default())).unwrap();

    assert!(recorded.lock().unwrap().launched);
    assert!(session.marks().is_none());
    assert_eq!(session.config().marker.emphasis_color, "red");
}

#[tokio::test]
async fn file_chooser_override_is_registered_once_per_tab() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();
    session.navigate("https://shop.example/").await.unwrap();
    session.navigate("https://shop.example/cart").await.unwrap();

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.init_scripts.len(), 1);
    assert!(recorded.init_scripts[0].contains("showOpenFilePicker"));
    assert!(recorded.scripts.is_empty());
}

#[tokio::test]
async fn override_can_be_disabled() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut config = Config::default();
    config.session.install_file_chooser_override = false;
    let mut session = MarkingSession::new(browser, config).await.unwrap();
    session.navigate("https://shop.example/").await.unwrap();

    let recorded = recorded.lock().unwrap();
    assert!(recorded.init_scripts.is_empty());
    assert!(recorded.scripts.is_empty());
}

#[tokio::test]
async fn invalid_urls_are_rejected_before_navigating() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    let err = session.navigate("not a url").await.unwrap_err();
    assert!(matches!(err, MarkerError::NavigationFailed(_)));
    assert!(recorded.lock().unwrap().scripts.is_empty());
}

#[tokio::test]
async fn current_url_comes_from_the_tab() {
    let (browser, _recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();
    session.navigate("https://shop.example/").await.unwrap();

    assert_eq!(session.current_url().await.unwrap(), "https://shop.example/");
}

#[tokio::test]
async fn mark_page_replays_the_pass_and_keeps_live_markup() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    let marks = session.mark_page().await.unwrap();
    assert_eq!(marks.url, "https://shop.example/");
    assert_eq!(marks.title, "Shop");
    assert_eq!(marks.len(), 2);
    assert_eq!(marks.elements[0].tag, "A");
    assert!(marks.elements[0].frame.is_top());
    assert_eq!(marks.elements[1].previous_label.as_deref(), Some("Buy now"));
    assert_eq!(marks.elements[1].xpath, "/html/body/main/button");

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.replays.len(), 1);
    let replay = &recorded.replays[0];
    assert!(replay.frame.is_empty());
    assert_eq!(replay.markup, vec![marks.elements[0].node, marks.elements[1].node]);

    let labels: Vec<&str> = replay
        .mutations
        .iter()
        .filter_map(|m| match m {
            Mutation::SetAttribute { value, .. } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["item_id__0__", "Buy now item_id__1__"]);

    let overlays = replay
        .mutations
        .iter()
        .filter(|m| matches!(m, Mutation::Append { .. }))
        .count();
    assert_eq!(overlays, 4);

    for element in &marks.elements {
        assert_eq!(
            element.html_snapshot,
            format!("<live data-node=\"{}\">", element.node.0)
        );
    }
}

#[tokio::test]
async fn frames_continue_the_numbering() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let browser = browser.with_frame(vec![0], "payment", &payment_frame());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    let marks = session.mark_page().await.unwrap();
    let ids: Vec<usize> = marks.elements.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(marks.url, "https://shop.example/");
    assert_eq!(marks.title, "Shop");

    let framed: Vec<&str> = marks.elements[2..]
        .iter()
        .map(|e| e.frame.name.as_str())
        .collect();
    assert_eq!(framed, vec!["payment"; 3]);
    assert_eq!(marks.elements[2].frame.path, vec![0]);
    assert_eq!(marks.elements[4].xpath, "/html/body/form/button");

    {
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.replays.len(), 2);
        let frame_replay = &recorded.replays[1];
        assert_eq!(frame_replay.frame, vec![0]);
        let labels: Vec<&str> = frame_replay
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::SetAttribute { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["item_id__2__", "item_id__3__", "item_id__4__"]);
    }

    session.emphasize(3).await.unwrap();
    let script = recorded.lock().unwrap().scripts.last().unwrap().clone();
    let request: RecolorRequest = argument(&script, RECOLOR_FUNCTION);
    assert_eq!(request.frame, vec![0]);
    assert_eq!(request.border_id, "item_id_border__3");

    // Four overlays removed in each of the two frames.
    assert_eq!(session.clear_marks().await.unwrap(), 8);
}

#[tokio::test]
async fn frames_without_a_body_are_skipped() {
    let empty = PageSnapshot::new(300.0, 150.0, vec![]).unwrap();
    let (browser, _recorded) = MockBrowser::serving(&shop_page());
    let browser = browser.with_frame(vec![0], "ad", &empty);
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    let marks = session.mark_page().await.unwrap();
    assert_eq!(marks.len(), 2);
    assert!(marks.elements.iter().all(|e| e.frame.is_top()));
}

#[tokio::test]
async fn stale_elements_undo_the_pass_and_mark_again() {
    let (mut browser, recorded) = MockBrowser::serving(&shop_page());
    browser.stale_replays = 1;
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    let marks = session.mark_page().await.unwrap();
    assert_eq!(marks.len(), 2);
    assert_eq!(marks.elements[0].id, 0);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.replays.len(), 2);
    let first_replay = recorded
        .scripts
        .iter()
        .position(|s| s.starts_with("// page-marker:replay"))
        .unwrap();
    assert!(recorded.scripts[first_replay + 1].starts_with("// page-marker:cleanup"));
}

#[tokio::test]
async fn stale_elements_fail_the_pass_without_retries() {
    let (mut browser, recorded) = MockBrowser::serving(&shop_page());
    browser.stale_replays = 1;
    let mut config = Config::default();
    config.session.stale_retries = 0;
    let mut session = MarkingSession::new(browser, config).await.unwrap();

    assert!(matches!(
        session.mark_page().await,
        Err(MarkerError::StaleSnapshot(1))
    ));
    assert!(session.marks().is_none());
    assert!(recorded
        .lock()
        .unwrap()
        .scripts
        .last()
        .unwrap()
        .starts_with("// page-marker:cleanup"));
}

#[tokio::test]
async fn short_markup_reply_keeps_captured_markup() {
    let (mut browser, _recorded) = MockBrowser::serving(&shop_page());
    browser.truncate_markup = true;
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    let marks = session.mark_page().await.unwrap();
    assert_eq!(marks.len(), 2);
    assert_eq!(
        marks.elements[0].html_snapshot,
        r#"<a aria-label="item_id__0__" href="/" id="home">Shop</a>"#
    );
    assert!(marks.elements[1]
        .html_snapshot
        .contains(r#"aria-label="Buy now item_id__1__""#));
}

#[tokio::test]
async fn marks_are_kept_until_cleared() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();
    assert!(session.marked_elements().is_empty());

    session.mark_page().await.unwrap();
    assert_eq!(session.marked_elements().len(), 2);
    assert_eq!(session.xpath_of(0).unwrap(), "/html/body/header/a");
    assert!(matches!(
        session.xpath_of(7),
        Err(MarkerError::UnknownMarkedId(7))
    ));

    assert_eq!(session.clear_marks().await.unwrap(), 4);
    assert!(session.marks().is_none());
    assert!(recorded
        .lock()
        .unwrap()
        .scripts
        .last()
        .unwrap()
        .contains("item_id_border__"));
}

#[tokio::test]
async fn emphasize_and_restore_recolor_the_overlays() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();
    session.mark_page().await.unwrap();

    session.emphasize(1).await.unwrap();
    let script = recorded.lock().unwrap().scripts.last().unwrap().clone();
    let request: RecolorRequest = argument(&script, RECOLOR_FUNCTION);
    assert_eq!(request.border_id, "item_id_border__1");
    assert_eq!(request.label_id, "item_id_label__1");
    assert_eq!(request.border_color, "red");
    assert_eq!(request.label_color, "red");

    session.restore(1).await.unwrap();
    let script = recorded.lock().unwrap().scripts.last().unwrap().clone();
    let request: RecolorRequest = argument(&script, RECOLOR_FUNCTION);
    assert_eq!(request.border_color, "green");
    assert_eq!(request.label_color, "green");

    let scripts = recorded.lock().unwrap().scripts.len();
    assert!(matches!(
        session.emphasize(9).await,
        Err(MarkerError::UnknownMarkedId(9))
    ));
    assert!(matches!(
        session.restore(9).await,
        Err(MarkerError::UnknownMarkedId(9))
    ));
    assert_eq!(recorded.lock().unwrap().scripts.len(), scripts);
}

#[tokio::test]
async fn navigation_forgets_previous_marks() {
    let (browser, _recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();
    session.mark_page().await.unwrap();

    session.navigate("https://shop.example/cart").await.unwrap();
    assert!(session.marked_elements().is_empty());
}

#[tokio::test]
async fn page_without_body_is_reported() {
    let empty = PageSnapshot::new(1600.0, 900.0, vec![]).unwrap();
    let (browser, _recorded) = MockBrowser::serving(&empty);
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();

    assert!(matches!(
        session.mark_page().await,
        Err(MarkerError::NoDocument)
    ));
}

#[tokio::test]
async fn slow_scripts_time_out() {
    let (mut browser, _recorded) = MockBrowser::serving(&shop_page());
    browser.delay = Some(Duration::from_millis(500));
    let mut config = Config::default();
    config.session.script_timeout_ms = 20;
    let mut session = MarkingSession::new(browser, config).await.unwrap();

    assert!(matches!(
        session.mark_page().await,
        Err(MarkerError::JavaScriptTimeout)
    ));
}

#[tokio::test]
async fn close_clears_marks_and_stops_the_browser() {
    let (browser, recorded) = MockBrowser::serving(&shop_page());
    let mut session = MarkingSession::new(browser, Config::default()).await.unwrap();
    session.mark_page().await.unwrap();

    session.close().await.unwrap();
    let recorded = recorded.lock().unwrap();
    assert!(recorded.closed);
    assert!(recorded
        .scripts
        .last()
        .unwrap()
        .starts_with("// page-marker:cleanup"));
}
