//! Offline replay of captured HTML documents.
//!
//! A [`SnapshotSite`] maps URLs to one or more captured documents (one per
//! result page). [`SnapshotPage`] serves them through the [`Page`] and
//! [`Element`] traits, evaluating CSS locators with the `scraper` crate and
//! counting every scroll and click it receives.
//!
//! A few `data-snapshot-*` attributes stand in for behaviour a static
//! document cannot express:
//!
//! * `data-snapshot-page="N"`: clicking the element switches to captured
//!   document `N` (1-based) of the current URL. Handles obtained before the
//!   switch become detached.
//! * `data-snapshot-detached`: the element reports itself as detached on
//!   every access.
//! * `data-snapshot-intercepted`: native clicks fail; only
//!   [`Element::force_click`] reaches the element.
//!
//! Elements with a `hidden` attribute or an inline `display: none` style
//! report as not displayed. XPath locators are not supported.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use scraper::{ElementRef as HtmlElement, Html, Selector};

use crate::{BrowserError, Element, ElementRef, Launcher, Locator, Page, Session};

const PAGE_ATTR: &str = "data-snapshot-page";
const DETACHED_ATTR: &str = "data-snapshot-detached";
const INTERCEPTED_ATTR: &str = "data-snapshot-intercepted";

/// Captured documents keyed by the URL they were captured from.
#[derive(Debug, Clone)]
pub struct SnapshotSite {
    routes: BTreeMap<String, Vec<String>>,
    screen_height: i64,
}

impl Default for SnapshotSite {
    fn default() -> Self {
        Self {
            routes: BTreeMap::new(),
            screen_height: 1080,
        }
    }
}

impl SnapshotSite {
    /// Creates an empty site with a 1080 px screen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single captured document for `url`.
    #[must_use]
    pub fn with_document(self, url: &str, html: impl Into<String>) -> Self {
        self.with_pages(url, vec![html.into()])
    }

    /// Registers the captured result pages for `url`, first page first.
    #[must_use]
    pub fn with_pages(mut self, url: &str, pages: Vec<String>) -> Self {
        self.routes.insert(url.to_owned(), pages);
        self
    }

    /// Overrides the reported screen height.
    #[must_use]
    pub const fn with_screen_height(mut self, height: i64) -> Self {
        self.screen_height = height;
        self
    }
}

/// Interactions a [`SnapshotPage`] has received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    /// URLs navigated to, in order.
    pub navigations: Vec<String>,
    /// Window scrolls (relative and absolute).
    pub window_scrolls: u32,
    /// Scrolls of individual elements' content.
    pub element_scrolls: u32,
    /// Native clicks that reached an element.
    pub clicks: u32,
    /// Script clicks.
    pub forced_clicks: u32,
    /// Captured documents shown so far, as 1-based page numbers.
    pub pages_shown: Vec<usize>,
    /// Whether the owning session has been closed.
    pub closed: bool,
}

#[derive(Debug)]
struct SnapshotState {
    site: SnapshotSite,
    url: Option<String>,
    page_index: usize,
    /// Bumped on every document switch so stale handles can be detected.
    generation: u64,
    stats: SnapshotStats,
}

impl SnapshotState {
    fn document(&self) -> Option<&str> {
        let url = self.url.as_ref()?;
        self.site
            .routes
            .get(url)?
            .get(self.page_index)
            .map(String::as_str)
    }

    fn show_page(&mut self, index: usize) {
        self.page_index = index;
        self.generation += 1;
        self.stats.pages_shown.push(index + 1);
    }
}

type SharedState = Arc<Mutex<SnapshotState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, SnapshotState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_selector(locator: &Locator) -> Result<Selector, BrowserError> {
    let css = locator.css_selector().ok_or_else(|| {
        BrowserError::Unsupported(format!("snapshot replay cannot evaluate {locator}"))
    })?;
    match Selector::parse(&css) {
        Ok(selector) => Ok(selector),
        Err(_) => Err(BrowserError::InvalidSelector(css.clone())),
    }
}

/// A [`Page`] that serves captured documents.
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    state: SharedState,
}

impl SnapshotPage {
    /// Creates a new page over `site`. Nothing is loaded until [`Page::goto`].
    #[must_use]
    pub fn new(site: SnapshotSite) -> Self {
        Self {
            state: Arc::new(Mutex::new(SnapshotState {
                site,
                url: None,
                page_index: 0,
                generation: 0,
                stats: SnapshotStats::default(),
            })),
        }
    }

    /// Returns a copy of the interactions recorded so far.
    #[must_use]
    pub fn stats(&self) -> SnapshotStats {
        lock(&self.state).stats.clone()
    }

    fn element(&self, html: String, generation: u64) -> ElementRef {
        Box::new(SnapshotElement {
            html,
            generation,
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl Page for SnapshotPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = lock(&self.state);
        if !state.site.routes.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_owned(),
                message: "no snapshot captured for this URL".to_owned(),
            });
        }
        state.url = Some(url.to_owned());
        state.stats.navigations.push(url.to_owned());
        state.show_page(0);
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>, BrowserError> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, BrowserError> {
        let selector = parse_selector(locator)?;
        let (fragments, generation) = {
            let state = lock(&self.state);
            let Some(document) = state.document() else {
                return Ok(Vec::new());
            };
            let parsed = Html::parse_document(document);
            let fragments: Vec<String> = parsed.select(&selector).map(|el| el.html()).collect();
            (fragments, state.generation)
        };
        Ok(fragments
            .into_iter()
            .map(|html| self.element(html, generation))
            .collect())
    }

    async fn scroll_window_by(&self, _dy: i64) -> Result<(), BrowserError> {
        lock(&self.state).stats.window_scrolls += 1;
        Ok(())
    }

    async fn scroll_window_to(&self, _y: i64) -> Result<(), BrowserError> {
        lock(&self.state).stats.window_scrolls += 1;
        Ok(())
    }

    async fn screen_height(&self) -> Result<i64, BrowserError> {
        Ok(lock(&self.state).site.screen_height)
    }
}

/// An element of a captured document, held as its outer HTML.
struct SnapshotElement {
    html: String,
    generation: u64,
    state: SharedState,
}

impl SnapshotElement {
    /// Re-parses the element and hands its root to `f`, failing when the
    /// element has been detached.
    fn inspect<T>(&self, f: impl FnOnce(HtmlElement<'_>) -> T) -> Result<T, BrowserError> {
        if lock(&self.state).generation != self.generation {
            return Err(BrowserError::Detached);
        }
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment
            .root_element()
            .children()
            .find_map(HtmlElement::wrap)
            .ok_or(BrowserError::Detached)?;
        if root.value().attr(DETACHED_ATTR).is_some() {
            return Err(BrowserError::Detached);
        }
        Ok(f(root))
    }

    fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        self.inspect(|root| root.value().attr(name).map(str::to_owned))
    }
}

#[async_trait]
impl Element for SnapshotElement {
    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>, BrowserError> {
        let selector = parse_selector(locator)?;
        let found = self.inspect(|root| root.select(&selector).next().map(|el| el.html()))?;
        Ok(found.map(|html| {
            Box::new(Self {
                html,
                generation: self.generation,
                state: Arc::clone(&self.state),
            }) as ElementRef
        }))
    }

    async fn text(&self) -> Result<String, BrowserError> {
        self.inspect(|root| root.text().collect::<String>())
    }

    async fn is_displayed(&self) -> Result<bool, BrowserError> {
        self.inspect(|root| {
            let element = root.value();
            let hidden_style = element.attr("style").is_some_and(|style| {
                style
                    .replace(' ', "")
                    .to_ascii_lowercase()
                    .contains("display:none")
            });
            element.attr("hidden").is_none() && !hidden_style
        })
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.inspect(|_| ())
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<(), BrowserError> {
        self.inspect(|_| ())?;
        lock(&self.state).stats.element_scrolls += 1;
        Ok(())
    }

    async fn click(&self) -> Result<(), BrowserError> {
        if self.attr(INTERCEPTED_ATTR)?.is_some() {
            return Err(BrowserError::Script(
                "element click intercepted by another element".to_owned(),
            ));
        }
        lock(&self.state).stats.clicks += 1;
        self.follow_page_link()
    }

    async fn force_click(&self) -> Result<(), BrowserError> {
        self.inspect(|_| ())?;
        lock(&self.state).stats.forced_clicks += 1;
        self.follow_page_link()
    }
}

impl SnapshotElement {
    fn follow_page_link(&self) -> Result<(), BrowserError> {
        let Some(target) = self.attr(PAGE_ATTR)? else {
            return Ok(());
        };
        let page: usize = target
            .trim()
            .parse()
            .map_err(|_| BrowserError::Script(format!("invalid {PAGE_ATTR} value '{target}'")))?;

        let mut state = lock(&self.state);
        let available = state
            .url
            .as_ref()
            .and_then(|url| state.site.routes.get(url))
            .map_or(0, Vec::len);
        if page == 0 || page > available {
            return Err(BrowserError::Navigation {
                url: state.url.clone().unwrap_or_default(),
                message: format!("no captured page {page}"),
            });
        }
        state.show_page(page - 1);
        Ok(())
    }
}

/// Launches sessions over a shared [`SnapshotPage`].
///
/// Every launched session drives the same page, so callers can inspect
/// [`SnapshotPage::stats`] after the session has been closed.
#[derive(Debug, Clone)]
pub struct SnapshotLauncher {
    page: SnapshotPage,
}

impl SnapshotLauncher {
    /// Creates a new launcher whose sessions replay `site`.
    #[must_use]
    pub fn new(site: SnapshotSite) -> Self {
        Self {
            page: SnapshotPage::new(site),
        }
    }

    /// Returns a handle to the page every session drives.
    #[must_use]
    pub fn page(&self) -> SnapshotPage {
        self.page.clone()
    }
}

#[async_trait]
impl Launcher for SnapshotLauncher {
    async fn launch(&self) -> Result<Box<dyn Session>, BrowserError> {
        Ok(Box::new(SnapshotSession {
            page: self.page.clone(),
        }))
    }
}

struct SnapshotSession {
    page: SnapshotPage,
}

#[async_trait]
impl Session for SnapshotSession {
    fn page(&self) -> &dyn Page {
        &self.page
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        lock(&self.page.state).stats.closed = true;
        Ok(())
    }
}
