//! Headless Chrome driver over the DevTools protocol.
//!
//! [`ChromeLauncher`] starts a Chrome process through `chromiumoxide`,
//! spawns the protocol handler on the tokio runtime and opens a single tab
//! with the configured window size and user agent.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{BrowserError, Element, ElementRef, Launcher, Locator, Page, Session};

/// Desktop Chrome user agent presented to review sites.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DISPLAYED_FN: &str = "function() { \
    return !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length); }";
const SCROLL_INTO_VIEW_FN: &str = "function() { this.scrollIntoView({block: 'center'}); }";
const FORCE_CLICK_FN: &str = "function() { this.click(); }";

/// Options for launching Chrome.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run without a visible window.
    pub headless: bool,
    /// Window and viewport width in pixels.
    pub window_width: u32,
    /// Window and viewport height in pixels.
    pub window_height: u32,
    /// User agent override, if any.
    pub user_agent: Option<String>,
    /// Extra command-line switches passed to Chrome.
    pub args: Vec<String>,
    /// Explicit Chrome executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
            args: vec![
                "--disable-gpu".to_owned(),
                "--disable-dev-shm-usage".to_owned(),
            ],
            executable: None,
        }
    }
}

impl SessionConfig {
    /// Shows the browser window instead of running headless.
    #[must_use]
    pub const fn with_head(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Uses the given Chrome executable instead of auto-detection.
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.window_width, self.window_height)
            .args(self.args.iter().cloned());
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

/// Launches Chrome sessions from a [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: SessionConfig,
}

impl ChromeLauncher {
    /// Creates a new launcher with the given session settings.
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn Session>, BrowserError> {
        log::info!("Initializing Chrome session...");
        let (browser, mut handler) = Browser::launch(self.config.browser_config()?)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("Chrome handler event error: {e}");
                }
            }
        });

        let page = match open_tab(&browser, &self.config).await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        log::info!("Chrome session initialized");
        Ok(Box::new(ChromeSession {
            browser: Mutex::new(browser),
            page: ChromePage { inner: page },
            handler_task,
        }))
    }
}

async fn open_tab(
    browser: &Browser,
    config: &SessionConfig,
) -> Result<chromiumoxide::Page, CdpError> {
    let page = browser.new_page("about:blank").await?;
    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(config.window_width),
        i64::from(config.window_height),
        1.0,
        false,
    ))
    .await?;
    if let Some(user_agent) = &config.user_agent {
        page.execute(SetUserAgentOverrideParams::new(user_agent.clone()))
            .await?;
    }
    Ok(page)
}

/// A running Chrome process and its single tab.
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: ChromePage,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl Session for ChromeSession {
    fn page(&self) -> &dyn Page {
        &self.page
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        let Self {
            browser,
            handler_task,
            ..
        } = *self;
        let mut browser = browser.into_inner();

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            log::warn!("Chrome process did not exit cleanly: {e}");
        }
        handler_task.abort();

        closed.map(|_| ()).map_err(BrowserError::from)
    }
}

/// A Chrome tab.
pub struct ChromePage {
    inner: chromiumoxide::Page,
}

#[async_trait]
impl Page for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>, BrowserError> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, BrowserError> {
        let elements = match locator {
            Locator::Css(selector) => self.inner.find_elements(selector.as_str()).await?,
            Locator::Class(name) => self.inner.find_elements(format!(".{name}")).await?,
            // DOM.performSearch errors instead of returning an empty result
            // set when nothing matches.
            Locator::Xpath(xpath) => match self.inner.find_xpaths(xpath.as_str()).await {
                Ok(elements) => elements,
                Err(e) => {
                    log::debug!("XPath lookup {locator} found nothing: {e}");
                    Vec::new()
                }
            },
        };
        Ok(elements
            .into_iter()
            .map(|inner| Box::new(ChromeElement { inner }) as ElementRef)
            .collect())
    }

    async fn scroll_window_by(&self, dy: i64) -> Result<(), BrowserError> {
        self.inner
            .evaluate(format!("window.scrollBy(0, {dy});"))
            .await?;
        Ok(())
    }

    async fn scroll_window_to(&self, y: i64) -> Result<(), BrowserError> {
        self.inner
            .evaluate(format!("window.scrollTo(0, {y});"))
            .await?;
        Ok(())
    }

    async fn screen_height(&self) -> Result<i64, BrowserError> {
        self.inner
            .evaluate("window.screen.height")
            .await?
            .into_value::<i64>()
            .map_err(|e| BrowserError::Script(format!("screen height: {e}")))
    }
}

/// An element inside a Chrome tab.
pub struct ChromeElement {
    inner: chromiumoxide::Element,
}

impl ChromeElement {
    async fn call(&self, function: impl Into<String> + Send) -> Result<(), BrowserError> {
        self.inner.call_js_fn(function, false).await?;
        Ok(())
    }
}

#[async_trait]
impl Element for ChromeElement {
    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>, BrowserError> {
        let css = locator.css_selector().ok_or_else(|| {
            BrowserError::Unsupported(format!("element-scoped lookup by {locator}"))
        })?;
        Ok(self
            .inner
            .find_elements(css)
            .await?
            .into_iter()
            .next()
            .map(|inner| Box::new(Self { inner }) as ElementRef))
    }

    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn is_displayed(&self) -> Result<bool, BrowserError> {
        let returns = self.inner.call_js_fn(DISPLAYED_FN, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.call(SCROLL_INTO_VIEW_FN).await
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), BrowserError> {
        self.call(format!("function() {{ this.scrollBy({dx}, {dy}); }}"))
            .await
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.inner.click().await?;
        Ok(())
    }

    async fn force_click(&self) -> Result<(), BrowserError> {
        self.call(FORCE_CLICK_FN).await
    }
}
