#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Browser session abstraction used by the review harvester.
//!
//! The extraction pipeline never talks to a browser directly. It drives a
//! [`Page`] and the [`Element`]s found on it, looked up through
//! [`Locator`] values. Two drivers implement the traits:
//!
//! * [`chrome`] controls a real headless Chrome over the DevTools protocol.
//! * [`snapshot`] replays captured HTML documents offline, recording every
//!   scroll and click so reveal loops can be exercised without a browser.
//!
//! Lookups return `Ok(None)` (or an empty `Vec`) when nothing matches. An
//! `Err` always means the lookup itself could not be performed.

pub mod chrome;
pub mod snapshot;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use serde::{Deserialize, Serialize};

/// Interval between lookups while waiting for an element to appear.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Chrome error fragments that mean a node was removed from the document
/// after we obtained a handle to it.
const DETACHED_NODE_MESSAGES: &[&str] = &[
    "No node with given id",
    "Could not find node with given id",
    "Node is detached from document",
    "Cannot find context with specified id",
];

/// Errors that can occur while driving a browser session.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// The browser process could not be started or connected to.
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// A DevTools protocol call failed.
    #[error("CDP error: {0}")]
    Cdp(#[source] CdpError),

    /// The element is no longer attached to the page.
    #[error("Element is no longer attached to the page")]
    Detached,

    /// A selector could not be parsed.
    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    /// A script ran but its result could not be interpreted.
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// The driver does not support the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Navigating to a URL failed.
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// The URL that could not be opened.
        url: String,
        /// Description of what went wrong.
        message: String,
    },
}

impl BrowserError {
    /// Returns `true` when the error means the element itself vanished,
    /// as opposed to a single lookup failing.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Detached)
    }
}

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        let message = err.to_string();
        if DETACHED_NODE_MESSAGES
            .iter()
            .any(|fragment| message.contains(fragment))
        {
            Self::Detached
        } else {
            Self::Cdp(err)
        }
    }
}

/// How to find an element, as declared in source definitions.
///
/// Deserializes from single-key tables such as `{ css = "div.review" }`,
/// `{ xpath = "//button" }` or `{ class = "d4r55" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector.
    Css(String),
    /// XPath expression.
    Xpath(String),
    /// A single CSS class name.
    Class(String),
}

impl Locator {
    /// Returns the equivalent CSS selector, or `None` for XPath locators.
    #[must_use]
    pub fn css_selector(&self) -> Option<String> {
        match self {
            Self::Css(selector) => Some(selector.clone()),
            Self::Class(name) => Some(format!(".{name}")),
            Self::Xpath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css `{selector}`"),
            Self::Xpath(xpath) => write!(f, "xpath `{xpath}`"),
            Self::Class(name) => write!(f, "class `{name}`"),
        }
    }
}

/// An owned handle to an element on the current page.
pub type ElementRef = Box<dyn Element>;

/// A DOM element located on a [`Page`].
#[async_trait]
pub trait Element: Send + Sync {
    /// Finds the first descendant matching `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the lookup cannot be performed, e.g. the
    /// element has been detached.
    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>, BrowserError>;

    /// Returns the rendered text of the element.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the text cannot be read.
    async fn text(&self) -> Result<String, BrowserError>;

    /// Returns whether the element is currently rendered.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if visibility cannot be determined.
    async fn is_displayed(&self) -> Result<bool, BrowserError>;

    /// Scrolls the element to the vertical centre of the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the scroll script fails.
    async fn scroll_into_view(&self) -> Result<(), BrowserError>;

    /// Scrolls the element's own content by the given offset.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the scroll script fails.
    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), BrowserError>;

    /// Dispatches a native mouse click on the element.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the click could not be delivered, e.g.
    /// because another element intercepts it.
    async fn click(&self) -> Result<(), BrowserError>;

    /// Invokes the element's `click()` handler from script, bypassing
    /// hit-testing.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the script fails.
    async fn force_click(&self) -> Result<(), BrowserError>;

    /// Clicks natively and falls back to [`Element::force_click`] when the
    /// native click fails.
    ///
    /// # Errors
    ///
    /// Returns the force-click error if both attempts fail.
    async fn click_or_force(&self) -> Result<(), BrowserError> {
        if let Err(e) = self.click().await {
            log::debug!("Native click failed ({e}), forcing click from script");
            self.force_click().await?;
        }
        Ok(())
    }
}

/// The single tab a harvest run drives.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates to `url` and waits for the load to finish.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if navigation fails.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Finds the first element matching `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the lookup cannot be performed.
    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>, BrowserError>;

    /// Finds every element matching `locator`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the lookup cannot be performed.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, BrowserError>;

    /// Scrolls the window by `dy` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the scroll script fails.
    async fn scroll_window_by(&self, dy: i64) -> Result<(), BrowserError>;

    /// Scrolls the window to the absolute vertical position `y`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the scroll script fails.
    async fn scroll_window_to(&self, y: i64) -> Result<(), BrowserError>;

    /// Returns the height of the screen in CSS pixels.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the value cannot be read.
    async fn screen_height(&self) -> Result<i64, BrowserError>;

    /// Polls for an element matching `locator` until it appears or
    /// `timeout` elapses. Returns `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if any lookup fails outright.
    async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(element) = self.find(locator).await? {
                return Ok(Some(element));
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

/// A running browser that owns exactly one [`Page`].
#[async_trait]
pub trait Session: Send + Sync {
    /// Returns the page this session drives.
    fn page(&self) -> &dyn Page;

    /// Shuts the browser down. Consumes the session so it is released
    /// exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the browser did not shut down cleanly.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Creates browser sessions.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Starts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] if no session can be created.
    async fn launch(&self) -> Result<Box<dyn Session>, BrowserError>;
}
