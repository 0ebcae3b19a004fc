//! Page-by-page traversal of a paginated review list.

use review_harvest_browser::{BrowserError, ElementRef, Locator, Page};

use super::{locate_records, open_reviews, pause_ms};
use crate::source_def::PaginatedConfig;

/// Record nodes found on one result page.
pub struct PageBatch {
    /// 1-based result page the records were found on.
    pub page_number: u32,
    /// Raw record nodes, handed to the assembler before the next page loads.
    pub nodes: Vec<ElementRef>,
}

/// Walks result pages until `max_pages` have been visited or no control for
/// the next page exists.
///
/// Each call to [`Paginator::next_batch`] yields the records of one page.
/// Record nodes go stale once the next page loads, so callers must finish
/// with a batch before asking for the next one.
pub struct Paginator<'a> {
    page: &'a dyn Page,
    config: &'a PaginatedConfig,
    max_pages: u32,
    current: u32,
    screen_height: Option<i64>,
    exhausted: bool,
}

impl<'a> Paginator<'a> {
    /// Creates a new paginator that reads at most `max_pages` pages.
    #[must_use]
    pub const fn new(page: &'a dyn Page, config: &'a PaginatedConfig, max_pages: u32) -> Self {
        Self {
            page,
            config,
            max_pages,
            current: 0,
            screen_height: None,
            exhausted: false,
        }
    }

    /// Number of result pages visited so far.
    #[must_use]
    pub const fn pages_visited(&self) -> u32 {
        self.current
    }

    /// Moves to the next result page, expands it and returns its records.
    ///
    /// Returns `Ok(None)` once the page bound is reached or there is no
    /// next page. The next-page control is never clicked past the bound.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the screen height or the record lookup
    /// cannot be read. Failed scroll steps and expanders are only logged.
    pub async fn next_batch(&mut self) -> Result<Option<PageBatch>, BrowserError> {
        if self.exhausted || self.current >= self.max_pages {
            return Ok(None);
        }

        if self.current == 0 {
            if let Some(opener) = &self.config.open_reviews {
                open_reviews(self.page, opener).await;
            }
        } else if !self.advance().await {
            self.exhausted = true;
            return Ok(None);
        }

        self.current += 1;
        log::info!("Scraping page {} of {}...", self.current, self.max_pages);
        self.expand_page().await?;

        let nodes = locate_records(self.page, &self.config.records).await?;
        log::info!("Found {} reviews on page {}", nodes.len(), self.current);
        Ok(Some(PageBatch {
            page_number: self.current,
            nodes,
        }))
    }

    async fn expand_page(&mut self) -> Result<(), BrowserError> {
        let screen_height = match self.screen_height {
            Some(height) => height,
            None => {
                let height = self.page.screen_height().await?;
                self.screen_height = Some(height);
                height
            }
        };

        for step in 1..=self.config.scroll_steps {
            if let Err(e) = self
                .page
                .scroll_window_to(screen_height * i64::from(step))
                .await
            {
                log::warn!("Scroll step {step} failed: {e}");
            }
            pause_ms(self.config.scroll_pause_ms).await;
            self.click_show_more().await;
        }
        Ok(())
    }

    /// Force-clicks every displayed expander. Best effort: the first failure
    /// abandons the remaining expanders of this step.
    async fn click_show_more(&self) {
        let buttons = match self.page.find_all(&self.config.show_more).await {
            Ok(buttons) => buttons,
            Err(e) => {
                log::debug!("Show-more lookup failed: {e}");
                return;
            }
        };
        for button in buttons {
            let clicked = match button.is_displayed().await {
                Ok(true) => button.force_click().await.map(|()| true),
                Ok(false) => Ok(false),
                Err(e) => Err(e),
            };
            match clicked {
                Ok(true) => pause_ms(self.config.show_more_pause_ms).await,
                Ok(false) => {}
                Err(e) => {
                    log::debug!("Show-more click failed: {e}");
                    return;
                }
            }
        }
    }

    async fn advance(&self) -> bool {
        let target = self.current + 1;
        let locator = self.config.next_page_locator(target);
        match self.click_next(&locator).await {
            Ok(true) => true,
            Ok(false) => {
                log::info!("No more pages available, no control for page {target}");
                false
            }
            Err(e) => {
                log::info!("No more pages available or reached the end: {e}");
                false
            }
        }
    }

    async fn click_next(&self, locator: &Locator) -> Result<bool, BrowserError> {
        let Some(control) = self.page.find(locator).await? else {
            return Ok(false);
        };
        control.scroll_into_view().await?;
        pause_ms(self.config.next_page_settle_ms).await;
        control.force_click().await?;
        pause_ms(self.config.next_page_pause_ms).await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use review_harvest_browser::snapshot::{SnapshotPage, SnapshotSite};

    use super::*;

    const URL: &str = "https://booking.example.test/hotel";

    fn config() -> PaginatedConfig {
        PaginatedConfig {
            open_reviews: None,
            scroll_steps: 3,
            scroll_pause_ms: 3_000,
            show_more: Locator::Css("button.more".to_string()),
            show_more_pause_ms: 2_000,
            records: vec![
                Locator::Css("div[data-testid='review']".to_string()),
                Locator::Css("div.review_item".to_string()),
            ],
            next_page: "button[aria-label=' {page}']".to_string(),
            next_page_settle_ms: 2_000,
            next_page_pause_ms: 3_000,
        }
    }

    /// Builds `count` result pages with `per_page` records each. Every page
    /// but the last links to its successor.
    fn pages(count: usize, per_page: usize) -> Vec<String> {
        (1..=count)
            .map(|number| {
                let records = (0..per_page)
                    .map(|i| format!("<div data-testid=\"review\">p{number} r{i}</div>"))
                    .collect::<String>();
                let next = if number < count {
                    format!(
                        "<button aria-label=\" {next}\" data-snapshot-page=\"{next}\">{next}</button>",
                        next = number + 1
                    )
                } else {
                    String::new()
                };
                format!("<html><body>{records}{next}</body></html>")
            })
            .collect()
    }

    async fn page_with(pages: Vec<String>) -> SnapshotPage {
        let page = SnapshotPage::new(SnapshotSite::new().with_pages(URL, pages));
        page.goto(URL).await.unwrap();
        page
    }

    async fn drain(paginator: &mut Paginator<'_>) -> Vec<(u32, usize)> {
        let mut seen = Vec::new();
        while let Some(batch) = paginator.next_batch().await.unwrap() {
            seen.push((batch.page_number, batch.nodes.len()));
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_no_next_page_exists() {
        let page = page_with(pages(3, 2)).await;
        let config = config();
        let mut paginator = Paginator::new(&page, &config, 5);

        assert_eq!(drain(&mut paginator).await, vec![(1, 2), (2, 2), (3, 2)]);
        assert_eq!(paginator.pages_visited(), 3);
        assert_eq!(page.stats().pages_shown, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn never_clicks_past_the_page_bound() {
        let page = page_with(pages(4, 1)).await;
        let config = config();
        let mut paginator = Paginator::new(&page, &config, 2);

        assert_eq!(drain(&mut paginator).await, vec![(1, 1), (2, 1)]);
        let stats = page.stats();
        assert_eq!(stats.pages_shown, vec![1, 2]);
        assert_eq!(stats.forced_clicks, 1);
        assert!(paginator.next_batch().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn single_page_bound_reads_only_the_first_page() {
        let page = page_with(pages(3, 2)).await;
        let config = config();
        let mut paginator = Paginator::new(&page, &config, 1);

        assert_eq!(drain(&mut paginator).await, vec![(1, 2)]);
        assert_eq!(page.stats().forced_clicks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expands_each_page_in_screen_height_steps() {
        let html = r#"<html><body>
            <div class="review_item">one</div>
            <button class="more">more</button>
            <button class="more" hidden>more</button>
        </body></html>"#;
        let page = page_with(vec![html.to_string()]).await;
        let config = config();
        let mut paginator = Paginator::new(&page, &config, 5);

        let batch = paginator.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.nodes.len(), 1);

        let stats = page.stats();
        assert_eq!(stats.window_scrolls, 3);
        // One displayed expander clicked after each of the three steps.
        assert_eq!(stats.forced_clicks, 3);
        assert!(paginator.next_batch().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn page_without_records_yields_empty_batch() {
        let page = page_with(vec!["<html><body><p>empty</p></body></html>".to_string()]).await;
        let config = config();
        let mut paginator = Paginator::new(&page, &config, 5);

        assert_eq!(drain(&mut paginator).await, vec![(1, 0)]);
    }
}
