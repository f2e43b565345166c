//! GitHub repositories-page listing source.
//!
//! The only module that knows what the page looks like. Rows live under
//! `#user-repositories-list`; each row carries a star toggle whose visible
//! state ("Star" vs "Unstar") is the already-done marker, and the
//! repositories tab paginates through a `next_page` link. All of that is
//! presentation-layer detail of github.com and may change without notice,
//! which is why none of it leaks past this module.

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::sweep::{Item, ListingSource};

/// Container for the repository rows on a user's `?tab=repositories` page.
pub const LIST_SELECTOR: &str = "#user-repositories-list";

const NEXT_PAGE_SELECTOR: &str = ".paginate-container a.next_page";

/// [`ListingSource`] over a live repositories page.
pub struct RepoListing {
    page: Page,
    /// Wait after clicks for GitHub's AJAX response to land.
    settle: Duration,
}

impl RepoListing {
    pub fn new(page: Page, settle: Duration) -> Self {
        Self { page, settle }
    }

    async fn eval<T: DeserializeOwned>(&self, js: &str) -> Result<T, String> {
        self.page
            .evaluate(js)
            .await
            .map_err(|e| format!("evaluate failed: {e}"))?
            .into_value()
            .map_err(|e| format!("unexpected result shape: {e}"))
    }

    /// Selector for the star form's submit button in row `ordinal`.
    /// GitHub renders paired starred/unstarred forms and toggles their
    /// visibility, so target the unstarred one explicitly.
    fn star_button_selector(ordinal: usize) -> String {
        format!("{LIST_SELECTOR} li:nth-child({ordinal}) .unstarred button[type=\"submit\"]")
    }

    fn fallback_button_selector(ordinal: usize) -> String {
        format!("{LIST_SELECTOR} li:nth-child({ordinal}) button[aria-label*=\"Star\"]")
    }

    /// Repo name of the first visible row, used to detect page turns.
    async fn first_row_id(&self) -> Result<Option<String>, String> {
        self.eval(&format!(
            r#"(() => {{
                const name = document.querySelector('{LIST_SELECTOR} li a[itemprop="name codeRepository"]');
                return name ? name.textContent.trim() : null;
            }})()"#
        ))
        .await
    }
}

#[async_trait]
impl ListingSource for RepoListing {
    async fn items(&mut self) -> Result<Vec<Item>, String> {
        let names: Vec<String> = self
            .eval(&format!(
                r#"Array.from(document.querySelectorAll('{LIST_SELECTOR} li')).map((li, i) => {{
                    const name = li.querySelector('a[itemprop="name codeRepository"]');
                    return name ? name.textContent.trim() : 'row-' + (i + 1);
                }})"#
            ))
            .await?;
        debug!(count = names.len(), "enumerated repository rows");
        Ok(names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Item::new(name, i + 1))
            .collect())
    }

    async fn already_done(&mut self, item: &Item) -> Result<bool, String> {
        let state: Option<bool> = self
            .eval(&format!(
                r#"(() => {{
                    const li = document.querySelector('{LIST_SELECTOR} li:nth-child({ordinal})');
                    if (!li) return null;
                    const container = li.querySelector('.starring-container');
                    if (container) return container.classList.contains('on');
                    return !!li.querySelector('button[aria-label*="Unstar"]');
                }})()"#,
                ordinal = item.ordinal
            ))
            .await?;
        state.ok_or_else(|| format!("row {} detached from the listing", item.ordinal))
    }

    async fn act(&mut self, item: &Item) -> Result<(), String> {
        let selector = Self::star_button_selector(item.ordinal);
        let button = match self.page.find_element(selector).await {
            Ok(button) => button,
            Err(_) => self
                .page
                .find_element(Self::fallback_button_selector(item.ordinal))
                .await
                .map_err(|e| format!("star control not found: {e}"))?,
        };

        button
            .scroll_into_view()
            .await
            .map_err(|e| format!("scroll failed: {e}"))?;
        button
            .click()
            .await
            .map_err(|e| format!("click failed: {e}"))?;

        // The star flips via AJAX without a reload; give it a moment.
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn reveal_more(&mut self) -> bool {
        let before = match self.first_row_id().await {
            Ok(id) => id,
            Err(_) => return false,
        };

        let next = match self.page.find_element(NEXT_PAGE_SELECTOR).await {
            Ok(link) => link,
            Err(_) => {
                debug!("no next-page link, listing exhausted");
                return false;
            }
        };
        if next.scroll_into_view().await.is_err() || next.click().await.is_err() {
            return false;
        }
        if self.page.wait_for_navigation().await.is_err() {
            return false;
        }
        tokio::time::sleep(self.settle).await;

        match self.first_row_id().await {
            Ok(after) => {
                let turned = after.is_some() && after != before;
                debug!(turned, "next page requested");
                turned
            }
            Err(_) => false,
        }
    }
}
