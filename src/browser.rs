//! Browser session management over chromiumoxide (CDP).
//!
//! One [`Session`] per run: launch Chromium against a persistent profile
//! directory so cookies and login state survive between runs, drive a
//! single page, and close everything on the way out regardless of how the
//! run ended. The first run is expected to be headful so the user can log
//! in by hand; every later run rides the saved session.

pub mod profiles;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Error;

/// How often to re-poll while waiting for an element to appear.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launch parameters for one session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Persistent profile directory (cookies, local storage, login state).
    pub user_data_dir: PathBuf,
    /// Run without a visible window. Keep headful for the login run.
    pub headless: bool,
    /// Browser window size.
    pub window: (u32, u32),
}

/// A live browser with one page and the CDP event pump running.
pub struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl Session {
    /// Launch the browser with the given profile and open a blank page.
    ///
    /// Failure here is the fatal startup class: nothing has been acted on
    /// yet and the caller should abort the run.
    pub async fn launch(opts: &LaunchOptions) -> Result<Self, Error> {
        debug!(profile = %opts.user_data_dir.display(), headless = opts.headless, "launching browser");

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&opts.user_data_dir)
            .window_size(opts.window.0, opts.window.1)
            .viewport(None);
        if !opts.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| Error::Launch(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Launch(e.to_string()))?;

        // The handler stream must be drained for the browser to function.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Launch(format!("opening page: {e}")))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Navigate the page and wait for the navigation to complete.
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<(), Error> {
        debug!(url, "navigating");
        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| Error::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| Error::Navigation(e.to_string()))?;
            Ok::<_, Error>(())
        };
        tokio::time::timeout(timeout, nav)
            .await
            .map_err(|_| Error::Navigation(format!("timed out after {timeout:?} loading {url}")))?
    }

    /// Poll until `selector` matches an element, or fail after `timeout`.
    /// Dynamic listings render after the navigation settles, so a plain
    /// goto is not enough.
    pub async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), Error> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Navigation(format!(
                    "element {selector} did not appear within {timeout:?}"
                )));
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    /// Handle to the session's page. `Page` is cheaply cloneable.
    pub fn page(&self) -> Page {
        self.page.clone()
    }

    /// Close the page and the browser. Best-effort: a browser that is
    /// already gone is not an error at shutdown.
    pub async fn close(self) {
        debug!("closing browser session");
        let Self {
            mut browser,
            page,
            handler,
        } = self;
        let _ = page.close().await;
        let _ = browser.close().await;
        let _ = browser.wait().await;
        handler.abort();
    }
}
