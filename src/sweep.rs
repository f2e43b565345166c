//! The scan-and-act loop.
//!
//! Walks a paginated, possibly shifting listing of items and applies an
//! action to each item at most once per run, skipping items that are
//! already in the target state. The loop is idempotent across runs: a
//! second run over an unchanged listing performs zero actions, because
//! every marker it reads is already set. Failure recovery is deliberately
//! rerun-based — a failed action is recorded and skipped for the rest of
//! the run, and the next invocation of the whole program picks it up
//! again since its done-marker is still unset.
//!
//! Everything page-specific (selectors, markers, pagination mechanics)
//! lives behind [`ListingSource`]; this module never touches the browser.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Error;

/// One entity in the listing, discovered during a pass and discarded with
/// the run. The id only needs to be stable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    /// Run-stable identifier (e.g. the repository name).
    pub id: String,
    /// Position in the listing at discovery time, 1-based.
    pub ordinal: usize,
}

impl Item {
    pub fn new(id: impl Into<String>, ordinal: usize) -> Self {
        Self {
            id: id.into(),
            ordinal,
        }
    }
}

/// The four operations the loop consumes. Implementations own every
/// DOM/selector/network detail; the loop sees ids and booleans.
#[async_trait]
pub trait ListingSource {
    /// Enumerate the items currently visible or realized in the listing.
    /// The set may grow or shift between calls.
    async fn items(&mut self) -> Result<Vec<Item>, String>;

    /// Whether the action was already applied to this item. Inspection
    /// only — must not change any state.
    async fn already_done(&mut self, item: &Item) -> Result<bool, String>;

    /// Apply the action to this item. Externally visible on success;
    /// failures are per-item and non-fatal to the run.
    async fn act(&mut self, item: &Item) -> Result<(), String>;

    /// Request the next page or batch. `false` means the listing is
    /// exhausted; an implementation that cannot load more reports `false`
    /// rather than erroring.
    async fn reveal_more(&mut self) -> bool;
}

/// Outcome of one run over the listing.
#[derive(Debug, Default, Clone)]
pub struct SweepReport {
    /// Ids acted on, in listing order.
    pub acted: Vec<String>,
    /// Ids skipped because their marker was already set.
    pub skipped: Vec<String>,
    /// Ids whose action or classification failed, with the failure text.
    pub failed: Vec<(String, String)>,
    /// Number of full passes over the listing.
    pub passes: usize,
}

impl SweepReport {
    /// Total distinct items observed this run.
    pub fn total_seen(&self) -> usize {
        self.acted.len() + self.skipped.len() + self.failed.len()
    }

    /// True when every observed item ended up done or already-done.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the loop to completion over `source`, sleeping `delay` after every
/// successful action.
///
/// Termination: the loop ends once a pass surfaces no actions and no
/// failures and `reveal_more` reports nothing further, or once two
/// consecutive passes surface zero unseen items (a pager that claims more
/// is available but never produces it does not spin forever).
///
/// A failing `items()` enumeration is fatal: without it no progress is
/// possible, so it propagates rather than being swallowed per-item.
pub async fn run<S>(source: &mut S, delay: Duration) -> Result<SweepReport, Error>
where
    S: ListingSource + ?Sized,
{
    let mut processed: HashSet<String> = HashSet::new();
    let mut report = SweepReport::default();
    let mut stagnant_passes = 0usize;

    loop {
        let items = source.items().await.map_err(Error::Enumerate)?;
        report.passes += 1;

        let mut acted_this_pass = 0usize;
        let mut failed_this_pass = 0usize;
        let mut unseen_this_pass = 0usize;

        for item in items {
            if !processed.insert(item.id.clone()) {
                continue;
            }
            unseen_this_pass += 1;

            match source.already_done(&item).await {
                Ok(true) => {
                    debug!(id = %item.id, "already done, skipping");
                    report.skipped.push(item.id);
                }
                Ok(false) => match source.act(&item).await {
                    Ok(()) => {
                        debug!(id = %item.id, "action applied");
                        report.acted.push(item.id);
                        acted_this_pass += 1;
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        warn!(id = %item.id, error = %e, "action failed, continuing");
                        report.failed.push((item.id, e));
                        failed_this_pass += 1;
                    }
                },
                Err(e) => {
                    warn!(id = %item.id, error = %e, "classification failed, continuing");
                    report.failed.push((item.id, e));
                    failed_this_pass += 1;
                }
            }
        }

        if unseen_this_pass == 0 {
            stagnant_passes += 1;
            if stagnant_passes >= 2 {
                debug!("listing stagnant across passes, terminating");
                break;
            }
        } else {
            stagnant_passes = 0;
        }

        // A pass that produced work means the listing may have shifted
        // under us; re-enumerate before asking for more.
        if acted_this_pass > 0 || failed_this_pass > 0 {
            continue;
        }

        if !source.reveal_more().await {
            debug!("listing exhausted");
            break;
        }
    }

    Ok(report)
}

/// Wrapper that reports what would be acted on without acting. Everything
/// else passes through, so a dry run still walks the full listing.
pub struct DryRun<S>(pub S);

#[async_trait]
impl<S: ListingSource + Send> ListingSource for DryRun<S> {
    async fn items(&mut self) -> Result<Vec<Item>, String> {
        self.0.items().await
    }

    async fn already_done(&mut self, item: &Item) -> Result<bool, String> {
        self.0.already_done(item).await
    }

    async fn act(&mut self, item: &Item) -> Result<(), String> {
        debug!(id = %item.id, "dry run, action suppressed");
        Ok(())
    }

    async fn reveal_more(&mut self) -> bool {
        self.0.reveal_more().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal scripted source: one page, fixed markers.
    struct Fixed {
        done: Vec<bool>,
        acted: Vec<usize>,
    }

    #[async_trait]
    impl ListingSource for Fixed {
        async fn items(&mut self) -> Result<Vec<Item>, String> {
            Ok((0..self.done.len())
                .map(|i| Item::new(format!("item-{i}"), i + 1))
                .collect())
        }

        async fn already_done(&mut self, item: &Item) -> Result<bool, String> {
            Ok(self.done[item.ordinal - 1])
        }

        async fn act(&mut self, item: &Item) -> Result<(), String> {
            self.acted.push(item.ordinal);
            self.done[item.ordinal - 1] = true;
            Ok(())
        }

        async fn reveal_more(&mut self) -> bool {
            false
        }
    }

    #[tokio::test(start_paused = true)]
    async fn acts_only_on_undone_items_in_order() {
        let mut source = Fixed {
            done: vec![false, true, false, true, false],
            acted: Vec::new(),
        };
        let report = run(&mut source, Duration::from_millis(100)).await.unwrap();
        assert_eq!(source.acted, vec![1, 3, 5]);
        assert_eq!(report.acted, vec!["item-0", "item-2", "item-4"]);
        assert_eq!(report.skipped, vec!["item-1", "item-3"]);
        assert!(report.is_clean());
        assert_eq!(report.total_seen(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn dry_run_leaves_markers_untouched() {
        let mut source = DryRun(Fixed {
            done: vec![false, false],
            acted: Vec::new(),
        });
        let report = run(&mut source, Duration::ZERO).await.unwrap();
        assert_eq!(report.acted.len(), 2);
        assert!(source.0.acted.is_empty());
        assert_eq!(source.0.done, vec![false, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn enumeration_failure_is_fatal() {
        struct Broken;

        #[async_trait]
        impl ListingSource for Broken {
            async fn items(&mut self) -> Result<Vec<Item>, String> {
                Err("listing container missing".into())
            }
            async fn already_done(&mut self, _: &Item) -> Result<bool, String> {
                unreachable!()
            }
            async fn act(&mut self, _: &Item) -> Result<(), String> {
                unreachable!()
            }
            async fn reveal_more(&mut self) -> bool {
                unreachable!()
            }
        }

        let err = run(&mut Broken, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, Error::Enumerate(_)));
    }
}
