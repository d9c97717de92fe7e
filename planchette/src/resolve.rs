//! Locator resolution: candidate enumeration, geometric filtering, ranking,
//! and the implicit-wait poll loop.
//!
//! Resolution runs in two stages. Spatial anchors resolve first, each to
//! exactly one bounding box; a locator whose anchor matches several elements
//! is ambiguous and fails rather than guessing. The target kind's candidates
//! are then filtered against every anchor and ranked by how close they sit,
//! with document order breaking ties.

use std::future::Future;
use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::Client;
use futures::future::{BoxFuture, FutureExt};
use planchette_common::util::ellipsize;
use planchette_common::{PlanchetteError, Result};
use tracing::{debug, trace};

use crate::geometry::{Direction, Rect, PROXIMITY_TOLERANCE};
use crate::locator::Locator;
use crate::query::{self, Query};

/// How long a session keeps re-trying a failed resolution before giving up.
pub const DEFAULT_IMPLICIT_WAIT: Duration = Duration::from_secs(10);

/// Pause between resolution attempts while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Indices of the candidates that satisfy every anchor constraint, in
/// document order.
pub(crate) fn qualifying(
    rects: &[Rect],
    anchors: &[(Direction, Rect)],
    tolerance: f64,
) -> Vec<usize> {
    rects
        .iter()
        .enumerate()
        .filter(|(_, rect)| {
            anchors
                .iter()
                .all(|(direction, anchor)| direction.admits(rect, anchor, tolerance))
        })
        .map(|(index, _)| index)
        .collect()
}

fn total_distance(rect: &Rect, anchors: &[(Direction, Rect)]) -> f64 {
    anchors
        .iter()
        .map(|(direction, anchor)| direction.distance(rect, anchor))
        .sum()
}

/// Pick the qualifying candidate with the smallest summed distance to its
/// anchors. Ties keep the earliest candidate in document order; with no
/// constraints that is simply the first element the driver returned.
pub(crate) fn best_match(rects: &[Rect], anchors: &[(Direction, Rect)]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for index in qualifying(rects, anchors, PROXIMITY_TOLERANCE) {
        let distance = total_distance(&rects[index], anchors);
        let closer = match best {
            None => true,
            Some((_, best_distance)) => distance < best_distance,
        };
        if closer {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

fn not_found(locator: &Locator) -> PlanchetteError {
    PlanchetteError::NotFound(locator.to_string())
}

/// Whether a failed attempt may succeed on a later poll.
///
/// Missing and ambiguous matches clear up as the page settles. Standard
/// driver errors cover stale element references hit mid-measurement.
/// Everything else (transport failures, closed windows, bad configuration)
/// is final.
fn is_retryable(error: &PlanchetteError) -> bool {
    matches!(
        error,
        PlanchetteError::NotFound(_)
            | PlanchetteError::Ambiguous { .. }
            | PlanchetteError::Driver(CmdError::Standard(_))
    )
}

/// Run `attempt` until it succeeds, fails permanently, or the budget runs
/// out. A zero budget means exactly one attempt.
pub(crate) async fn poll_until<T, F, Fut>(
    budget: Duration,
    interval: Duration,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let deadline = Instant::now() + budget;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if !is_retryable(&error) => return Err(error),
            Err(error) => {
                if Instant::now() >= deadline {
                    return Err(error);
                }
                trace!(target: "locator.wait", error = %error, "not ready yet; polling");
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// One resolution context: a driver connection plus the wait budget that
/// applies to lookups made through it.
pub(crate) struct Resolver<'a> {
    client: &'a Client,
    implicit_wait: Duration,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(client: &'a Client, implicit_wait: Duration) -> Self {
        Self {
            client,
            implicit_wait,
        }
    }

    /// Resolve to a single element, polling up to the implicit-wait budget.
    pub(crate) async fn resolve(&self, locator: &Locator) -> Result<Element> {
        let element = poll_until(self.implicit_wait, DEFAULT_POLL_INTERVAL, || {
            self.attempt(locator)
        })
        .await?;
        debug!(target: "locator.resolve", locator = %locator, "resolved");
        Ok(element)
    }

    /// Every qualifying element, evaluated once with no waiting.
    pub(crate) async fn all_matches(&self, locator: &Locator) -> Result<Vec<Element>> {
        let anchors = self.resolve_anchors(locator).await?;
        let query = query::query_for(locator);
        if anchors.is_empty() {
            let elements = self.client.find_all(query.as_fantoccini()).await?;
            debug!(target: "locator.resolve", locator = %locator, count = elements.len(), "matched");
            return Ok(elements);
        }
        let (elements, rects) = self.measured_candidates(&query).await?;
        let mut keep = vec![false; elements.len()];
        for index in qualifying(&rects, &anchors, PROXIMITY_TOLERANCE) {
            keep[index] = true;
        }
        let matched: Vec<Element> = elements
            .into_iter()
            .zip(keep)
            .filter_map(|(element, kept)| kept.then_some(element))
            .collect();
        debug!(target: "locator.resolve", locator = %locator, count = matched.len(), "matched");
        Ok(matched)
    }

    /// Whether at least one element currently matches. Evaluated once with
    /// no waiting; an ambiguous anchor counts as no match.
    pub(crate) async fn exists(&self, locator: &Locator) -> Result<bool> {
        match self.attempt(locator).await {
            Ok(_) => Ok(true),
            Err(PlanchetteError::NotFound(_)) | Err(PlanchetteError::Ambiguous { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// One full resolution pass with no waiting.
    async fn attempt(&self, locator: &Locator) -> Result<Element> {
        let anchors = self.resolve_anchors(locator).await?;
        let query = query::query_for(locator);
        if anchors.is_empty() {
            // No geometry involved, so skip the per-candidate measurements.
            let mut elements = self.client.find_all(query.as_fantoccini()).await?;
            if elements.is_empty() {
                return Err(not_found(locator));
            }
            return Ok(elements.swap_remove(0));
        }
        let (mut elements, rects) = self.measured_candidates(&query).await?;
        match best_match(&rects, &anchors) {
            Some(index) => Ok(elements.swap_remove(index)),
            None => Err(not_found(locator)),
        }
    }

    async fn resolve_anchors(&self, locator: &Locator) -> Result<Vec<(Direction, Rect)>> {
        let mut anchors = Vec::with_capacity(locator.constraints().len());
        for constraint in locator.constraints() {
            let rect = self.resolve_unique(&constraint.anchor).await?;
            anchors.push((constraint.direction, rect));
        }
        Ok(anchors)
    }

    /// Anchors must pin down exactly one element after their own constraints
    /// are applied. Boxed because anchors nest.
    fn resolve_unique<'b>(&'b self, locator: &'b Locator) -> BoxFuture<'b, Result<Rect>> {
        async move {
            let anchors = self.resolve_anchors(locator).await?;
            let query = query::query_for(locator);
            let (_, rects) = self.measured_candidates(&query).await?;
            let matches = qualifying(&rects, &anchors, PROXIMITY_TOLERANCE);
            match matches.len() {
                0 => Err(not_found(locator)),
                1 => Ok(rects[matches[0]]),
                count => Err(PlanchetteError::Ambiguous {
                    target: locator.to_string(),
                    count,
                }),
            }
        }
        .boxed()
    }

    async fn measured_candidates(&self, query: &Query) -> Result<(Vec<Element>, Vec<Rect>)> {
        trace!(
            target: "locator.resolve",
            query = %ellipsize(query.as_str(), 160),
            "enumerating candidates"
        );
        let elements = self.client.find_all(query.as_fantoccini()).await?;
        let mut rects = Vec::with_capacity(elements.len());
        for element in &elements {
            rects.push(Rect::from(element.rectangle().await?));
        }
        Ok((elements, rects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn r(x: f64, y: f64) -> Rect {
        Rect::new(x, y, 50.0, 20.0)
    }

    #[test]
    fn no_constraints_selects_the_first_candidate() {
        let rects = [r(0.0, 0.0), r(0.0, 100.0)];
        assert_eq!(best_match(&rects, &[]), Some(0));
    }

    #[test]
    fn constraints_filter_before_ranking() {
        let anchor = r(100.0, 100.0);
        let rects = [r(100.0, 40.0), r(100.0, 130.0), r(100.0, 200.0)];
        let anchors = [(Direction::Below, anchor)];
        assert_eq!(qualifying(&rects, &anchors, PROXIMITY_TOLERANCE), vec![1, 2]);
        assert_eq!(best_match(&rects, &anchors), Some(1));
    }

    #[test]
    fn nearest_candidate_wins_regardless_of_document_order() {
        let rects = [r(100.0, 300.0), r(100.0, 130.0)];
        let anchors = [(Direction::Below, r(100.0, 100.0))];
        assert_eq!(best_match(&rects, &anchors), Some(1));
    }

    #[test]
    fn equal_distances_keep_document_order() {
        let anchor = r(100.0, 100.0);
        let rects = [r(120.0, 130.0), r(80.0, 130.0)];
        assert_eq!(best_match(&rects, &[(Direction::Below, anchor)]), Some(0));
    }

    #[test]
    fn multiple_constraints_must_all_hold() {
        let anchors = [
            (Direction::Below, r(100.0, 100.0)),
            (Direction::RightOf, r(0.0, 130.0)),
        ];
        // The first candidate sits below the label but has drifted out of
        // the side anchor's vertical band.
        let rects = [r(100.0, 200.0), r(100.0, 130.0)];
        assert_eq!(qualifying(&rects, &anchors, PROXIMITY_TOLERANCE), vec![1]);
        assert_eq!(best_match(&rects, &anchors), Some(1));
    }

    #[test]
    fn summed_distances_rank_multi_constraint_candidates() {
        let anchors = [
            (Direction::Below, r(100.0, 100.0)),
            (Direction::RightOf, r(0.0, 130.0)),
        ];
        // First: 10 below + 50 right = 60. Second: 15 below + 10 right = 25.
        let rects = [r(100.0, 130.0), r(60.0, 135.0)];
        assert_eq!(best_match(&rects, &anchors), Some(1));
    }

    #[test]
    fn best_match_is_none_when_nothing_qualifies() {
        let anchors = [(Direction::Below, r(100.0, 100.0))];
        assert_eq!(best_match(&[r(100.0, 40.0)], &anchors), None);
        assert_eq!(best_match(&[], &[]), None);
    }

    #[test]
    fn retry_policy_distinguishes_transient_from_final_errors() {
        assert!(is_retryable(&PlanchetteError::NotFound("button 'OK'".into())));
        assert!(is_retryable(&PlanchetteError::Ambiguous {
            target: "text 'Price'".into(),
            count: 3,
        }));
        assert!(!is_retryable(&PlanchetteError::Config("bad endpoint".into())));
        assert!(!is_retryable(&PlanchetteError::Timeout {
            waited: Duration::from_secs(1),
        }));
    }

    #[test]
    fn driver_reported_misses_retry_but_transport_loss_is_final() {
        use fantoccini::error::{ErrorStatus, WebDriver};

        let stale = CmdError::Standard(WebDriver::new(
            ErrorStatus::StaleElementReference,
            "element went away",
        ));
        assert!(is_retryable(&PlanchetteError::Driver(stale)));

        let missing = CmdError::Standard(WebDriver::new(
            ErrorStatus::NoSuchElement,
            "no such element",
        ));
        assert!(is_retryable(&PlanchetteError::Driver(missing)));

        let lost = CmdError::Lost(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "socket closed",
        ));
        assert!(!is_retryable(&PlanchetteError::Driver(lost)));
    }

    #[tokio::test]
    async fn poll_retries_until_the_attempt_succeeds() {
        let calls = Cell::new(0);
        let result = poll_until(Duration::from_secs(2), Duration::from_millis(10), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(PlanchetteError::NotFound("thing".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn zero_budget_means_a_single_attempt() {
        let calls = Cell::new(0);
        let result: Result<()> = poll_until(Duration::ZERO, Duration::from_millis(10), || {
            calls.set(calls.get() + 1);
            async { Err(PlanchetteError::NotFound("missing".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(PlanchetteError::NotFound(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn final_errors_stop_the_poll_immediately() {
        let calls = Cell::new(0);
        let result: Result<()> = poll_until(Duration::from_secs(5), Duration::from_millis(10), || {
            calls.set(calls.get() + 1);
            async { Err(PlanchetteError::Config("bad endpoint".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(PlanchetteError::Config(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_the_last_error() {
        let result: Result<()> =
            poll_until(Duration::from_millis(30), Duration::from_millis(10), || async {
                Err(PlanchetteError::NotFound("ghost".to_string()))
            })
            .await;
        match result {
            Err(PlanchetteError::NotFound(target)) => assert_eq!(target, "ghost"),
            other => panic!("expected a not-found error, got {other:?}"),
        }
    }
}
