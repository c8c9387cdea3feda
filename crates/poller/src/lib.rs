//! The smart poller: drives a status-fetch closure until a terminal state,
//! with an adaptive interval schedule, monotone progress estimation, a hard
//! deadline, and cooperative cancellation.
//!
//! Modeled on the teacher's long-running-operation [`Poller`] abstraction
//! (`src/lro/src/lib.rs`): a trait-free driver function takes ownership of a
//! fetch closure and repeatedly calls it at a single well-defined suspension
//! boundary, rather than the promise-chained per-call timers the source
//! system used (see spec §9).

pub mod policy;
pub mod status;

use gateway_gax::GatewayError;
use policy::{PollErrorBackoff, PollIntervalPolicy};
use status::PollOutcome;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Everything the smart poller needs to know about a single poll loop,
/// besides the fetch closure itself.
#[derive(Clone, Debug)]
pub struct PollSpec {
    /// Number of items the terminal collection must contain.
    pub expected_item_count: usize,
    /// Hard wall-clock deadline for the whole loop, independent of
    /// `max_poll_count`.
    pub deadline: Duration,
}

/// Summary returned alongside the terminal data on success.
#[derive(Clone, Debug)]
pub struct PollSummary {
    pub elapsed: Duration,
    pub poll_count: u32,
}

/// Drives `fetch` until a terminal [`PollOutcome`] is observed, the
/// `cancel` token fires, the poll-count budget in `interval_policy` is
/// exhausted, or `spec.deadline` elapses.
///
/// `fetch` returns a [`PollOutcome`] on a successful round-trip (which may
/// itself report a non-terminal status) or a `GatewayError` for a
/// transient fetch failure; those are retried within the attempt budget.
///
/// `on_progress` is called after every successful fetch with a monotone
/// 0-95 estimate; 95-100 is reserved for the terminal transition so a
/// caller sampling progress never sees a value regress.
pub async fn poll_until_done<D, F, Fut>(
    interval_policy: &dyn PollIntervalPolicy,
    spec: &PollSpec,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(u8),
    mut fetch: F,
) -> Result<(D, PollSummary), GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome<D>, GatewayError>>,
{
    let error_backoff = PollErrorBackoff::default();
    let loop_start = Instant::now();
    let max_poll_count = interval_policy.max_poll_count();
    let mut consecutive_errors: u32 = 0;
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        if loop_start.elapsed() >= spec.deadline {
            return Err(GatewayError::PollTimeout {
                poll_count: attempt,
                elapsed_ms: loop_start.elapsed().as_millis() as u64,
            });
        }
        if attempt >= max_poll_count {
            return Err(GatewayError::PollTimeout {
                poll_count: attempt,
                elapsed_ms: loop_start.elapsed().as_millis() as u64,
            });
        }

        attempt += 1;
        match fetch().await {
            Ok(outcome) => {
                consecutive_errors = 0;
                let status = outcome.status.clone();

                if status.fail_code != 0 {
                    return Err(GatewayError::UpstreamGenerationFailed {
                        fail_code: status.fail_code,
                    });
                }

                // A non-zero finish_time is not sufficient on its own: a
                // record can finalize a partial batch (e.g. 2 of 4 images)
                // before the full item list lands. Never report terminal
                // unless the expected item count has actually been met.
                let is_terminal = status.item_count >= spec.expected_item_count
                    && (status.reports_success() || status.finish_time > 0);

                if is_terminal {
                    on_progress(100);
                    return Ok((
                        outcome.data,
                        PollSummary {
                            elapsed: loop_start.elapsed(),
                            poll_count: attempt,
                        },
                    ));
                }

                let progress = estimate_progress(
                    loop_start.elapsed(),
                    spec.deadline,
                    status.item_count,
                    spec.expected_item_count,
                );
                on_progress(progress);
            }
            Err(err) => {
                consecutive_errors += 1;
                warn!(attempt, consecutive_errors, error = %err, "poll fetch failed, retrying");
            }
        }

        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let steady = interval_policy.steady_interval(attempt + 1);
        let wait = if consecutive_errors > 0 {
            error_backoff.wait_period(loop_start, steady, consecutive_errors)
        } else {
            steady
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
        }
    }
}

/// Combines elapsed-time fraction and item-count fraction into a single
/// monotone estimate, capped at 95 so the terminal transition always
/// supplies the final jump to 100.
fn estimate_progress(
    elapsed: Duration,
    estimated_total: Duration,
    item_count: usize,
    expected: usize,
) -> u8 {
    let time_fraction = if estimated_total.is_zero() {
        0.0
    } else {
        (elapsed.as_secs_f64() / estimated_total.as_secs_f64()).clamp(0.0, 1.0)
    };
    let item_fraction = if expected == 0 {
        0.0
    } else {
        (item_count as f64 / expected as f64).clamp(0.0, 1.0)
    };
    let combined = time_fraction.max(item_fraction);
    (combined * 95.0).round().min(95.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::ImagePollPolicy;
    use status::PollStatus;

    fn spec(expected: usize) -> PollSpec {
        PollSpec {
            expected_item_count: expected,
            deadline: Duration::from_secs(30),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_when_item_count_and_success_observed() {
        let policy = ImagePollPolicy {
            interval: Duration::from_millis(1),
            max_poll_count: 10,
        };
        let cancel = CancellationToken::new();
        let mut calls = 0;
        let mut progresses = Vec::new();

        let (data, summary) = poll_until_done(
            &policy,
            &spec(4),
            &cancel,
            |p| progresses.push(p),
            || {
                calls += 1;
                let call = calls;
                async move {
                    if call < 3 {
                        Ok(PollOutcome {
                            status: PollStatus {
                                state: "processing".into(),
                                item_count: 0,
                                ..Default::default()
                            },
                            data: "partial",
                        })
                    } else {
                        Ok(PollOutcome {
                            status: PollStatus {
                                state: "success".into(),
                                item_count: 4,
                                finish_time: 1234,
                                ..Default::default()
                            },
                            data: "final",
                        })
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(data, "final");
        assert_eq!(summary.poll_count, 3);
        assert_eq!(*progresses.last().unwrap(), 100);
        assert!(progresses.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn upstream_fail_code_is_permanent() {
        let policy = ImagePollPolicy {
            interval: Duration::from_millis(1),
            max_poll_count: 10,
        };
        let cancel = CancellationToken::new();

        let err = poll_until_done(&policy, &spec(4), &cancel, |_| {}, || async {
            Ok(PollOutcome {
                status: PollStatus {
                    fail_code: 5000,
                    ..Default::default()
                },
                data: (),
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::UpstreamGenerationFailed { fail_code: 5000 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_poll_count_is_timeout() {
        let policy = ImagePollPolicy {
            interval: Duration::from_millis(1),
            max_poll_count: 2,
        };
        let cancel = CancellationToken::new();

        let err = poll_until_done(&policy, &spec(4), &cancel, |_| {}, || async {
            Ok(PollOutcome {
                status: PollStatus {
                    state: "processing".into(),
                    ..Default::default()
                },
                data: (),
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, GatewayError::PollTimeout { poll_count: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_at_next_boundary() {
        let policy = ImagePollPolicy {
            interval: Duration::from_millis(50),
            max_poll_count: 100,
        };
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(async move {
            poll_until_done(&policy, &spec(4), &cancel_clone, |_| {}, || async {
                Ok(PollOutcome {
                    status: PollStatus {
                        state: "processing".into(),
                        ..Default::default()
                    },
                    data: (),
                })
            })
            .await
        });

        tokio::time::advance(Duration::from_millis(10)).await;
        cancel.cancel();
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, GatewayError::Cancelled));
    }

    #[test]
    fn progress_estimate_is_capped_below_terminal() {
        let p = estimate_progress(Duration::from_secs(1000), Duration::from_secs(1), 0, 4);
        assert_eq!(p, 95);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_time_alone_does_not_terminate_a_partial_item_count() {
        let policy = ImagePollPolicy {
            interval: Duration::from_millis(1),
            max_poll_count: 10,
        };
        let cancel = CancellationToken::new();
        let mut calls = 0;

        let (data, summary) = poll_until_done(
            &policy,
            &spec(4),
            &cancel,
            |_| {},
            || {
                calls += 1;
                let call = calls;
                async move {
                    if call < 3 {
                        // Upstream stamped finish_time on a partial batch;
                        // this must not read as terminal.
                        Ok(PollOutcome {
                            status: PollStatus {
                                state: "processing".into(),
                                item_count: 2,
                                finish_time: 1234,
                                ..Default::default()
                            },
                            data: "partial",
                        })
                    } else {
                        Ok(PollOutcome {
                            status: PollStatus {
                                state: "processing".into(),
                                item_count: 4,
                                finish_time: 1234,
                                ..Default::default()
                            },
                            data: "final",
                        })
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(data, "final");
        assert_eq!(summary.poll_count, 3);
    }
}
