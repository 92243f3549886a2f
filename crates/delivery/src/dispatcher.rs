//! Batch dispatcher for one delivery channel.

use database::{delivery_queue, destination, Channel, Database, DeliveryQueueEntry};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::DispatcherConfig;
use crate::error::Result;
use crate::sender::{ChannelSender, SendOutcome};

/// Note stored on entries whose recipient has nowhere to deliver to.
pub const NO_DESTINATIONS_NOTE: &str = "no active destinations";

/// What a single run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Entries claimed by this run.
    pub claimed: usize,
    /// Entries delivered to at least one destination.
    pub sent: usize,
    /// Entries where every destination failed.
    pub failed: usize,
    /// Entries marked sent because there was nothing to send to.
    pub skipped: usize,
    /// Destinations deactivated after a permanent failure.
    pub deactivated: usize,
    /// Entries this run could not finish: a store write failed (the entry
    /// is picked up again once its claim expires) or another run took the
    /// claim over.
    pub errors: usize,
}

impl BatchReport {
    /// Add another report's counts to this one.
    pub fn merge(&mut self, other: BatchReport) {
        self.claimed += other.claimed;
        self.sent += other.sent;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.deactivated += other.deactivated;
        self.errors += other.errors;
    }
}

/// Claims pending entries for one channel and sends them.
pub struct Dispatcher<S: ChannelSender> {
    db: Database,
    sender: S,
    config: DispatcherConfig,
}

impl<S: ChannelSender> Dispatcher<S> {
    /// Fails if `config` could let a claim expire in the middle of a send.
    pub fn new(db: Database, sender: S, config: DispatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { db, sender, config })
    }

    /// The channel this dispatcher serves.
    pub fn channel(&self) -> Channel {
        self.sender.channel()
    }

    /// Claim one batch and process every entry in it.
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let channel = self.channel();
        let entries = delivery_queue::claim_batch(
            self.db.pool(),
            channel,
            self.config.batch_size,
            self.config.claim_ttl.as_secs() as i64,
        )
        .await?;

        let mut report = BatchReport {
            claimed: entries.len(),
            ..Default::default()
        };

        if entries.is_empty() {
            debug!(channel = %channel, "Nothing to dispatch");
            return Ok(report);
        }

        for entry in &entries {
            match self.process_entry(entry).await {
                Ok(entry_report) => report.merge(entry_report),
                Err(e) => {
                    error!(channel = %channel, entry_id = %entry.id, error = %e, "Failed to process entry");
                    report.errors += 1;
                }
            }
        }

        info!(
            channel = %channel,
            claimed = report.claimed,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            deactivated = report.deactivated,
            errors = report.errors,
            "Dispatch batch complete"
        );

        Ok(report)
    }

    /// Put this channel's retryable failures back in the queue.
    ///
    /// Only entries with fewer than `max_attempts` attempts are requeued.
    pub async fn requeue_failed(&self, max_attempts: i64) -> Result<u64> {
        let requeued = delivery_queue::requeue_failed(self.db.pool(), self.channel(), max_attempts).await?;
        info!(channel = %self.channel(), requeued, max_attempts, "Requeued failed entries");
        Ok(requeued)
    }

    async fn process_entry(&self, entry: &DeliveryQueueEntry) -> Result<BatchReport> {
        let pool = self.db.pool();
        let mut report = BatchReport::default();

        let Some(claim_token) = entry.claim_token.as_deref() else {
            warn!(entry_id = %entry.id, "Claimed entry has no claim token");
            report.errors += 1;
            return Ok(report);
        };

        let destinations = destination::list_active(pool, &entry.recipient_id, self.channel()).await?;
        if destinations.is_empty() {
            if delivery_queue::mark_sent(pool, &entry.id, claim_token, Some(NO_DESTINATIONS_NOTE)).await? {
                report.skipped += 1;
            } else {
                claim_lost(entry, &mut report);
            }
            return Ok(report);
        }

        let mut delivered = 0usize;
        let mut any_transient = false;
        let mut failures = Vec::new();

        for dest in &destinations {
            // Earlier entries in the batch may have used up most of the TTL.
            if !delivery_queue::renew_claim(pool, &entry.id, claim_token).await? {
                claim_lost(entry, &mut report);
                return Ok(report);
            }

            let outcome = match timeout(self.config.send_timeout, self.sender.send(dest, &entry.content.0)).await {
                Ok(outcome) => outcome,
                Err(_) => SendOutcome::TransientError(format!(
                    "timed out after {}ms",
                    self.config.send_timeout.as_millis()
                )),
            };

            delivery_queue::record_attempt(pool, &entry.id, &dest.id, outcome.outcome(), outcome.error()).await?;

            match &outcome {
                SendOutcome::Delivered => delivered += 1,
                SendOutcome::PermanentlyInvalid(reason) => {
                    if destination::deactivate(pool, &dest.id, reason).await? {
                        report.deactivated += 1;
                        info!(destination_id = %dest.id, reason = %reason, "Destination deactivated");
                    }
                    failures.push(format!("{}: {}", dest.id, reason));
                }
                SendOutcome::TransientError(reason) => {
                    any_transient = true;
                    warn!(entry_id = %entry.id, destination_id = %dest.id, reason = %reason, "Transient send failure");
                    failures.push(format!("{}: {}", dest.id, reason));
                }
            }
        }

        let summary = failures.join("; ");
        if delivered > 0 {
            let note = (!failures.is_empty()).then_some(summary.as_str());
            if delivery_queue::mark_sent(pool, &entry.id, claim_token, note).await? {
                report.sent += 1;
            } else {
                claim_lost(entry, &mut report);
            }
        } else if delivery_queue::mark_failed(pool, &entry.id, claim_token, &summary, any_transient).await? {
            report.failed += 1;
        } else {
            claim_lost(entry, &mut report);
        }

        Ok(report)
    }
}

fn claim_lost(entry: &DeliveryQueueEntry, report: &mut BatchReport) {
    warn!(entry_id = %entry.id, "Claim was taken over by another run; leaving the entry to it");
    report.errors += 1;
}
