//! Per-run deduplication
//!
//! Records sharing a [`DedupKey`] collapse into one episode. The first
//! occurrence keeps its place in the output order; later ones are either
//! dropped (keep-first) or folded into it (aggregate). Every collapsed record
//! is reported as a [`DuplicateLogEntry`].

use std::collections::HashMap;

use podstats_common::DedupPolicy;

use crate::models::{eq_full, DedupKey, DuplicateLogEntry, NormalizedRecord};

/// Unique episodes in first-seen order plus the ledger of collapsed rows
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub episodes: Vec<NormalizedRecord>,
    pub duplicates: Vec<DuplicateLogEntry>,
}

/// Streaming deduplicator for one import run
#[derive(Debug)]
pub struct Deduplicator {
    policy: DedupPolicy,
    index: HashMap<DedupKey, usize>,
    episodes: Vec<NormalizedRecord>,
    /// Running (sum, count) of avg bandwidth per episode, aggregate only
    avg_bandwidth: Vec<(f64, usize)>,
    duplicates: Vec<DuplicateLogEntry>,
}

impl Deduplicator {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            index: HashMap::new(),
            episodes: Vec::new(),
            avg_bandwidth: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    /// Deduplicate a whole batch
    pub fn process(
        policy: DedupPolicy,
        records: impl IntoIterator<Item = NormalizedRecord>,
    ) -> DedupOutcome {
        let mut dedup = Self::new(policy);
        for record in records {
            dedup.push(record);
        }
        dedup.finish()
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        let key = record.key();

        let existing = self.index.get(&key).copied();
        let Some(slot) = existing else {
            self.index.insert(key, self.episodes.len());
            self.avg_bandwidth.push((record.avg_bandwidth, 1));
            self.episodes.push(record);
            return;
        };

        let kept = &mut self.episodes[slot];
        self.duplicates.push(DuplicateLogEntry {
            key_url: key.url,
            sheet: record.sheet.clone(),
            row: record.source_row,
            url: record.url.clone(),
            full: record.full,
            partial: record.partial,
            avg_bandwidth: record.avg_bandwidth,
            total_bandwidth: record.total_bandwidth,
            eq_full: record.eq_full,
            kept_row: kept.source_row,
            policy: self.policy.to_string(),
        });

        if self.policy == DedupPolicy::Aggregate {
            kept.full = kept.full.saturating_add(record.full);
            kept.partial = kept.partial.saturating_add(record.partial);
            kept.total_bandwidth += record.total_bandwidth;
            kept.eq_full = eq_full(kept.full, kept.partial);

            let (sum, count) = &mut self.avg_bandwidth[slot];
            *sum += record.avg_bandwidth;
            *count += 1;
        }
    }

    pub fn finish(mut self) -> DedupOutcome {
        if self.policy == DedupPolicy::Aggregate {
            for (episode, (sum, count)) in self.episodes.iter_mut().zip(&self.avg_bandwidth) {
                episode.avg_bandwidth = sum / *count as f64;
            }
        }

        tracing::debug!(
            unique = self.episodes.len(),
            duplicates = self.duplicates.len(),
            policy = %self.policy,
            "Deduplication complete"
        );

        DedupOutcome {
            episodes: self.episodes,
            duplicates: self.duplicates,
        }
    }
}
