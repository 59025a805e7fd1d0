use std::collections::HashSet;

use crate::models::{ChannelRecord, Source};

/// Parsed records of one input feed
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: Source,
    pub channels: Vec<ChannelRecord>,
}

impl SourceBatch {
    pub fn new(source: Source, channels: Vec<ChannelRecord>) -> Self {
        Self { source, channels }
    }
}

/// Keep the first record seen for each exact `name`, in input order.
///
/// Names are compared byte-for-byte: no case folding, no trimming.
pub fn dedupe_by_name<I>(records: I) -> Vec<ChannelRecord>
where
    I: IntoIterator<Item = ChannelRecord>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for record in records {
        if seen.insert(record.name.clone()) {
            unique.push(record);
        }
    }

    unique
}

/// Merge per-source batches into one unique collection.
///
/// Batches are concatenated in `priority` order (highest first), then
/// deduplicated by name so the higher-priority source wins. Sources absent
/// from `priority` go last, ordered by their `Source` ordering. The sort is
/// stable, so several batches for the same source keep their given order.
pub fn merge_sources(mut batches: Vec<SourceBatch>, priority: &[Source]) -> Vec<ChannelRecord> {
    let rank = |source: Source| {
        priority
            .iter()
            .position(|&p| p == source)
            .unwrap_or(priority.len())
    };
    batches.sort_by_key(|b| (rank(b.source), b.source));

    let total: usize = batches.iter().map(|b| b.channels.len()).sum();
    let unique = dedupe_by_name(batches.into_iter().flat_map(|b| b.channels));

    tracing::info!(
        "Merged {} channels into {} unique ({} duplicates dropped)",
        total,
        unique.len(),
        total - unique.len()
    );

    unique
}
