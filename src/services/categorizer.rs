use crate::models::{CategorizedChannels, CategoryBucket, ChannelRecord, Taxonomy};

/// Partition channels into taxonomy buckets plus the catch-all.
///
/// Each channel goes to the first category (taxonomy order) whose keywords
/// match its lower-cased name or group. If that bucket is already full the
/// channel is dropped from every bucket; it does not fall through to later
/// categories or the catch-all. Channels matching nothing go to the
/// catch-all while it has room. `channels` itself is never modified, so it
/// still serves the "all channels" view.
pub fn categorize(channels: &[ChannelRecord], taxonomy: &Taxonomy) -> CategorizedChannels {
    let mut buckets: Vec<CategoryBucket> = taxonomy
        .categories()
        .iter()
        .map(|rule| CategoryBucket::new(&rule.name, rule.capacity))
        .collect();
    let catch_all_idx = buckets.len();
    buckets.push(CategoryBucket::new(
        &taxonomy.catch_all().name,
        taxonomy.catch_all().capacity,
    ));

    let mut dropped = 0usize;

    for (idx, channel) in channels.iter().enumerate() {
        let lower_name = channel.name.to_lowercase();
        let lower_group = channel.group.as_deref().unwrap_or("").to_lowercase();

        let target = taxonomy
            .categories()
            .iter()
            .position(|rule| rule.matches(&lower_name, &lower_group))
            .unwrap_or(catch_all_idx);

        let bucket = &mut buckets[target];
        if bucket.is_full() {
            dropped += 1;
        } else {
            bucket.channels.push(idx);
        }
    }

    for bucket in buckets.iter().filter(|b| !b.is_empty()) {
        tracing::debug!("Category {}: {} channels", bucket.name, bucket.len());
    }
    if dropped > 0 {
        tracing::debug!("{} channels left out of categories (bucket full)", dropped);
    }

    CategorizedChannels { buckets }
}
