//! Folding a run's records into category and global summaries.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::models::{
    Category, ExposureRecord, ExposureVerdict, KeywordStatus, KeywordTarget, RecordKey,
    RunSummary,
};
use crate::pipeline::merge::{key_for, latest_by_key};

/// Targets of one keyword within one category, in configuration order.
struct KeywordGroup<'a> {
    category: &'a Category,
    keyword: &'a str,
    priority: &'a str,
    targets: Vec<&'a KeywordTarget>,
}

/// Group targets by (category, keyword), keeping first-appearance order.
fn group_targets(targets: &[KeywordTarget]) -> Vec<KeywordGroup<'_>> {
    let mut order: Vec<KeywordGroup<'_>> = Vec::new();
    let mut index: HashMap<(&Category, &str), usize> = HashMap::new();

    for target in targets {
        let id = (&target.category, target.keyword.as_str());
        match index.get(&id) {
            Some(&i) => order[i].targets.push(target),
            None => {
                index.insert(id, order.len());
                order.push(KeywordGroup {
                    category: &target.category,
                    keyword: &target.keyword,
                    priority: &target.priority,
                    targets: vec![target],
                });
            }
        }
    }
    order
}

/// Integer percent, 0 when the denominator is 0.
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u8
}

/// Percent rounded to two decimals, 0 when the denominator is 0.
fn percent_2dp(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}

/// Order for the needs-attention list: most recently lost first, never-exposed
/// last, keyword name ascending on ties.
pub fn attention_order(a: &KeywordStatus, b: &KeywordStatus) -> Ordering {
    match (a.last_exposed_at, b.last_exposed_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.keyword.cmp(&b.keyword))
}

/// Build one summary over the given targets.
///
/// A published URL without a stored record has never been checked and counts
/// as not exposed with no exposure on record. When several records share a
/// key, the most recently checked one decides.
pub fn summarize(
    scope: &str,
    records: &[ExposureRecord],
    targets: &[KeywordTarget],
    now: DateTime<Utc>,
) -> RunSummary {
    let by_key: HashMap<RecordKey, ExposureRecord> = latest_by_key(records.iter().cloned());

    let groups = group_targets(targets);
    let mut summary = RunSummary {
        scope: scope.to_string(),
        timestamp: now,
        total_keywords: groups.len(),
        exposed: Vec::new(),
        partially_exposed: Vec::new(),
        not_exposed: Vec::new(),
        no_url: Vec::new(),
        exposure_rate: 0,
        publish_rate: 0.0,
    };

    for group in groups {
        let mut exposed_count = 0;
        let mut total_count = 0;
        let mut best: Option<(DateTime<Utc>, &str)> = None;
        let mut first_url: Option<&str> = None;
        let mut latest: Option<&ExposureRecord> = None;

        for target in group.targets.iter().filter(|t| t.has_url()) {
            let record = by_key.get(&key_for(target));
            let verdict = record
                .map(|r| r.last_verdict)
                .unwrap_or(ExposureVerdict::NotExposed);
            if verdict == ExposureVerdict::NoUrl {
                continue;
            }

            total_count += 1;
            first_url.get_or_insert(target.target_url.trim());
            if verdict.is_exposed() {
                exposed_count += 1;
            }
            if let Some(at) = record.and_then(|r| r.last_exposed_at) {
                if best.is_none_or(|(b, _)| at > b) {
                    best = Some((at, target.target_url.trim()));
                }
            }
            if let Some(r) = record {
                if latest.is_none_or(|l| r.last_checked_at > l.last_checked_at) {
                    latest = Some(r);
                }
            }
        }

        let mut status = KeywordStatus {
            category: group.category.clone(),
            keyword: group.keyword.to_string(),
            priority: group.priority.to_string(),
            exposed_count,
            total_count,
            last_exposed_at: None,
            last_exposed_url: None,
            top_cafe: latest.and_then(|r| r.top_cafe.clone()),
        };

        if total_count == 0 {
            summary.no_url.push(status);
        } else if exposed_count == total_count {
            summary.exposed.push(status);
        } else if exposed_count > 0 {
            summary.partially_exposed.push(status);
        } else {
            status.last_exposed_at = best.map(|(at, _)| at);
            status.last_exposed_url = best
                .map(|(_, url)| url)
                .or(first_url)
                .map(str::to_string);
            summary.not_exposed.push(status);
        }
    }

    summary.not_exposed.sort_by(attention_order);

    let published = summary.published_count();
    summary.exposure_rate = percent(summary.exposed.len(), published);
    summary.publish_rate = percent_2dp(published, summary.total_keywords);
    summary
}

/// One summary per category present in `targets`, in category order.
pub fn summarize_by_category(
    records: &[ExposureRecord],
    targets: &[KeywordTarget],
    now: DateTime<Utc>,
) -> Vec<RunSummary> {
    let mut per_category: BTreeMap<&Category, Vec<KeywordTarget>> = BTreeMap::new();
    for target in targets {
        per_category
            .entry(&target.category)
            .or_default()
            .push(target.clone());
    }

    per_category
        .into_iter()
        .map(|(category, targets)| summarize(category.as_str(), records, &targets, now))
        .collect()
}

/// Category summaries plus the global one.
pub fn summarize_all(
    records: &[ExposureRecord],
    targets: &[KeywordTarget],
    now: DateTime<Utc>,
) -> (Vec<RunSummary>, RunSummary) {
    (
        summarize_by_category(records, targets, now),
        summarize("all", records, targets, now),
    )
}

/// Targets published within `days` of `now` whose keyword is not fully exposed.
pub fn recent_unexposed<'a>(
    summary: &RunSummary,
    targets: &'a [KeywordTarget],
    records: &[ExposureRecord],
    now: DateTime<Utc>,
    days: i64,
) -> Vec<(&'a KeywordTarget, ExposureVerdict)> {
    let cutoff = (now - chrono::Duration::days(days)).date_naive();
    let by_key: HashMap<RecordKey, ExposureRecord> = latest_by_key(records.iter().cloned());

    let mut rows: Vec<(&KeywordTarget, ExposureVerdict)> = targets
        .iter()
        .filter(|t| t.has_url())
        .filter(|t| t.published_at.is_some_and(|d| d >= cutoff))
        .filter_map(|t| {
            let verdict = by_key
                .get(&key_for(t))
                .map(|r| r.last_verdict)
                .unwrap_or(ExposureVerdict::NotExposed);
            (!verdict.is_exposed()).then_some((t, verdict))
        })
        .filter(|(t, _)| {
            summary
                .bucket_of(&t.category, &t.keyword)
                .is_some()
        })
        .collect();

    rows.sort_by(|(a, _), (b, _)| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bucket, ExposureVerdict, TopCafeHit};
    use crate::pipeline::merge::merge;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn target(category: &str, keyword: &str, url: &str) -> KeywordTarget {
        KeywordTarget {
            category: Category::from(category),
            keyword: keyword.into(),
            target_url: url.into(),
            priority: String::new(),
            row_reference: String::new(),
            published_at: None,
            author_id: String::new(),
            cafe: String::new(),
        }
    }

    fn record(
        t: &KeywordTarget,
        verdict: ExposureVerdict,
        last_exposed_at: Option<DateTime<Utc>>,
    ) -> ExposureRecord {
        let mut r = merge(None, t, verdict, now());
        r.last_exposed_at = last_exposed_at;
        r
    }

    #[test]
    fn test_partial_exposure() {
        let a = target("cancer", "K", "https://cafe.example.com/x/1");
        let b = target("cancer", "K", "https://cafe.example.com/x/2");
        let records = vec![
            record(&a, ExposureVerdict::Exposed, Some(now())),
            record(&b, ExposureVerdict::NotExposed, Some(now() - Duration::days(4))),
        ];
        let summary = summarize("cancer", &records, &[a, b], now());

        assert_eq!(summary.partially_exposed.len(), 1);
        let status = &summary.partially_exposed[0];
        assert_eq!((status.exposed_count, status.total_count), (1, 2));
        // Partially exposed keywords do not carry a last-exposure value
        assert_eq!(status.last_exposed_at, None);
    }

    #[test]
    fn test_every_keyword_in_exactly_one_bucket() {
        let targets = vec![
            target("cancer", "exposed", "https://blog.example.com/a/1"),
            target("cancer", "partial", "https://blog.example.com/b/1"),
            target("cancer", "partial", "https://blog.example.com/b/2"),
            target("cancer", "missing", "https://blog.example.com/c/1"),
            target("cancer", "unpublished", ""),
            target("cancer", "deleted", "https://blog.example.com/d/1"),
        ];
        let records = vec![
            record(&targets[0], ExposureVerdict::Exposed, Some(now())),
            record(&targets[1], ExposureVerdict::Exposed, Some(now())),
            record(&targets[2], ExposureVerdict::NotExposed, None),
            record(&targets[3], ExposureVerdict::NotExposed, None),
            record(&targets[5], ExposureVerdict::Deleted, None),
        ];
        let summary = summarize("cancer", &records, &targets, now());

        let total = summary.exposed.len()
            + summary.partially_exposed.len()
            + summary.not_exposed.len()
            + summary.no_url.len();
        assert_eq!(total, summary.total_keywords);
        assert_eq!(summary.total_keywords, 5);

        let cancer = Category::from("cancer");
        assert_eq!(summary.bucket_of(&cancer, "exposed"), Some(Bucket::Exposed));
        assert_eq!(summary.bucket_of(&cancer, "partial"), Some(Bucket::PartiallyExposed));
        assert_eq!(summary.bucket_of(&cancer, "missing"), Some(Bucket::NotExposed));
        assert_eq!(summary.bucket_of(&cancer, "unpublished"), Some(Bucket::NoUrl));
        assert_eq!(summary.bucket_of(&cancer, "deleted"), Some(Bucket::NotExposed));
    }

    #[test]
    fn test_rates() {
        let targets = vec![
            target("cream", "a", "https://blog.example.com/a/1"),
            target("cream", "b", "https://blog.example.com/b/1"),
            target("cream", "c", "https://blog.example.com/c/1"),
            target("cream", "d", ""),
        ];
        let records = vec![
            record(&targets[0], ExposureVerdict::Exposed, Some(now())),
            record(&targets[1], ExposureVerdict::Exposed, Some(now())),
            record(&targets[2], ExposureVerdict::NotExposed, None),
        ];
        let summary = summarize("cream", &records, &targets, now());
        assert_eq!(summary.exposure_rate, 67);
        assert_eq!(summary.publish_rate, 75.0);
    }

    #[test]
    fn test_rates_zero_without_published_urls() {
        let targets = vec![target("cream", "a", ""), target("cream", "b", "")];
        let summary = summarize("cream", &[], &targets, now());
        assert_eq!(summary.exposure_rate, 0);
        assert_eq!(summary.publish_rate, 0.0);

        let empty = summarize("cream", &[], &[], now());
        assert_eq!(empty.exposure_rate, 0);
        assert_eq!(empty.publish_rate, 0.0);
    }

    #[test]
    fn test_unchecked_url_counts_as_not_exposed() {
        let targets = vec![target("cream", "fresh", "https://blog.example.com/a/1")];
        let summary = summarize("cream", &[], &targets, now());
        assert_eq!(summary.not_exposed.len(), 1);
        assert_eq!(summary.not_exposed[0].last_exposed_at, None);
        assert_eq!(
            summary.not_exposed[0].last_exposed_url.as_deref(),
            Some("https://blog.example.com/a/1")
        );
    }

    #[test]
    fn test_attention_ranking() {
        let targets = vec![
            target("cancer", "never", "https://blog.example.com/n/1"),
            target("cancer", "old", "https://blog.example.com/o/1"),
            target("cancer", "recent", "https://blog.example.com/r/1"),
            target("cancer", "also-recent", "https://blog.example.com/s/1"),
        ];
        let recent = now() - Duration::days(1);
        let records = vec![
            record(&targets[0], ExposureVerdict::NotExposed, None),
            record(&targets[1], ExposureVerdict::NotExposed, Some(now() - Duration::days(9))),
            record(&targets[2], ExposureVerdict::NotExposed, Some(recent)),
            record(&targets[3], ExposureVerdict::Deleted, Some(recent)),
        ];
        let summary = summarize("cancer", &records, &targets, now());
        let order: Vec<&str> = summary
            .not_exposed
            .iter()
            .map(|s| s.keyword.as_str())
            .collect();
        assert_eq!(order, vec!["also-recent", "recent", "old", "never"]);
    }

    #[test]
    fn test_not_exposed_attaches_latest_exposure_url() {
        let a = target("cancer", "K", "https://blog.example.com/a/1");
        let b = target("cancer", "K", "https://blog.example.com/a/2");
        let records = vec![
            record(&a, ExposureVerdict::NotExposed, Some(now() - Duration::days(5))),
            record(&b, ExposureVerdict::NotExposed, Some(now() - Duration::days(2))),
        ];
        let summary = summarize("cancer", &records, &[a, b], now());
        let status = &summary.not_exposed[0];
        assert_eq!(status.last_exposed_at, Some(now() - Duration::days(2)));
        assert_eq!(
            status.last_exposed_url.as_deref(),
            Some("https://blog.example.com/a/2")
        );
    }

    #[test]
    fn test_by_category_and_global() {
        let targets = vec![
            target("cream", "a", "https://blog.example.com/a/1"),
            target("cancer", "a", "https://blog.example.com/b/1"),
        ];
        let records = vec![record(&targets[0], ExposureVerdict::Exposed, Some(now()))];
        let (per_category, global) = summarize_all(&records, &targets, now());

        assert_eq!(per_category.len(), 2);
        assert_eq!(per_category[0].scope, "cancer");
        assert_eq!(per_category[0].exposure_rate, 0);
        assert_eq!(per_category[1].scope, "cream");
        assert_eq!(per_category[1].exposure_rate, 100);
        assert_eq!(global.total_keywords, 2);
        assert_eq!(global.exposure_rate, 50);
    }

    #[test]
    fn test_recent_unexposed() {
        let mut fresh = target("cancer", "fresh", "https://blog.example.com/f/1");
        fresh.published_at = NaiveDate::from_ymd_opt(2026, 3, 8);
        let mut stale = target("cancer", "stale", "https://blog.example.com/s/1");
        stale.published_at = NaiveDate::from_ymd_opt(2026, 2, 1);
        let mut shown = target("cancer", "shown", "https://blog.example.com/e/1");
        shown.published_at = NaiveDate::from_ymd_opt(2026, 3, 9);

        let targets = vec![fresh, stale, shown];
        let records = vec![
            record(&targets[0], ExposureVerdict::Deleted, None),
            record(&targets[1], ExposureVerdict::NotExposed, None),
            record(&targets[2], ExposureVerdict::Exposed, Some(now())),
        ];
        let summary = summarize("cancer", &records, &targets, now());
        let rows = recent_unexposed(&summary, &targets, &records, now(), 7);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.keyword, "fresh");
        assert_eq!(rows[0].1, ExposureVerdict::Deleted);
    }

    #[test]
    fn test_stale_copy_under_old_category_does_not_count_as_exposed() {
        let moved = target("cancer", "K", "https://cafe.example.com/x/1");
        let mut stale = record(&moved, ExposureVerdict::Exposed, Some(now() - Duration::days(2)));
        stale.category = Category::from("cream");
        stale.last_checked_at = now() - Duration::days(2);
        let fresh = record(&moved, ExposureVerdict::NotExposed, None);

        // Order must not matter
        for records in [vec![fresh.clone(), stale.clone()], vec![stale, fresh]] {
            let summary = summarize("all", &records, std::slice::from_ref(&moved), now());
            assert_eq!(
                summary.bucket_of(&moved.category, "K"),
                Some(Bucket::NotExposed)
            );
            assert_eq!(
                summary.not_exposed[0].last_exposed_at,
                Some(now() - Duration::days(2))
            );
        }
    }

    #[test]
    fn test_status_carries_top_cafe() {
        let t = target("cream", "K", "https://blog.example.com/a/1");
        let mut r = record(&t, ExposureVerdict::NotExposed, None);
        r.top_cafe = Some(TopCafeHit {
            position: 4,
            url: "https://cafe.example.com/momcafe/8".into(),
            cafe_id: "momcafe".into(),
            cafe_name: "맘카페".into(),
        });
        let summary = summarize("cream", &[r], &[t], now());
        let hit = summary.not_exposed[0].top_cafe.as_ref().unwrap();
        assert_eq!(hit.position, 4);
        assert_eq!(hit.cafe_name, "맘카페");
    }
}
