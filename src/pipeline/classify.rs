//! Exposure classification of one target against one scrape.

use crate::models::{CafeInfo, DeletionPolicy, ExposureVerdict, KeywordTarget, TopCafeHit};
use crate::utils::url::{cafe_id, normalize};

/// Classifier applying a fixed policy for inconclusive deletion probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    policy: DeletionPolicy,
}

impl Classifier {
    pub fn new(policy: DeletionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DeletionPolicy {
        self.policy
    }

    /// Resolve a three-valued probe outcome into "deleted or not".
    ///
    /// `Skip` is resolved like `AssumeAlive` here; skipping the target
    /// entirely is up to the caller (see [`Classifier::skips`]).
    pub fn is_deleted(&self, probe: Option<bool>) -> bool {
        match probe {
            Some(deleted) => deleted,
            None => self.policy == DeletionPolicy::AssumeDeleted,
        }
    }

    /// Whether a probe outcome means the target is left out of this run.
    pub fn skips(&self, probe: Option<bool>) -> bool {
        probe.is_none() && self.policy == DeletionPolicy::Skip
    }

    /// Classify a target given the current result list and the deletion probe.
    pub fn classify(
        &self,
        target: &KeywordTarget,
        result_urls: &[String],
        is_deleted: Option<bool>,
    ) -> ExposureVerdict {
        if !target.has_url() {
            return ExposureVerdict::NoUrl;
        }
        if self.is_deleted(is_deleted) {
            return ExposureVerdict::Deleted;
        }

        let key = normalize(target.target_url.trim());
        if result_urls.iter().any(|u| normalize(u) == key) {
            ExposureVerdict::Exposed
        } else {
            ExposureVerdict::NotExposed
        }
    }
}

/// Classify with the default policy (inconclusive probes count as alive).
pub fn classify(
    target: &KeywordTarget,
    result_urls: &[String],
    is_deleted: Option<bool>,
) -> ExposureVerdict {
    Classifier::default().classify(target, result_urls, is_deleted)
}

/// First result that belongs to one of `cafes`, found whether or not the
/// target post itself is exposed.
pub fn find_top_cafe(result_urls: &[String], cafes: &[CafeInfo]) -> Option<TopCafeHit> {
    if cafes.is_empty() {
        return None;
    }
    result_urls.iter().enumerate().find_map(|(idx, url)| {
        let id = cafe_id(url)?;
        let cafe = cafes.iter().find(|c| c.id.trim().eq_ignore_ascii_case(&id))?;
        Some(TopCafeHit {
            position: u32::try_from(idx + 1).ok()?,
            url: url.clone(),
            cafe_id: id,
            cafe_name: cafe.display_name().to_string(),
        })
    })
}
