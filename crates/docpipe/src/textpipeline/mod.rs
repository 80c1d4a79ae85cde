//! The seven-stage text cleaning and deduplication pipeline.
//!
//! Each stage is a pure function over the previous stage's output, chained
//! the way a `Cow<str>`-based text transform usually is: allocate only when
//! a stage actually changes something.

mod noise;
mod simhash;
mod unicode_repair;

use crate::config::PipelineConfig;
use crate::dedup::{sha256_text, DedupStore};
use crate::types::{PipelineOutcome, PipelineStats};
use regex::Regex;
use std::sync::Arc;

pub struct TextPipeline {
    store: Arc<DedupStore>,
    min_paragraph_len: usize,
    simhash_distance_threshold: u32,
    enable_near_duplicate: bool,
    custom_patterns: Vec<Regex>,
}

impl TextPipeline {
    pub fn new(store: Arc<DedupStore>, config: &PipelineConfig) -> Self {
        let custom_patterns = config
            .custom_noise_patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            store,
            min_paragraph_len: config.min_paragraph_len,
            simhash_distance_threshold: config.simhash_distance_threshold,
            enable_near_duplicate: config.enable_near_duplicate,
            custom_patterns,
        }
    }

    pub async fn process(&self, text: &str, _doc_name: &str) -> PipelineOutcome {
        let mut stats = PipelineStats { original_length: text.chars().count(), ..Default::default() };

        let repaired = unicode_repair::repair(text);
        let (noise_removed, noise_count) = noise::remove_noise(&repaired, &self.custom_patterns);
        stats.noise_removed_count = noise_count;

        // Empty documents (or documents reduced to nothing by noise removal)
        // never enter the fingerprint store: marking an empty fingerprint
        // would make every subsequent empty document a false duplicate.
        if !noise_removed.trim().is_empty() {
            let fingerprint = sha256_text(&noise_removed);
            if self.store.is_doc_seen(&fingerprint).await {
                stats.normalized_length = noise_removed.chars().count();
                return PipelineOutcome {
                    success: false,
                    doc_duplicate: true,
                    cleaned_text: noise_removed,
                    message: "document is a duplicate of a previously processed document".to_string(),
                    stats,
                };
            }
            self.store.mark_doc(&fingerprint).await;
        }

        let raw_paragraphs: Vec<&str> = split_paragraphs(&noise_removed);
        stats.paragraphs_original = raw_paragraphs.len();

        let mut kept = Vec::new();
        for paragraph in raw_paragraphs {
            let trimmed = paragraph.trim();
            if trimmed.chars().count() < self.min_paragraph_len {
                stats.paragraphs_too_short += 1;
                continue;
            }

            let para_hash = sha256_text(trimmed);
            if self.store.is_para_seen(&para_hash).await {
                stats.paragraphs_exact_dup += 1;
                continue;
            }

            if self.enable_near_duplicate {
                let candidate_simhash = simhash::compute(trimmed);
                let existing = self.store.all_para_simhash().await;
                let is_near_dup = existing
                    .values()
                    .any(|&seen| simhash::hamming_distance(candidate_simhash, seen) <= self.simhash_distance_threshold);
                if is_near_dup {
                    stats.paragraphs_near_dup += 1;
                    continue;
                }
                self.store.mark_para(&para_hash, Some(candidate_simhash)).await;
            } else {
                self.store.mark_para(&para_hash, None).await;
            }

            kept.push(trimmed);
        }

        stats.paragraphs_after_dedup = kept.len();
        let cleaned_text = kept.join("\n\n");
        stats.normalized_length = cleaned_text.chars().count();

        PipelineOutcome {
            success: true,
            doc_duplicate: false,
            cleaned_text,
            message: "processed".to_string(),
            stats,
        }
    }
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    static SPLIT: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
    SPLIT.split(text).filter(|p| !p.trim().is_empty()).collect()
}
