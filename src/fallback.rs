use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::models::{
    rounded_mean, AnalysisResult, Grade, IndicatorScore, Mode, DEFAULT_DESCRIPTION, DEFAULT_NOTE,
};

const FALLBACK_SCORE_MIN: i32 = 62;
const FALLBACK_SCORE_MAX: i32 = 90;

/// Canonical seed string for one request, e.g. `health|年齡:30|no_photo`.
pub fn seed_for(mode: Mode, context: &str, photo_attached: bool) -> String {
    let photo = if photo_attached { "photo" } else { "no_photo" };
    format!("{}|{}|{}", mode.key(), context, photo)
}

fn seed_to_u64(seed: &str) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Placeholder analysis used whenever no external scorer is available or it
/// fails. Identical seed strings always yield identical results; this function
/// cannot fail.
pub fn generate(mode: Mode, seed: &str) -> AnalysisResult {
    let mut rng = StdRng::seed_from_u64(seed_to_u64(seed));

    let items: Vec<IndicatorScore> = mode
        .indicators()
        .iter()
        .map(|name| {
            let score = rng.gen_range(FALLBACK_SCORE_MIN..=FALLBACK_SCORE_MAX);
            IndicatorScore {
                name: (*name).to_string(),
                score,
                grade: Grade::from_score(score),
                description: DEFAULT_DESCRIPTION.to_string(),
            }
        })
        .collect();

    let overall = rounded_mean(&items);

    AnalysisResult {
        overall,
        items,
        note: DEFAULT_NOTE.to_string(),
    }
}
