use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;
use tracing::warn;

use crate::fallback;
use crate::models::{AnalysisResult, Mode};
use crate::normalize;

/// An external scorer: given the request, returns a loosely structured payload
/// approximating an analysis. Treated as unreliable end to end; callers never
/// see its failures.
pub trait ScoreSource {
    fn fetch(&self, mode: Mode, context: &str, photo_attached: bool) -> anyhow::Result<Value>;
}

/// Reads a raw scorer payload from a JSON file, standing in for whichever
/// upstream model produced it.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ScoreSource for JsonFileSource {
    fn fetch(&self, _mode: Mode, _context: &str, _photo_attached: bool) -> anyhow::Result<Value> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read scores from {}", self.path.display()))?;
        let raw = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", self.path.display()))?;
        Ok(raw)
    }
}

/// Resolves one analysis request: normalize the source payload when a source is
/// present and succeeds, otherwise degrade to the deterministic placeholder.
/// Always completes with a schema-valid result.
pub fn resolve(
    mode: Mode,
    context: &str,
    photo_attached: bool,
    source: Option<&dyn ScoreSource>,
) -> AnalysisResult {
    if let Some(source) = source {
        match source.fetch(mode, context, photo_attached) {
            Ok(raw) => return normalize::normalize_result(mode, &raw),
            Err(error) => {
                warn!("score source failed, falling back to placeholder: {error:#}");
            }
        }
    }

    let seed = fallback::seed_for(mode, context, photo_attached);
    fallback::generate(mode, &seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;
    use uuid::Uuid;

    struct ScriptedSource {
        payload: Value,
    }

    impl ScoreSource for ScriptedSource {
        fn fetch(&self, _mode: Mode, _context: &str, _photo: bool) -> anyhow::Result<Value> {
            Ok(self.payload.clone())
        }
    }

    struct OfflineSource;

    impl ScoreSource for OfflineSource {
        fn fetch(&self, _mode: Mode, _context: &str, _photo: bool) -> anyhow::Result<Value> {
            Err(anyhow!("scorer offline"))
        }
    }

    #[test]
    fn absent_source_uses_the_placeholder() {
        let result = resolve(Mode::Health, "年齡:30", false, None);
        let seed = fallback::seed_for(Mode::Health, "年齡:30", false);
        assert_eq!(result, fallback::generate(Mode::Health, &seed));
    }

    #[test]
    fn successful_source_is_normalized() {
        let source = ScriptedSource {
            payload: json!({"items": [{"name": "心肺功能", "score": 93}]}),
        };
        let result = resolve(Mode::Health, "", false, Some(&source));
        assert_eq!(result.items.len(), 10);
        assert_eq!(result.items[0].score, 93);
    }

    #[test]
    fn failing_source_degrades_to_the_placeholder() {
        let result = resolve(Mode::Skin, "年齡:25", true, Some(&OfflineSource));
        let seed = fallback::seed_for(Mode::Skin, "年齡:25", true);
        assert_eq!(result, fallback::generate(Mode::Skin, &seed));
    }

    #[test]
    fn json_file_source_round_trips() {
        let path = std::env::temp_dir().join(format!("wellness-scores-{}.json", Uuid::new_v4()));
        std::fs::write(&path, r#"{"overall": 88, "items": []}"#).unwrap();

        let source = JsonFileSource::new(path.clone());
        let raw = source.fetch(Mode::Health, "", false).unwrap();
        assert_eq!(raw.get("overall"), Some(&json!(88)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn json_file_source_reports_missing_files() {
        let source = JsonFileSource::new(PathBuf::from("/nonexistent/scores.json"));
        assert!(source.fetch(Mode::Health, "", false).is_err());
    }
}
