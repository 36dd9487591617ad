use std::collections::HashMap;

use serde_json::Value;

use crate::models::{
    rounded_mean, AnalysisResult, Grade, IndicatorScore, Mode, DEFAULT_DESCRIPTION, DEFAULT_NOTE,
    DEFAULT_SCORE, DESCRIPTION_MAX_CHARS, NOTE_MAX_CHARS,
};

/// Forces an arbitrary scorer payload into the fixed schema for `mode`.
///
/// Total over any JSON shape: missing or duplicated items, unknown names,
/// wrong-typed scores and absent fields all degrade to defaults instead of
/// errors. Duplicate names resolve last-occurrence-wins, and grades are always
/// re-derived from the clamped score, so a score/grade pair can never disagree.
pub fn normalize_result(mode: Mode, raw: &Value) -> AnalysisResult {
    let by_name = index_items(raw.get("items"));

    let items: Vec<IndicatorScore> = mode
        .indicators()
        .iter()
        .map(|name| match by_name.get(*name) {
            Some(entry) => coerce_item(name, entry),
            None => default_item(name),
        })
        .collect();

    let overall = match raw.get("overall").and_then(coerce_score) {
        Some(value) => clamp_score(value),
        None => rounded_mean(&items),
    };

    let note = match raw.get("note").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => truncate_chars(text.trim(), NOTE_MAX_CHARS),
        _ => DEFAULT_NOTE.to_string(),
    };

    AnalysisResult {
        overall,
        items,
        note,
    }
}

fn index_items<'a>(items: Option<&'a Value>) -> HashMap<&'a str, &'a Value> {
    let mut by_name = HashMap::new();
    let Some(entries) = items.and_then(Value::as_array) else {
        return by_name;
    };
    for entry in entries {
        let Some(name) = entry.get("name").and_then(Value::as_str).map(str::trim) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        // insertion order means a later duplicate replaces an earlier one
        by_name.insert(name, entry);
    }
    by_name
}

fn coerce_item(name: &str, entry: &Value) -> IndicatorScore {
    let score = entry
        .get("score")
        .and_then(coerce_score)
        .map(clamp_score)
        .unwrap_or(DEFAULT_SCORE);

    // the upstream scorer has been seen emitting both spellings
    let raw_description = entry
        .get("description")
        .or_else(|| entry.get("desc"))
        .and_then(Value::as_str);
    let description = match raw_description {
        Some(text) if !text.trim().is_empty() => truncate_chars(text.trim(), DESCRIPTION_MAX_CHARS),
        _ => DEFAULT_DESCRIPTION.to_string(),
    };

    IndicatorScore {
        name: name.to_string(),
        score,
        grade: Grade::from_score(score),
        description,
    }
}

fn default_item(name: &str) -> IndicatorScore {
    IndicatorScore {
        name: name.to_string(),
        score: DEFAULT_SCORE,
        grade: Grade::from_score(DEFAULT_SCORE),
        description: DEFAULT_DESCRIPTION.to_string(),
    }
}

fn coerce_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int)
            } else {
                number.as_f64().map(|float| float.round() as i64)
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .map(|float| float.round() as i64),
        _ => None,
    }
}

fn clamp_score(value: i64) -> i32 {
    value.clamp(0, 100) as i32
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_yields_full_default_schema() {
        let result = normalize_result(Mode::Health, &json!({}));
        assert_eq!(result.items.len(), 10);
        for (item, name) in result.items.iter().zip(Mode::Health.indicators()) {
            assert_eq!(item.name, *name);
            assert_eq!(item.score, DEFAULT_SCORE);
            assert_eq!(item.grade, Grade::B);
            assert_eq!(item.description, DEFAULT_DESCRIPTION);
        }
        assert_eq!(result.overall, DEFAULT_SCORE);
        assert_eq!(result.note, DEFAULT_NOTE);
    }

    #[test]
    fn partial_items_fill_in_and_unknown_names_drop_out() {
        let raw = json!({
            "items": [
                {"name": "心肺功能", "score": 91, "description": "狀態良好"},
                {"name": "未知指標", "score": 12},
                {"name": "代謝效率", "score": 58}
            ]
        });
        let result = normalize_result(Mode::Health, &raw);
        assert_eq!(result.items[0].score, 91);
        assert_eq!(result.items[0].grade, Grade::A);
        assert_eq!(result.items[0].description, "狀態良好");
        assert_eq!(result.items[1].score, 58);
        assert_eq!(result.items[1].grade, Grade::C);
        assert!(result.items[2..].iter().all(|item| item.score == DEFAULT_SCORE));
        assert!(result.items.iter().all(|item| item.name != "未知指標"));
    }

    #[test]
    fn duplicate_names_resolve_last_wins() {
        let raw = json!({
            "items": [
                {"name": "皮膚水合", "score": 20},
                {"name": "皮膚水合", "score": 80}
            ]
        });
        let result = normalize_result(Mode::Skin, &raw);
        assert_eq!(result.items[0].score, 80);
    }

    #[test]
    fn scores_coerce_and_clamp() {
        let raw = json!({
            "items": [
                {"name": "專注力", "score": "88.6"},
                {"name": "情緒穩定", "score": 73.4},
                {"name": "壓力承受", "score": true},
                {"name": "溝通能力", "score": 250},
                {"name": "社交能量", "score": -5}
            ]
        });
        let result = normalize_result(Mode::Psy, &raw);
        assert_eq!(result.items[0].score, 89);
        assert_eq!(result.items[1].score, 73);
        assert_eq!(result.items[2].score, DEFAULT_SCORE);
        assert_eq!(result.items[3].score, 100);
        assert_eq!(result.items[4].score, 0);
    }

    #[test]
    fn supplied_grade_is_ignored_in_favor_of_the_derived_one() {
        let raw = json!({
            "items": [{"name": "財運能量", "score": 40, "grade": "A"}]
        });
        let result = normalize_result(Mode::Fortune, &raw);
        assert_eq!(result.items[0].grade, Grade::D);
    }

    #[test]
    fn descriptions_truncate_on_char_boundaries() {
        let long = "狀".repeat(DESCRIPTION_MAX_CHARS + 15);
        let raw = json!({
            "items": [
                {"name": "心肺功能", "score": 75, "description": long},
                {"name": "代謝效率", "score": 75, "description": "   "}
            ]
        });
        let result = normalize_result(Mode::Health, &raw);
        assert_eq!(result.items[0].description.chars().count(), DESCRIPTION_MAX_CHARS);
        assert_eq!(result.items[1].description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn desc_spelling_is_accepted() {
        let raw = json!({
            "items": [{"name": "光澤度", "score": 66, "desc": "偏暗沉"}]
        });
        let result = normalize_result(Mode::Skin, &raw);
        let item = result.items.iter().find(|item| item.name == "光澤度").unwrap();
        assert_eq!(item.description, "偏暗沉");
    }

    #[test]
    fn overall_clamps_or_falls_back_to_the_mean() {
        let supplied = normalize_result(Mode::Health, &json!({"overall": "150"}));
        assert_eq!(supplied.overall, 100);

        let derived = normalize_result(
            Mode::Health,
            &json!({"items": [{"name": "心肺功能", "score": 100}]}),
        );
        // nine defaults at 70 plus one 100
        assert_eq!(derived.overall, 73);
    }

    #[test]
    fn note_truncates_and_defaults() {
        let long_note = "評".repeat(NOTE_MAX_CHARS * 2);
        let result = normalize_result(Mode::Health, &json!({"note": long_note}));
        assert_eq!(result.note.chars().count(), NOTE_MAX_CHARS);

        let missing = normalize_result(Mode::Health, &json!({"note": 42}));
        assert_eq!(missing.note, DEFAULT_NOTE);
    }

    #[test]
    fn hostile_shapes_never_panic() {
        let shapes = [
            json!(null),
            json!([1, 2, 3]),
            json!({"items": "not an array"}),
            json!({"items": [null, 17, "text", {"score": 88}, {"name": 5}]}),
            json!({"overall": {"nested": true}}),
        ];
        for raw in &shapes {
            let result = normalize_result(Mode::Health, raw);
            assert_eq!(result.items.len(), 10);
            assert!((0..=100).contains(&result.overall));
        }
    }
}
