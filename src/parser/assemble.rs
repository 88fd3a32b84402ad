use super::classify::{GENERAL, GENERAL_TOPIC};
use super::{DraftLesson, LessonRecord};

/// Fixed default values applied to every retained record. Any field still
/// empty after extraction is replaced by its default, so downstream consumers
/// can rely on every field being non-empty.
#[derive(Debug, Clone)]
pub struct RecordDefaults {
    pub lesson_number: u32,
    pub title: String,
    pub strand: String,
    pub sub_strand: String,
    pub learning_outcomes: Vec<String>,
    pub core_competencies: Vec<String>,
    pub key_inquiry_question: String,
    pub learning_resources: Vec<String>,
    pub activities: Vec<String>,
    pub assessment: String,
    pub reflection: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        RecordDefaults {
            lesson_number: 1,
            title: "Untitled Lesson".to_string(),
            strand: GENERAL.to_string(),
            sub_strand: GENERAL_TOPIC.to_string(),
            learning_outcomes: vec![
                "By the end of the lesson, learners will be able to understand the topic."
                    .to_string(),
            ],
            core_competencies: vec!["Critical thinking and problem solving".to_string()],
            key_inquiry_question: "How can we apply this knowledge?".to_string(),
            learning_resources: vec!["Textbooks".to_string(), "Learning materials".to_string()],
            activities: vec![
                "Introduction".to_string(),
                "Main activity".to_string(),
                "Conclusion".to_string(),
            ],
            assessment: "Observation and oral questions".to_string(),
            reflection: "Were the learning outcomes achieved?".to_string(),
        }
    }
}

/// Retention, title synthesis, defaulting and week ordering.
///
/// A draft survives only when its week is set and it carries real evidence:
/// a classified strand other than the sentinel, a title, or at least one
/// learning outcome. Everything else is dropped silently. Retained records
/// are sorted ascending by week (stably, so several lessons in one week keep
/// their document order).
pub fn finalize(drafts: Vec<DraftLesson>, defaults: &RecordDefaults) -> Vec<LessonRecord> {
    let mut records: Vec<LessonRecord> = drafts
        .into_iter()
        .filter_map(|d| build_record(d, defaults))
        .collect();
    records.sort_by_key(|r| r.week);
    records
}

fn build_record(draft: DraftLesson, defaults: &RecordDefaults) -> Option<LessonRecord> {
    let week = draft.week?;

    let mut title = draft.title.trim().to_string();
    if title.is_empty() && !draft.strand.is_empty() && draft.strand != GENERAL {
        title = if !draft.sub_strand.is_empty() {
            format!("{}: {}", draft.strand, draft.sub_strand)
        } else {
            draft.strand.clone()
        };
    }

    let has_strand = !draft.strand.is_empty() && draft.strand != GENERAL;
    if !has_strand && title.is_empty() && draft.learning_outcomes.is_empty() {
        return None;
    }

    let or_text = |value: String, default: &str| {
        if value.trim().is_empty() {
            default.to_string()
        } else {
            value
        }
    };
    let or_list = |value: Vec<String>, default: &[String]| {
        if value.is_empty() {
            default.to_vec()
        } else {
            value
        }
    };

    Some(LessonRecord {
        week,
        lesson_number: draft.lesson_number.unwrap_or(defaults.lesson_number),
        title: or_text(title, &defaults.title),
        strand: or_text(draft.strand, &defaults.strand),
        sub_strand: or_text(draft.sub_strand, &defaults.sub_strand),
        learning_outcomes: or_list(draft.learning_outcomes, &defaults.learning_outcomes),
        core_competencies: or_list(draft.core_competencies, &defaults.core_competencies),
        key_inquiry_question: or_text(draft.key_inquiry_question, &defaults.key_inquiry_question),
        learning_resources: dedup(or_list(draft.learning_resources, &defaults.learning_resources)),
        activities: or_list(draft.activities, &defaults.activities),
        assessment: or_text(draft.assessment, &defaults.assessment),
        reflection: or_text(draft.reflection, &defaults.reflection),
    })
}

/// Remove duplicate resources, keeping first-seen order.
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

// ── Tests ──
