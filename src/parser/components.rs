use std::sync::LazyLock;

use regex::Regex;

use super::classify::title_case;
use super::patterns::{Field, FieldKind, FieldPatternLibrary};
use super::weeks::{WeekBlock, WeekPatterns};
use super::DraftLesson;

/// Bullet glyphs tried, in order, by the list splitter.
const BULLETS: [char; 7] = ['•', '○', '▪', '-', '*', '→', '◦'];
/// Plain separators tried when no bullet glyph is present.
const LIST_SEPARATORS: [char; 3] = [';', '\n', '|'];

/// Lines shorter than this never become a fallback title.
const MIN_TITLE_LEN: usize = 10;
/// Outcome fragments shorter than this are discarded.
const MIN_OUTCOME_LEN: usize = 6;

static OUTCOME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"by\s+the\s+end[^:]*?:\s*([^?]+?)(?:\s+how\s+|$)",
        r"learners?\s+should\s+be\s+able\s+to[:\s]*([^?]+?)(?:\s+how\s+|$)",
        r"objectives?[:\s]*([^?]+?)(?:\s+how\s+|$)",
        r"learning\s+outcomes?[:\s]*([^?]+?)(?:\s+how\s+|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static outcome pattern"))
    .collect()
});

static INQUIRY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"how\s+can\s+[^?]*?\?",
        r"what\s+[^?]*?\?",
        r"why\s+[^?]*?\?",
        r"when\s+[^?]*?\?",
        r"where\s+[^?]*?\?",
        r"inquiry\s+questions?[:\s]*([^.]+[?.])",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static inquiry pattern"))
    .collect()
});

const OUTCOME_SPLITTERS: [&str; 8] = ["a)", "b)", "c)", "d)", "e)", "•", "-", "\n"];

const RESOURCE_INDICATORS: &[&str] = &[
    "textbook", "chart", "cards", "materials", "flashcards", "marbles", "stones", "pictures",
    "models", "specimens", "calculator", "ruler", "compass", "protractor", "computer", "internet",
    "video", "audio", "map", "globe", "microscope",
];

const ASSESSMENT_INDICATORS: &[&str] = &[
    "observation", "written", "oral", "questions", "exercise", "test", "quiz", "presentation",
    "project", "assignment", "homework", "practical", "demonstration",
];

/// Split a text blob into list items: first bullet glyph present wins, then
/// the first of `;` / newline / `|`, else the whole blob as a single item.
/// Items are trimmed and empty items dropped.
pub fn split_list_content(text: &str) -> Vec<String> {
    let split_on = |sep: char| -> Vec<String> {
        text.split(sep)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    for bullet in BULLETS {
        if text.contains(bullet) {
            return split_on(bullet);
        }
    }
    for sep in LIST_SEPARATORS {
        if text.contains(sep) {
            return split_on(sep);
        }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

/// Extract lesson components from one week block: a line-by-line section
/// scan driven by the synonym lists, then regex cascades and keyword scans
/// over the joined content for whatever the scan left empty.
pub fn extract_block(
    block: &WeekBlock,
    library: &FieldPatternLibrary,
    weeks: &WeekPatterns,
) -> DraftLesson {
    let mut draft = DraftLesson::default();
    draft.week = Some(block.week);
    draft.content = block.lines.join(" ");

    scan_sections(&mut draft, block, library, weeks);

    let lower = draft.content.to_lowercase();
    if draft.learning_outcomes.is_empty() {
        draft.learning_outcomes = extract_outcomes(&lower);
    }
    if draft.key_inquiry_question.is_empty() {
        draft.key_inquiry_question = extract_inquiry(&lower);
    }
    if draft.learning_resources.is_empty() {
        draft.learning_resources = extract_resources(&lower);
    }
    if draft.assessment.is_empty() {
        draft.assessment = extract_assessment(&lower);
    }

    draft
}

/// How a synonym matched within a line.
enum SynMatch {
    /// "{syn}:" or "{syn} -" style: content follows the line's first
    /// separator character.
    Separator,
    /// Line starts with "{syn} ": content is the remainder of the line.
    Prefix,
}

fn scan_sections(
    draft: &mut DraftLesson,
    block: &WeekBlock,
    library: &FieldPatternLibrary,
    weeks: &WeekPatterns,
) {
    let mut current: Option<Field> = None;

    for line in &block.lines {
        // Week-marker lines never open or feed a section.
        if weeks.is_marker(line) {
            continue;
        }
        let lower = line.to_lowercase();

        let mut matched = None;
        'fields: for fp in library.fields() {
            for syn in fp.synonyms {
                if let Some(kind) = synonym_match(&lower, syn) {
                    matched = Some((fp.field, syn, kind));
                    break 'fields;
                }
            }
        }

        if let Some((field, syn, kind)) = matched {
            let content = match kind {
                SynMatch::Separator => {
                    if let Some(i) = line.find(':') {
                        &line[i + 1..]
                    } else if let Some(i) = line.find('-') {
                        &line[i + 1..]
                    } else {
                        ""
                    }
                }
                SynMatch::Prefix => line.get(syn.len()..).unwrap_or(""),
            };
            let content = content.trim();
            assign(draft, field, content);
            // Numeric fields are assign-once and never stay open as the
            // current section.
            current = match field.kind() {
                FieldKind::Number => None,
                _ => Some(field),
            };
            continue;
        }

        if let Some(field) = current {
            append(draft, field, line);
            continue;
        }

        // No section open yet: long lines become the title, later ones fall
        // into the activities bucket.
        if line.len() > MIN_TITLE_LEN {
            if draft.title.is_empty() {
                draft.title = line.clone();
            } else {
                draft.activities.push(line.clone());
            }
        }
    }
}

/// Locate `syn` within the lowercased line. An occurrence counts only when it
/// is not preceded by an alphanumeric or '-' (so "sub-strand:" is never
/// claimed by "strand") and is followed by a separator; a line-leading
/// "{syn} " also counts.
fn synonym_match(lower: &str, syn: &str) -> Option<SynMatch> {
    let mut from = 0;
    while let Some(rel) = lower[from..].find(syn) {
        let start = from + rel;
        let end = start + syn.len();
        let ok_before = lower[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && c != '-');
        if ok_before {
            let rest = &lower[end..];
            if rest.starts_with(':')
                || rest.starts_with(" :")
                || rest.starts_with('-')
                || rest.starts_with(" -")
            {
                return Some(SynMatch::Separator);
            }
            if start == 0 && rest.starts_with(' ') {
                return Some(SynMatch::Prefix);
            }
        }
        from = end.max(from + 1);
    }
    None
}

fn assign(draft: &mut DraftLesson, field: Field, content: &str) {
    if content.is_empty() {
        return;
    }
    match field.kind() {
        FieldKind::Number => {
            if let Some(n) = first_number(content) {
                match field {
                    Field::Week => draft.week = Some(n),
                    Field::LessonNumber => draft.lesson_number = Some(n),
                    _ => {}
                }
            }
        }
        FieldKind::List => {
            if let Some(list) = draft.list_field_mut(field) {
                list.push(content.to_string());
            }
        }
        FieldKind::Text => {
            if let Some(value) = draft.text_field_mut(field) {
                *value = content.to_string();
            }
        }
    }
}

fn append(draft: &mut DraftLesson, field: Field, line: &str) {
    match field.kind() {
        FieldKind::Number => {}
        FieldKind::List => {
            if let Some(list) = draft.list_field_mut(field) {
                list.push(line.to_string());
            }
        }
        FieldKind::Text => {
            if let Some(value) = draft.text_field_mut(field) {
                if value.is_empty() {
                    *value = line.to_string();
                } else {
                    value.push(' ');
                    value.push_str(line);
                }
            }
        }
    }
}

pub(crate) fn first_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|&n| n > 0)
}

fn extract_outcomes(lower: &str) -> Vec<String> {
    for re in OUTCOME_PATTERNS.iter() {
        if let Some(caps) = re.captures(lower) {
            let text = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let parts = OUTCOME_SPLITTERS
                .iter()
                .find(|sep| text.contains(*sep))
                .map(|sep| {
                    text.split(sep)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|| vec![text.trim().to_string()]);
            return parts.into_iter().filter(|p| p.len() >= MIN_OUTCOME_LEN).collect();
        }
    }
    Vec::new()
}

fn extract_inquiry(lower: &str) -> String {
    for re in INQUIRY_PATTERNS.iter() {
        if let Some(caps) = re.captures(lower) {
            let text = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim())
                .unwrap_or("");
            return capitalize_first(text);
        }
    }
    String::new()
}

/// Any resource keyword present contributes its containing short phrase
/// (previous '.' to the first whitespace or '.' after the keyword).
/// Duplicates are removed preserving first-seen order, which keeps the
/// pipeline deterministic.
fn extract_resources(lower: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for indicator in RESOURCE_INDICATORS {
        let Some(pos) = lower.find(indicator) else {
            continue;
        };
        let start = lower[..pos].rfind('.').map(|i| i + 1).unwrap_or(0);
        let after = pos + indicator.len();
        let end = lower[after..]
            .find(|c: char| c.is_whitespace() || c == '.')
            .map(|i| after + i)
            .unwrap_or(lower.len());
        let phrase = lower[start..end].trim();
        if phrase.is_empty() || phrase.len() >= 100 {
            continue;
        }
        let titled = title_case(phrase);
        if !found.contains(&titled) {
            found.push(titled);
        }
    }
    found
}

fn extract_assessment(lower: &str) -> String {
    let mut found: Vec<String> = Vec::new();
    for indicator in ASSESSMENT_INDICATORS {
        if lower.contains(indicator) {
            let titled = title_case(indicator);
            if !found.contains(&titled) {
                found.push(titled);
            }
        }
    }
    found.join(", ")
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> WeekBlock {
        WeekBlock {
            week: 1,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn extract(lines: &[&str]) -> DraftLesson {
        let library = FieldPatternLibrary::standard();
        let weeks = WeekPatterns::standard();
        extract_block(&block(lines), &library, &weeks)
    }

    #[test]
    fn split_on_bullets() {
        assert_eq!(
            split_list_content("• count objects • write numerals"),
            vec!["count objects", "write numerals"]
        );
    }

    #[test]
    fn split_on_first_glyph_only() {
        // '•' appears first in the glyph order, so '-' survives inside items.
        assert_eq!(
            split_list_content("• self-check • re-read"),
            vec!["self-check", "re-read"]
        );
    }

    #[test]
    fn split_on_semicolon_then_pipe() {
        assert_eq!(split_list_content("one; two; three"), vec!["one", "two", "three"]);
        assert_eq!(split_list_content("one | two"), vec!["one", "two"]);
    }

    #[test]
    fn split_whole_blob() {
        assert_eq!(split_list_content("just one item"), vec!["just one item"]);
        assert!(split_list_content("   ").is_empty());
    }

    #[test]
    fn section_scan_assigns_fields() {
        let d = extract(&[
            "Week 1",
            "Strand: Mathematics",
            "Sub-strand: Numbers",
            "Resources: counters and charts",
            "Assessment: oral questions",
        ]);
        assert_eq!(d.strand, "Mathematics");
        assert_eq!(d.sub_strand, "Numbers");
        assert_eq!(d.learning_resources, vec!["counters and charts"]);
        assert_eq!(d.assessment, "oral questions");
    }

    #[test]
    fn sub_strand_line_not_claimed_by_strand() {
        let d = extract(&["Week 1", "Sub-strand: Numbers"]);
        assert_eq!(d.strand, "");
        assert_eq!(d.sub_strand, "Numbers");
    }

    #[test]
    fn unlabelled_lines_append_to_open_section() {
        let d = extract(&[
            "Week 1",
            "Activities: counting games",
            "sorting objects into groups",
        ]);
        assert_eq!(d.activities, vec!["counting games", "sorting objects into groups"]);
    }

    #[test]
    fn long_line_becomes_title_then_activities() {
        let d = extract(&[
            "Week 1",
            "Place value and grouping tens",
            "Counting with bundles of sticks",
        ]);
        assert_eq!(d.title, "Place value and grouping tens");
        assert_eq!(d.activities, vec!["Counting with bundles of sticks"]);
    }

    #[test]
    fn line_leading_synonym_claims_section() {
        // A line beginning "{synonym} ..." is treated as that section even
        // without a separator, as in "Introduction ..." -> activities.
        let d = extract(&["Week 1", "Introduction to place value"]);
        assert!(d.title.is_empty());
        assert_eq!(d.activities, vec!["to place value"]);
    }

    #[test]
    fn marker_lines_skipped_by_scan() {
        let d = extract(&["Week 1", "Week 1"]);
        assert!(d.title.is_empty());
        assert!(d.activities.is_empty());
    }

    #[test]
    fn outcome_cascade() {
        let d = extract(&[
            "Week 1",
            "By the end of the lesson, the learner should be able to: a) count to ten b) write numerals",
        ]);
        assert_eq!(d.learning_outcomes.len(), 1);
        assert!(d.learning_outcomes[0].starts_with("count to ten"));
    }

    #[test]
    fn inquiry_cascade_capitalizes() {
        let d = extract(&["Week 1", "How can we measure length accurately?"]);
        assert_eq!(d.key_inquiry_question, "How can we measure length accurately?");
    }

    #[test]
    fn resource_and_assessment_keywords() {
        let d = extract(&["Week 1", "Learners use the textbook and wall chart, then a written test"]);
        assert!(d.learning_resources.iter().any(|r| r.contains("Textbook")));
        assert!(d.assessment.contains("Written"));
        assert!(d.assessment.contains("Test"));
    }

    #[test]
    fn lesson_number_assign_once_no_open_section() {
        let d = extract(&["Week 1", "Lesson number: 3", "Place value and grouping tens"]);
        assert_eq!(d.lesson_number, Some(3));
        // The line after the numeric label falls through to the title slot.
        assert_eq!(d.title, "Place value and grouping tens");
    }

    #[test]
    fn first_number_parses_digit_runs() {
        assert_eq!(first_number("lesson 12 of 30"), Some(12));
        assert_eq!(first_number("no digits"), None);
        assert_eq!(first_number("0"), None);
    }
}
