pub mod assemble;
pub mod classify;
pub mod components;
pub mod layout;
pub mod patterns;
pub mod taxonomy;
pub mod weeks;

use serde::{Deserialize, Serialize};

use crate::extract::{self, ExtractError, FileKind};
use assemble::RecordDefaults;
use classify::{ScoringWeights, StrandClassifier};
use patterns::{Field, FieldPatternLibrary};
use taxonomy::Taxonomy;
use weeks::WeekPatterns;

/// One normalized lesson. After assembly every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    pub week: u32,
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

/// Raw field values accumulated by either extraction path before
/// classification, retention and defaulting. `content` keeps the source text
/// of the row or block for the classifier.
#[derive(Debug, Clone, Default)]
pub struct DraftLesson {
    pub week: Option<u32>,
    pub lesson_number: Option<u32>,
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
    pub content: String,
}

impl DraftLesson {
    pub(crate) fn text_field_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Strand => Some(&mut self.strand),
            Field::SubStrand => Some(&mut self.sub_strand),
            Field::KeyInquiryQuestion => Some(&mut self.key_inquiry_question),
            Field::Assessment => Some(&mut self.assessment),
            Field::Reflection => Some(&mut self.reflection),
            _ => None,
        }
    }

    pub(crate) fn list_field_mut(&mut self, field: Field) -> Option<&mut Vec<String>> {
        match field {
            Field::LearningOutcomes => Some(&mut self.learning_outcomes),
            Field::CoreCompetencies => Some(&mut self.core_competencies),
            Field::LearningResources => Some(&mut self.learning_resources),
            Field::Activities => Some(&mut self.activities),
            _ => None,
        }
    }
}

/// Why a parse produced no records. Carried inside `ParseResult` rather than
/// returned as an error: the pipeline itself is total over its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseFailure {
    #[error(
        "No week numbers found. Ensure the document contains week indicators like 'Week 1', 'Week 2'."
    )]
    NoWeekMarkers,
    #[error("Found week numbers {weeks:?} but could not parse lesson content. Sample: {sample:?}")]
    NoParsableContent { weeks: Vec<u32>, sample: String },
}

/// Outcome of one parse call. Owned entirely by the caller; the parser holds
/// no reference after returning.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub success: bool,
    pub message: String,
    pub lessons: Vec<LessonRecord>,
    /// Every distinct week number encountered, sorted ascending, including
    /// weeks whose blocks were not retained.
    pub weeks_found: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ParseFailure>,
}

impl ParseResult {
    fn ok(lessons: Vec<LessonRecord>, weeks_found: Vec<u32>) -> Self {
        ParseResult {
            success: true,
            message: format!(
                "Successfully parsed {} lessons from scheme of work",
                lessons.len()
            ),
            lessons,
            weeks_found,
            failure: None,
        }
    }

    fn fail(failure: ParseFailure, weeks_found: Vec<u32>) -> Self {
        ParseResult {
            success: false,
            message: failure.to_string(),
            lessons: Vec::new(),
            weeks_found,
            failure: Some(failure),
        }
    }
}

/// The scheme-of-work parser: immutable configuration assembled once, then
/// shared freely. Each `parse` call is a pure function of its input text.
pub struct SchemeParser {
    library: FieldPatternLibrary,
    weeks: WeekPatterns,
    classifier: StrandClassifier,
    defaults: RecordDefaults,
}

impl Default for SchemeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeParser {
    pub fn new() -> Self {
        Self::with_taxonomy(Taxonomy::cbc())
    }

    /// Inject a taxonomy (and thereby the classifier) at construction time.
    pub fn with_taxonomy(taxonomy: Taxonomy) -> Self {
        SchemeParser {
            library: FieldPatternLibrary::standard(),
            weeks: WeekPatterns::standard(),
            classifier: StrandClassifier::new(taxonomy),
            defaults: RecordDefaults::default(),
        }
    }

    pub fn with_weights(taxonomy: Taxonomy, weights: ScoringWeights) -> Self {
        SchemeParser {
            library: FieldPatternLibrary::standard(),
            weeks: WeekPatterns::standard(),
            classifier: StrandClassifier::with_weights(taxonomy, weights),
            defaults: RecordDefaults::default(),
        }
    }

    pub fn library(&self) -> &FieldPatternLibrary {
        &self.library
    }

    pub fn week_patterns(&self) -> &WeekPatterns {
        &self.weeks
    }

    /// Parse a document: table path when a header is detected, free-form
    /// otherwise. Total over its input; failures are reported in the result.
    pub fn parse(&self, text: &str) -> ParseResult {
        match layout::detect_table(text) {
            Some(header) => self.parse_table(text, header),
            None => self.parse_free_form(text),
        }
    }

    /// Byte-oriented variant: runs the extraction collaborator first.
    pub fn parse_bytes(&self, bytes: &[u8], kind: FileKind) -> Result<ParseResult, ExtractError> {
        let text = extract::extract_text(bytes, kind)?;
        Ok(self.parse(&text))
    }

    fn parse_table(&self, text: &str, header: layout::TableHeader) -> ParseResult {
        let mapping = layout::map_columns(&header, &self.library);
        let extraction = layout::extract_rows(text, &header, &mapping);

        if extraction.rows_seen == 0 {
            return ParseResult::fail(ParseFailure::NoWeekMarkers, Vec::new());
        }

        let sample = extraction
            .drafts
            .first()
            .map(|d| d.content.clone())
            .unwrap_or_default();
        self.classify_and_assemble(extraction.drafts, sample)
    }

    fn parse_free_form(&self, text: &str) -> ParseResult {
        let blocks = weeks::segment_weeks(text, &self.weeks);
        if blocks.is_empty() {
            return ParseResult::fail(ParseFailure::NoWeekMarkers, Vec::new());
        }

        let sample = blocks[0]
            .lines
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(" | ");
        let drafts = blocks
            .iter()
            .map(|b| components::extract_block(b, &self.library, &self.weeks))
            .collect();
        self.classify_and_assemble(drafts, sample)
    }

    fn classify_and_assemble(&self, mut drafts: Vec<DraftLesson>, sample: String) -> ParseResult {
        let mut weeks_found: Vec<u32> = drafts.iter().filter_map(|d| d.week).collect();
        weeks_found.sort_unstable();
        weeks_found.dedup();

        for draft in &mut drafts {
            self.resolve_classification(draft);
        }

        let lessons = assemble::finalize(drafts, &self.defaults);
        if lessons.is_empty() {
            return ParseResult::fail(
                ParseFailure::NoParsableContent {
                    weeks: weeks_found.clone(),
                    sample,
                },
                weeks_found,
            );
        }
        ParseResult::ok(lessons, weeks_found)
    }

    /// Resolve strand/sub-strand for a draft. Label-sized text captured by
    /// the extraction path is normalized directly; anything else (missing, or
    /// polluted by appended lines) goes through the classification cascade
    /// over the full source content.
    fn resolve_classification(&self, draft: &mut DraftLesson) {
        let strand_raw = draft.strand.trim();
        draft.strand = if strand_raw.len() > 2 && strand_raw.len() < 50 {
            self.classifier.normalize(strand_raw)
        } else {
            self.classifier.identify_strand(&draft.content)
        };

        let sub_raw = draft.sub_strand.trim();
        draft.sub_strand = if sub_raw.len() > 2 && sub_raw.len() < 100 {
            self.classifier.normalize(sub_raw)
        } else {
            self.classifier
                .identify_substrand(&draft.content, &draft.strand)
        };
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SchemeParser {
        SchemeParser::new()
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn freeform_fixture_parses() {
        let result = parser().parse(&fixture("freeform.txt"));
        assert!(result.success, "{}", result.message);
        assert_eq!(result.weeks_found, vec![1, 2, 3]);
        assert_eq!(result.lessons.len(), 3);

        let first = &result.lessons[0];
        assert_eq!(first.week, 1);
        assert_eq!(first.strand, "Mathematics");
        assert_eq!(first.sub_strand, "Numbers");
        assert!(first.learning_outcomes[0].contains("read numbers"));
        assert_eq!(
            first.key_inquiry_question,
            "How can we use numbers in daily life?"
        );
        assert!(!first.learning_resources.is_empty());
        assert!(!first.assessment.is_empty());
    }

    #[test]
    fn table_fixture_takes_table_path() {
        let text = fixture("table.txt");
        assert!(layout::detect_table(&text).is_some());
        let result = parser().parse(&text);
        assert!(result.success, "{}", result.message);
        assert_eq!(result.weeks_found, vec![1, 2]);

        let first = &result.lessons[0];
        assert_eq!(first.strand, "Science");
        assert_eq!(first.sub_strand, "Living Things");
        assert_eq!(first.title, "Science: Living Things");
        assert_eq!(first.learning_outcomes.len(), 2);
    }

    #[test]
    fn no_markers_fails_with_kind() {
        let result = parser().parse(&fixture("nomarkers.txt"));
        assert!(!result.success);
        assert!(result.lessons.is_empty());
        assert!(result.weeks_found.is_empty());
        assert_eq!(result.failure, Some(ParseFailure::NoWeekMarkers));
    }

    #[test]
    fn markers_without_content_fail_with_diagnostics() {
        let result = parser().parse("Week 4\nWeek 9");
        assert!(!result.success);
        match result.failure {
            Some(ParseFailure::NoParsableContent { ref weeks, .. }) => {
                assert_eq!(weeks, &vec![4, 9]);
            }
            ref other => panic!("unexpected failure: {:?}", other),
        }
        // Weeks encountered are still reported.
        assert_eq!(result.weeks_found, vec![4, 9]);
    }

    #[test]
    fn parse_is_deterministic() {
        let text = fixture("freeform.txt");
        let p = parser();
        let a = p.parse(&text);
        let b = p.parse(&text);
        assert_eq!(a.lessons, b.lessons);
        assert_eq!(a.weeks_found, b.weeks_found);
        assert_eq!(a.message, b.message);
    }

    #[test]
    fn marker_weeks_are_reported() {
        let result = parser().parse("Week 7\nStrand: Mathematics\nCounting practice drills");
        assert!(result.weeks_found.contains(&7));
    }

    #[test]
    fn every_retained_record_is_fully_defaulted() {
        let result = parser().parse(&fixture("freeform.txt"));
        for lesson in &result.lessons {
            assert!(lesson.week > 0);
            assert!(!lesson.title.is_empty());
            assert!(!lesson.strand.is_empty());
            assert!(!lesson.sub_strand.is_empty());
            assert!(!lesson.learning_outcomes.is_empty());
            assert!(!lesson.core_competencies.is_empty());
            assert!(!lesson.key_inquiry_question.is_empty());
            assert!(!lesson.learning_resources.is_empty());
            assert!(!lesson.activities.is_empty());
            assert!(!lesson.assessment.is_empty());
            assert!(!lesson.reflection.is_empty());
        }
    }

    #[test]
    fn repeated_weeks_produce_multiple_records() {
        let text = "Week 1\nStrand: Mathematics\nSub-strand: Numbers\nWeek 1\nStrand: English\nSub-strand: Reading";
        let result = parser().parse(text);
        assert!(result.success, "{}", result.message);
        assert_eq!(result.lessons.len(), 2);
        assert_eq!(result.weeks_found, vec![1]);
        assert_eq!(result.lessons[0].week, 1);
        assert_eq!(result.lessons[1].week, 1);
    }

    #[test]
    fn parse_bytes_runs_extraction_first() {
        let bytes = b"Week 1\nStrand: Mathematics\nSub-strand: Numbers";
        let result = parser().parse_bytes(bytes, FileKind::Txt).unwrap();
        assert!(result.success);
        assert_eq!(result.lessons[0].strand, "Mathematics");
    }

    #[test]
    fn scoring_weights_are_overridable() {
        let p = SchemeParser::with_weights(
            Taxonomy::cbc(),
            ScoringWeights {
                early_bonus: 0.0,
                ..ScoringWeights::default()
            },
        );
        // Classification still works without the early-match bonus.
        assert_eq!(
            p.classifier.identify_strand("Week 1: Understanding fractions"),
            "Mathematics"
        );
    }

    #[test]
    fn json_output_shape() {
        let result = parser().parse(&fixture("freeform.txt"));
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"subStrand\""));
        let lessons: Vec<LessonRecord> =
            serde_json::from_str(&serde_json::to_string(&result.lessons).unwrap()).unwrap();
        assert_eq!(lessons, result.lessons);
    }
}
