use super::components::{first_number, split_list_content};
use super::patterns::{Field, FieldKind, FieldPatternLibrary};
use super::DraftLesson;

/// Words whose presence in a line marks it as a potential header row.
const HEADER_INDICATORS: [&str; 12] = [
    "week", "lesson", "strand", "sub-strand", "learning", "outcome", "experience", "inquiry",
    "question", "resource", "assessment", "method",
];

/// A line qualifies as a header candidate when it contains at least this many
/// distinct indicator words. Carried over from the original tuning.
const MIN_HEADER_INDICATORS: usize = 4;
/// A splitting strategy must yield at least this many non-empty columns.
const MIN_HEADER_COLUMNS: usize = 4;
/// Single-space splitting is only attempted on lines with at least this many
/// words.
const MIN_SINGLE_SPACE_WORDS: usize = 6;
/// Only the first 30 non-empty lines are scanned for a header.
const HEADER_SCAN_LINES: usize = 30;

/// Column separator of a detected table, in the order the strategies are
/// tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    DoubleSpace,
    Tab,
    Space,
}

impl Separator {
    fn token(self) -> &'static str {
        match self {
            Separator::DoubleSpace => "  ",
            Separator::Tab => "\t",
            Separator::Space => " ",
        }
    }

    /// Non-overlapping occurrences of the separator token in a line.
    pub fn count(self, line: &str) -> usize {
        line.matches(self.token()).count()
    }

    /// Split a line on the separator, trimming each column but keeping empty
    /// columns in place so indices stay aligned with the header.
    pub fn split(self, line: &str) -> Vec<String> {
        line.split(self.token()).map(|c| c.trim().to_string()).collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            Separator::DoubleSpace => "double-space",
            Separator::Tab => "tab",
            Separator::Space => "space",
        }
    }
}

/// A detected table header: the line it sits on, its column texts and the
/// separator that produced them.
#[derive(Debug, Clone)]
pub struct TableHeader {
    pub line_index: usize,
    pub columns: Vec<String>,
    pub separator: Separator,
}

/// Scan the first lines of the document for a table header. Each qualifying
/// line is tried against three splitting strategies in order (double-space
/// runs, tabs, single spaces on word-rich lines); the first candidate wins.
/// None means the free-form path applies.
pub fn detect_table(text: &str) -> Option<TableHeader> {
    let mut scanned = 0;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        scanned += 1;
        if scanned > HEADER_SCAN_LINES {
            break;
        }

        let lower = line.to_lowercase();
        let indicators = HEADER_INDICATORS.iter().filter(|w| lower.contains(*w)).count();
        if indicators < MIN_HEADER_INDICATORS {
            continue;
        }

        if line.contains("  ") {
            let columns = non_empty_columns(line, Separator::DoubleSpace);
            if columns.len() >= MIN_HEADER_COLUMNS {
                return Some(TableHeader {
                    line_index: index,
                    columns,
                    separator: Separator::DoubleSpace,
                });
            }
        }
        if line.contains('\t') {
            let columns = non_empty_columns(line, Separator::Tab);
            if columns.len() >= MIN_HEADER_COLUMNS {
                return Some(TableHeader {
                    line_index: index,
                    columns,
                    separator: Separator::Tab,
                });
            }
        }
        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if words.len() >= MIN_SINGLE_SPACE_WORDS {
            return Some(TableHeader {
                line_index: index,
                columns: words,
                separator: Separator::Space,
            });
        }
    }

    None
}

fn non_empty_columns(line: &str, separator: Separator) -> Vec<String> {
    separator
        .split(line)
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect()
}

/// Map header columns to canonical fields. Each column is claimed by the
/// first field whose header patterns match it; unmatched columns stay None
/// and are ignored downstream. Two columns map to the same field only when
/// the header genuinely repeats it.
pub fn map_columns(header: &TableHeader, library: &FieldPatternLibrary) -> Vec<Option<Field>> {
    header.columns.iter().map(|c| library.match_header(c)).collect()
}

/// Result of scanning the data rows under a header.
pub struct TableExtraction {
    pub drafts: Vec<DraftLesson>,
    /// Rows that passed the separator-count check, whether or not they
    /// produced a draft.
    pub rows_seen: usize,
}

/// Convert the lines after the header into draft lesson records using the
/// column mapping. A line qualifies as a data row when its separator count is
/// within two of the header's column count, and its split must yield at least
/// half the header's columns non-empty.
pub fn extract_rows(
    text: &str,
    header: &TableHeader,
    mapping: &[Option<Field>],
) -> TableExtraction {
    let min_separators = header.columns.len().saturating_sub(2);
    let min_columns = header.columns.len() / 2;

    let mut drafts = Vec::new();
    let mut rows_seen = 0;

    for line in text.lines().skip(header.line_index + 1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if header.separator.count(line) < min_separators {
            continue;
        }
        rows_seen += 1;

        let columns = header.separator.split(line);
        if columns.iter().filter(|c| !c.is_empty()).count() < min_columns {
            continue;
        }

        let mut draft = DraftLesson::default();
        draft.content = line.to_string();

        for (idx, field) in mapping.iter().enumerate() {
            let Some(field) = *field else { continue };
            let Some(content) = columns.get(idx).map(|c| c.trim()) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            match field.kind() {
                FieldKind::Number => {
                    let Some(n) = first_number(content) else { continue };
                    match field {
                        Field::Week => draft.week = Some(n),
                        Field::LessonNumber => draft.lesson_number = Some(n),
                        _ => {}
                    }
                }
                FieldKind::List => {
                    if let Some(list) = draft.list_field_mut(field) {
                        list.extend(split_list_content(content));
                    }
                }
                FieldKind::Text => {
                    if let Some(value) = draft.text_field_mut(field) {
                        *value = content.to_string();
                    }
                }
            }
        }

        drafts.push(draft);
    }

    TableExtraction { drafts, rows_seen }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Week  Lesson  Strand  Sub-Strand  Specific Learning Outcomes  Learning Resources  Assessment";

    #[test]
    fn detects_double_space_header() {
        let text = format!("Grade 4 Term 1\n\n{}\n1  1  Science  Living Things  ...", HEADER);
        let header = detect_table(&text).expect("header detected");
        assert_eq!(header.separator, Separator::DoubleSpace);
        assert_eq!(header.columns.len(), 7);
        assert_eq!(header.columns[3], "Sub-Strand");
    }

    #[test]
    fn detects_single_space_header() {
        // The documented trigger scenario: a space-separated header row with
        // many indicator words selects the table path.
        let text = "Week Lesson Strand Sub-Strand Specific Learning Outcomes Learning Experiences";
        let header = detect_table(text).expect("header detected");
        assert_eq!(header.separator, Separator::Space);
        assert!(header.columns.len() >= 6);
    }

    #[test]
    fn prose_is_not_a_table() {
        assert!(detect_table("This term covers numbers and shapes.\nLessons run weekly.").is_none());
    }

    #[test]
    fn indicator_rich_line_without_columns_is_skipped() {
        // Plenty of indicator words but neither double spaces, tabs, nor six
        // words.
        assert!(detect_table("week lesson strand outcome").is_none());
    }

    #[test]
    fn header_beyond_scan_window_ignored() {
        let mut text = String::new();
        for i in 0..35 {
            text.push_str(&format!("filler line number {}\n", i));
        }
        text.push_str(HEADER);
        assert!(detect_table(&text).is_none());
    }

    #[test]
    fn maps_columns_in_order() {
        let library = FieldPatternLibrary::standard();
        let header = detect_table(HEADER).expect("header");
        let mapping = map_columns(&header, &library);
        assert_eq!(mapping[0], Some(Field::Week));
        assert_eq!(mapping[1], Some(Field::LessonNumber));
        assert_eq!(mapping[2], Some(Field::Strand));
        assert_eq!(mapping[3], Some(Field::SubStrand));
        assert_eq!(mapping[4], Some(Field::LearningOutcomes));
        assert_eq!(mapping[5], Some(Field::LearningResources));
        assert_eq!(mapping[6], Some(Field::Assessment));
    }

    #[test]
    fn extracts_rows_with_lists() {
        let text = format!(
            "{}\n1  1  Science  Living Things  Identify plants; Name parts of a plant  Seed samples; charts  Observation\n2  1  Science  Energy  Describe heat sources  Charcoal stove  Written exercise",
            HEADER
        );
        let library = FieldPatternLibrary::standard();
        let header = detect_table(&text).expect("header");
        let mapping = map_columns(&header, &library);
        let extraction = extract_rows(&text, &header, &mapping);

        assert_eq!(extraction.rows_seen, 2);
        assert_eq!(extraction.drafts.len(), 2);

        let first = &extraction.drafts[0];
        assert_eq!(first.week, Some(1));
        assert_eq!(first.lesson_number, Some(1));
        assert_eq!(first.strand, "Science");
        assert_eq!(first.sub_strand, "Living Things");
        assert_eq!(
            first.learning_outcomes,
            vec!["Identify plants", "Name parts of a plant"]
        );
        assert_eq!(first.learning_resources, vec!["Seed samples", "charts"]);
        assert_eq!(first.assessment, "Observation");

        assert_eq!(extraction.drafts[1].week, Some(2));
    }

    #[test]
    fn sparse_lines_are_not_rows() {
        let text = format!("{}\nSchemes prepared by the subject panel", HEADER);
        let library = FieldPatternLibrary::standard();
        let header = detect_table(&text).expect("header");
        let mapping = map_columns(&header, &library);
        let extraction = extract_rows(&text, &header, &mapping);
        assert_eq!(extraction.rows_seen, 0);
        assert!(extraction.drafts.is_empty());
    }
}
