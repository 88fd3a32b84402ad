use regex::Regex;

/// Canonical lesson fields, in fixed iteration order. Both the table header
/// mapper and the free-form section scanner test fields in this order and
/// stop at the first match, so order is part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Week,
    LessonNumber,
    Strand,
    SubStrand,
    Title,
    LearningOutcomes,
    CoreCompetencies,
    KeyInquiryQuestion,
    LearningResources,
    Assessment,
    Reflection,
    Activities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// First digit run, parsed as integer; malformed captures are skipped.
    Number,
    /// Trimmed text, later assignments concatenated.
    Text,
    /// Ordered sequence of strings.
    List,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Week,
        Field::LessonNumber,
        Field::Strand,
        Field::SubStrand,
        Field::Title,
        Field::LearningOutcomes,
        Field::CoreCompetencies,
        Field::KeyInquiryQuestion,
        Field::LearningResources,
        Field::Assessment,
        Field::Reflection,
        Field::Activities,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Week | Field::LessonNumber => FieldKind::Number,
            Field::LearningOutcomes
            | Field::CoreCompetencies
            | Field::LearningResources
            | Field::Activities => FieldKind::List,
            _ => FieldKind::Text,
        }
    }

    /// Canonical field name as used in serialized records.
    pub fn name(self) -> &'static str {
        match self {
            Field::Week => "week",
            Field::LessonNumber => "lessonNumber",
            Field::Strand => "strand",
            Field::SubStrand => "subStrand",
            Field::Title => "title",
            Field::LearningOutcomes => "learningOutcomes",
            Field::CoreCompetencies => "coreCompetencies",
            Field::KeyInquiryQuestion => "keyInquiryQuestion",
            Field::LearningResources => "learningResources",
            Field::Assessment => "assessment",
            Field::Reflection => "reflection",
            Field::Activities => "activities",
        }
    }
}

/// Patterns for one canonical field: anchored regexes for table header cells
/// plus plain-text synonyms for free-form section labels ("Strand:", "Topic -").
pub struct FieldPatterns {
    pub field: Field,
    pub headers: Vec<Regex>,
    pub synonyms: &'static [&'static str],
}

/// The single pattern library shared by both pipeline paths. Order matters
/// everywhere: the first matching pattern wins, with no backtracking to try a
/// later "better" match.
pub struct FieldPatternLibrary {
    fields: Vec<FieldPatterns>,
}

impl FieldPatternLibrary {
    pub fn standard() -> Self {
        let defs: &[(Field, &[&str], &'static [&'static str])] = &[
            (Field::Week, &[r"^weeks?\b", r"^wk\.?$"], &[]),
            (
                Field::LessonNumber,
                &[r"^lessons?$", r"^lsn$", r"^periods?$", r"^lesson\s+(?:no|number)\.?s?$"],
                &["lesson number", "lesson no"],
            ),
            (
                Field::Strand,
                &[
                    r"^strands?\b",
                    r"^themes?\b",
                    r"^topics?$",
                    r"^main\s+topics?\b",
                    r"^subject\s+areas?\b",
                    r"^content\s+areas?\b",
                ],
                &["strand", "theme", "topic", "main topic", "subject area", "content area"],
            ),
            (
                Field::SubStrand,
                &[
                    r"^sub[\s-]*strands?\b",
                    r"^sub[\s-]*topics?\b",
                    r"^sub[\s-]*themes?\b",
                    r"^specific\s+topics?\b",
                    r"^focus\s+areas?\b",
                ],
                &[
                    "sub-strand",
                    "sub strand",
                    "substrand",
                    "subtopic",
                    "sub-topic",
                    "sub topic",
                    "sub-theme",
                    "specific topic",
                    "focus area",
                    "focus",
                ],
            ),
            (
                Field::Title,
                &[
                    r"^titles?\b",
                    r"^lesson\s+title\b",
                    r"^lesson\s+topics?\b",
                    r"^lesson\s+name\b",
                    r"^topic\s+title\b",
                ],
                &["title", "lesson title", "topic title", "lesson name"],
            ),
            (
                Field::LearningOutcomes,
                &[
                    r"specific\s+learning\s+outcomes?",
                    r"learning\s+outcomes?",
                    r"^outcomes?\b",
                    r"^objectives?\b",
                    r"^slos?$",
                    r"^expected\s+outcomes?\b",
                    r"^goals?\b",
                ],
                &[
                    "specific learning outcomes",
                    "learning outcomes",
                    "learning objectives",
                    "objectives",
                    "expected outcomes",
                    "outcomes",
                    "slo",
                    "goals",
                ],
            ),
            (
                Field::CoreCompetencies,
                &[r"core\s+competenc", r"^competenc", r"^core\s+skills?\b", r"^key\s+competenc"],
                &[
                    "core competencies",
                    "key competencies",
                    "competency areas",
                    "competencies",
                    "core skills",
                    "skills",
                ],
            ),
            (
                Field::KeyInquiryQuestion,
                &[
                    r"inquiry\s+questions?",
                    r"^kiqs?$",
                    r"guiding\s+questions?",
                    r"essential\s+questions?",
                ],
                &[
                    "key inquiry question",
                    "key inquiry",
                    "inquiry questions",
                    "inquiry question",
                    "kiq",
                    "guiding question",
                    "essential question",
                ],
            ),
            (
                Field::LearningResources,
                &[
                    r"learning\s+resources?",
                    r"^resources?\b",
                    r"^materials?\b",
                    r"teaching\s+materials?",
                    r"learning\s+materials?",
                    r"teaching\s+aids?",
                    r"^references?\b",
                ],
                &[
                    "learning resources",
                    "learning materials",
                    "teaching materials",
                    "teaching aids",
                    "resources",
                    "materials",
                    "references",
                ],
            ),
            (
                Field::Assessment,
                &[
                    r"^assessments?\b",
                    r"^evaluations?\b",
                    r"assessment\s+(?:methods?|techniques?|strategies)",
                ],
                &[
                    "assessment methods",
                    "assessment techniques",
                    "assessment strategies",
                    "evaluation methods",
                    "assessment",
                    "evaluation",
                ],
            ),
            (
                Field::Reflection,
                &[
                    r"^reflections?\b",
                    r"self[\s-]*reflections?",
                    r"teacher\s+reflections?",
                    r"^remarks?\b",
                ],
                &["self-reflection", "teacher reflection", "reflections", "reflection"],
            ),
            (
                Field::Activities,
                &[
                    r"^activit",
                    r"learning\s+experiences?",
                    r"learning[\s/]+teaching\s+experiences?",
                    r"^procedures?\b",
                    r"teaching\s+activit",
                    r"learning\s+activit",
                ],
                &[
                    "learning experiences",
                    "teaching activities",
                    "learning activities",
                    "activities",
                    "activity",
                    "introduction",
                    "development",
                    "conclusion",
                    "procedure",
                ],
            ),
        ];

        let fields = defs
            .iter()
            .map(|&(field, headers, synonyms)| FieldPatterns {
                field,
                headers: headers
                    .iter()
                    .map(|p| Regex::new(p).expect("static header pattern"))
                    .collect(),
                synonyms,
            })
            .collect();

        FieldPatternLibrary { fields }
    }

    pub fn fields(&self) -> &[FieldPatterns] {
        &self.fields
    }

    /// Map one table header cell to a canonical field. Tests every field's
    /// header patterns in declaration order against the lowercased cell text;
    /// the first field with any matching pattern claims the cell.
    pub fn match_header(&self, column: &str) -> Option<Field> {
        let lower = column.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        for fp in &self.fields {
            if fp.headers.iter().any(|re| re.is_match(&lower)) {
                return Some(fp.field);
            }
        }
        None
    }
}

// ── Tests ──
