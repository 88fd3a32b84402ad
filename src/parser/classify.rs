use regex::Regex;

use super::taxonomy::{find_word, Subject, Taxonomy};

/// Sentinel returned when no strand evidence exists.
pub const GENERAL: &str = "General";
/// Sentinel returned when no sub-strand evidence exists.
pub const GENERAL_TOPIC: &str = "General Topic";

/// Heuristic scoring constants. The values are carried over verbatim from the
/// hand-tuning of the original system against its sample documents; no record
/// of how they were derived exists, and there is no guarantee they generalize
/// (see DESIGN.md). They are named and overridable rather than re-derived.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    /// Multiplier for a word-boundary keyword match when scoring subjects.
    pub keyword_exact: f32,
    /// Multiplier for a plain substring keyword match when scoring subjects.
    pub keyword_partial: f32,
    /// Bonus added when any of a subject's matched terms falls entirely
    /// within the first `early_window` bytes of the content.
    pub early_bonus: f32,
    pub early_window: usize,
    /// Multiplier for a word-boundary keyword match when scoring sub-strands.
    pub sub_exact: f32,
    /// Multiplier for a substring keyword match when scoring sub-strands.
    pub sub_partial: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            keyword_exact: 1.2,
            keyword_partial: 0.8,
            early_bonus: 2.0,
            early_window: 200,
            sub_exact: 1.5,
            sub_partial: 1.0,
        }
    }
}

/// Fixed synonym table applied before title-casing. Every multi-word value's
/// lower-case form is also a key so that `normalize` is idempotent.
const NORMALIZATIONS: &[(&str, &str)] = &[
    ("math", "Mathematics"),
    ("maths", "Mathematics"),
    ("mathematics", "Mathematics"),
    ("numbers", "Numbers"),
    ("geometry", "Geometry"),
    ("measurement", "Measurement"),
    ("data", "Data Handling"),
    ("data handling", "Data Handling"),
    ("science", "Science"),
    ("living things", "Living Things"),
    ("non living", "Non-Living Things"),
    ("non-living things", "Non-Living Things"),
    ("energy", "Energy"),
    ("environment", "Environment"),
    ("health", "Health Education"),
    ("health education", "Health Education"),
    ("english", "English"),
    ("kiswahili", "Kiswahili"),
    ("listening", "Listening And Speaking"),
    ("speaking", "Listening And Speaking"),
    ("listening and speaking", "Listening And Speaking"),
    ("reading", "Reading"),
    ("writing", "Writing"),
    ("social studies", "Social Studies"),
    ("history", "History"),
    ("geography", "Geography"),
    ("citizenship", "Citizenship"),
    ("creative arts", "Creative Arts"),
    ("visual arts", "Visual Arts"),
    ("performing arts", "Performing Arts"),
    ("pe", "Physical Education"),
    ("physical education", "Physical Education"),
    ("ict", "ICT"),
    ("computing", "ICT"),
    ("computer", "ICT"),
    ("re", "Religious Education"),
    ("religious education", "Religious Education"),
];

/// Single-word fallback: first content word found here decides the subject.
const SINGLE_WORD_SUBJECTS: &[(&str, &str)] = &[
    ("numbers", "mathematics"),
    ("geometry", "mathematics"),
    ("measurement", "mathematics"),
    ("fractions", "mathematics"),
    ("algebra", "mathematics"),
    ("shapes", "mathematics"),
    ("angles", "mathematics"),
    ("data", "mathematics"),
    ("science", "science"),
    ("biology", "science"),
    ("physics", "science"),
    ("chemistry", "science"),
    ("plants", "science"),
    ("animals", "science"),
    ("energy", "science"),
    ("matter", "science"),
    ("health", "science"),
    ("environment", "science"),
    ("english", "english"),
    ("language", "english"),
    ("reading", "english"),
    ("writing", "english"),
    ("grammar", "english"),
    ("vocabulary", "english"),
    ("history", "social studies"),
    ("geography", "social studies"),
    ("maps", "social studies"),
    ("citizenship", "social studies"),
    ("government", "social studies"),
    ("art", "creative arts"),
    ("music", "creative arts"),
    ("dance", "creative arts"),
    ("drama", "creative arts"),
    ("drawing", "creative arts"),
    ("painting", "creative arts"),
    ("computer", "ict"),
    ("technology", "ict"),
    ("programming", "ict"),
    ("coding", "ict"),
    ("sports", "physical education"),
    ("games", "physical education"),
    ("exercise", "physical education"),
];

/// Single-word sub-strand fallback, values in display form.
const SINGLE_WORD_SUBSTRANDS: &[(&str, &str)] = &[
    ("numbers", "Numbers"),
    ("counting", "Numbers"),
    ("fractions", "Numbers"),
    ("decimals", "Numbers"),
    ("geometry", "Geometry"),
    ("shapes", "Geometry"),
    ("angles", "Geometry"),
    ("measurement", "Measurement"),
    ("length", "Measurement"),
    ("mass", "Measurement"),
    ("time", "Measurement"),
    ("data", "Data Handling"),
    ("graphs", "Data Handling"),
    ("statistics", "Data Handling"),
    ("animals", "Living Things"),
    ("plants", "Living Things"),
    ("habitats", "Living Things"),
    ("classification", "Living Things"),
    ("energy", "Energy"),
    ("forces", "Energy"),
    ("electricity", "Energy"),
    ("magnetism", "Energy"),
    ("matter", "Non-Living Things"),
    ("materials", "Non-Living Things"),
    ("health", "Health Education"),
    ("nutrition", "Health Education"),
    ("hygiene", "Health Education"),
    ("environment", "Environment"),
    ("weather", "Environment"),
    ("climate", "Environment"),
    ("reading", "Reading"),
    ("comprehension", "Reading"),
    ("writing", "Writing"),
    ("composition", "Writing"),
    ("grammar", "Writing"),
    ("listening", "Listening And Speaking"),
    ("speaking", "Listening And Speaking"),
    ("oral", "Listening And Speaking"),
    ("history", "History"),
    ("geography", "Geography"),
    ("maps", "Geography"),
    ("citizenship", "Citizenship"),
    ("government", "Citizenship"),
    ("economics", "Economics"),
    ("trade", "Economics"),
    ("drawing", "Visual Arts"),
    ("painting", "Visual Arts"),
    ("art", "Visual Arts"),
    ("music", "Performing Arts"),
    ("dance", "Performing Arts"),
    ("drama", "Performing Arts"),
    ("programming", "Programming"),
    ("coding", "Programming"),
    ("computers", "Computing"),
    ("internet", "Digital Literacy"),
    ("games", "Games And Sports"),
    ("sports", "Games And Sports"),
    ("fitness", "Health And Fitness"),
    ("exercise", "Health And Fitness"),
];

const STOP_WORDS: &[&str] = &["THE", "AND", "FOR", "WITH"];
const EDGE_FILLERS: &[&str] = &["and", "or", "the", "a", "an", "in", "of", "for", "with"];

/// Multi-strategy strand / sub-strand classifier over an immutable taxonomy.
/// Never fails: absence of evidence degrades to the "General" sentinels.
pub struct StrandClassifier {
    taxonomy: Taxonomy,
    weights: ScoringWeights,
    strand_labels: Vec<Regex>,
    substrand_labels: Vec<Regex>,
    descriptive: Regex,
    cap_run: Regex,
}

impl StrandClassifier {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self::with_weights(taxonomy, ScoringWeights::default())
    }

    pub fn with_weights(taxonomy: Taxonomy, weights: ScoringWeights) -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("static classifier pattern"))
                .collect()
        };
        StrandClassifier {
            taxonomy,
            weights,
            strand_labels: compile(&[
                r"(?i)strands?[:\-]?\s*([a-z\s]+?)(?:\s+sub[\-\s]*strand|$|\.|\n)",
                r"(?i)subject[:\-]?\s*([a-z\s]+?)(?:\s+topic|$|\.|\n)",
                r"(?i)theme[:\-]?\s*([a-z\s]+?)(?:\s+sub|$|\.|\n)",
                r"(?i)^([a-z][a-z\s]+?)[:\-]\s*",
                r"(?i)learning\s+area[:\-]?\s*([a-z\s]+?)(?:\s+topic|$|\.|\n)",
            ]),
            substrand_labels: compile(&[
                r"(?i)sub[\-\s]*strands?[:\-]?\s*([a-z\s]+?)(?:\s+by\s+the\s+end|$|\.|\n)",
                r"(?i)topic[:\-]?\s*([a-z\s]+?)(?:\s+by\s+the\s+end|$|\.|\n)",
                r"(?i)sub[\-\s]*topics?[:\-]?\s*([a-z\s]+?)(?:\s+by\s+the\s+end|$|\.|\n)",
                r"(?i)focus[:\-]?\s*([a-z\s]+?)(?:\s+by\s+the\s+end|$|\.|\n)",
            ]),
            descriptive: Regex::new(
                r"(?i)([a-z\s]+?)\s+(?:concepts?|skills?|activities?|methods?|techniques?)",
            )
            .expect("static descriptive pattern"),
            cap_run: Regex::new(r"\b[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*\b")
                .expect("static capitalized-run pattern"),
        }
    }

    /// Identify the strand for a piece of content. Four strategies, first
    /// success wins: explicit label extraction, weighted taxonomy scoring,
    /// single-word lookup, capitalized-phrase lookup.
    pub fn identify_strand(&self, content: &str) -> String {
        let content = content.trim();
        let lower = content.to_lowercase();

        // Strategy 1: explicit "Strand:"/"Subject:"/"Theme:"/ALL-CAPS labels.
        for re in &self.strand_labels {
            if let Some(caps) = re.captures(content) {
                let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if let Some(subject) = self.taxonomy.canonical(&candidate.to_lowercase()) {
                    return format_label(&subject.name);
                }
            }
        }

        // Strategy 2: weighted scoring over taxonomy names, aliases and
        // sub-strand keywords.
        if let Some(subject) = self.best_subject(&lower) {
            return format_label(&subject.name);
        }

        // Strategy 3: first single word with a known subject mapping.
        for word in lower.split_whitespace() {
            let word = word.trim_matches(|c: char| ".,!?:;".contains(c));
            if let Some((_, subject)) = SINGLE_WORD_SUBJECTS.iter().find(|(w, _)| *w == word) {
                return format_label(subject);
            }
        }

        // Strategy 4: capitalized runs that map onto the taxonomy.
        for m in self.cap_run.find_iter(content) {
            let run = m.as_str().trim();
            if run.len() < 3 || run.len() > 30 {
                continue;
            }
            if STOP_WORDS.contains(&run.to_uppercase().as_str()) {
                continue;
            }
            if let Some(subject) = self.taxonomy.canonical(&run.to_lowercase()) {
                return format_label(&subject.name);
            }
        }

        GENERAL.to_string()
    }

    /// Identify the sub-strand, scoped to the already-chosen strand where
    /// applicable. Five strategies, first success wins.
    pub fn identify_substrand(&self, content: &str, strand: &str) -> String {
        let content = content.trim();
        let lower = content.to_lowercase();
        let strand_lower = strand.to_lowercase();

        // Strategy 1: explicit "Sub-strand:"/"Topic:"/"Focus:" labels.
        for re in &self.substrand_labels {
            if let Some(caps) = re.captures(content) {
                let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if candidate.len() > 2 && candidate.len() < 100 {
                    return format_label(candidate);
                }
            }
        }

        // Strategy 2: weighted keyword scoring over the strand's sub-strands.
        if let Some(subject) = self.taxonomy.get(&strand_lower) {
            if let Some(name) = self.best_substrand(subject, &lower) {
                return format_label(name);
            }
        }

        // Strategy 3: text following a mention of the strand itself.
        if strand_lower != "general" {
            if let Some(candidate) = after_strand_mention(&lower, &strand_lower) {
                let trimmed = trim_fillers(&candidate);
                if trimmed.len() > 2 && trimmed.len() < 50 {
                    return format_label(trimmed);
                }
            }
        }

        // Strategy 4: descriptive suffixes ("... concepts/skills/methods").
        if let Some(caps) = self.descriptive.captures(content) {
            let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let trimmed = trim_fillers(candidate);
            if trimmed.len() > 2 && trimmed.len() < 50 {
                return format_label(trimmed);
            }
        }

        // Strategy 5: single-word sub-strand lookup.
        for word in lower.split_whitespace() {
            let word = word.trim_matches(|c: char| ".,!?:;".contains(c));
            if let Some((_, sub)) = SINGLE_WORD_SUBSTRANDS.iter().find(|(w, _)| *w == word) {
                return sub.to_string();
            }
        }

        GENERAL_TOPIC.to_string()
    }

    /// Normalize a strand/sub-strand name: synonym table first, title-case
    /// otherwise. Idempotent and case-insensitive.
    pub fn normalize(&self, name: &str) -> String {
        let trimmed = name.trim();
        let lower = trimmed.to_lowercase();
        if let Some((_, v)) = NORMALIZATIONS.iter().find(|(k, _)| *k == lower) {
            return v.to_string();
        }
        title_case(trimmed)
    }

    fn best_subject(&self, lower: &str) -> Option<&Subject> {
        let w = &self.weights;
        let mut best: Option<(&Subject, f32)> = None;

        for subject in self.taxonomy.subjects() {
            // (score, start, len) per individual term match.
            let mut matches: Vec<(f32, usize, usize)> = Vec::new();
            if let Some(p) = lower.find(&subject.name) {
                matches.push((subject.name.len() as f32, p, subject.name.len()));
            }
            for alias in &subject.aliases {
                if let Some(p) = lower.find(alias.as_str()) {
                    matches.push((alias.len() as f32, p, alias.len()));
                }
            }
            for ss in &subject.sub_strands {
                for kw in &ss.keywords {
                    if let Some(p) = find_word(lower, kw) {
                        matches.push((kw.len() as f32 * w.keyword_exact, p, kw.len()));
                    } else if let Some(p) = lower.find(kw.as_str()) {
                        matches.push((kw.len() as f32 * w.keyword_partial, p, kw.len()));
                    }
                }
            }
            if matches.is_empty() {
                continue;
            }

            let mut score = matches.iter().map(|m| m.0).fold(0.0f32, f32::max);
            if matches.iter().any(|&(_, p, l)| p + l <= w.early_window) {
                score += w.early_bonus;
            }
            // Strict comparison: ties go to the subject declared first.
            let better = match best {
                None => true,
                Some((_, b)) => score > b,
            };
            if better {
                best = Some((subject, score));
            }
        }

        best.map(|(s, _)| s)
    }

    fn best_substrand<'a>(&self, subject: &'a Subject, lower: &str) -> Option<&'a str> {
        let w = &self.weights;
        let mut best: Option<(&str, f32)> = None;

        for ss in &subject.sub_strands {
            let mut max = 0.0f32;
            for kw in &ss.keywords {
                let score = if find_word(lower, kw).is_some() {
                    kw.len() as f32 * w.sub_exact
                } else if lower.contains(kw.as_str()) {
                    kw.len() as f32 * w.sub_partial
                } else {
                    continue;
                };
                max = max.max(score);
            }
            if max > 0.0 {
                let better = match best {
                    None => true,
                    Some((_, b)) => max > b,
                };
                if better {
                    best = Some((ss.name.as_str(), max));
                }
            }
        }

        best.map(|(name, _)| name)
    }
}

/// Capture the text following a mention of the strand, up to the first of
/// " by the end" / "learning" / "objective" or the end of the run of
/// letters/spaces/commas after the mention.
fn after_strand_mention(lower: &str, strand_lower: &str) -> Option<String> {
    let pos = lower.find(strand_lower)?;
    let mut rest = &lower[pos + strand_lower.len()..];
    if let Some(stripped) = rest.strip_prefix([':', '-']) {
        rest = stripped;
    }
    let rest = rest.trim_start();

    let region_end = rest
        .char_indices()
        .find(|&(_, c)| !(c.is_alphabetic() || c.is_whitespace() || c == ','))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let region = &rest[..region_end];

    let cut = [" by the end", "learning", "objective"]
        .iter()
        .filter_map(|t| region.find(t))
        .min();

    let captured = match cut {
        Some(i) => &region[..i],
        // Without a terminator the capture is only valid when the region runs
        // to the end of the content.
        None if region_end == rest.len() => region,
        None => return None,
    };
    let captured = captured.trim();
    if captured.is_empty() {
        None
    } else {
        Some(captured.to_string())
    }
}

/// Strip leading/trailing filler words (articles and common conjunctions).
fn trim_fillers(text: &str) -> &str {
    let mut t = text.trim();
    loop {
        let mut changed = false;
        for f in EDGE_FILLERS {
            if let Some(rest) = t.strip_prefix(f) {
                if rest.starts_with(char::is_whitespace) {
                    t = rest.trim_start();
                    changed = true;
                }
            }
            if let Some(rest) = t.strip_suffix(f) {
                if rest.ends_with(char::is_whitespace) {
                    t = rest.trim_end();
                    changed = true;
                }
            }
        }
        if !changed {
            return t;
        }
    }
}

/// Display form of a lower-case taxonomy name. A few abbreviations keep their
/// conventional casing; everything else is title-cased per word.
pub(crate) fn format_label(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "ict" => "ICT".to_string(),
        "pe" => "Physical Education".to_string(),
        "re" => "Religious Education".to_string(),
        _ => title_case(name),
    }
}

pub(crate) fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::taxonomy::{SubStrandDef, Subject};

    fn classifier() -> StrandClassifier {
        StrandClassifier::new(Taxonomy::cbc())
    }

    #[test]
    fn explicit_labels() {
        let c = classifier();
        let content = "STRAND: Mathematics SUB-STRAND: Numbers";
        assert_eq!(c.identify_strand(content), "Mathematics");
        assert_eq!(c.identify_substrand(content, "Mathematics"), "Numbers");
    }

    #[test]
    fn all_caps_prefix() {
        let c = classifier();
        assert_eq!(c.identify_strand("Science: Living things and their environment"), "Science");
        assert_eq!(c.identify_strand("English - Reading comprehension skills"), "English");
        assert_eq!(c.identify_strand("Creative Arts: Drawing and painting"), "Creative Arts");
        assert_eq!(c.identify_strand("Social Studies - History of Kenya"), "Social Studies");
    }

    #[test]
    fn keyword_scoring() {
        let c = classifier();
        assert_eq!(c.identify_strand("Week 1: Understanding fractions"), "Mathematics");
        assert_eq!(c.identify_strand("ICT skills - computer programming"), "ICT");
    }

    #[test]
    fn scoped_substrands() {
        let c = classifier();
        assert_eq!(
            c.identify_substrand("Week 1: Understanding fractions", "Mathematics"),
            "Numbers"
        );
        assert_eq!(
            c.identify_substrand("ICT skills - computer programming", "ICT"),
            "Programming"
        );
        assert_eq!(
            c.identify_substrand("Physical Education: Games and sports", "Physical Education"),
            "Games And Sports"
        );
        assert_eq!(
            c.identify_substrand("English - Reading comprehension skills", "English"),
            "Reading"
        );
    }

    #[test]
    fn never_empty() {
        let c = classifier();
        assert_eq!(c.identify_strand(""), GENERAL);
        assert_eq!(c.identify_strand("zzz qqq"), GENERAL);
        assert_eq!(c.identify_substrand("", GENERAL), GENERAL_TOPIC);
        assert_eq!(c.identify_substrand("zzz qqq", GENERAL), GENERAL_TOPIC);
    }

    #[test]
    fn normalize_idempotent_and_case_insensitive() {
        let c = classifier();
        assert_eq!(c.normalize("MATHS"), "Mathematics");
        assert_eq!(c.normalize("maths"), "Mathematics");
        assert_eq!(c.normalize("Mathematics"), "Mathematics");
        assert_eq!(c.normalize(&c.normalize("pe")), c.normalize("pe"));
        assert_eq!(c.normalize(&c.normalize("ict")), "ICT");
        assert_eq!(c.normalize(&c.normalize("non living")), c.normalize("non living"));
        assert_eq!(c.normalize(&c.normalize("some odd topic")), "Some Odd Topic");
    }

    #[test]
    fn declaration_order_breaks_ties() {
        // Two subjects sharing an equally scored keyword: the one declared
        // first must win.
        let taxonomy = Taxonomy::new(vec![
            Subject {
                name: "astronomy".into(),
                aliases: vec![],
                sub_strands: vec![SubStrandDef {
                    name: "orbits".into(),
                    keywords: vec!["kepler".into()],
                }],
            },
            Subject {
                name: "navigation".into(),
                aliases: vec![],
                sub_strands: vec![SubStrandDef {
                    name: "charts".into(),
                    keywords: vec!["kepler".into()],
                }],
            },
        ]);
        let c = StrandClassifier::new(taxonomy);
        assert_eq!(c.identify_strand("a lesson about kepler"), "Astronomy");
    }

    #[test]
    fn substrand_tie_breaks_by_declaration_order() {
        let taxonomy = Taxonomy::new(vec![Subject {
            name: "astronomy".into(),
            aliases: vec![],
            sub_strands: vec![
                SubStrandDef {
                    name: "orbits".into(),
                    keywords: vec!["kepler".into()],
                },
                SubStrandDef {
                    name: "optics".into(),
                    keywords: vec!["kepler".into()],
                },
            ],
        }]);
        let c = StrandClassifier::new(taxonomy);
        assert_eq!(c.identify_substrand("a lesson about kepler", "Astronomy"), "Orbits");
    }

    #[test]
    fn descriptive_suffix_fallback() {
        let c = classifier();
        // No labels, no taxonomy keywords: falls through to the descriptive
        // suffix pattern.
        assert_eq!(c.identify_substrand("basket weaving techniques", GENERAL), "Basket Weaving");
    }

    #[test]
    fn single_word_fallbacks() {
        let c = classifier();
        assert_eq!(c.identify_strand("fractions"), "Mathematics");
        assert_eq!(c.identify_substrand("all about the internet", "ICT"), "Digital Literacy");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("living things"), "Living Things");
        assert_eq!(title_case("NON-LIVING matter"), "Non-living Matter");
        assert_eq!(title_case(""), "");
    }
}
