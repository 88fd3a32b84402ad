/// One sub-strand and the keywords that evidence it.
#[derive(Debug, Clone)]
pub struct SubStrandDef {
    pub name: String,
    pub keywords: Vec<String>,
}

/// One subject (strand) with its aliases and sub-strands. Declaration order
/// is significant: classification ties are broken in favour of the subject
/// declared first.
#[derive(Debug, Clone)]
pub struct Subject {
    pub name: String,
    pub aliases: Vec<String>,
    pub sub_strands: Vec<SubStrandDef>,
}

/// The curriculum taxonomy: read-only after construction, built once at
/// process start and shared by reference. All names are stored lower-case
/// for matching; display forms are title-cased on output.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    subjects: Vec<Subject>,
}

impl Taxonomy {
    /// Every subject must carry at least one sub-strand and every sub-strand
    /// at least one keyword; entries violating that are dropped.
    pub fn new(subjects: Vec<Subject>) -> Self {
        let subjects = subjects
            .into_iter()
            .map(|mut s| {
                s.name = s.name.to_lowercase();
                for a in &mut s.aliases {
                    *a = a.to_lowercase();
                }
                s.sub_strands.retain(|ss| !ss.keywords.is_empty());
                for ss in &mut s.sub_strands {
                    ss.name = ss.name.to_lowercase();
                    for kw in &mut ss.keywords {
                        *kw = kw.to_lowercase();
                    }
                }
                s
            })
            .filter(|s| !s.sub_strands.is_empty())
            .collect();
        Taxonomy { subjects }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn get(&self, name_lower: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name_lower)
    }

    /// Map free text onto a subject: exact name or alias match first, then
    /// word-boundary containment of a name/alias inside the text
    /// ("ict skills" -> ict). Containment is boundary-checked so that short
    /// aliases like "re" or "pe" never fire inside unrelated words.
    pub fn canonical(&self, text_lower: &str) -> Option<&Subject> {
        let text = text_lower.trim();
        if text.is_empty() {
            return None;
        }
        for s in &self.subjects {
            if s.name == text || s.aliases.iter().any(|a| a == text) {
                return Some(s);
            }
        }
        self.subjects.iter().find(|s| {
            find_word(text, &s.name).is_some()
                || s.aliases.iter().any(|a| find_word(text, a).is_some())
        })
    }

    /// The CBC taxonomy this system targets.
    pub fn cbc() -> Self {
        fn sub(name: &str, keywords: &[&str]) -> SubStrandDef {
            SubStrandDef {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            }
        }
        fn subject(name: &str, aliases: &[&str], subs: Vec<SubStrandDef>) -> Subject {
            Subject {
                name: name.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
                sub_strands: subs,
            }
        }

        Taxonomy::new(vec![
            subject(
                "mathematics",
                &["math", "maths", "mathematics", "arithmetic"],
                vec![
                    sub("numbers", &[
                        "number", "numeration", "counting", "place value", "whole numbers",
                        "integers", "fractions", "decimals", "percentages",
                    ]),
                    sub("geometry", &[
                        "shapes", "geometric", "2d", "3d", "lines", "angles", "polygons",
                        "circles", "spatial",
                    ]),
                    sub("measurement", &[
                        "measuring", "length", "mass", "weight", "time", "capacity", "volume",
                        "area", "perimeter",
                    ]),
                    sub("data handling", &["data", "statistics", "graphs", "charts", "probability"]),
                    sub("algebra", &["patterns", "equations", "expressions", "variables", "functions"]),
                    sub("money", &["currency", "coins", "notes", "buying", "selling", "profit", "loss"]),
                ],
            ),
            subject(
                "science",
                &["science", "sciences", "natural science"],
                vec![
                    sub("living things", &[
                        "life", "biology", "plants", "animals", "human body", "organisms",
                        "cells", "habitats", "ecosystems",
                    ]),
                    sub("non-living things", &[
                        "matter", "materials", "substances", "physics", "properties",
                        "states of matter",
                    ]),
                    sub("energy", &[
                        "force", "motion", "electricity", "magnetism", "heat", "light", "sound",
                        "renewable",
                    ]),
                    sub("environment", &[
                        "ecology", "conservation", "pollution", "weather", "climate",
                        "natural resources",
                    ]),
                    sub("health education", &[
                        "health", "hygiene", "nutrition", "disease", "safety", "first aid",
                        "mental health",
                    ]),
                ],
            ),
            subject(
                "english",
                &["english", "language arts", "literacy"],
                vec![
                    sub("listening and speaking", &[
                        "listening", "speaking", "oral", "conversation", "presentation",
                        "communication",
                    ]),
                    sub("reading", &["reading", "comprehension", "phonics", "fluency", "vocabulary"]),
                    sub("writing", &[
                        "writing", "composition", "spelling", "grammar", "handwriting",
                        "creative writing",
                    ]),
                ],
            ),
            subject(
                "kiswahili",
                &["kiswahili", "swahili", "kusoma", "kuandika"],
                vec![
                    sub("kusikiliza na kuzungumza", &["kusikiliza", "kuzungumza", "mazungumzo", "maongezi"]),
                    sub("kusoma", &["kusoma", "ufahamu", "msamiati"]),
                    sub("kuandika", &["kuandika", "utunzi", "sarufi", "imla"]),
                ],
            ),
            subject(
                "social studies",
                &["social studies", "social science", "history and government"],
                vec![
                    sub("history", &["history", "historical", "past", "heritage", "culture", "civilization"]),
                    sub("geography", &[
                        "geography", "maps", "location", "physical features", "climate", "regions",
                    ]),
                    sub("citizenship", &[
                        "citizenship", "civic", "government", "rights", "responsibilities",
                        "democracy",
                    ]),
                    sub("economics", &[
                        "economics", "trade", "resources", "production", "consumption", "business",
                    ]),
                ],
            ),
            subject(
                "creative arts",
                &["creative arts", "arts", "fine arts"],
                vec![
                    sub("visual arts", &["visual arts", "drawing", "painting", "crafts", "art", "sculpture"]),
                    sub("performing arts", &[
                        "performing arts", "music", "dance", "drama", "theatre", "instruments",
                    ]),
                    sub("digital arts", &["digital arts", "computer arts", "multimedia", "digital design"]),
                ],
            ),
            subject(
                "ict",
                &["ict", "information technology", "computer studies", "computing", "technology"],
                vec![
                    sub("computing", &["computing", "computer", "hardware", "software", "systems"]),
                    sub("programming", &["programming", "coding", "algorithms", "software development"]),
                    sub("digital literacy", &[
                        "digital literacy", "internet", "web", "online safety", "digital citizenship",
                    ]),
                ],
            ),
            subject(
                "physical education",
                &["physical education", "pe", "sports", "games"],
                vec![
                    sub("motor skills", &["motor skills", "movement", "coordination", "balance", "agility"]),
                    sub("games and sports", &["games", "sports", "athletics", "competition", "team sports"]),
                    sub("health and fitness", &["fitness", "exercise", "physical activity", "wellness"]),
                ],
            ),
            subject(
                "religious education",
                &["religious education", "re", "religion", "christian education"],
                vec![
                    sub("beliefs and practices", &[
                        "beliefs", "faith", "doctrine", "teachings", "practices", "worship",
                    ]),
                    sub("values and morals", &["values", "morals", "ethics", "character", "virtues"]),
                ],
            ),
        ])
    }
}

/// Find `needle` in `haystack` at a word boundary: the characters adjacent to
/// the match, if any, must not be alphanumeric or '_'. Returns the byte
/// offset of the first such occurrence.
pub(crate) fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let start = from + rel;
        let end = start + needle.len();
        let ok_before = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
        let ok_after = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
        if ok_before && ok_after {
            return Some(start);
        }
        from = start + needle.len().max(1);
    }
    None
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbc_shape() {
        let t = Taxonomy::cbc();
        assert!(t.subjects().len() >= 8);
        for s in t.subjects() {
            assert!(!s.sub_strands.is_empty(), "{} has no sub-strands", s.name);
            for ss in &s.sub_strands {
                assert!(!ss.keywords.is_empty(), "{}/{} has no keywords", s.name, ss.name);
            }
        }
    }

    #[test]
    fn canonical_exact_and_alias() {
        let t = Taxonomy::cbc();
        assert_eq!(t.canonical("mathematics").map(|s| s.name.as_str()), Some("mathematics"));
        assert_eq!(t.canonical("maths").map(|s| s.name.as_str()), Some("mathematics"));
        assert_eq!(t.canonical("pe").map(|s| s.name.as_str()), Some("physical education"));
    }

    #[test]
    fn canonical_containment() {
        let t = Taxonomy::cbc();
        assert_eq!(t.canonical("ict skills").map(|s| s.name.as_str()), Some("ict"));
        assert!(t.canonical("unknown subject").is_none());
    }

    #[test]
    fn short_alias_needs_word_boundary() {
        let t = Taxonomy::cbc();
        // "reading" contains the letters "re" but must not map to religious
        // education.
        assert!(t.canonical("reading").is_none());
    }

    #[test]
    fn find_word_boundaries() {
        assert_eq!(find_word("ict skills", "ict"), Some(0));
        assert_eq!(find_word("basic ict skills", "ict"), Some(6));
        assert_eq!(find_word("strict rules", "ict"), None);
        assert_eq!(find_word("fractions", "fractions"), Some(0));
        assert_eq!(find_word("anything", ""), None);
    }

    #[test]
    fn names_stored_lowercase() {
        let t = Taxonomy::new(vec![Subject {
            name: "Robotics".into(),
            aliases: vec!["ROBOTS".into()],
            sub_strands: vec![SubStrandDef {
                name: "Sensors".into(),
                keywords: vec!["LIDAR".into()],
            }],
        }]);
        let s = t.get("robotics").unwrap();
        assert_eq!(s.aliases[0], "robots");
        assert_eq!(s.sub_strands[0].name, "sensors");
        assert_eq!(s.sub_strands[0].keywords[0], "lidar");
    }
}
