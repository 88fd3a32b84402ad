use regex::Regex;

/// The unified week-marker cascade. The two pipelines of the original system
/// carried diverging pattern lists; this list is the merge of both, tried per
/// line in fixed order with the first match winning.
pub struct WeekPatterns {
    patterns: Vec<Regex>,
}

impl WeekPatterns {
    pub fn standard() -> Self {
        // Word boundaries on the week/wk/w prefix keep words that merely end
        // in "w" ("draw 3") from being read as markers.
        let raw = [
            r"(?i)\b(?:week|wk|w)\s*[:\-]?\s*(\d+)",
            r"^(\d+)$",
            r"(?i)(\d+)\s+(?:week|wk)",
            r"^(\d+)\s+\d+",
            r"(?i)\bterm\s+\d+\s+week\s+(\d+)",
            r"(?i)\bt\d+\s*w(\d+)\b",
        ];
        WeekPatterns {
            patterns: raw
                .iter()
                .map(|p| Regex::new(p).expect("static week pattern"))
                .collect(),
        }
    }

    /// Match a line against the cascade. Returns the parsed week number of
    /// the first matching pattern, or None. Zero weeks and captures that do
    /// not parse as integers are skipped rather than raising.
    pub fn match_week(&self, line: &str) -> Option<u32> {
        let line = line.trim();
        for re in &self.patterns {
            if let Some(caps) = re.captures(line) {
                if let Some(week) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                    if week > 0 {
                        return Some(week);
                    }
                }
            }
        }
        None
    }

    pub fn is_marker(&self, line: &str) -> bool {
        self.match_week(line).is_some()
    }
}

/// One per-week content block. The marker line itself is kept as the first
/// content line so that downstream regex scans see text like
/// "Week 1: Understanding fractions".
#[derive(Debug, Clone)]
pub struct WeekBlock {
    pub week: u32,
    pub lines: Vec<String>,
}

/// Partition free-form text into per-week blocks. A matching line closes the
/// current block and opens a new one; non-matching lines append to the open
/// block; lines before the first marker are discarded. Repeated week numbers
/// open independent blocks: a document with two "Week 1" sections yields two
/// records for week 1, not a last-wins overwrite.
pub fn segment_weeks(text: &str, patterns: &WeekPatterns) -> Vec<WeekBlock> {
    let mut blocks: Vec<WeekBlock> = Vec::new();
    let mut current: Option<WeekBlock> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(week) = patterns.match_week(line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(WeekBlock {
                week,
                lines: vec![line.to_string()],
            });
            continue;
        }

        if let Some(block) = current.as_mut() {
            block.lines.push(line.to_string());
        }
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks
}

// ── Tests ──
