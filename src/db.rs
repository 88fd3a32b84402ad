use anyhow::Result;
use rusqlite::Connection;

use crate::parser::LessonRecord;

const DB_PATH: &str = "data/schemes.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id           INTEGER PRIMARY KEY,
            filename     TEXT NOT NULL,
            kind         TEXT NOT NULL CHECK(kind IN ('pdf','docx','txt')),
            imported_at  TEXT NOT NULL,
            lesson_count INTEGER NOT NULL,
            weeks_found  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lessons (
            id                   INTEGER PRIMARY KEY,
            document_id          INTEGER NOT NULL REFERENCES documents(id),
            week                 INTEGER NOT NULL,
            lesson_number        INTEGER NOT NULL,
            title                TEXT NOT NULL,
            strand               TEXT NOT NULL,
            sub_strand           TEXT NOT NULL,
            learning_outcomes    TEXT NOT NULL,
            core_competencies    TEXT NOT NULL,
            key_inquiry_question TEXT NOT NULL,
            learning_resources   TEXT NOT NULL,
            activities           TEXT NOT NULL,
            assessment           TEXT NOT NULL,
            reflection           TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_lessons_document ON lessons(document_id);
        CREATE INDEX IF NOT EXISTS idx_lessons_week ON lessons(week);
        CREATE INDEX IF NOT EXISTS idx_lessons_strand ON lessons(strand);
        ",
    )?;
    Ok(())
}

// ── Ingest ──

pub struct DocumentRow {
    pub filename: String,
    pub kind: String,
    pub imported_at: String,
    pub lesson_count: usize,
    pub weeks_found: Vec<u32>,
}

pub fn insert_document(conn: &Connection, doc: &DocumentRow) -> Result<i64> {
    let weeks = doc
        .weeks_found
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",");
    conn.execute(
        "INSERT INTO documents (filename, kind, imported_at, lesson_count, weeks_found)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![doc.filename, doc.kind, doc.imported_at, doc.lesson_count as i64, weeks],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List fields are stored newline-joined and re-split on read.
pub fn save_lessons(conn: &Connection, document_id: i64, lessons: &[LessonRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO lessons
             (document_id, week, lesson_number, title, strand, sub_strand,
              learning_outcomes, core_competencies, key_inquiry_question,
              learning_resources, activities, assessment, reflection)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for lesson in lessons {
            stmt.execute(rusqlite::params![
                document_id,
                lesson.week,
                lesson.lesson_number,
                lesson.title,
                lesson.strand,
                lesson.sub_strand,
                lesson.learning_outcomes.join("\n"),
                lesson.core_competencies.join("\n"),
                lesson.key_inquiry_question,
                lesson.learning_resources.join("\n"),
                lesson.activities.join("\n"),
                lesson.assessment,
                lesson.reflection,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Queries ──

pub struct StoredLesson {
    pub id: i64,
    pub document_id: i64,
    pub record: LessonRecord,
}

fn split_list(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn fetch_lessons(
    conn: &Connection,
    week: Option<u32>,
    strand: Option<&str>,
    limit: usize,
) -> Result<Vec<StoredLesson>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(w) = week {
        conditions.push(format!("week = ?{}", params.len() + 1));
        params.push(Box::new(w));
    }
    if let Some(s) = strand {
        conditions.push(format!("strand = ?{} COLLATE NOCASE", params.len() + 1));
        params.push(Box::new(s.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT id, document_id, week, lesson_number, title, strand, sub_strand,
                learning_outcomes, core_competencies, key_inquiry_question,
                learning_resources, activities, assessment, reflection
         FROM lessons{}
         ORDER BY week, lesson_number, id
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(StoredLesson {
                id: row.get(0)?,
                document_id: row.get(1)?,
                record: LessonRecord {
                    week: row.get(2)?,
                    lesson_number: row.get(3)?,
                    title: row.get(4)?,
                    strand: row.get(5)?,
                    sub_strand: row.get(6)?,
                    learning_outcomes: split_list(&row.get::<_, String>(7)?),
                    core_competencies: split_list(&row.get::<_, String>(8)?),
                    key_inquiry_question: row.get(9)?,
                    learning_resources: split_list(&row.get::<_, String>(10)?),
                    activities: split_list(&row.get::<_, String>(11)?),
                    assessment: row.get(12)?,
                    reflection: row.get(13)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub documents: usize,
    pub lessons: usize,
    pub distinct_weeks: usize,
    pub strands: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let lessons: usize = conn.query_row("SELECT COUNT(*) FROM lessons", [], |r| r.get(0))?;
    let distinct_weeks: usize =
        conn.query_row("SELECT COUNT(DISTINCT week) FROM lessons", [], |r| r.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT strand, COUNT(*) FROM lessons GROUP BY strand ORDER BY COUNT(*) DESC, strand",
    )?;
    let strands = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Stats {
        documents,
        lessons,
        distinct_weeks,
        strands,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn document() -> DocumentRow {
        DocumentRow {
            filename: "scheme.txt".into(),
            kind: "txt".into(),
            imported_at: "2025-01-01T00:00:00Z".into(),
            lesson_count: 2,
            weeks_found: vec![1, 2],
        }
    }

    fn lesson(week: u32, strand: &str) -> LessonRecord {
        LessonRecord {
            week,
            lesson_number: 1,
            title: format!("{} lesson", strand),
            strand: strand.to_string(),
            sub_strand: "General Topic".to_string(),
            learning_outcomes: vec!["outcome one".to_string(), "outcome two".to_string()],
            core_competencies: vec!["Critical thinking".to_string()],
            key_inquiry_question: "How?".to_string(),
            learning_resources: vec!["Textbooks".to_string()],
            activities: vec!["Introduction".to_string()],
            assessment: "Observation".to_string(),
            reflection: "Reflection".to_string(),
        }
    }

    #[test]
    fn round_trip_preserves_lists() {
        let conn = memory_conn();
        let doc_id = insert_document(&conn, &document()).unwrap();
        save_lessons(&conn, doc_id, &[lesson(1, "Mathematics"), lesson(2, "Science")]).unwrap();

        let stored = fetch_lessons(&conn, None, None, 50).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].record.week, 1);
        assert_eq!(
            stored[0].record.learning_outcomes,
            vec!["outcome one", "outcome two"]
        );
    }

    #[test]
    fn filters_by_week_and_strand() {
        let conn = memory_conn();
        let doc_id = insert_document(&conn, &document()).unwrap();
        save_lessons(
            &conn,
            doc_id,
            &[lesson(1, "Mathematics"), lesson(1, "Science"), lesson(2, "Science")],
        )
        .unwrap();

        assert_eq!(fetch_lessons(&conn, Some(1), None, 50).unwrap().len(), 2);
        assert_eq!(fetch_lessons(&conn, None, Some("science"), 50).unwrap().len(), 2);
        assert_eq!(fetch_lessons(&conn, Some(2), Some("Science"), 50).unwrap().len(), 1);
    }

    #[test]
    fn stats_counts() {
        let conn = memory_conn();
        let doc_id = insert_document(&conn, &document()).unwrap();
        save_lessons(&conn, doc_id, &[lesson(1, "Mathematics"), lesson(2, "Mathematics")]).unwrap();

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.lessons, 2);
        assert_eq!(stats.distinct_weeks, 2);
        assert_eq!(stats.strands, vec![("Mathematics".to_string(), 2)]);
    }
}
