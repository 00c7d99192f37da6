//! SQL schema for the two SOP stores.
//!
//! Executed once at connection startup. `PRAGMA foreign_keys` is per
//! connection, so it lives in each batch.

pub const FUNCTION_TABLE: &str = "function";
pub const USER_TABLE: &str = "user";
pub const ANNOTATION_TABLE: &str = "annotations";
pub const QUESTION_TABLE: &str = "questions";
pub const BACKUP_TABLE: &str = "backup";

/// Functions, annotators and annotations.
pub const ANNOTATION_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Function names are unique by business rule; the insert path guards it.
CREATE TABLE IF NOT EXISTS \"function\" (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS \"user\" (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name        TEXT    NOT NULL,
    last_name         TEXT    NOT NULL,
    function_id       INTEGER NOT NULL REFERENCES \"function\"(id),
    years_in_function INTEGER NOT NULL CHECK (years_in_function >= 0)
);

-- Append-only. question_id points into the question store, which is a
-- separate database, so the reference is not declared.
CREATE TABLE IF NOT EXISTS annotations (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    question_text     TEXT    NOT NULL,
    question_id       INTEGER NOT NULL,
    alt_question      TEXT,
    passage_text      TEXT    NOT NULL,
    answer_text       TEXT    NOT NULL,
    alt_answer        TEXT,
    question_accepted INTEGER NOT NULL DEFAULT 1 CHECK (question_accepted IN (0, 1)),
    fluency           INTEGER NOT NULL CHECK (fluency           BETWEEN 1 AND 5),
    comprehensiveness INTEGER NOT NULL CHECK (comprehensiveness BETWEEN 1 AND 5),
    factuality        INTEGER NOT NULL CHECK (factuality        BETWEEN 1 AND 5),
    annotator_id      INTEGER NOT NULL REFERENCES \"user\"(id)
);

CREATE INDEX IF NOT EXISTS annotations_question_idx ON annotations(question_id);

PRAGMA user_version = 1;
";

/// Live questions and their append-only backup.
///
/// `backup` assigns keys; `questions` copies them, so both tables agree on
/// every question_id.
pub const QUESTION_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Every question ever introduced. Never updated or deleted.
CREATE TABLE IF NOT EXISTS backup (
    question_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    question_text TEXT NOT NULL,
    answer_text   TEXT NOT NULL,
    passage_text  TEXT NOT NULL
);

-- Questions that can still be handed out; exhausted rows are deleted.
CREATE TABLE IF NOT EXISTS questions (
    question_id   INTEGER PRIMARY KEY REFERENCES backup(question_id),
    question_text TEXT NOT NULL,
    answer_text   TEXT NOT NULL,
    passage_text  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
