//! Session persistence: SQLite first, in-memory map when the database
//! cannot be opened. Both backends expose the identical contract.
//!
//! All operations are synchronous (rusqlite is blocking). Callers in async
//! contexts should use `tokio::task::spawn_blocking`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::pipeline::types::{FinalRecommendation, SurveyInput};

use super::types::{new_session_id, Session};

enum Backend {
    Sqlite(Mutex<Connection>),
    Memory(Mutex<HashMap<String, Session>>),
}

pub struct SessionStore {
    backend: Backend,
}

impl SessionStore {
    /// Open or create the session database at the given path. Any failure
    /// (unwritable directory, corrupt file, failed migration) degrades to
    /// the in-memory backend so rating and replay keep working for the
    /// lifetime of the process.
    pub fn open(db_path: &Path) -> Self {
        match open_sqlite(db_path) {
            Ok(conn) => {
                info!("opened session database at {:?}", db_path);
                Self {
                    backend: Backend::Sqlite(Mutex::new(conn)),
                }
            }
            Err(e) => {
                warn!(
                    "session database unavailable ({}), degrading to in-memory store",
                    e
                );
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    /// Whether sessions survive a process restart.
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, Backend::Sqlite(_))
    }

    /// Persist a new session for a finished pipeline run.
    pub fn create(
        &self,
        survey: &SurveyInput,
        recommendations: &[FinalRecommendation],
        email: Option<String>,
    ) -> Result<Session, String> {
        let now = Utc::now();
        let session = Session {
            id: new_session_id(),
            mode: survey.mode,
            survey: survey.clone(),
            recommendations: recommendations.to_vec(),
            ratings: BTreeMap::new(),
            email,
            created_at: now,
            updated_at: now,
        };

        match &self.backend {
            Backend::Sqlite(conn) => {
                let conn = conn.lock().unwrap();
                let survey_json = serde_json::to_string(&session.survey)
                    .map_err(|e| format!("Failed to serialize survey: {}", e))?;
                let recommendations_json = serde_json::to_string(&session.recommendations)
                    .map_err(|e| format!("Failed to serialize recommendations: {}", e))?;
                let ratings_json = serde_json::to_string(&session.ratings)
                    .map_err(|e| format!("Failed to serialize ratings: {}", e))?;

                conn.execute(
                    "INSERT INTO sessions
                     (id, mode, survey_json, recommendations_json, ratings_json, email,
                      created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        session.id,
                        session.mode.as_str(),
                        survey_json,
                        recommendations_json,
                        ratings_json,
                        session.email,
                        session.created_at.to_rfc3339(),
                        session.updated_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| format!("Failed to insert session: {}", e))?;
            }
            Backend::Memory(map) => {
                map.lock().unwrap().insert(session.id.clone(), session.clone());
            }
        }

        info!("created session {}", session.id);
        Ok(session)
    }

    /// Record a rating for one book of a session. Returns false when the
    /// session does not exist; the rating value is validated by the caller.
    pub fn update_rating(
        &self,
        session_id: &str,
        book_id: &str,
        rating: u8,
    ) -> Result<bool, String> {
        match &self.backend {
            Backend::Sqlite(conn) => {
                let conn = conn.lock().unwrap();
                let ratings_json: Option<String> = conn
                    .query_row(
                        "SELECT ratings_json FROM sessions WHERE id = ?1",
                        params![session_id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| format!("Failed to look up session: {}", e))?;

                let Some(ratings_json) = ratings_json else {
                    return Ok(false);
                };

                let mut ratings: BTreeMap<String, u8> = serde_json::from_str(&ratings_json)
                    .map_err(|e| format!("Failed to deserialize ratings: {}", e))?;
                ratings.insert(book_id.to_string(), rating);
                let updated = serde_json::to_string(&ratings)
                    .map_err(|e| format!("Failed to serialize ratings: {}", e))?;

                conn.execute(
                    "UPDATE sessions SET ratings_json = ?1, updated_at = ?2 WHERE id = ?3",
                    params![updated, Utc::now().to_rfc3339(), session_id],
                )
                .map_err(|e| format!("Failed to update rating: {}", e))?;
                Ok(true)
            }
            Backend::Memory(map) => {
                let mut map = map.lock().unwrap();
                match map.get_mut(session_id) {
                    Some(session) => {
                        session.ratings.insert(book_id.to_string(), rating);
                        session.updated_at = Utc::now();
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }

    /// Load a session by id.
    pub fn read(&self, session_id: &str) -> Result<Option<Session>, String> {
        match &self.backend {
            Backend::Sqlite(conn) => {
                let conn = conn.lock().unwrap();
                conn.query_row(
                    "SELECT id, survey_json, recommendations_json, ratings_json, email,
                            created_at, updated_at
                     FROM sessions WHERE id = ?1",
                    params![session_id],
                    |row| {
                        let id: String = row.get(0)?;
                        let survey_json: String = row.get(1)?;
                        let recommendations_json: String = row.get(2)?;
                        let ratings_json: String = row.get(3)?;
                        let email: Option<String> = row.get(4)?;
                        let created_at: String = row.get(5)?;
                        let updated_at: String = row.get(6)?;
                        Ok((
                            id,
                            survey_json,
                            recommendations_json,
                            ratings_json,
                            email,
                            created_at,
                            updated_at,
                        ))
                    },
                )
                .optional()
                .map_err(|e| format!("Failed to read session: {}", e))?
                .map(row_to_session)
                .transpose()
            }
            Backend::Memory(map) => Ok(map.lock().unwrap().get(session_id).cloned()),
        }
    }
}

type SessionRow = (String, String, String, String, Option<String>, String, String);

fn row_to_session(row: SessionRow) -> Result<Session, String> {
    let (id, survey_json, recommendations_json, ratings_json, email, created_at, updated_at) = row;

    let survey: SurveyInput = serde_json::from_str(&survey_json)
        .map_err(|e| format!("Failed to deserialize survey: {}", e))?;
    let recommendations: Vec<FinalRecommendation> = serde_json::from_str(&recommendations_json)
        .map_err(|e| format!("Failed to deserialize recommendations: {}", e))?;
    let ratings: BTreeMap<String, u8> = serde_json::from_str(&ratings_json)
        .map_err(|e| format!("Failed to deserialize ratings: {}", e))?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| format!("Invalid created_at timestamp: {}", e))?
        .with_timezone(&Utc);
    let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| format!("Invalid updated_at timestamp: {}", e))?
        .with_timezone(&Utc);

    Ok(Session {
        id,
        mode: survey.mode,
        survey,
        recommendations,
        ratings,
        email,
        created_at,
        updated_at,
    })
}

fn open_sqlite(db_path: &Path) -> Result<Connection, String> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create data dir: {}", e))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| format!("Failed to open session db: {}", e))?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            mode TEXT NOT NULL,
            survey_json TEXT NOT NULL,
            recommendations_json TEXT NOT NULL,
            ratings_json TEXT NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions(created_at DESC);",
    )
    .map_err(|e| format!("Failed to create sessions table: {}", e))?;

    Ok(conn)
}
