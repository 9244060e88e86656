//! In-memory storage of generated quizzes awaiting submission

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::types::{CollectionId, Quiz};

/// A generated quiz kept for grading
#[derive(Debug, Clone)]
pub struct QuizSession {
    /// The quiz as returned to the client
    pub quiz: Quiz,
    /// Collection it was generated from
    pub collection_id: CollectionId,
    /// Topic used for retrieval
    pub topic: String,
    /// When the quiz was generated
    pub created_at: DateTime<Utc>,
}

/// Quiz sessions with TTL and capacity bound
pub struct QuizSessions {
    sessions: RwLock<HashMap<Uuid, QuizSession>>,
    /// Maximum stored quizzes
    max_entries: usize,
    /// Lifetime of a quiz (seconds)
    ttl_seconds: u64,
}

impl QuizSessions {
    /// Create a new session store
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl_seconds,
        }
    }

    /// Store a quiz and return its id
    pub fn insert(&self, quiz: Quiz, collection_id: CollectionId, topic: String) -> Uuid {
        let id = Uuid::new_v4();
        let session = QuizSession {
            quiz,
            collection_id,
            topic,
            created_at: Utc::now(),
        };

        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| !self.is_expired(s));

        // Evict oldest entries if at capacity
        while sessions.len() >= self.max_entries {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, s)| s.created_at)
                .map(|(k, _)| *k)
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::debug!("Evicted quiz session {}", oldest);
        }

        sessions.insert(id, session);
        id
    }

    /// Get a quiz if it exists and has not expired
    pub fn get(&self, id: &Uuid) -> Option<QuizSession> {
        {
            let sessions = self.sessions.read();
            match sessions.get(id) {
                Some(session) if !self.is_expired(session) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        tracing::debug!("Quiz session {} expired", id);
        self.sessions.write().remove(id);
        None
    }

    /// Number of stored sessions (including expired ones not yet purged)
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no sessions are stored
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn is_expired(&self, session: &QuizSession) -> bool {
        let age = Utc::now().signed_duration_since(session.created_at);
        age.num_seconds().max(0) as u64 > self.ttl_seconds
    }
}
