// Session Index Store
//
// *Le Magasin* (The Store) - One bounded message list and match index per session

use crate::error::{ensure_session_id, Result};
use crate::fuzzy::FuzzyIndex;
use crate::message::{normalize_messages, IndexedMessage, RawMessage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a full (re)index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Messages kept in the index
    pub indexed: usize,

    /// Messages supplied by the caller
    pub total: usize,

    /// True when the input exceeded the size bound
    pub truncated: bool,
}

/// Outcome of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReport {
    /// Messages supplied by the caller
    pub added: usize,

    /// Messages in the session index afterwards
    pub total: usize,
}

/// Indexed messages of one session and the match structure built over them
#[derive(Debug, Clone, Default)]
pub struct SessionIndex {
    messages: Vec<IndexedMessage>,
    index: FuzzyIndex,
}

impl SessionIndex {
    fn from_messages(messages: Vec<IndexedMessage>) -> Self {
        let index = FuzzyIndex::build(&messages);
        Self { messages, index }
    }

    /// Indexed messages, oldest first
    pub fn messages(&self) -> &[IndexedMessage] {
        &self.messages
    }

    /// Match structure
    pub fn index(&self) -> &FuzzyIndex {
        &self.index
    }

    /// Number of indexed messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the session holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Owner of every session index
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, SessionIndex>,
    max_index_size: usize,
}

impl SessionStore {
    /// Create a store bounding each session to `max_index_size` messages
    pub fn new(max_index_size: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_index_size,
        }
    }

    /// Replace the index of a session with the given messages
    pub fn index_messages(
        &mut self,
        session_id: &str,
        messages: &[RawMessage],
    ) -> Result<IndexReport> {
        ensure_session_id(session_id)?;

        let mut normalized = normalize_messages(messages)?;
        let total = normalized.len();
        let truncated = total > self.max_index_size;
        truncate_oldest(&mut normalized, self.max_index_size);

        let session = SessionIndex::from_messages(normalized);
        let indexed = session.len();
        self.sessions.insert(session_id.to_string(), session);

        tracing::info!(
            "Indexed session {}: {} of {} messages{}",
            session_id,
            indexed,
            total,
            if truncated { " (truncated)" } else { "" }
        );

        Ok(IndexReport {
            indexed,
            total,
            truncated,
        })
    }

    /// Append messages to a session and rebuild its match structure
    ///
    /// Returns `None` when there is nothing to add. A session that was never
    /// indexed starts out empty.
    pub fn add_messages(
        &mut self,
        session_id: &str,
        new_messages: &[RawMessage],
    ) -> Result<Option<AppendReport>> {
        ensure_session_id(session_id)?;

        if new_messages.is_empty() {
            return Ok(None);
        }

        let normalized = normalize_messages(new_messages)?;

        let mut combined = self
            .sessions
            .remove(session_id)
            .map(|s| s.messages)
            .unwrap_or_default();
        combined.extend(normalized);
        truncate_oldest(&mut combined, self.max_index_size);

        let session = SessionIndex::from_messages(combined);
        let total = session.len();
        self.sessions.insert(session_id.to_string(), session);

        tracing::debug!(
            "Appended {} messages to session {} (now {})",
            new_messages.len(),
            session_id,
            total
        );

        Ok(Some(AppendReport {
            added: new_messages.len(),
            total,
        }))
    }

    /// Drop the index of a session, returning whether one existed
    pub fn clear_session(&mut self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Drop every session
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Index of a session, if any
    pub fn get(&self, session_id: &str) -> Option<&SessionIndex> {
        self.sessions.get(session_id)
    }

    /// Number of indexed sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Messages indexed across all sessions
    pub fn total_messages(&self) -> usize {
        self.sessions.values().map(SessionIndex::len).sum()
    }

    /// Per-session message bound
    pub fn max_index_size(&self) -> usize {
        self.max_index_size
    }
}

/// Keep only the `max` most recently arrived entries
fn truncate_oldest<T>(items: &mut Vec<T>, max: usize) {
    if items.len() > max {
        let excess = items.len() - max;
        items.drain(..excess);
    }
}
