//! Score submission and leaderboard
//!
//! The session talks to score storage through [`ScoreSink`] and
//! [`ScoreSource`]. [`Leaderboard`] implements both in memory and is
//! serializable so a host can persist it however it likes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Default number of entries shown on a leaderboard
pub const DEFAULT_TOP_SCORES: usize = 10;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    /// Percentage of bricks destroyed (0-100)
    pub score: u8,
    /// Play time of the run in milliseconds
    pub elapsed_ms: u64,
}

impl ScoreEntry {
    pub fn new(username: impl Into<String>, score: u8, elapsed_ms: u64) -> Self {
        Self {
            username: username.into(),
            score: score.min(100),
            elapsed_ms,
        }
    }

    /// Leaderboard order: higher score first, then faster time
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(self.elapsed_ms.cmp(&other.elapsed_ms))
    }
}

/// Destination for finished-run scores
pub trait ScoreSink {
    fn submit_score(&mut self, entry: &ScoreEntry) -> Result<(), BackendError>;
}

/// Source of ranked scores
pub trait ScoreSource {
    /// Top `limit` entries, score descending then elapsed time ascending
    fn fetch_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, BackendError>;
}

/// In-memory leaderboard with one row per username
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    /// Kept sorted by [`ScoreEntry::rank_cmp`]
    pub entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or improve a player's row
    ///
    /// An existing row is only replaced by a strictly higher score.
    /// Returns the 1-indexed rank of the player's row afterwards.
    pub fn upsert(&mut self, entry: ScoreEntry) -> usize {
        match self.entries.iter().position(|e| e.username == entry.username) {
            Some(i) if entry.score > self.entries[i].score => {
                self.entries.remove(i);
                self.insert_sorted(entry)
            }
            Some(i) => i + 1,
            None => self.insert_sorted(entry),
        }
    }

    fn insert_sorted(&mut self, entry: ScoreEntry) -> usize {
        let pos = self
            .entries
            .iter()
            .position(|e| entry.rank_cmp(e) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        pos + 1
    }

    /// Get the rank a result would achieve (1-indexed), ignoring its username
    pub fn potential_rank(&self, score: u8, elapsed_ms: u64) -> usize {
        let probe = ScoreEntry::new("", score, elapsed_ms);
        self.entries
            .iter()
            .position(|e| probe.rank_cmp(e) == Ordering::Less)
            .unwrap_or(self.entries.len())
            + 1
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top entry (if any)
    pub fn top(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut board: Leaderboard = serde_json::from_str(json)?;
        board.entries.sort_by(ScoreEntry::rank_cmp);
        log::info!("Loaded {} leaderboard entries", board.entries.len());
        Ok(board)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ScoreSink for Leaderboard {
    fn submit_score(&mut self, entry: &ScoreEntry) -> Result<(), BackendError> {
        let rank = self.upsert(entry.clone());
        log::info!("{} ranked #{} with {}%", entry.username, rank, entry.score);
        Ok(())
    }
}

impl ScoreSource for Leaderboard {
    fn fetch_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, BackendError> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}
