//! Leaderboard collaborator
//!
//! The game reads the top-N once at session start (victory threshold) and
//! writes once at game over. `LocalLeaderboard` keeps the board in
//! LocalStorage on wasm and in memory on native.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::MAX_NAME_LEN;

/// Errors from a leaderboard backend
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
    #[error("player name is empty")]
    InvalidName,
    #[error("leaderboard data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u64,
    /// Length of the run in seconds
    pub duration_secs: f64,
}

/// Result of a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// 1-indexed position on the board, None if it didn't make the cut
    pub global_rank: Option<usize>,
    pub is_personal_best: bool,
}

/// Score submission and lookup
pub trait Leaderboard {
    fn submit_score(
        &mut self,
        name: &str,
        score: u64,
        duration_secs: f64,
    ) -> Result<SubmitReceipt, LeaderboardError>;

    /// Best first
    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError>;
}

/// Score a run needs to beat the top `n`; any positive score while the board
/// still has room
pub fn victory_threshold(top: &[ScoreEntry], n: usize) -> u64 {
    match n.checked_sub(1).and_then(|last| top.get(last)) {
        Some(entry) => entry.score.saturating_add(1),
        None => 1,
    }
}

/// Top-N board persisted to LocalStorage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalLeaderboard {
    /// Sorted descending by score
    entries: Vec<ScoreEntry>,
    /// Best score per player name, including runs that fell off the board
    personal_bests: BTreeMap<String, u64>,
    capacity: usize,
}

impl LocalLeaderboard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "campaign_runner_leaderboard";

    /// Create an empty board
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            personal_bests: BTreeMap::new(),
            capacity,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LeaderboardError> {
        let mut board: Self = serde_json::from_str(json)?;
        board
            .entries
            .sort_by(|a, b| b.score.cmp(&a.score));
        board.entries.truncate(board.capacity);
        Ok(board)
    }

    pub fn to_json(&self) -> Result<String, LeaderboardError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn personal_best(&self, name: &str) -> Option<u64> {
        self.personal_bests.get(name).copied()
    }

    /// Check if a score qualifies for the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 || self.capacity == 0 {
            return false;
        }
        if self.entries.len() < self.capacity {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Load the board from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(capacity: usize) -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(mut board) => {
                        board.capacity = capacity;
                        board.entries.truncate(capacity);
                        log::info!("Loaded {} leaderboard entries", board.entries.len());
                        return board;
                    }
                    Err(err) => log::warn!("Discarding stored leaderboard: {}", err),
                }
            }
        }

        log::info!("No leaderboard found, starting fresh");
        Self::new(capacity)
    }

    /// Save the board to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    fn persist(&self) -> Result<(), LeaderboardError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| LeaderboardError::Unavailable("no LocalStorage".to_string()))?;
        let json = self.to_json()?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| LeaderboardError::Unavailable("LocalStorage write failed".to_string()))?;
        log::info!("Leaderboard saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(capacity: usize) -> Self {
        Self::new(capacity)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn persist(&self) -> Result<(), LeaderboardError> {
        Ok(())
    }
}

impl LocalLeaderboard {
    /// Stage the score on a copy and keep it only once `persist` accepts it
    fn submit_with<P>(
        &mut self,
        name: &str,
        score: u64,
        duration_secs: f64,
        persist: P,
    ) -> Result<SubmitReceipt, LeaderboardError>
    where
        P: FnOnce(&Self) -> Result<(), LeaderboardError>,
    {
        let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        if name.is_empty() {
            return Err(LeaderboardError::InvalidName);
        }

        let mut next = self.clone();
        let previous = next.personal_bests.get(&name).copied();
        let is_personal_best = score > 0 && previous.is_none_or(|best| score > best);
        if is_personal_best {
            next.personal_bests.insert(name.clone(), score);
        }

        let global_rank = next.potential_rank(score);
        if let Some(rank) = global_rank {
            next.entries.insert(
                rank - 1,
                ScoreEntry {
                    name,
                    score,
                    duration_secs,
                },
            );
            next.entries.truncate(next.capacity);
        }

        persist(&next)?;
        *self = next;
        Ok(SubmitReceipt {
            global_rank,
            is_personal_best,
        })
    }
}

impl Leaderboard for LocalLeaderboard {
    fn submit_score(
        &mut self,
        name: &str,
        score: u64,
        duration_secs: f64,
    ) -> Result<SubmitReceipt, LeaderboardError> {
        self.submit_with(name, score, duration_secs, Self::persist)
    }

    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u64) -> ScoreEntry {
        ScoreEntry {
            name: "x".to_string(),
            score,
            duration_secs: 10.0,
        }
    }

    #[test]
    fn test_submit_keeps_sorted_top_n() {
        let mut board = LocalLeaderboard::new(3);
        for score in [50, 200, 100, 10, 300] {
            board.submit_score("Ann", score, 12.0).unwrap();
        }
        let scores: Vec<u64> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
    }

    #[test]
    fn test_rank_and_personal_best() {
        let mut board = LocalLeaderboard::new(10);
        let first = board.submit_score("Ann", 100, 30.0).unwrap();
        assert_eq!(first.global_rank, Some(1));
        assert!(first.is_personal_best);

        let second = board.submit_score("Bob", 150, 30.0).unwrap();
        assert_eq!(second.global_rank, Some(1));

        let worse = board.submit_score("Ann", 80, 20.0).unwrap();
        assert_eq!(worse.global_rank, Some(3));
        assert!(!worse.is_personal_best);
        assert_eq!(board.personal_best("Ann"), Some(100));
    }

    #[test]
    fn test_full_board_rejects_low_score() {
        let mut board = LocalLeaderboard::new(2);
        board.submit_score("A", 100, 1.0).unwrap();
        board.submit_score("B", 90, 1.0).unwrap();
        let receipt = board.submit_score("C", 90, 1.0).unwrap();
        assert_eq!(receipt.global_rank, None);
        // Still a personal best for a first-time player
        assert!(receipt.is_personal_best);
        assert_eq!(board.entries().len(), 2);
    }

    #[test]
    fn test_failed_save_leaves_board_untouched() {
        let mut board = LocalLeaderboard::new(2);
        board.submit_score("A", 300, 1.0).unwrap();
        board.submit_score("B", 200, 1.0).unwrap();

        let offline =
            |_: &LocalLeaderboard| Err(LeaderboardError::Unavailable("quota".to_string()));
        for _ in 0..2 {
            assert!(board.submit_with("C", 250, 1.0, offline).is_err());
        }
        let scores: Vec<u64> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 200]);
        assert_eq!(board.personal_best("C"), None);

        // The retry lands exactly once
        let receipt = board.submit_with("C", 250, 1.0, |_| Ok(())).unwrap();
        assert_eq!(receipt.global_rank, Some(2));
        assert!(receipt.is_personal_best);
        let scores: Vec<u64> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 250]);
    }

    #[test]
    fn test_save_sees_staged_board() {
        let mut board = LocalLeaderboard::new(10);
        board
            .submit_with("Ann", 40, 1.0, |staged| {
                assert_eq!(staged.top_score(), Some(40));
                Ok(())
            })
            .unwrap();
        assert_eq!(board.top_score(), Some(40));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut board = LocalLeaderboard::new(10);
        assert!(matches!(
            board.submit_score("   ", 10, 1.0),
            Err(LeaderboardError::InvalidName)
        ));
        assert!(board.is_empty());
    }

    #[test]
    fn test_victory_threshold() {
        let top: Vec<ScoreEntry> = [500, 400, 300].into_iter().map(entry).collect();
        assert_eq!(victory_threshold(&top, 3), 301);
        // Board not full: any positive score
        assert_eq!(victory_threshold(&top, 10), 1);
        assert_eq!(victory_threshold(&[], 10), 1);
    }

    #[test]
    fn test_json_round_trip_resorts() {
        let json = r#"{"entries":[{"name":"a","score":1,"duration_secs":1.0},{"name":"b","score":9,"duration_secs":2.0}],"personal_bests":{},"capacity":10}"#;
        let board = LocalLeaderboard::from_json(json).unwrap();
        assert_eq!(board.top_score(), Some(9));
        let again = LocalLeaderboard::from_json(&board.to_json().unwrap()).unwrap();
        assert_eq!(again.entries(), board.entries());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            LocalLeaderboard::from_json("{nope"),
            Err(LeaderboardError::Serialization(_))
        ));
    }
}
