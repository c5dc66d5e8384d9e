//! Polls and vote tallies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
}

impl Poll {
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    /// Share of votes for `option_id` in percent; 0.0 for an empty poll.
    pub fn percent(&self, option_id: &str) -> f64 {
        let total = self.total_votes();
        if total == 0 {
            return 0.0;
        }
        let votes = self
            .options
            .iter()
            .find(|o| o.id == option_id)
            .map_or(0, |o| o.votes);
        votes as f64 / total as f64 * 100.0
    }
}
