use const_format::formatcp;
use serde::{Deserialize, Serialize};

// Input location constants
pub const DATA_DIR: &str = "./data";

pub const RATINGS_INPUT: &str = formatcp!("{}/user_prefs.csv", DATA_DIR);

/// Identifier of a user in the ratings source
pub type UserId = i64;

/// Identifier of an item in the ratings source
pub type ItemId = i64;

/// A single (user, item, value) record, as read from the ratings source.
/// Values are taken as given; no range is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// The user who gave the rating
    pub user_id: UserId,
    /// The item that was rated
    pub item_id: ItemId,
    /// The rating itself
    pub value: f64,
}

impl Rating {
    pub const fn new(user_id: UserId, item_id: ItemId, value: f64) -> Self {
        Rating {
            user_id,
            item_id,
            value,
        }
    }
}

/// An item suggested for a user, along with the score it was predicted to receive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub score: f64,
}

/// Locations of the files the recommender reads from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputFiles {
    /// Ratings source, either delimited text or parquet
    pub ratings_input: String,
}

impl InputFiles {
    pub fn new() -> Self {
        InputFiles {
            ratings_input: String::from(RATINGS_INPUT),
        }
    }
}

impl Default for InputFiles {
    fn default() -> Self {
        Self::new()
    }
}
