use polars::prelude::PolarsError;
use simrec::{InputFiles, UserId};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("Polars: {0}")]
    Polars(#[from] PolarsError),
    #[error("File: {0}")]
    File(#[from] io::Error),
    /// A field was present in a record but could not be parsed
    #[error("Line {line}: could not parse {field} from {value:?}")]
    DataFormat {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("Target user {0} not found in data.")]
    UserNotFound(UserId),
    #[error("No similar users found for user {0}")]
    NoSimilarUsers(UserId),
    #[error("No candidate items to recommend for user {0}")]
    NoCandidateItems(UserId),
}

impl RecommenderError {
    /// True for the outcomes that end a run normally: the data was fine, there is just nothing to
    /// recommend. Everything else is a failure of the run itself.
    pub fn is_terminal_outcome(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::NoSimilarUsers(_) | Self::NoCandidateItems(_)
        )
    }

    /// Short machine readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Polars(_) => "POLARS_ERROR",
            Self::File(_) => "FILE_ERROR",
            Self::DataFormat { .. } => "DATA_FORMAT_ERROR",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NoSimilarUsers(_) => "NO_SIMILAR_USERS",
            Self::NoCandidateItems(_) => "NO_CANDIDATE_ITEMS",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecommenderOptions {
    /// Minimum number of items another user must have rated to be considered a neighbor.
    /// Raising this ignores users whose few ratings make their similarity unreliable.
    /// The target user is never held to this.
    pub min_ratings: usize,
    /// Maximum number of neighbors whose ratings go into a prediction, the most similar first.
    /// None, or zero, uses every user with a positive similarity.
    /// A small value makes predictions depend on fewer, closer opinions.
    pub users_to_consider: Option<usize>,
    /// Locations of the input files
    pub inputs: InputFiles,
}

impl RecommenderOptions {
    /// Create an options instance with the default options
    pub fn new() -> RecommenderOptions {
        RecommenderOptions {
            min_ratings: 1,
            users_to_consider: None,
            inputs: InputFiles::new(),
        }
    }

    pub fn with_ratings_file(mut self, new_ratings_file: impl Into<String>) -> RecommenderOptions {
        self.inputs.ratings_input = new_ratings_file.into();
        self
    }

    pub fn with_min_ratings(mut self, new_min_ratings: usize) -> RecommenderOptions {
        self.min_ratings = new_min_ratings;
        self
    }

    pub fn with_users_to_consider(
        mut self,
        new_users_to_consider: Option<usize>,
    ) -> RecommenderOptions {
        self.users_to_consider = new_users_to_consider;
        self
    }

    pub fn get_ratings_file(&self) -> &str {
        &self.inputs.ratings_input
    }

    pub fn get_min_ratings(&self) -> usize {
        self.min_ratings
    }

    pub fn get_users_to_consider(&self) -> Option<usize> {
        self.users_to_consider
    }
}

impl Default for RecommenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder() {
        let options = RecommenderOptions::new()
            .with_ratings_file("ratings.parquet")
            .with_min_ratings(4)
            .with_users_to_consider(Some(10));

        assert_eq!(options.get_ratings_file(), "ratings.parquet");
        assert_eq!(options.get_min_ratings(), 4);
        assert_eq!(options.get_users_to_consider(), Some(10));
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            RecommenderError::UserNotFound(99).to_string(),
            "Target user 99 not found in data."
        );
        assert_eq!(
            RecommenderError::NoSimilarUsers(3).to_string(),
            "No similar users found for user 3"
        );
        assert_eq!(
            RecommenderError::NoCandidateItems(3).to_string(),
            "No candidate items to recommend for user 3"
        );
        assert!(RecommenderError::NoCandidateItems(3).is_terminal_outcome());
    }

    #[test]
    fn format_errors_are_fatal() {
        let error = RecommenderError::DataFormat {
            line: 2,
            field: "rating",
            value: String::from("abc"),
        };

        assert!(!error.is_terminal_outcome());
        assert_eq!(error.code(), "DATA_FORMAT_ERROR");
        assert_eq!(error.to_string(), "Line 2: could not parse rating from \"abc\"");
    }
}
