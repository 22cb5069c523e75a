mod recommender_types;

use crate::ratings::{sorted_ratings, RatingsMatrix, UserRatings};
use polars::{datatypes::PlHashMap, prelude::InitHashMaps};
use rayon::prelude::*;
use simrec::{ItemId, Recommendation, UserId};
use std::cmp::Ordering;

pub use recommender_types::RecommenderError;
pub use recommender_types::RecommenderOptions;

/// Euclidean norm of every user's rating vector
pub type NormTable = PlHashMap<UserId, f64>;

/// Cosine similarity of other users to a target user. Only strictly positive values are kept.
pub type SimilarityTable = PlHashMap<UserId, f64>;

/// Predicted score of every item the target user has not rated yet
pub type PredictionTable = PlHashMap<ItemId, f64>;

/// Represents the recommendation system
pub struct Recommender {
    /// Every rating in the source, never changed after loading
    ratings: RatingsMatrix,
    /// Norms of every user in `ratings`, computed once up front
    norms: NormTable,
    /// Minimum number of ratings a user needs to count as a neighbor
    min_ratings: usize,
    /// The number of similar users' ratings to account for when making a recommendation
    users_to_consider: Option<usize>,
}

impl Recommender {
    /// Creates a new recommender with the provided settings, reading the ratings file they name
    pub fn new_with_options(options: &RecommenderOptions) -> Result<Recommender, RecommenderError> {
        log::info!("Reading ratings from {}", options.get_ratings_file());
        let ratings = RatingsMatrix::load(options.get_ratings_file())?;

        Ok(Self::from_ratings(ratings, options))
    }

    /// Creates a recommender over ratings that are already in memory
    pub fn from_ratings(ratings: RatingsMatrix, options: &RecommenderOptions) -> Recommender {
        let norms = compute_norms(&ratings);
        log::info!("Norms computed for {} users", norms.len());

        Recommender {
            ratings,
            norms,
            min_ratings: options.get_min_ratings(),
            users_to_consider: options.get_users_to_consider(),
        }
    }

    pub fn ratings(&self) -> &RatingsMatrix {
        &self.ratings
    }

    pub fn norms(&self) -> &NormTable {
        &self.norms
    }

    /// Get the similarity (0-1.0] of every sufficiently active user to the given user.
    /// Users with zero or negative similarity are left out.
    pub fn get_user_similarity(&self, uid: UserId) -> Result<SimilarityTable, RecommenderError> {
        similarities_among(&self.ratings, &self.norms, uid, self.min_ratings)
    }

    /// Return the `n` items the given user is most likely to rate highly, best first
    pub fn get_recommendations_by_uid(
        &self,
        uid: UserId,
        n: usize,
    ) -> Result<Vec<Recommendation>, RecommenderError> {
        let similarities = self.get_user_similarity(uid)?;
        log::debug!("{} users similar to user {}", similarities.len(), uid);

        let neighbors = self.select_neighbors(similarities);
        let predictions = predict(&self.ratings, &neighbors, uid)?;
        log::debug!("{} candidate items for user {}", predictions.len(), uid);

        Ok(top_n(&predictions, n))
    }

    /// Keep only the most similar users, if a limit is set
    fn select_neighbors(&self, similarities: SimilarityTable) -> SimilarityTable {
        // A limit of zero would leave nobody to predict from, so it means no limit
        let limit = match self.users_to_consider {
            Some(limit) if limit > 0 && limit < similarities.len() => limit,
            _ => return similarities,
        };

        let mut ranked: Vec<_> = similarities.into_iter().collect();
        ranked.sort_unstable_by(|(a_uid, a_sim), (b_uid, b_sim)| {
            b_sim.total_cmp(a_sim).then_with(|| a_uid.cmp(b_uid))
        });
        ranked.truncate(limit);

        ranked.into_iter().collect()
    }
}

/// Computes the Euclidean norm of every user's ratings
pub fn compute_norms(ratings: &RatingsMatrix) -> NormTable {
    let users: Vec<_> = ratings.users().collect();

    let norms: Vec<_> = users
        .into_par_iter()
        .map(|(uid, user_ratings)| (uid, norm(user_ratings)))
        .collect();

    norms.into_iter().collect()
}

/// Computes the cosine similarity of every other user to `target`, keeping the positive ones.
///
/// Fails with `UserNotFound` if the target has no ratings, and with `NoSimilarUsers` if nobody is
/// positively similar.
pub fn compute_similarities(
    ratings: &RatingsMatrix,
    norms: &NormTable,
    target: UserId,
) -> Result<SimilarityTable, RecommenderError> {
    similarities_among(ratings, norms, target, 0)
}

fn similarities_among(
    ratings: &RatingsMatrix,
    norms: &NormTable,
    target: UserId,
    min_ratings: usize,
) -> Result<SimilarityTable, RecommenderError> {
    let target_ratings = ratings
        .get_user(target)
        .ok_or(RecommenderError::UserNotFound(target))?;
    let target_ratings = sorted_ratings(target_ratings);
    let target_norm = norms.get(&target).copied().unwrap_or(0.0);

    let candidates: Vec<_> = ratings
        .users()
        .filter(|(uid, user_ratings)| *uid != target && user_ratings.len() >= min_ratings)
        .collect();

    let similar: Vec<_> = candidates
        .into_par_iter()
        .filter_map(|(uid, user_ratings)| {
            let other_norm = norms.get(&uid).copied().unwrap_or(0.0);
            let similarity =
                cosine_similarity(&target_ratings, target_norm, user_ratings, other_norm);

            (similarity > 0.0).then_some((uid, similarity))
        })
        .collect();

    if similar.is_empty() {
        return Err(RecommenderError::NoSimilarUsers(target));
    }

    Ok(similar.into_iter().collect())
}

/// Predicts a score for every item rated by a similar user but not by `target`.
/// Each prediction is the similarity weighted average of the similar users' ratings.
pub fn predict(
    ratings: &RatingsMatrix,
    similarities: &SimilarityTable,
    target: UserId,
) -> Result<PredictionTable, RecommenderError> {
    let target_ratings = ratings
        .get_user(target)
        .ok_or(RecommenderError::UserNotFound(target))?;

    // Accumulate neighbors in id order so every item's sum is reproducible
    let mut neighbors: Vec<_> = similarities
        .iter()
        .map(|(uid, similarity)| (*uid, *similarity))
        .collect();
    neighbors.sort_unstable_by_key(|(uid, _)| *uid);

    // Item id to (numerator, denominator)
    let mut weights: PlHashMap<ItemId, (f64, f64)> = PlHashMap::new();

    for (uid, similarity) in neighbors {
        let Some(neighbor_ratings) = ratings.get_user(uid) else {
            continue;
        };

        for (item, rating) in neighbor_ratings {
            if target_ratings.contains_key(item) {
                continue;
            }

            let (numerator, denominator) = weights.entry(*item).or_insert((0.0, 0.0));
            *numerator += similarity * rating;
            // Absolute value keeps the average correct if negative similarities ever get here
            *denominator += similarity.abs();
        }
    }

    let predictions: PredictionTable = weights
        .into_iter()
        .filter(|(_, (_, denominator))| *denominator > 0.0)
        .map(|(item, (numerator, denominator))| (item, numerator / denominator))
        .collect();

    if predictions.is_empty() {
        return Err(RecommenderError::NoCandidateItems(target));
    }

    Ok(predictions)
}

/// Returns at most `n` predictions, highest score first.
/// Equal scores are ordered by ascending item id.
pub fn top_n(predictions: &PredictionTable, n: usize) -> Vec<Recommendation> {
    let mut ranked: Vec<_> = predictions
        .iter()
        .map(|(item_id, score)| Recommendation {
            item_id: *item_id,
            score: *score,
        })
        .collect();

    ranked.sort_unstable_by(rank_order);
    ranked.truncate(n);

    ranked
}

fn rank_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.item_id.cmp(&b.item_id))
}

fn norm(user_ratings: &UserRatings) -> f64 {
    sorted_ratings(user_ratings)
        .iter()
        .map(|(_, value)| value * value)
        .sum::<f64>()
        .sqrt()
}

/// `target` must be sorted by item id
fn cosine_similarity(
    target: &[(ItemId, f64)],
    target_norm: f64,
    other: &UserRatings,
    other_norm: f64,
) -> f64 {
    // Items the other user has not rated contribute nothing
    let dot: f64 = target
        .iter()
        .filter_map(|(item, rating)| other.get(item).map(|other_rating| rating * other_rating))
        .sum();

    let denominator = target_norm * other_norm;
    if denominator == 0.0 {
        0.0
    } else {
        // Rounding in the norms can push identical vectors just past 1
        (dot / denominator).min(1.0)
    }
}
