pub mod ratings;
pub mod recommender;
pub mod report;

use recommender::{Recommender, RecommenderError, RecommenderOptions};
use report::OutputFormat;
use simrec::UserId;
use std::io::Write;

/// User recommendations are made for when none is given
pub const DEFAULT_TARGET_USER: UserId = 1;

/// Number of recommendations made when no count is given
pub const DEFAULT_TOP_N: i64 = 3;

/// Loads the ratings named by `options` and writes the top `top_n` recommendations for `uid`.
///
/// A missing user, or a user nobody resembles, is reported to `out` and still counts as
/// success. Unreadable or malformed input is returned as an error and nothing is written.
pub fn run<W: Write>(
    options: &RecommenderOptions,
    uid: UserId,
    top_n: i64,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), RecommenderError> {
    let recommender = Recommender::new_with_options(options)?;
    recommend_to(&recommender, uid, top_n, format, out)
}

/// Same as `run`, over an already built recommender
pub fn recommend_to<W: Write>(
    recommender: &Recommender,
    uid: UserId,
    top_n: i64,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), RecommenderError> {
    match recommender.get_recommendations_by_uid(uid, requested_count(top_n)) {
        Ok(recs) => report::write_recommendations(out, format, uid, &recs)?,
        Err(outcome) if outcome.is_terminal_outcome() => {
            log::info!("No recommendations for user {}: {:?}", uid, outcome);
            report::write_outcome(out, format, uid, &outcome)?
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Negative counts ask for nothing
fn requested_count(top_n: i64) -> usize {
    usize::try_from(top_n).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::RatingsMatrix;
    use std::{env, fs};

    const SAMPLE: &str = "userId,itemId,rating\n1,10,5\n1,20,3\n2,10,4\n2,30,5\n";

    fn render(input: &str, uid: UserId, top_n: i64) -> String {
        let ratings = RatingsMatrix::from_reader(input.as_bytes()).unwrap();
        let recommender = Recommender::from_ratings(ratings, &RecommenderOptions::new());

        let mut out = Vec::new();
        recommend_to(&recommender, uid, top_n, OutputFormat::Text, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn sample_scenario() {
        assert_eq!(
            render(SAMPLE, 1, 3),
            "Recommendations for User 1:\nItem: 30 | Predicted score: 5.000\n"
        );
    }

    #[test]
    fn missing_target_scenario() {
        assert_eq!(render(SAMPLE, 99, 3), "Target user 99 not found in data.\n");
    }

    #[test]
    fn isolated_target_scenario() {
        let input = "1,10,5\n2,20,4\n";
        assert_eq!(render(input, 1, 3), "No similar users found for user 1\n");
    }

    #[test]
    fn nothing_new_scenario() {
        let input = "1,10,5\n1,20,3\n2,10,4\n";
        assert_eq!(
            render(input, 1, 3),
            "No candidate items to recommend for user 1\n"
        );
    }

    #[test]
    fn non_positive_count_lists_nothing() {
        assert_eq!(render(SAMPLE, 1, 0), "Recommendations for User 1:\n");
        assert_eq!(render(SAMPLE, 1, -4), "Recommendations for User 1:\n");
    }

    #[test]
    fn output_is_idempotent() {
        let input = "1,10,5\n1,20,3\n2,10,4\n2,30,5\n3,20,2\n3,30,1\n3,40,4\n4,10,1\n4,40,4\n4,50,4\n";
        assert_eq!(render(input, 1, 5), render(input, 1, 5));
    }

    #[test]
    fn run_reads_file_and_fails_on_bad_data() {
        let dir = env::temp_dir().join(format!("simrec_run_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.csv");
        fs::write(&good, SAMPLE).unwrap();
        let options = RecommenderOptions::new().with_ratings_file(good.to_string_lossy());
        let mut out = Vec::new();
        run(&options, 1, DEFAULT_TOP_N, OutputFormat::Text, &mut out).expect("Run should succeed");
        assert!(String::from_utf8(out).unwrap().contains("Item: 30"));

        let bad = dir.join("bad.csv");
        fs::write(&bad, "1,10,5\n1,twenty,3\n").unwrap();
        let options = RecommenderOptions::new().with_ratings_file(bad.to_string_lossy());
        let mut out = Vec::new();
        let result = run(&options, 1, DEFAULT_TOP_N, OutputFormat::Text, &mut out);
        assert!(matches!(result, Err(RecommenderError::DataFormat { line: 2, .. })));
        assert!(out.is_empty());

        fs::remove_dir_all(&dir).ok();
    }
}
