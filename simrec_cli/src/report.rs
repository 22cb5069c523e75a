use crate::recommender::RecommenderError;
use clap::ValueEnum;
use serde::Serialize;
use simrec::{Recommendation, UserId};
use std::io::{self, Write};

/// How results are written to the output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// A single JSON object
    Json,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonReport<'a> {
    Recommendations {
        user: UserId,
        recommendations: &'a [Recommendation],
    },
    Error {
        code: &'static str,
        user: UserId,
    },
}

/// Writes the recommendations made for `uid`, best first
pub fn write_recommendations<W: Write>(
    out: &mut W,
    format: OutputFormat,
    uid: UserId,
    recommendations: &[Recommendation],
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "Recommendations for User {}:", uid)?;
            for rec in recommendations {
                writeln!(out, "Item: {} | Predicted score: {:.3}", rec.item_id, rec.score)?;
            }
            Ok(())
        }
        OutputFormat::Json => write_json(
            out,
            &JsonReport::Recommendations {
                user: uid,
                recommendations,
            },
        ),
    }
}

/// Writes the reason no recommendations could be made for `uid`
pub fn write_outcome<W: Write>(
    out: &mut W,
    format: OutputFormat,
    uid: UserId,
    outcome: &RecommenderError,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", outcome),
        OutputFormat::Json => write_json(
            out,
            &JsonReport::Error {
                code: outcome.code(),
                user: uid,
            },
        ),
    }
}

fn write_json<W: Write>(out: &mut W, report: &JsonReport) -> io::Result<()> {
    serde_json::to_writer(&mut *out, report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_recs(format: OutputFormat, recs: &[Recommendation]) -> String {
        let mut out = Vec::new();
        write_recommendations(&mut out, format, 1, recs).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_recommendations() {
        let recs = [
            Recommendation {
                item_id: 30,
                score: 5.0,
            },
            Recommendation {
                item_id: 12,
                score: 3.14159,
            },
        ];

        assert_eq!(
            render_recs(OutputFormat::Text, &recs),
            "Recommendations for User 1:\n\
             Item: 30 | Predicted score: 5.000\n\
             Item: 12 | Predicted score: 3.142\n"
        );
    }

    #[test]
    fn json_recommendations() {
        let recs = [Recommendation {
            item_id: 30,
            score: 5.0,
        }];

        assert_eq!(
            render_recs(OutputFormat::Json, &recs),
            "{\"type\":\"recommendations\",\"user\":1,\"recommendations\":[{\"item_id\":30,\"score\":5.0}]}\n"
        );
    }

    #[test]
    fn outcomes() {
        let mut text = Vec::new();
        write_outcome(&mut text, OutputFormat::Text, 99, &RecommenderError::UserNotFound(99))
            .unwrap();
        assert_eq!(String::from_utf8(text).unwrap(), "Target user 99 not found in data.\n");

        let cases = [
            (RecommenderError::UserNotFound(4), "USER_NOT_FOUND"),
            (RecommenderError::NoSimilarUsers(4), "NO_SIMILAR_USERS"),
            (RecommenderError::NoCandidateItems(4), "NO_CANDIDATE_ITEMS"),
        ];
        for (outcome, code) in cases {
            let mut json = Vec::new();
            write_outcome(&mut json, OutputFormat::Json, 4, &outcome).unwrap();
            assert_eq!(
                String::from_utf8(json).unwrap(),
                format!("{{\"type\":\"error\",\"code\":\"{}\",\"user\":4}}\n", code)
            );
        }
    }
}
