use clap::Parser;
use simrec::{UserId, RATINGS_INPUT};
use simrec_cli::{
    recommender::RecommenderOptions, report::OutputFormat, run, DEFAULT_TARGET_USER,
    DEFAULT_TOP_N,
};
use std::{io, process};

/// Recommends items to a user based on the ratings of users with similar taste
#[derive(Parser)]
#[command(version)]
struct Args {
    /// User to make recommendations for
    #[arg(default_value_t = DEFAULT_TARGET_USER, allow_negative_numbers = true)]
    target_user: UserId,

    /// Number of recommendations to make. Zero or less lists none.
    #[arg(default_value_t = DEFAULT_TOP_N, allow_negative_numbers = true)]
    top_n: i64,

    /// Ratings file, delimited text (userId,itemId,rating) or parquet (uid, pid, rating)
    #[arg(short, long, default_value = RATINGS_INPUT)]
    ratings_file: String,

    /// Minimum number of ratings another user needs to be considered similar
    #[arg(short, long, default_value_t = 1)]
    min_ratings: usize,

    /// Only use this many of the most similar users. Uses all of them when not given.
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    users_to_consider: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let options = RecommenderOptions::new()
        .with_ratings_file(args.ratings_file)
        .with_min_ratings(args.min_ratings)
        .with_users_to_consider(args.users_to_consider.map(|limit| limit as usize));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = run(&options, args.target_user, args.top_n, args.format, &mut out) {
        eprintln!("Recommender failed with error: {}", e);
        process::exit(1);
    }
}
