use crate::recommender::RecommenderError;
use polars::{datatypes::PlHashMap, prelude::*};
use simrec::{ItemId, Rating, UserId};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Heading the header line starts with, compared case-insensitively
const HEADER_PREFIX: &str = "userid";

/// Number of fields a record needs before it is considered at all
const RECORD_FIELDS: usize = 3;

/// Ratings given by a single user, mapping item ids to the rating value
pub type UserRatings = PlHashMap<ItemId, f64>;

/// Holds every rating of the source, keyed by user then by item.
/// There is at most one rating per (user, item) pair; later records overwrite earlier ones.
#[derive(Clone, Debug, Default)]
pub struct RatingsMatrix {
    users: PlHashMap<UserId, UserRatings>,
}

impl RatingsMatrix {
    pub fn new() -> RatingsMatrix {
        RatingsMatrix {
            users: PlHashMap::new(),
        }
    }

    /// Reads the ratings file at `path`, picking the parser from the file extension.
    /// Files ending in `.parquet` are read as columnar data, anything else as delimited text.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RatingsMatrix, RecommenderError> {
        let path = path.as_ref();
        let is_parquet = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

        if is_parquet {
            Self::from_parquet_file(path)
        } else {
            Self::from_csv_file(path)
        }
    }

    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<RatingsMatrix, RecommenderError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parses `userId,itemId,rating` records, one per line.
    ///
    /// The first line is dropped if it starts with "userid" (any case). Records with fewer than
    /// three fields are skipped, but a field that is present and does not parse fails the whole
    /// load.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<RatingsMatrix, RecommenderError> {
        let mut matrix = RatingsMatrix::new();
        let mut skipped = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;

            if index == 0 && is_header(&line) {
                continue;
            }

            match parse_record(&line, line_number)? {
                Some(rating) => matrix.insert(rating),
                None => {
                    log::debug!("Skipping short record on line {}", line_number);
                    skipped += 1;
                }
            }
        }

        log::info!(
            "Loaded {} ratings from {} users ({} short records skipped)",
            matrix.rating_count(),
            matrix.user_count(),
            skipped
        );

        Ok(matrix)
    }

    /// Reads a parquet file with `uid`, `pid` and `rating` columns.
    /// Rows with a missing cell are skipped, rows are applied in file order.
    pub fn from_parquet_file<P: AsRef<Path>>(path: P) -> Result<RatingsMatrix, RecommenderError> {
        let args = ScanArgsParquet::default();
        let frame = LazyFrame::scan_parquet(path, args)?
            // Narrow integer and float columns are widened so any physical type can be used
            .select([
                col("uid").cast(DataType::Int64),
                col("pid").cast(DataType::Int64),
                col("rating").cast(DataType::Float64),
            ])
            .collect()?;

        Self::from_frame(&frame)
    }

    /// Builds a matrix out of a frame holding `uid`, `pid` and `rating` columns of types
    /// Int64, Int64 and Float64 respectively
    pub fn from_frame(frame: &DataFrame) -> Result<RatingsMatrix, RecommenderError> {
        let uids = frame.column("uid")?.i64()?;
        let pids = frame.column("pid")?.i64()?;
        let values = frame.column("rating")?.f64()?;

        let mut matrix = RatingsMatrix::new();
        let mut skipped = 0usize;

        for ((uid, pid), value) in uids.into_iter().zip(pids).zip(values) {
            match (uid, pid, value) {
                (Some(user_id), Some(item_id), Some(value)) => {
                    matrix.insert(Rating::new(user_id, item_id, value))
                }
                _ => skipped += 1,
            }
        }

        log::info!(
            "Loaded {} ratings from {} users ({} incomplete rows skipped)",
            matrix.rating_count(),
            matrix.user_count(),
            skipped
        );

        Ok(matrix)
    }

    /// Records a rating, replacing any earlier rating of the same item by the same user
    pub fn insert(&mut self, rating: Rating) {
        self.users
            .entry(rating.user_id)
            .or_default()
            .insert(rating.item_id, rating.value);
    }

    /// Returns every rating given by `user_id`, or None if the user never appeared in the source
    pub fn get_user(&self, user_id: UserId) -> Option<&UserRatings> {
        self.users.get(&user_id)
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn rating_count(&self) -> usize {
        self.users.values().map(|ratings| ratings.len()).sum()
    }

    /// Iterates over every user and their ratings, in no particular order
    pub fn users(&self) -> impl Iterator<Item = (UserId, &UserRatings)> {
        self.users.iter().map(|(user_id, ratings)| (*user_id, ratings))
    }
}

impl FromIterator<Rating> for RatingsMatrix {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        let mut matrix = RatingsMatrix::new();
        for rating in iter {
            matrix.insert(rating);
        }
        matrix
    }
}

/// Returns the ratings of a user ordered by item id.
/// Sums over this are reproducible, unlike sums in hash map order.
pub fn sorted_ratings(ratings: &UserRatings) -> Vec<(ItemId, f64)> {
    let mut sorted: Vec<_> = ratings.iter().map(|(item, value)| (*item, *value)).collect();
    sorted.sort_unstable_by_key(|(item, _)| *item);
    sorted
}

fn is_header(line: &str) -> bool {
    line.get(..HEADER_PREFIX.len())
        .is_some_and(|start| start.eq_ignore_ascii_case(HEADER_PREFIX))
}

/// Parses a single line into a rating. Ok(None) means the record is too short to use.
fn parse_record(line: &str, line_number: usize) -> Result<Option<Rating>, RecommenderError> {
    let mut fields: Vec<&str> = line.split(',').collect();

    // Empty trailing fields do not count towards the record length
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }

    if fields.len() < RECORD_FIELDS {
        return Ok(None);
    }

    let user_id = parse_field(fields[0], "userId", line_number)?;
    let item_id = parse_field(fields[1], "itemId", line_number)?;
    let value = parse_field(fields[2], "rating", line_number)?;

    Ok(Some(Rating::new(user_id, item_id, value)))
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    field: &'static str,
    line: usize,
) -> Result<T, RecommenderError> {
    raw.trim()
        .parse()
        .map_err(|_| RecommenderError::DataFormat {
            line,
            field,
            value: String::from(raw),
        })
}
