/// MovieLens Loader
///
/// Reads a MovieLens-100k style directory into a `Dataset`:
///
/// - `u.data`:  `user_id \t item_id \t rating \t timestamp`
/// - `u.user`:  `user_id | age | gender | occupation | zip_code`
/// - `u.genre`: `name | genre_id`
/// - `u.item`:  `item_id | title | release_date | video_release_date | url | flag × N`
///
/// Genre flags start at column 5: a `1` in column `5 + g` tags the item with
/// genre id `g`. Files are decoded lossily (MovieLens ships Latin-1 text).
/// Blank lines are ignored; malformed lines are skipped and counted.
use crate::models::{Dataset, Genre, Item, ItemId, ItemTable, Rating, RatingIndex, User, UserId};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const RATINGS_FILE: &str = "u.data";
pub const USERS_FILE: &str = "u.user";
pub const GENRES_FILE: &str = "u.genre";
pub const ITEMS_FILE: &str = "u.item";

/// First genre flag column in `u.item`
const GENRE_FLAGS_OFFSET: usize = 5;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed rows plus the number of malformed lines skipped
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub skipped: usize,
}

/// Load all four files from `directory`
pub fn load_movielens(directory: impl AsRef<Path>) -> Result<Dataset, DatasetError> {
    let directory = directory.as_ref();

    let ratings = parse_ratings(&read_lossy(&directory.join(RATINGS_FILE))?);
    let users = parse_users(&read_lossy(&directory.join(USERS_FILE))?);
    let genres = parse_genres(&read_lossy(&directory.join(GENRES_FILE))?);
    let items = parse_items(&read_lossy(&directory.join(ITEMS_FILE))?, &genres.value);

    let skipped = ratings.skipped + users.skipped + genres.skipped + items.skipped;
    if skipped > 0 {
        warn!(
            directory = %directory.display(),
            ratings = ratings.skipped,
            users = users.skipped,
            genres = genres.skipped,
            items = items.skipped,
            "Skipped malformed dataset lines"
        );
    }

    info!(
        directory = %directory.display(),
        ratings = ratings.value.rating_count(),
        users = users.value.len(),
        items = items.value.len(),
        genres = genres.value.len(),
        "MovieLens dataset loaded"
    );

    Ok(Dataset {
        index: ratings.value,
        items: items.value,
        users: users.value,
        genres: genres.value,
    })
}

fn read_lossy(path: &Path) -> Result<String, DatasetError> {
    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Non-blank lines with their 1-based line numbers
fn lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

pub fn parse_ratings(contents: &str) -> Parsed<RatingIndex> {
    let mut index = RatingIndex::new();
    let mut skipped = 0;

    for (line_no, line) in lines(contents) {
        match parse_rating(line) {
            Some(rating) => index.insert(rating),
            None => {
                debug!(file = RATINGS_FILE, line_no, "Malformed rating line");
                skipped += 1;
            }
        }
    }

    Parsed { value: index, skipped }
}

fn parse_rating(line: &str) -> Option<Rating> {
    let mut columns = line.split('\t').map(str::trim);
    let user_id = columns.next()?.parse().ok()?;
    let item_id = columns.next()?.parse().ok()?;
    let value: f64 = columns.next()?.parse().ok()?;
    let timestamp = columns.next()?.parse().ok()?;

    value.is_finite().then_some(Rating {
        user_id,
        item_id,
        value,
        timestamp,
    })
}

pub fn parse_users(contents: &str) -> Parsed<BTreeMap<UserId, User>> {
    let mut users = BTreeMap::new();
    let mut skipped = 0;

    for (line_no, line) in lines(contents) {
        let columns: Vec<&str> = line.split('|').collect();
        let user = match (columns.first(), columns.get(1)) {
            (Some(id), Some(age)) => id
                .parse::<UserId>()
                .ok()
                .zip(age.parse::<u32>().ok())
                .map(|(user_id, age)| User {
                    user_id,
                    age,
                    gender: columns.get(2).unwrap_or(&"").to_string(),
                    occupation: columns.get(3).unwrap_or(&"").to_string(),
                    zip_code: columns.get(4).unwrap_or(&"").to_string(),
                }),
            _ => None,
        };

        match user {
            Some(user) => {
                users.insert(user.user_id, user);
            }
            None => {
                debug!(file = USERS_FILE, line_no, "Malformed user line");
                skipped += 1;
            }
        }
    }

    Parsed { value: users, skipped }
}

pub fn parse_genres(contents: &str) -> Parsed<Vec<Genre>> {
    let mut genres = Vec::new();
    let mut skipped = 0;

    for (line_no, line) in lines(contents) {
        match line.split_once('|') {
            Some((name, id)) => match id.trim().parse() {
                Ok(genre_id) => genres.push(Genre {
                    genre_id,
                    name: name.to_string(),
                }),
                Err(_) => {
                    debug!(file = GENRES_FILE, line_no, "Malformed genre id");
                    skipped += 1;
                }
            },
            None => {
                debug!(file = GENRES_FILE, line_no, "Malformed genre line");
                skipped += 1;
            }
        }
    }

    genres.sort_by_key(|genre| genre.genre_id);
    Parsed { value: genres, skipped }
}

pub fn parse_items(contents: &str, genres: &[Genre]) -> Parsed<ItemTable> {
    let genre_names: BTreeMap<u32, &str> = genres
        .iter()
        .map(|genre| (genre.genre_id, genre.name.as_str()))
        .collect();

    let mut items = ItemTable::new();
    let mut skipped = 0;

    for (line_no, line) in lines(contents) {
        let columns: Vec<&str> = line.split('|').collect();
        let Some(item_id) = columns.first().and_then(|id| id.parse::<ItemId>().ok()) else {
            debug!(file = ITEMS_FILE, line_no, "Malformed item line");
            skipped += 1;
            continue;
        };

        let genres = columns
            .iter()
            .skip(GENRE_FLAGS_OFFSET)
            .enumerate()
            .filter(|(_, flag)| flag.trim() == "1")
            .filter_map(|(genre_id, _)| genre_names.get(&(genre_id as u32)))
            .map(|name| name.to_string())
            .collect();

        items.insert(
            item_id,
            Item {
                item_id,
                title: columns.get(1).unwrap_or(&"").to_string(),
                release_date: columns.get(2).unwrap_or(&"").to_string(),
                genres,
            },
        );
    }

    Parsed { value: items, skipped }
}
