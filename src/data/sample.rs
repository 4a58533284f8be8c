//! Synthetic Arsenal match dataset used when no raw data is present.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

use super::{Column, DataError, Dataset};

const ROWS: usize = 100;

const OPPONENTS: [&str; 7] = [
    "Man City",
    "Liverpool",
    "Chelsea",
    "Spurs",
    "Man Utd",
    "Aston Villa",
    "Brighton",
];
const VENUES: [&str; 2] = ["Home", "Away"];
const WEATHER: [Option<&str>; 4] = [Some("Rain"), Some("Clear"), Some("Windy"), None];
const DAYS_REST: [i64; 4] = [3, 4, 6, 7];

/// Generate the 100-row match table. Possession and ShotsOnTarget get a few
/// blanked cells and Weather is missing for roughly a quarter of the rows.
pub fn generate(seed: u64) -> Result<Dataset, DataError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let match_id: Vec<Option<i64>> = (1..=ROWS as i64).map(Some).collect();
    let opponent: Vec<Option<&str>> = (0..ROWS)
        .map(|_| OPPONENTS.choose(&mut rng).copied())
        .collect();
    let venue: Vec<Option<&str>> = (0..ROWS).map(|_| VENUES.choose(&mut rng).copied()).collect();
    let mut possession: Vec<Option<f64>> = (0..ROWS)
        .map(|_| Some((rng.gen_range(30.0..75.0_f64) * 100.0).round() / 100.0))
        .collect();
    let mut shots: Vec<Option<i64>> = (0..ROWS).map(|_| Some(rng.gen_range(0..15))).collect();
    let corners: Vec<Option<i64>> = (0..ROWS).map(|_| Some(rng.gen_range(0..12))).collect();
    let yellow: Vec<Option<i64>> = (0..ROWS).map(|_| Some(rng.gen_range(0..6))).collect();
    let injured: Vec<Option<i64>> = (0..ROWS).map(|_| Some(rng.gen_range(0..5))).collect();
    let rest: Vec<Option<i64>> = (0..ROWS)
        .map(|_| DAYS_REST.choose(&mut rng).copied())
        .collect();
    let weather: Vec<Option<&str>> = (0..ROWS)
        .map(|_| WEATHER.choose(&mut rng).copied().flatten())
        .collect();
    let win: Vec<Option<i64>> = (0..ROWS).map(|_| Some(rng.gen_range(0..2))).collect();

    for idx in index::sample(&mut rng, ROWS, 10) {
        possession[idx] = None;
    }
    for idx in index::sample(&mut rng, ROWS, 5) {
        shots[idx] = None;
    }

    Dataset::new(vec![
        Column::int("MatchID", match_id),
        Column::text("Opponent", opponent),
        Column::text("Venue", venue),
        Column::float("Possession", possession),
        Column::int("ShotsOnTarget", shots),
        Column::int("Corners", corners),
        Column::int("YellowCards", yellow),
        Column::int("InjuredStarters", injured),
        Column::int("DaysRest", rest),
        Column::text("Weather", weather),
        Column::int("ArsenalWin", win),
    ])
}
