/// Mean of `ratings` rounded to two decimals, and the number of ratings.
/// An empty set yields `(0.0, 0)`.
pub fn aggregate(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    ((mean * 100.0).round() / 100.0, ratings.len() as i32)
}

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
