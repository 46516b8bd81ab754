pub mod listing;
pub mod rating;
pub mod tags;
pub mod visibility;
