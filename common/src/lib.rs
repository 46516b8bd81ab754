pub mod builders;
pub mod db;
pub mod domain;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod settings;
pub mod storage;

pub use builders::build_all;
