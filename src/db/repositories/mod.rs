pub mod hadith_repository;
pub mod token_repository;

pub use hadith_repository::HadithRepository;
pub use token_repository::TokenRepository;

/// Parse a SQLite datetime string into NaiveDateTime.
pub(crate) fn parse_dt(s: &str) -> chrono::NaiveDateTime {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap_or_default()
}
