pub mod er_api;
pub mod frankfurter;
pub mod util;
pub mod yahoo;

// Re-export the concrete providers for wiring
pub use er_api::ErApiSource;
pub use frankfurter::FrankfurterSource;
pub use yahoo::YahooProvider;
