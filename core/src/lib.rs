pub mod apk;
pub mod errors;
pub mod models;

pub use apk::Apk;
pub use errors::ApkError;
pub use models::ApkJson;
