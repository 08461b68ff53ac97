pub mod models;
pub mod services;

pub use models::{UrlField, Video};
pub use services::{PgVideoStore, StoreError, VideoStore};
