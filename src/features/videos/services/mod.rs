mod video_store;

pub use video_store::{PgVideoStore, StoreError, VideoStore};
