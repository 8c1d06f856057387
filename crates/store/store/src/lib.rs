pub mod error;
pub mod key;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use key::BlobKey;
pub use store::{BlobStore, ETag, VersionedBlob, WriteCondition, WriteResult};
