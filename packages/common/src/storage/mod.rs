mod error;
mod hash;
mod name;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use hash::ContentHash;
pub use name::BlobName;
pub use traits::{BlobStore, BoxReader, StoredBlob};
