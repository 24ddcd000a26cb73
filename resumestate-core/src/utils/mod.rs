//! Batch job helpers: Pacific-time dates and warehouse query exports

pub mod athena;
pub mod dates;
pub mod query;
pub mod s3;

pub use athena::AthenaQueryRunner;
pub use dates::*;
pub use query::*;
pub use s3::S3ObjectStore;
