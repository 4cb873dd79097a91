//! FITS image library
//!
//! Derives a database record from each image's salient headers, filing
//! target frames under their canonical catalog name so every alias of an
//! object finds the same images.

pub mod error;
pub mod ingest;
pub mod record;
pub mod store;
pub mod types;

pub use error::FitsError;
pub use ingest::Ingestor;
pub use record::build_record;
pub use store::FitsStore;
pub use types::{
    FitsHeaders, FitsRecord, FitsStatus, HeaderDump, HeaderValue, ImageType, IngestReport,
};
