//! Data module - loading, joining and reshaping

pub mod aggregator;
pub mod labeler;
pub mod loader;
pub mod normalizer;
pub mod processor;
pub mod reconstructor;
pub mod records;
pub mod schema;

pub use aggregator::{Aggregation, Aggregator};
pub use labeler::Labeler;
pub use loader::{DataLoader, LoaderError, SourceTables};
pub use normalizer::Normalizer;
pub use processor::{DataProcessor, JoinKind, JoinSpec, Prefer};
pub use reconstructor::Reconstructor;
pub use records::{
    FinalRecord, InstitutionAttributes, JoinedRecord, NameLink, OutcomeRecord, PredominantDegree,
    ReconstructedRecord, SearchRecord, StandardizedRecord, WeeklyAggregate,
};
