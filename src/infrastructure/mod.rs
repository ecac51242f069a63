pub mod analysis;
pub mod audio;
pub mod media;
pub mod observability;
pub mod persistence;
pub mod storage;
pub mod workspace;
