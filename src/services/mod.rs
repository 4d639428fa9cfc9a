pub mod access_url;
pub mod ingest;
pub mod media_tool;
pub mod storage;
pub mod video_repository;
