pub mod config;
pub mod response;
pub mod storage_header;
