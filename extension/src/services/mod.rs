pub mod explain;
pub mod storage;
