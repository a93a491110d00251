pub mod calc;
pub mod poll;
pub mod storage;
