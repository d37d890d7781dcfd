// Utils compartidos

pub mod dates;
pub mod debounce;
pub mod format;
pub mod jwt;
pub mod storage;
