pub mod bracket;
pub mod games;
pub mod standings;
