pub mod blocks;
pub mod logs;
