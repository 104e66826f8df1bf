pub mod particles;
pub mod sink;
