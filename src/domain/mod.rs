pub mod audio;
pub mod chapter;
