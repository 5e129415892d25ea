pub mod finalize;
pub mod generate;
pub mod load;
pub mod render;
