pub mod args;
pub mod color;
pub mod cow;
