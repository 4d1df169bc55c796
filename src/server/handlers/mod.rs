pub mod pages;
pub mod predictions;
