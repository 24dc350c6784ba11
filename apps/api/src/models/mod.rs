pub mod catalog;
pub mod score;
pub mod user;
