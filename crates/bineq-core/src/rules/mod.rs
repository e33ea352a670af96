pub mod catalog;
pub mod grade;
