pub mod catalog;
pub mod checks;
pub mod dispatch;
pub mod engine;
