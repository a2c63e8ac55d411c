pub mod action;
pub mod condition;
pub mod episode;
pub mod quest;
pub mod snapshot;
pub mod value;
