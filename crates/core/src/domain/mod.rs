pub mod catalog;
pub mod record;
pub mod routine;
pub mod step;
