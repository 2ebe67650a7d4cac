mod questions;
mod quiz;

pub use questions::questions_router;
pub use quiz::quiz_router;
