//! Qanda CLI - interactive question loop and model listing

pub mod interactive;
pub mod models;

pub use interactive::{normalize, run_loop, EXIT_WORDS, PROMPT};
pub use models::print_generation_models;
