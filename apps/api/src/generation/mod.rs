// Application summary generation.
// Composes the summary PDF, merges the uploaded document, and stores the result.

pub mod generator;

pub use generator::generate_summary;
