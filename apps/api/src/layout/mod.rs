// Text layout: static Helvetica metrics, sanitization, and greedy word-wrap.
// Everything here is pure and synchronous; callers run it inside spawn_blocking.

pub mod font_metrics;
pub mod wrap;

pub use font_metrics::{default_page_config, PageConfig};
