// Diagnostics: per-session counters.

pub mod stats;
