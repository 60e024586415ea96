pub mod canonical;
pub mod dedup;
pub mod diff;
pub mod monitoring;
pub mod parsers;
pub mod pipeline;
