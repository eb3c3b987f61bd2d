// Common utilities shared across the pipeline

pub mod text;
