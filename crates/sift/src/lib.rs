// Domain-driven module structure for sift.

// Core infrastructure
pub mod pattern;
pub mod conf;
pub mod runtime;

// Domain modules
pub mod bundle;
pub mod jobs;
