//! Runtime module: process lifecycle: boot and batch run.

pub mod boot;
pub mod run;
