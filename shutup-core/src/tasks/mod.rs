// shutup-core/src/tasks/mod.rs
pub mod presence_annotator;
