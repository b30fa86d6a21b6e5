//! Model file format and memory-mapped reader for sumi
//!
//! A model is a read-only binary file holding every template character the
//! recognizer can match against, grouped by stroke count. This crate defines
//! the on-disk layout (`format`) and a zero-copy memory-mapped reader plus a
//! file writer (`mmap`). Template matrices are never copied out of the
//! mapping; the reader hands out typed views that live as long as the
//! [`Model`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod mmap;

pub use format::{CharacterGroup, CharacterInfo, TemplateEntry, HEADER_SIZE, MODEL_MAGIC};
pub use mmap::{write_model_file, Model};
