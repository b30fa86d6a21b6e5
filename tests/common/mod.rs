//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use std::path::PathBuf;

use sumi::{write_model_file, Character, PackedVector, TemplateEntry};
use tempfile::TempDir;

/// Build a template entry from 2-D points; pad lanes are zero.
pub fn template(unicode: u32, n_strokes: u32, points: &[[f32; 2]]) -> TemplateEntry {
    TemplateEntry {
        unicode,
        n_strokes,
        points: points
            .iter()
            .map(|p| PackedVector::from_values(p))
            .collect(),
    }
}

/// Build an input character from 2-D points.
pub fn character(n_strokes: u32, points: &[[f32; 2]]) -> Character {
    let mut ch = Character::new(points.len(), n_strokes);
    for (i, p) in points.iter().enumerate() {
        ch.set_vector(i, p);
    }
    ch
}

/// Write a model with dimension 2 into a fresh temp dir.
pub fn write_fixture(templates: &[TemplateEntry]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixture.model");
    write_model_file(&path, 2, 50, templates).unwrap();
    (dir, path)
}

/// A straight-line template of `n_vectors` points along the x axis,
/// shifted by `shift` so distances are distinct and predictable.
pub fn line_template(unicode: u32, n_strokes: u32, n_vectors: usize, shift: f32) -> TemplateEntry {
    let points: Vec<[f32; 2]> = (0..n_vectors).map(|i| [i as f32 + shift, shift]).collect();
    template(unicode, n_strokes, &points)
}
