//! Memory-mapped model reader and model file writer
//!
//! Provides zero-copy access to a recognition model. The file is mapped
//! read-only and validated once at open; after that, the character and group
//! metadata arrays and the packed template matrices are exposed as typed
//! views directly into the mapping. Tens of thousands of templates are
//! common, so nothing is copied out.
//!
//! The writer is the producing side of the same format, used by offline
//! tooling and by tests to build fixture models.

use memmap2::Mmap;
use std::fs::{self, File};
use std::io::Write;
use std::mem;
use std::path::Path;
use std::slice;
use tracing::info;

use sumi_core::{flatten, Error, PackedVector, Result, PACKED_DIM};

use crate::format::{CharacterGroup, CharacterInfo, TemplateEntry, HEADER_SIZE, MODEL_MAGIC};

/// Byte size of one packed vector.
const VECTOR_BYTES: usize = mem::size_of::<PackedVector>();

/// A memory-mapped recognition model (read-only).
///
/// Owns the mapping for its whole lifetime; every view handed out borrows
/// from it. Multiple recognizers may share one `Model` behind an `Arc` if
/// callers want to run recognitions on separate threads, since the model is
/// never mutated.
pub struct Model {
    /// The memory-mapped file
    mmap: Mmap,
    /// Number of template characters
    n_characters: u32,
    /// Number of stroke-count groups
    n_groups: u32,
    /// Logical feature dimension D (pad lanes excluded)
    dimension: u32,
    /// Resampling threshold recorded for preprocessors; unused by matching
    downsample_threshold: u32,
    /// Byte offset of the stroke-data region (= groups[0].offset)
    stroke_offset: usize,
    /// Total packed vectors in the stroke-data region
    n_stroke_vectors: usize,
    /// Longest template, in vectors
    max_n_vectors: u32,
}

impl Model {
    /// Open and validate a model file.
    ///
    /// Fails with [`Error::Map`] when the file cannot be opened or mapped,
    /// [`Error::Format`] on a magic-number mismatch, [`Error::EmptyModel`]
    /// when the model declares no characters or no groups, and
    /// [`Error::Truncated`] / [`Error::InvalidModel`] when the metadata does
    /// not describe the file's actual contents.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and never outlives the file
        // handle; all accesses go through bounds-validated views.
        let mmap = unsafe { Mmap::map(&file) }?;

        if mmap.len() < HEADER_SIZE {
            return Err(Error::Truncated {
                section: "header",
                needed: HEADER_SIZE,
                available: mmap.len(),
            });
        }

        let data = &mmap[..];

        let magic = read_u32(data, 0);
        if magic != MODEL_MAGIC {
            return Err(Error::Format { found: magic });
        }

        let n_characters = read_u32(data, 4);
        let n_groups = read_u32(data, 8);
        let dimension = read_u32(data, 12);
        let downsample_threshold = read_u32(data, 16);

        if n_characters == 0 || n_groups == 0 {
            return Err(Error::EmptyModel);
        }
        if dimension == 0 || dimension as usize > PACKED_DIM {
            return Err(Error::InvalidModel(format!(
                "dimension {} not in 1..={}",
                dimension, PACKED_DIM
            )));
        }

        let info_end = HEADER_SIZE + n_characters as usize * mem::size_of::<CharacterInfo>();
        if info_end > mmap.len() {
            return Err(Error::Truncated {
                section: "character infos",
                needed: info_end,
                available: mmap.len(),
            });
        }

        let group_end = info_end + n_groups as usize * mem::size_of::<CharacterGroup>();
        if group_end > mmap.len() {
            return Err(Error::Truncated {
                section: "character groups",
                needed: group_end,
                available: mmap.len(),
            });
        }

        let infos = info_view(data, n_characters as usize);
        let groups = group_view(data, info_end, n_groups as usize);

        let stroke_offset = groups[0].offset as usize;
        if stroke_offset < group_end || stroke_offset > mmap.len() {
            return Err(Error::InvalidModel(format!(
                "stroke data offset {} outside [{}, {}]",
                stroke_offset,
                group_end,
                mmap.len()
            )));
        }
        if stroke_offset % VECTOR_BYTES != 0 {
            return Err(Error::InvalidModel(format!(
                "stroke data offset {} not {}-byte aligned",
                stroke_offset, VECTOR_BYTES
            )));
        }

        // The group table must describe the info array and the stroke
        // region exactly: stroke counts ascending, character counts summing
        // to n_characters, offsets partitioning the region contiguously.
        let mut char_id = 0usize;
        let mut expected_offset = stroke_offset;
        let mut max_n_vectors = 0u32;
        for (i, group) in groups.iter().enumerate() {
            if i > 0 && group.n_strokes <= groups[i - 1].n_strokes {
                return Err(Error::InvalidModel(format!(
                    "group {} stroke count {} not above previous {}",
                    i,
                    group.n_strokes,
                    groups[i - 1].n_strokes
                )));
            }
            if group.offset as usize != expected_offset {
                return Err(Error::InvalidModel(format!(
                    "group {} offset {} does not continue the stroke region at {}",
                    i, group.offset, expected_offset
                )));
            }
            let chars = group.n_chars as usize;
            if char_id + chars > infos.len() {
                return Err(Error::InvalidModel(format!(
                    "group character counts exceed {} characters",
                    infos.len()
                )));
            }
            for info in &infos[char_id..char_id + chars] {
                if info.n_vectors == 0 {
                    return Err(Error::InvalidModel(format!(
                        "template U+{:04X} has no vectors",
                        info.unicode
                    )));
                }
                max_n_vectors = max_n_vectors.max(info.n_vectors);
                expected_offset += info.n_vectors as usize * VECTOR_BYTES;
            }
            char_id += chars;
        }
        if char_id != infos.len() {
            return Err(Error::InvalidModel(format!(
                "group character counts sum to {}, model declares {}",
                char_id,
                infos.len()
            )));
        }
        if expected_offset > mmap.len() {
            return Err(Error::Truncated {
                section: "stroke data",
                needed: expected_offset,
                available: mmap.len(),
            });
        }

        let n_stroke_vectors = (expected_offset - stroke_offset) / VECTOR_BYTES;

        info!(
            target: "sumi::model",
            characters = n_characters,
            groups = n_groups,
            dimension,
            max_vectors = max_n_vectors,
            "Model opened"
        );

        Ok(Model {
            mmap,
            n_characters,
            n_groups,
            dimension,
            downsample_threshold,
            stroke_offset,
            n_stroke_vectors,
            max_n_vectors,
        })
    }

    /// Number of template characters.
    pub fn n_characters(&self) -> u32 {
        self.n_characters
    }

    /// Number of stroke-count groups.
    pub fn n_groups(&self) -> u32 {
        self.n_groups
    }

    /// Logical feature dimension D.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Resampling threshold recorded in the header for preprocessors.
    pub fn downsample_threshold(&self) -> u32 {
        self.downsample_threshold
    }

    /// Length of the longest template, in vectors.
    pub fn max_n_vectors(&self) -> u32 {
        self.max_n_vectors
    }

    /// The per-character metadata array, in group order.
    pub fn characters(&self) -> &[CharacterInfo] {
        info_view(&self.mmap, self.n_characters as usize)
    }

    /// The per-group metadata array, stroke counts ascending.
    pub fn groups(&self) -> &[CharacterGroup] {
        let info_end = HEADER_SIZE + self.n_characters as usize * mem::size_of::<CharacterInfo>();
        group_view(&self.mmap, info_end, self.n_groups as usize)
    }

    /// The whole stroke-data region as packed vectors, in group order.
    pub fn stroke_vectors(&self) -> &[PackedVector] {
        // SAFETY: offset, alignment and length were validated at open;
        // PackedVector is repr(C) over [f32; 4] and the region is 16-byte
        // aligned within the page-aligned mapping.
        unsafe {
            slice::from_raw_parts(
                self.mmap.as_ptr().add(self.stroke_offset) as *const PackedVector,
                self.n_stroke_vectors,
            )
        }
    }

    /// Index into [`stroke_vectors`](Model::stroke_vectors) where `group`'s
    /// templates begin.
    pub fn group_vector_start(&self, group: &CharacterGroup) -> usize {
        (group.offset as usize - self.stroke_offset) / VECTOR_BYTES
    }
}

#[inline]
fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
}

fn info_view(data: &[u8], count: usize) -> &[CharacterInfo] {
    // SAFETY: the caller validated that `count` records fit; CharacterInfo
    // is repr(C) over two u32s and HEADER_SIZE keeps the 4-byte alignment
    // of the page-aligned mapping.
    unsafe {
        slice::from_raw_parts(
            data.as_ptr().add(HEADER_SIZE) as *const CharacterInfo,
            count,
        )
    }
}

fn group_view(data: &[u8], offset: usize, count: usize) -> &[CharacterGroup] {
    // SAFETY: same argument as info_view; the group array starts right
    // after the info array, which preserves 4-byte alignment.
    unsafe { slice::from_raw_parts(data.as_ptr().add(offset) as *const CharacterGroup, count) }
}

/// Write a model file from a set of template characters.
///
/// Templates are grouped by stroke count (groups sorted ascending, order
/// within a group preserved), the stroke region is aligned to a 16-byte
/// boundary, and the file is written to a temp path and atomically renamed.
///
/// This is the producing side of [`Model::open`], used by offline tooling
/// and test fixtures.
pub fn write_model_file(
    path: &Path,
    dimension: u32,
    downsample_threshold: u32,
    templates: &[TemplateEntry],
) -> Result<()> {
    if templates.is_empty() {
        return Err(Error::InvalidModel("no templates to write".to_string()));
    }
    if dimension == 0 || dimension as usize > PACKED_DIM {
        return Err(Error::InvalidModel(format!(
            "dimension {} not in 1..={}",
            dimension, PACKED_DIM
        )));
    }
    for t in templates {
        if t.points.is_empty() {
            return Err(Error::InvalidModel(format!(
                "template U+{:04X} has no vectors",
                t.unicode
            )));
        }
    }

    // Group by stroke count; BTreeMap iteration gives ascending groups and
    // pushes preserve the caller's order within each group.
    let mut by_strokes: std::collections::BTreeMap<u32, Vec<&TemplateEntry>> =
        std::collections::BTreeMap::new();
    for t in templates {
        by_strokes.entry(t.n_strokes).or_default().push(t);
    }

    let n_characters = templates.len();
    let n_groups = by_strokes.len();
    let metadata_end = HEADER_SIZE
        + n_characters * mem::size_of::<CharacterInfo>()
        + n_groups * mem::size_of::<CharacterGroup>();
    let stroke_base = (metadata_end + VECTOR_BYTES - 1) / VECTOR_BYTES * VECTOR_BYTES;

    let mut groups = Vec::with_capacity(n_groups);
    let mut offset = stroke_base;
    for (&n_strokes, members) in &by_strokes {
        groups.push(CharacterGroup::new(
            n_strokes,
            members.len() as u32,
            u32::try_from(offset)
                .map_err(|_| Error::InvalidModel("model exceeds 4 GiB".to_string()))?,
        ));
        offset += members
            .iter()
            .map(|t| t.points.len() * VECTOR_BYTES)
            .sum::<usize>();
    }
    u32::try_from(offset).map_err(|_| Error::InvalidModel("model exceeds 4 GiB".to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Write to temp file then rename for atomicity
    let temp_path = path.with_extension("model.tmp");
    let mut file = File::create(&temp_path)?;

    // Header
    file.write_all(&MODEL_MAGIC.to_le_bytes())?;
    file.write_all(&(n_characters as u32).to_le_bytes())?;
    file.write_all(&(n_groups as u32).to_le_bytes())?;
    file.write_all(&dimension.to_le_bytes())?;
    file.write_all(&downsample_threshold.to_le_bytes())?;

    // Character infos, in group order
    for members in by_strokes.values() {
        for t in members {
            file.write_all(&t.unicode.to_le_bytes())?;
            file.write_all(&(t.points.len() as u32).to_le_bytes())?;
        }
    }

    // Group records
    for g in &groups {
        file.write_all(&g.n_strokes.to_le_bytes())?;
        file.write_all(&g.n_chars.to_le_bytes())?;
        file.write_all(&g.offset.to_le_bytes())?;
        file.write_all(&0u32.to_le_bytes())?;
    }

    // Pad to the aligned stroke region
    file.write_all(&vec![0u8; stroke_base - metadata_end])?;

    // Stroke data (raw f32 payload)
    for members in by_strokes.values() {
        for t in members {
            let floats = flatten(&t.points);
            // SAFETY: f32 is 4 bytes with no padding; reinterpreting the
            // float slice as bytes is layout-exact.
            let bytes = unsafe {
                slice::from_raw_parts(floats.as_ptr() as *const u8, floats.len() * 4)
            };
            file.write_all(bytes)?;
        }
    }

    file.flush()?;
    drop(file);

    // Atomic rename
    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template(unicode: u32, n_strokes: u32, points: &[[f32; 2]]) -> TemplateEntry {
        TemplateEntry {
            unicode,
            n_strokes,
            points: points
                .iter()
                .map(|p| PackedVector::from_values(p))
                .collect(),
        }
    }

    fn two_group_model(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("test.model");
        let templates = vec![
            template(0x41, 1, &[[0.0, 0.0], [1.0, 0.0]]),
            template(0x42, 1, &[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0]]),
            template(0x4E2D, 4, &[[0.5, 0.5], [1.5, 0.5]]),
        ];
        write_model_file(&path, 2, 50, &templates).unwrap();
        path
    }

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = two_group_model(&dir);

        let model = Model::open(&path).unwrap();
        assert_eq!(model.n_characters(), 3);
        assert_eq!(model.n_groups(), 2);
        assert_eq!(model.dimension(), 2);
        assert_eq!(model.downsample_threshold(), 50);
        assert_eq!(model.max_n_vectors(), 3);

        let infos = model.characters();
        assert_eq!(infos[0].unicode, 0x41);
        assert_eq!(infos[0].n_vectors, 2);
        assert_eq!(infos[1].unicode, 0x42);
        assert_eq!(infos[1].n_vectors, 3);
        assert_eq!(infos[2].unicode, 0x4E2D);

        let groups = model.groups();
        assert_eq!(groups[0].n_strokes, 1);
        assert_eq!(groups[0].n_chars, 2);
        assert_eq!(groups[1].n_strokes, 4);
        assert_eq!(groups[1].n_chars, 1);
        assert_eq!(groups[0].offset as usize % VECTOR_BYTES, 0);

        let strokes = model.stroke_vectors();
        assert_eq!(strokes.len(), 2 + 3 + 2);
        assert_eq!(strokes[0].as_array(), &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(strokes[1].as_array(), &[1.0, 0.0, 0.0, 0.0]);

        // Second group starts right after the first group's vectors.
        assert_eq!(model.group_vector_start(&groups[0]), 0);
        assert_eq!(model.group_vector_start(&groups[1]), 5);
        assert_eq!(strokes[5].as_array(), &[0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Model::open(&dir.path().join("nope.model"));
        assert!(matches!(result, Err(Error::Map(_))));
    }

    #[test]
    fn test_open_invalid_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.model");
        fs::write(&path, [0xAAu8; 32]).unwrap();

        match Model::open(&path) {
            Err(Error::Format { found }) => assert_eq!(found, 0xAAAA_AAAA),
            other => panic!("expected Format error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_open_truncated_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.model");
        fs::write(&path, MODEL_MAGIC.to_le_bytes()).unwrap();

        assert!(matches!(
            Model::open(&path),
            Err(Error::Truncated { section: "header", .. })
        ));
    }

    #[test]
    fn test_open_empty_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.model");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MODEL_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // n_characters
        bytes.extend_from_slice(&1u32.to_le_bytes()); // n_groups
        bytes.extend_from_slice(&2u32.to_le_bytes()); // dimension
        bytes.extend_from_slice(&0u32.to_le_bytes()); // downsample_threshold
        fs::write(&path, bytes).unwrap();

        match Model::open(&path) {
            Err(e @ Error::EmptyModel) => assert!(!e.to_string().is_empty()),
            other => panic!("expected EmptyModel error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_open_truncated_stroke_data() {
        let dir = TempDir::new().unwrap();
        let path = two_group_model(&dir);

        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 8);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Model::open(&path),
            Err(Error::Truncated { section: "stroke data", .. })
        ));
    }

    #[test]
    fn test_open_misaligned_stroke_offset() {
        let dir = TempDir::new().unwrap();
        let path = two_group_model(&dir);

        // Bump groups[0].offset off the 16-byte grid.
        let mut bytes = fs::read(&path).unwrap();
        let group_array = HEADER_SIZE + 3 * mem::size_of::<CharacterInfo>();
        let offset_pos = group_array + 8;
        let old = u32::from_le_bytes(bytes[offset_pos..offset_pos + 4].try_into().unwrap());
        bytes[offset_pos..offset_pos + 4].copy_from_slice(&(old + 4).to_le_bytes());
        fs::write(&path, bytes).unwrap();

        assert!(matches!(Model::open(&path), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_writer_rejects_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("void.model");
        assert!(matches!(
            write_model_file(&path, 2, 0, &[]),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_writer_sorts_groups_ascending() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sorted.model");
        let templates = vec![
            template(0x43, 9, &[[0.0, 0.0], [1.0, 1.0]]),
            template(0x41, 1, &[[0.0, 0.0], [1.0, 0.0]]),
            template(0x42, 5, &[[0.0, 0.0], [0.0, 1.0]]),
        ];
        write_model_file(&path, 2, 0, &templates).unwrap();

        let model = Model::open(&path).unwrap();
        let strokes: Vec<u32> = model.groups().iter().map(|g| g.n_strokes).collect();
        assert_eq!(strokes, vec![1, 5, 9]);

        let unicodes: Vec<u32> = model.characters().iter().map(|c| c.unicode).collect();
        assert_eq!(unicodes, vec![0x41, 0x42, 0x43]);
    }
}
