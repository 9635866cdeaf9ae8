use std::thread;

use crate::errors::{EditorError, EditorResult};
use crate::image_data::ImageData;

pub const MAX_PALETTE_IMAGES: usize = 4;

/// An upload or capture before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Turns raw upload bytes into a typed image. Implemented by the engine.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, file: &RawFile) -> EditorResult<ImageData>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteImage {
    pub id: String,
    pub file_name: String,
    pub image: ImageData,
}

impl PaletteImage {
    pub fn mime_type(&self) -> &str {
        self.image.mime_type()
    }
}

#[derive(Debug, Default)]
pub struct AddOutcome {
    pub added: Vec<PaletteImage>,
    pub rejected: Vec<EditorError>,
}

/// Bounded, insertion-ordered set of uploaded images.
#[derive(Debug, Clone, Default)]
pub struct PaletteStore {
    images: Vec<PaletteImage>,
    next_seq: u64,
}

impl PaletteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= MAX_PALETTE_IMAGES
    }

    pub fn remaining_capacity(&self) -> usize {
        MAX_PALETTE_IMAGES.saturating_sub(self.images.len())
    }

    pub fn images(&self) -> &[PaletteImage] {
        &self.images
    }

    pub fn first(&self) -> Option<&PaletteImage> {
        self.images.first()
    }

    pub fn get(&self, id: &str) -> Option<&PaletteImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// First-come admission: keeps only as many items as there is room for.
    pub fn admit<T>(&self, mut files: Vec<T>) -> Vec<T> {
        files.truncate(self.remaining_capacity());
        files
    }

    /// Decodes every file of the batch independently, then applies the
    /// successful ones in input order in a single step.
    pub fn add(&mut self, files: Vec<RawFile>, decoder: &dyn ImageDecoder) -> AddOutcome {
        let files = self.admit(files);
        let decoded = decode_batch(&files, decoder);

        let mut outcome = AddOutcome::default();
        for (file, result) in files.into_iter().zip(decoded) {
            match result {
                Ok(image) => {
                    self.next_seq += 1;
                    let entry = PaletteImage {
                        id: format!("img-{}", self.next_seq),
                        file_name: file.name,
                        image,
                    };
                    self.images.push(entry.clone());
                    outcome.added.push(entry);
                }
                Err(err) => outcome.rejected.push(err),
            }
        }
        outcome
    }

    /// Removes `id`; absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<PaletteImage> {
        let index = self.images.iter().position(|image| image.id == id)?;
        Some(self.images.remove(index))
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}

fn decode_batch(files: &[RawFile], decoder: &dyn ImageDecoder) -> Vec<EditorResult<ImageData>> {
    if files.len() <= 1 {
        return files.iter().map(|file| decoder.decode(file)).collect();
    }
    thread::scope(|scope| {
        let handles = files
            .iter()
            .map(|file| scope.spawn(move || decoder.decode(file)))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .zip(files)
            .map(|(handle, file)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(EditorError::file_read(&file.name, "decoder panicked")))
            })
            .collect()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Accepts anything except files whose name starts with `bad`.
    pub(crate) struct StubDecoder;

    impl ImageDecoder for StubDecoder {
        fn decode(&self, file: &RawFile) -> EditorResult<ImageData> {
            if file.name.starts_with("bad") {
                return Err(EditorError::file_read(&file.name, "not an image"));
            }
            let mime = if file.name.ends_with(".jpg") {
                "image/jpeg"
            } else {
                "image/png"
            };
            Ok(ImageData::new(mime, file.bytes.clone()))
        }
    }

    pub(crate) fn files(names: &[&str]) -> Vec<RawFile> {
        names
            .iter()
            .map(|name| RawFile::new(*name, name.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn add_assigns_unique_ids_in_upload_order() {
        let mut palette = PaletteStore::new();
        let outcome = palette.add(files(&["a.png", "b.jpg"]), &StubDecoder);
        assert_eq!(outcome.added.len(), 2);
        assert!(outcome.rejected.is_empty());
        let ids: Vec<&str> = palette.images().iter().map(|image| image.id.as_str()).collect();
        assert_eq!(ids, vec!["img-1", "img-2"]);
        assert_eq!(palette.images()[1].mime_type(), "image/jpeg");
        assert_eq!(palette.images()[0].file_name, "a.png");
    }

    #[test]
    fn decode_failure_is_isolated_to_its_file() {
        let mut palette = PaletteStore::new();
        let outcome = palette.add(files(&["a.png", "bad.heic", "c.png"]), &StubDecoder);
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(matches!(
            &outcome.rejected[0],
            EditorError::FileRead { file_name, .. } if file_name == "bad.heic"
        ));
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn capacity_is_first_come() {
        let mut palette = PaletteStore::new();
        palette.add(files(&["a.png", "b.png", "c.png"]), &StubDecoder);
        let outcome = palette.add(files(&["d.png", "e.png", "f.png"]), &StubDecoder);
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].file_name, "d.png");
        assert!(palette.is_full());
        assert_eq!(palette.remaining_capacity(), 0);

        let outcome = palette.add(files(&["g.png"]), &StubDecoder);
        assert!(outcome.added.is_empty());
        assert_eq!(palette.len(), MAX_PALETTE_IMAGES);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut palette = PaletteStore::new();
        palette.add(files(&["a.png", "b.png"]), &StubDecoder);
        assert!(palette.remove("img-2").is_some());
        palette.add(files(&["c.png"]), &StubDecoder);
        assert!(palette.contains("img-3"));
        assert!(!palette.contains("img-2"));
    }

    #[test]
    fn remove_absent_id_is_a_noop() {
        let mut palette = PaletteStore::new();
        palette.add(files(&["a.png"]), &StubDecoder);
        assert!(palette.remove("img-9").is_none());
        assert_eq!(palette.len(), 1);
        palette.clear();
        assert!(palette.is_empty());
    }

    #[test]
    fn size_stays_bounded_under_mixed_operations() {
        let mut palette = PaletteStore::new();
        let ops: &[(&str, usize)] = &[("add", 3), ("remove", 1), ("add", 4), ("remove", 2), ("add", 2)];
        for (op, count) in ops {
            match *op {
                "add" => {
                    let before = palette.len();
                    let names: Vec<String> = (0..*count).map(|i| format!("f{i}.png")).collect();
                    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                    let outcome = palette.add(files(&refs), &StubDecoder);
                    assert_eq!(outcome.added.len(), (*count).min(MAX_PALETTE_IMAGES - before));
                }
                _ => {
                    for _ in 0..*count {
                        if let Some(id) = palette.first().map(|image| image.id.clone()) {
                            palette.remove(&id);
                        }
                    }
                }
            }
            assert!(palette.len() <= MAX_PALETTE_IMAGES);
        }
    }
}
