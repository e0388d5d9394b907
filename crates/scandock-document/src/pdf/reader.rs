// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — inspect merged scan documents with `lopdf` (page count and
// page sizes).

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use scandock_core::error::ScandockError;
use tracing::{debug, info, instrument};

/// Guard against malformed page trees with cyclic /Parent links.
const MAX_PARENT_DEPTH: usize = 32;

/// Read-only view of an existing PDF.
pub struct PdfReader {
    document: Document,
    source_path: Option<String>,
}

impl PdfReader {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScandockError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            ScandockError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScandockError> {
        let document = Document::load_mem(data).map_err(|err| {
            ScandockError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Width and height in points of every page, in page order.
    ///
    /// Reads each page's /MediaBox, inheriting it from ancestor /Pages nodes
    /// when the page does not set its own.
    pub fn page_sizes(&self) -> Result<Vec<(f32, f32)>, ScandockError> {
        self.document
            .get_pages()
            .into_iter()
            .map(|(number, id)| {
                self.media_box(id)
                    .map(|b| (b[2] - b[0], b[3] - b[1]))
                    .ok_or_else(|| {
                        ScandockError::PdfError(format!("page {number} has no usable /MediaBox"))
                    })
            })
            .collect()
    }

    fn media_box(&self, page_id: ObjectId) -> Option<[f32; 4]> {
        let mut dict = self.dictionary(page_id)?;
        for _ in 0..MAX_PARENT_DEPTH {
            if let Ok(obj) = dict.get(b"MediaBox") {
                return self.rect(obj);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.dictionary(parent)?;
        }
        None
    }

    fn dictionary(&self, id: ObjectId) -> Option<&Dictionary> {
        self.document.get_object(id).ok()?.as_dict().ok()
    }

    fn rect(&self, obj: &Object) -> Option<[f32; 4]> {
        let obj = match obj {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            other => other,
        };
        let items = obj.as_array().ok()?;
        if items.len() != 4 {
            return None;
        }
        let mut out = [0.0f32; 4];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = number(item)?;
        }
        Some(out)
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Minimal document whose single page inherits its /MediaBox from the
    /// /Pages root.
    fn inherited_media_box_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(300),
                Object::Real(400.5),
            ],
        });
        if let Ok(dict) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            dict.set("Parent", Object::Reference(pages_id));
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save");
        out
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let reader = PdfReader::from_bytes(&inherited_media_box_pdf()).expect("load");
        assert_eq!(reader.page_count(), 1);
        let sizes = reader.page_sizes().expect("sizes");
        assert_eq!(sizes.len(), 1);
        assert!((sizes[0].0 - 300.0).abs() < 0.01);
        assert!((sizes[0].1 - 400.5).abs() < 0.01);
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(ScandockError::PdfError(_))
        ));
    }
}
