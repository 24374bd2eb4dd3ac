//! PDF ingestion
//!
//! Uploaded bytes are written to a scoped temporary file and parsed with
//! `lopdf`, one text entry per page. The temporary file is removed when the
//! guard drops, so parse failures and early returns clean up as well.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use docqa_core::{Error, Page, PdfDocument, Result};

/// Loads PDFs into page texts
#[derive(Debug, Default, Clone)]
pub struct PdfIngestor {
    temp_dir: Option<PathBuf>,
}

impl PdfIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write transient uploads under `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Parse an uploaded byte stream
    pub fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<PdfDocument> {
        if bytes.is_empty() {
            return Err(Error::Parse(format!("{} is empty", source)));
        }

        let fingerprint = fingerprint(bytes);

        let mut builder = tempfile::Builder::new();
        builder.prefix("docqa-").suffix(".pdf");
        let mut transient = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        transient.write_all(bytes)?;
        transient.flush()?;
        debug!(path = %transient.path().display(), bytes = bytes.len(), "wrote transient upload");

        let pages = extract_pages(transient.path())?;

        Ok(PdfDocument {
            source: source.to_string(),
            fingerprint,
            pages,
        })
    }
}

/// md5 of the raw upload, used to recognise a re-upload of the same file
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

fn extract_pages(path: &Path) -> Result<Vec<Page>> {
    let mut document = lopdf::Document::load(path).map_err(|e| Error::Parse(e.to_string()))?;

    // Owner-password-only files (print/copy restrictions) open with an empty user password
    if document.is_encrypted() {
        document
            .decrypt("")
            .map_err(|e| Error::Parse(format!("PDF is password protected: {}", e)))?;
        debug!("decrypted PDF with the empty user password");
    }

    let pages = document
        .get_pages()
        .into_keys()
        .map(|number| {
            let text = match document.extract_text(&[number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = number, error = %e, "could not extract page text");
                    String::new()
                }
            };
            Page { number, text }
        })
        .collect::<Vec<_>>();

    debug!(pages = pages.len(), "extracted page texts");
    Ok(pages)
}

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

    const PASSWORD_PADDING: [u8; 32] = [
        0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
        0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
    ];
    const FILE_ID: &[u8] = b"docqa-fixture-id";
    // Printing and copying denied
    const PERMISSIONS: i32 = -64;

    /// Build a minimal PDF with one text line per page
    pub fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        build(lines, None)
    }

    /// Same as [`pdf_with_pages`], RC4-40 encrypted with an empty user
    /// password and the given owner password
    pub fn encrypted_pdf_with_pages(lines: &[&str], owner_password: &str) -> Vec<u8> {
        build(lines, Some(owner_password))
    }

    fn build(lines: &[&str], owner_password: Option<&str>) -> Vec<u8> {
        let security = owner_password.map(StandardSecurity::new);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let mut encoded = content.encode().expect("content stream encodes");
            let content_id = doc.new_object_id();
            if let Some(security) = &security {
                encoded = security.encrypt(content_id, &encoded);
            }
            doc.objects
                .insert(content_id, Object::Stream(Stream::new(dictionary! {}, encoded)));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(security) = &security {
            let encrypt_id = doc.add_object(dictionary! {
                "Filter" => "Standard",
                "V" => 1,
                "R" => 2,
                "Length" => 40,
                "O" => Object::String(security.owner_entry.clone(), StringFormat::Hexadecimal),
                "U" => Object::String(security.user_entry.clone(), StringFormat::Hexadecimal),
                "P" => PERMISSIONS as i64,
            });
            let id = Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal);
            doc.trailer.set("Encrypt", encrypt_id);
            doc.trailer.set("ID", vec![id.clone(), id]);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("fixture pdf serializes");
        bytes
    }

    /// Revision 2 standard security handler with an empty user password
    struct StandardSecurity {
        key: [u8; 5],
        owner_entry: Vec<u8>,
        user_entry: Vec<u8>,
    }

    impl StandardSecurity {
        fn new(owner_password: &str) -> Self {
            let owner_digest = md5::compute(pad(owner_password.as_bytes()));
            let owner_entry = rc4(&owner_digest[..5], &PASSWORD_PADDING);

            let mut seed = PASSWORD_PADDING.to_vec();
            seed.extend_from_slice(&owner_entry);
            seed.extend_from_slice(&PERMISSIONS.to_le_bytes());
            seed.extend_from_slice(FILE_ID);
            let digest = md5::compute(&seed);
            let mut key = [0u8; 5];
            key.copy_from_slice(&digest[..5]);

            Self {
                key,
                owner_entry,
                user_entry: rc4(&key, &PASSWORD_PADDING),
            }
        }

        fn encrypt(&self, (number, generation): ObjectId, data: &[u8]) -> Vec<u8> {
            let mut seed = self.key.to_vec();
            seed.extend_from_slice(&number.to_le_bytes()[..3]);
            seed.extend_from_slice(&generation.to_le_bytes()[..2]);
            let digest = md5::compute(&seed);
            rc4(&digest[..10], data)
        }
    }

    fn pad(password: &[u8]) -> Vec<u8> {
        password
            .iter()
            .chain(PASSWORD_PADDING.iter())
            .take(32)
            .copied()
            .collect()
    }

    fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut state: Vec<u8> = (0..=255).collect();
        let mut j = 0usize;
        for i in 0..256 {
            j = (j + state[i] as usize + key[i % key.len()] as usize) % 256;
            state.swap(i, j);
        }

        let (mut i, mut j) = (0usize, 0usize);
        data.iter()
            .map(|byte| {
                i = (i + 1) % 256;
                j = (j + state[i] as usize) % 256;
                state.swap(i, j);
                byte ^ state[(state[i] as usize + state[j] as usize) % 256]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{encrypted_pdf_with_pages, pdf_with_pages};
    use super::*;

    #[test]
    fn test_pages_in_order() {
        let bytes = pdf_with_pages(&["Photosynthesis happens in chloroplasts", "Mitochondria make ATP"]);
        let doc = PdfIngestor::new().load_bytes(&bytes, "biology.pdf").unwrap();

        assert_eq!(doc.source, "biology.pdf");
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].number, 1);
        assert!(doc.pages[0].text.contains("Photosynthesis"));
        assert!(doc.pages[1].text.contains("Mitochondria"));
    }

    #[test]
    fn test_malformed_pdf_is_parse_error() {
        let result = PdfIngestor::new().load_bytes(b"this is not a pdf", "notes.pdf");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_empty_upload_is_parse_error() {
        let result = PdfIngestor::new().load_bytes(&[], "empty.pdf");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let bytes = pdf_with_pages(&["same"]);
        assert_eq!(fingerprint(&bytes), fingerprint(&bytes));
        assert_ne!(fingerprint(&bytes), fingerprint(b"other"));
    }

    #[test]
    fn test_transient_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = PdfIngestor::new().with_temp_dir(dir.path());

        assert!(ingestor.load_bytes(b"%PDF-1.5 truncated", "broken.pdf").is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        assert!(ingestor.load_bytes(&pdf_with_pages(&["fine"]), "fine.pdf").is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_owner_restricted_pdf_is_readable() {
        let bytes = encrypted_pdf_with_pages(&["Entropy always increases"], "registrar");
        assert!(lopdf::Document::load_mem(&bytes).unwrap().is_encrypted());

        let doc = PdfIngestor::new().load_bytes(&bytes, "thermo.pdf").unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].text.contains("Entropy always increases"));
    }
}
