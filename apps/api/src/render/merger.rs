//! Appends an uploaded, untrusted PDF to the composed summary.
//!
//! `embed` never fails. Every way the foreign document can be unusable ends in
//! an explanatory section rendered into the output, and the returned
//! `MergeOutcome` says which branch was taken.
//!
//! Branches, in the order they are checked:
//! 1. source bytes could not be read
//! 2. source is empty
//! 3. source does not parse as a PDF, even after rebuilding its
//!    cross-reference table, or is protected by a user password
//! 4. source parses but has no pages
//! 5. pages are staged; on success an info section is drawn and the pages are
//!    appended, otherwise a copy-failure section is drawn and nothing is appended

use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::render::composer::Composer;
use crate::render::recovery::load_lenient;

const ATTACHED_HEADING: &str = "Attached Document";
const MERGED_HEADING: &str = "Attached Resume/Document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Reading the source failed; carries the I/O error text.
    Unreadable(String),
    Empty,
    Unparseable,
    NoPages,
    Merged { pages: usize },
    CopyFailed,
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged { .. })
    }

    /// Heading and body of the section rendered for this outcome.
    ///
    /// `file_name` is reduced to its final path component.
    pub fn section(&self, file_name: &str) -> (&'static str, String) {
        let base = basename(file_name);
        match self {
            MergeOutcome::Unreadable(error) => (
                ATTACHED_HEADING,
                format!("Document was uploaded but could not be embedded in this PDF. Error: {error}"),
            ),
            MergeOutcome::Empty => (
                ATTACHED_HEADING,
                "Document file was empty and could not be processed.".to_string(),
            ),
            MergeOutcome::Unparseable => (
                ATTACHED_HEADING,
                format!(
                    "Document \"{base}\" was uploaded but could not be processed. \
                     The file may be corrupted or encrypted."
                ),
            ),
            MergeOutcome::NoPages => (
                ATTACHED_HEADING,
                "Document file contains no pages and could not be processed.".to_string(),
            ),
            MergeOutcome::Merged { pages } => (
                MERGED_HEADING,
                format!("The following {pages} page(s) contain the uploaded document:"),
            ),
            MergeOutcome::CopyFailed => (
                ATTACHED_HEADING,
                format!(
                    "Document \"{base}\" was uploaded but pages could not be copied. \
                     The file may have restrictions or be corrupted."
                ),
            ),
        }
    }
}

/// Embeds `source` into the composer after everything composed so far.
pub fn embed(composer: &mut Composer, file_name: &str, source: io::Result<Vec<u8>>) -> MergeOutcome {
    let outcome = merge(composer, file_name, source);
    match &outcome {
        MergeOutcome::Merged { pages } => {
            info!(file = %file_name, pages, "Attached uploaded document")
        }
        degraded => warn!(file = %file_name, outcome = ?degraded, "Uploaded document not attached"),
    }
    outcome
}

fn merge(composer: &mut Composer, file_name: &str, source: io::Result<Vec<u8>>) -> MergeOutcome {
    let bytes = match source {
        Ok(bytes) => bytes,
        Err(e) => return render(composer, file_name, MergeOutcome::Unreadable(e.to_string())),
    };
    if bytes.is_empty() {
        return render(composer, file_name, MergeOutcome::Empty);
    }

    let document = match load_lenient(&bytes) {
        Ok(document) => document,
        Err(e) => {
            warn!(file = %file_name, error = %e, "Failed to parse uploaded document");
            return render(composer, file_name, MergeOutcome::Unparseable);
        }
    };
    // An encryption dictionary without a decryption state means the empty
    // user password was rejected and no object was loaded.
    if document.is_encrypted() && !document.was_encrypted() {
        warn!(file = %file_name, "Uploaded document is password protected");
        return render(composer, file_name, MergeOutcome::Unparseable);
    }
    if document.was_encrypted() {
        info!(file = %file_name, "Decrypted uploaded document with the empty user password");
    }

    if document.get_pages().is_empty() {
        return render(composer, file_name, MergeOutcome::NoPages);
    }

    match composer.stage_import(document) {
        Ok(staged) => {
            let pages = staged.page_count();
            let outcome = render(composer, file_name, MergeOutcome::Merged { pages });
            composer.commit_import(staged);
            outcome
        }
        Err(e) => {
            warn!(file = %file_name, error = %e, "Failed to copy pages from uploaded document");
            render(composer, file_name, MergeOutcome::CopyFailed)
        }
    }
}

fn render(composer: &mut Composer, file_name: &str, outcome: MergeOutcome) -> MergeOutcome {
    let (heading, body) = outcome.section(file_name);
    composer.add_section(heading, &body);
    outcome
}

fn basename(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions};

    use super::*;
    use crate::layout::font_metrics::default_page_config;
    use crate::render::composer::BlockKind;
    use crate::render::testing::{page_texts, sample_pdf};

    fn composer_with_intro() -> Composer {
        let mut composer = Composer::new(default_page_config());
        composer.add_section("Uploaded Document", "resume.pdf");
        composer
    }

    /// Body lines of the section drawn after the intro section, rejoined.
    fn merger_body(texts: &[Vec<String>]) -> String {
        texts[0][3..].join(" ")
    }

    fn encrypted_pdf(texts: &[&str], user_password: &str) -> Vec<u8> {
        let mut doc = Document::load_mem(&sample_pdf(texts)).unwrap();
        let file_id = Object::string_literal("0123456789abcdef");
        doc.trailer.set("ID", vec![file_id.clone(), file_id]);

        let version = EncryptionVersion::V2 {
            document: &doc,
            owner_password: "owner",
            user_password,
            key_length: 128,
            permissions: Permissions::all(),
        };
        let state = EncryptionState::try_from(version).unwrap();
        doc.encrypt(&state).unwrap();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn embed_bytes(bytes: Vec<u8>) -> (MergeOutcome, Vec<Vec<String>>) {
        let mut composer = composer_with_intro();
        let outcome = embed(&mut composer, "uploads/123-abc-resume.pdf", Ok(bytes));
        let texts = page_texts(&composer.finish().unwrap());
        (outcome, texts)
    }

    #[test]
    fn test_pages_follow_info_section_in_order() {
        let (outcome, texts) = embed_bytes(sample_pdf(&["page one", "page two", "page three"]));
        assert_eq!(outcome, MergeOutcome::Merged { pages: 3 });
        assert_eq!(
            texts,
            vec![
                vec![
                    "Uploaded Document",
                    "resume.pdf",
                    "Attached Resume/Document",
                    "The following 3 page(s) contain the uploaded document:",
                ],
                vec!["page one"],
                vec!["page two"],
                vec!["page three"],
            ]
        );
    }

    #[test]
    fn test_empty_source_renders_one_section_and_no_pages() {
        let (outcome, texts) = embed_bytes(Vec::new());
        assert_eq!(outcome, MergeOutcome::Empty);
        assert_eq!(texts.len(), 1);
        assert_eq!(
            texts[0][2..],
            [
                "Attached Document".to_string(),
                "Document file was empty and could not be processed.".to_string(),
            ]
        );
    }

    #[test]
    fn test_garbage_source_is_unparseable() {
        let (outcome, texts) = embed_bytes(b"this is not a pdf at all".to_vec());
        assert_eq!(outcome, MergeOutcome::Unparseable);
        assert_eq!(texts.len(), 1);
        let body = merger_body(&texts);
        assert!(body.contains("\"123-abc-resume.pdf\""), "basename only: {body}");
        assert!(body.contains("corrupted or encrypted"));
    }

    #[test]
    fn test_truncated_pdf_does_not_error() {
        let mut bytes = sample_pdf(&["page"]);
        bytes.truncate(64);
        let (outcome, texts) = embed_bytes(bytes);
        assert!(!outcome.is_merged());
        assert_eq!(texts.len(), 1, "no foreign pages after a failed parse");
    }

    #[test]
    fn test_zero_page_document() {
        let (outcome, texts) = embed_bytes(sample_pdf(&[]));
        assert_eq!(outcome, MergeOutcome::NoPages);
        assert_eq!(
            merger_body(&texts),
            "Document file contains no pages and could not be processed."
        );
    }

    #[test]
    fn test_unreadable_source_includes_error_text() {
        let mut composer = composer_with_intro();
        let error = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let outcome = embed(&mut composer, "missing.pdf", Err(error));
        assert_eq!(outcome, MergeOutcome::Unreadable("no such file".to_string()));

        let texts = page_texts(&composer.finish().unwrap());
        assert_eq!(texts[0][2], "Attached Document");
        assert_eq!(
            merger_body(&texts),
            "Document was uploaded but could not be embedded in this PDF. Error: no such file"
        );
    }

    #[test]
    fn test_password_protected_source_is_unparseable() {
        let (outcome, texts) = embed_bytes(encrypted_pdf(&["secret page"], "secret"));
        assert_eq!(outcome, MergeOutcome::Unparseable);
        assert_eq!(texts.len(), 1, "no foreign pages from a locked document");
        assert_eq!(texts[0][2], "Attached Document");
        assert!(merger_body(&texts).contains("corrupted or encrypted"));
    }

    #[test]
    fn test_empty_user_password_source_is_merged() {
        let (outcome, texts) = embed_bytes(encrypted_pdf(&["open page"], ""));
        assert_eq!(outcome, MergeOutcome::Merged { pages: 1 });
        assert_eq!(texts[1], vec!["open page"]);
    }

    #[test]
    fn test_damaged_cross_reference_table_is_recovered() {
        let original = sample_pdf(&["one", "two"]);
        let line_end = original.iter().position(|&b| b == b'\n').unwrap() + 1;
        let mut shifted = original[..line_end].to_vec();
        shifted.extend_from_slice(b"%padding!\n");
        shifted.extend_from_slice(&original[line_end..]);

        let (outcome, texts) = embed_bytes(shifted);
        assert_eq!(outcome, MergeOutcome::Merged { pages: 2 });
        assert_eq!(&texts[1..], &[vec!["one"], vec!["two"]]);
    }

    #[test]
    fn test_dangling_content_stream_is_copy_failure() {
        let mut source = Document::load_mem(&sample_pdf(&["kept", "broken"])).unwrap();
        let pages: Vec<_> = source.get_pages().into_values().collect();
        let content_id = source
            .get_dictionary(pages[1])
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_reference()
            .unwrap();
        source.objects.remove(&content_id);
        let mut bytes = Vec::new();
        source.save_to(&mut bytes).unwrap();

        let mut composer = composer_with_intro();
        let outcome = embed(&mut composer, "uploads/cv.pdf", Ok(bytes));
        assert_eq!(outcome, MergeOutcome::CopyFailed);
        assert!(composer
            .blocks()
            .iter()
            .all(|b| b.kind != BlockKind::ImportedPage));

        let texts = page_texts(&composer.finish().unwrap());
        assert_eq!(texts.len(), 1, "no foreign page is appended, not even the intact one");
        assert_eq!(texts[0][2], "Attached Document");
        assert!(merger_body(&texts).contains("\"cv.pdf\" was uploaded but pages could not be copied"));
    }

    #[test]
    fn test_copy_failure_message_names_file() {
        let (heading, body) = MergeOutcome::CopyFailed.section("/var/uploads/cv.pdf");
        assert_eq!(heading, "Attached Document");
        assert_eq!(
            body,
            "Document \"cv.pdf\" was uploaded but pages could not be copied. \
             The file may have restrictions or be corrupted."
        );
    }

    #[test]
    fn test_imported_pages_recorded_after_text() {
        let mut composer = composer_with_intro();
        embed(&mut composer, "cv.pdf", Ok(sample_pdf(&["a", "b"])));
        let blocks = composer.blocks();
        let first_import = blocks
            .iter()
            .position(|b| b.kind == BlockKind::ImportedPage)
            .unwrap();
        assert!(blocks[first_import..]
            .iter()
            .all(|b| b.kind == BlockKind::ImportedPage));
        assert_eq!(blocks.len() - first_import, 2);
    }
}
