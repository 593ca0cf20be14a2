//! Tolerant loading for uploaded PDFs.
//!
//! `Document::load_mem` trusts the cross-reference table. Uploads that were
//! edited by hand, concatenated, or truncated and re-terminated often carry a
//! table whose offsets no longer point at their objects. When the strict load
//! fails, the table is rebuilt by scanning the body for `N G obj` headers and
//! the load is retried once against the rebuilt bytes.

use std::collections::BTreeMap;

use lopdf::{Document, ObjectId};
use tracing::{debug, info};

const HEADER: &[u8] = b"%PDF-";
const OBJ_KEYWORD: &[u8] = b"obj";

/// Loads `bytes`, falling back to a rebuilt cross-reference table.
///
/// Encrypted sources are never rebuilt; dropping their `Encrypt` entry would
/// only expose ciphertext. The strict error is returned when recovery fails.
pub fn load_lenient(bytes: &[u8]) -> Result<Document, lopdf::Error> {
    match Document::load_mem(bytes) {
        Ok(document) => {
            if document.is_encrypted() || !document.get_pages().is_empty() {
                return Ok(document);
            }
            // A table that parses can still point at the wrong bytes, which
            // leaves the page tree unreachable.
            match recover(bytes) {
                Some(recovered) if !recovered.get_pages().is_empty() => {
                    info!("Recovered page tree from damaged cross-reference table");
                    Ok(recovered)
                }
                _ => Ok(document),
            }
        }
        Err(strict) => match recover(bytes) {
            Some(recovered) => {
                info!(error = %strict, "Recovered document after strict parse failure");
                Ok(recovered)
            }
            None => Err(strict),
        },
    }
}

fn recover(bytes: &[u8]) -> Option<Document> {
    if contains(bytes, b"/Encrypt") {
        return None;
    }
    let rebuilt = rebuild_cross_reference(bytes)?;
    let mut document = match Document::load_mem(&rebuilt) {
        Ok(document) => document,
        Err(e) => {
            debug!(error = %e, "Rebuilt document still failed to parse");
            return None;
        }
    };

    let catalog = document
        .objects
        .iter()
        .filter(|(_, object)| matches!(object.type_name(), Ok(b"Catalog")))
        .map(|(id, _)| *id)
        .last()?;
    document.trailer.set("Root", catalog);
    Some(document)
}

/// Re-terminates the body with a fresh table covering every object header found.
///
/// Offsets are relative to the `%PDF-` header, matching how the reader
/// discards leading junk. Returns `None` when there is no header or no object.
fn rebuild_cross_reference(bytes: &[u8]) -> Option<Vec<u8>> {
    let start = bytes.windows(HEADER.len()).position(|w| w == HEADER)?;
    let body = &bytes[start..];

    let offsets = scan_object_headers(body);
    let size = offsets.keys().next_back()?.0 + 1;

    let mut out = body.to_vec();
    if !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    let xref_start = out.len();

    let by_number: BTreeMap<u32, (u16, usize)> = offsets
        .into_iter()
        .map(|((number, generation), offset)| (number, (generation, offset)))
        .collect();

    out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for number in 1..size {
        let entry = match by_number.get(&number) {
            Some((generation, offset)) => format!("{offset:010} {generation:05} n \n"),
            None => "0000000000 00000 f \n".to_string(),
        };
        out.extend_from_slice(entry.as_bytes());
    }
    out.extend_from_slice(
        format!("trailer\n<< /Size {size} >>\nstartxref\n{xref_start}\n%%EOF\n").as_bytes(),
    );
    Some(out)
}

/// Offsets of every `N G obj` header. A later header for the same object
/// number replaces an earlier one, as an incremental update would.
fn scan_object_headers(body: &[u8]) -> BTreeMap<ObjectId, usize> {
    let mut latest: BTreeMap<u32, (ObjectId, usize)> = BTreeMap::new();
    for keyword in 0..body.len().saturating_sub(OBJ_KEYWORD.len() - 1) {
        if !body[keyword..].starts_with(OBJ_KEYWORD) {
            continue;
        }
        if body
            .get(keyword + OBJ_KEYWORD.len())
            .is_some_and(u8::is_ascii_alphanumeric)
        {
            continue;
        }
        if let Some((id, offset)) = object_header_before(body, keyword) {
            latest.insert(id.0, (id, offset));
        }
    }
    latest.into_values().collect()
}

fn object_header_before(body: &[u8], keyword: usize) -> Option<(ObjectId, usize)> {
    let (rest, _) = split_trailing(&body[..keyword], is_pdf_whitespace)?;
    let (rest, generation) = split_trailing(rest, u8::is_ascii_digit)?;
    let (rest, _) = split_trailing(rest, is_pdf_whitespace)?;
    let (rest, number) = split_trailing(rest, u8::is_ascii_digit)?;
    if rest.last().is_some_and(|b| !is_pdf_whitespace(b)) {
        return None;
    }

    let number: u32 = std::str::from_utf8(number).ok()?.parse().ok()?;
    let generation: u16 = std::str::from_utf8(generation).ok()?.parse().ok()?;
    if number == 0 {
        return None;
    }
    Some(((number, generation), rest.len()))
}

/// Splits off the longest non-empty suffix whose bytes all satisfy `pred`.
fn split_trailing(bytes: &[u8], pred: impl Fn(&u8) -> bool) -> Option<(&[u8], &[u8])> {
    let start = bytes.iter().rposition(|b| !pred(b)).map_or(0, |p| p + 1);
    if start == bytes.len() {
        return None;
    }
    Some(bytes.split_at(start))
}

fn is_pdf_whitespace(b: &u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t' | b'\x0c' | b'\0')
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
