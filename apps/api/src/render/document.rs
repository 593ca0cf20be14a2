//! The generated summary document: an ordered page set backed by `lopdf`.
//!
//! Native pages accumulate text operations in memory and are only turned into
//! content streams by `finish`. Pages imported from a foreign document are
//! staged first (`stage_import`) and appended in one step (`commit_import`),
//! so a failed import never leaves half of a document behind.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use lopdf::Stream;

use crate::layout::font_metrics::{encode_win_ansi, FontFace, PageConfig};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page-tree depth when resolving inherited attributes.
/// Guards against `Parent` cycles in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Object types that belong to the foreign document's structure, not its content.
const STRUCTURAL_TYPES: [&[u8]; 5] = [b"Catalog", b"Pages", b"Page", b"Outlines", b"Outline"];

/// Index of a native page in the output page sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle(usize);

impl PageHandle {
    /// Zero-based position of the page in the output document.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Result of a single best-effort draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    /// The text contained glyphs the face cannot encode; nothing was drawn.
    Skipped,
}

enum PageSlot {
    Native {
        id: ObjectId,
        operations: Vec<Operation>,
    },
    Imported(ObjectId),
}

/// Foreign pages resolved and renumbered, ready to be appended.
pub struct StagedPages {
    objects: BTreeMap<ObjectId, Object>,
    page_ids: Vec<ObjectId>,
}

impl StagedPages {
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }
}

pub struct GeneratedDocument {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    config: PageConfig,
    pages: Vec<PageSlot>,
}

impl GeneratedDocument {
    /// Creates an empty document with both font faces registered.
    pub fn new(config: PageConfig) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary(FontFace::Regular));
        let bold_id = doc.add_object(font_dictionary(FontFace::Bold));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FontFace::Regular.resource_name() => regular_id,
                FontFace::Bold.resource_name() => bold_id,
            },
        });

        Self {
            doc,
            pages_id,
            resources_id,
            config,
            pages: Vec::new(),
        }
    }

    /// Appends a blank page with the fixed page dimensions.
    pub fn add_page(&mut self) -> PageHandle {
        let id = self.doc.new_object_id();
        self.pages.push(PageSlot::Native {
            id,
            operations: Vec::new(),
        });
        PageHandle(self.pages.len() - 1)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Draws a single line of text with its baseline at (`x`, `y`).
    pub fn draw_text(
        &mut self,
        page: PageHandle,
        text: &str,
        face: FontFace,
        size: f32,
        x: f32,
        y: f32,
    ) -> DrawOutcome {
        let Some(encoded) = encode_win_ansi(text) else {
            return DrawOutcome::Skipped;
        };
        let Some(PageSlot::Native { operations, .. }) = self.pages.get_mut(page.0) else {
            return DrawOutcome::Skipped;
        };

        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![face.resource_name().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
        DrawOutcome::Drawn
    }

    /// Resolves every page of `source` into a self-contained set of objects
    /// numbered above this document's current objects.
    ///
    /// On success the staged id range is reserved, so pages added before
    /// `commit_import` cannot collide with it. No page is added here.
    pub fn stage_import(&mut self, mut source: Document) -> Result<StagedPages, lopdf::Error> {
        source.renumber_objects_with(self.doc.max_id + 1);
        let source_max_id = source.max_id;

        let mut page_ids = Vec::new();
        let mut flattened = Vec::new();
        for page_id in source.get_pages().into_values() {
            let page = flatten_page(&source, page_id, &self.config)?;
            page_ids.push(page_id);
            flattened.push((page_id, page));
        }

        let mut objects: BTreeMap<ObjectId, Object> = source
            .objects
            .into_iter()
            .filter(|(_, object)| {
                let type_name = object.type_name().unwrap_or(b"");
                !STRUCTURAL_TYPES.contains(&type_name)
            })
            .collect();
        for (page_id, page) in flattened {
            objects.insert(page_id, Object::Dictionary(page));
        }

        self.doc.max_id = self.doc.max_id.max(source_max_id);
        Ok(StagedPages { objects, page_ids })
    }

    /// Appends staged foreign pages after every page already in the document.
    pub fn commit_import(&mut self, staged: StagedPages) {
        self.doc.objects.extend(staged.objects);
        self.pages
            .extend(staged.page_ids.into_iter().map(PageSlot::Imported));
    }

    /// Builds the page tree and serializes the document.
    pub fn finish(mut self) -> Result<Vec<u8>, lopdf::Error> {
        let media_box = vec![
            0.0_f32.into(),
            0.0_f32.into(),
            self.config.page_width.into(),
            self.config.page_height.into(),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for slot in std::mem::take(&mut self.pages) {
            match slot {
                PageSlot::Native { id, operations } => {
                    let content = Content { operations }.encode()?;
                    let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
                    let page = dictionary! {
                        "Type" => "Page",
                        "Parent" => self.pages_id,
                        "MediaBox" => media_box.clone(),
                        "Resources" => self.resources_id,
                        "Contents" => content_id,
                    };
                    self.doc.objects.insert(id, Object::Dictionary(page));
                    kids.push(Object::Reference(id));
                }
                PageSlot::Imported(id) => {
                    self.doc
                        .get_object_mut(id)?
                        .as_dict_mut()?
                        .set("Parent", self.pages_id);
                    kids.push(Object::Reference(id));
                }
            }
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal("Application Summary"),
            "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn font_dictionary(face: FontFace) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Copies a page dictionary with its inherited attributes made explicit.
fn flatten_page(
    source: &Document,
    page_id: ObjectId,
    config: &PageConfig,
) -> Result<Dictionary, lopdf::Error> {
    let mut page = source.get_dictionary(page_id)?.clone();

    for key in INHERITABLE_KEYS {
        if !page.has(key) {
            if let Some(value) = inherited_attribute(source, &page, key) {
                page.set(key, value);
            }
        }
    }
    if !page.has(b"MediaBox") {
        page.set(
            "MediaBox",
            vec![
                0.0_f32.into(),
                0.0_f32.into(),
                config.page_width.into(),
                config.page_height.into(),
            ],
        );
    }
    page.remove(b"Parent");
    check_page_references(source, &page)?;

    Ok(page)
}

/// Fails when the page's content streams or resources point at objects the
/// source does not hold.
fn check_page_references(source: &Document, page: &Dictionary) -> Result<(), lopdf::Error> {
    if let Ok(contents) = page.get(b"Contents") {
        match resolve(source, contents)? {
            Object::Array(parts) => {
                for part in parts {
                    resolve(source, part)?.as_stream()?;
                }
            }
            single => {
                single.as_stream()?;
            }
        }
    }
    if let Ok(resources) = page.get(b"Resources") {
        resolve(source, resources)?.as_dict()?;
    }
    Ok(())
}

fn resolve<'a>(source: &'a Document, object: &'a Object) -> Result<&'a Object, lopdf::Error> {
    match object {
        Object::Reference(id) => source.get_object(*id),
        direct => Ok(direct),
    }
}

fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = source.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
