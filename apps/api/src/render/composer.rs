//! Titles, sections and pagination over a `GeneratedDocument`.
//!
//! The composer owns the output document and its `RenderContext` for the whole
//! of one generation. Nothing here is shared across generations; each call to
//! `Composer::new` starts from a fresh document with one page.
//!
//! # Page states
//! - no page: only after foreign pages were appended; the next write allocates one.
//! - page active: `cursor_y` is the baseline for the next draw.
//! - page full: cursor below the reserve for the next item; a new page is
//!   allocated before drawing.

use lopdf::Document;
use tracing::{debug, warn};

use crate::layout::font_metrics::{get_metrics, FontFace, FontMetricTable, PageConfig};
use crate::layout::wrap::{sanitize, wrap_text};
use crate::render::document::{DrawOutcome, GeneratedDocument, PageHandle, StagedPages};

/// Vertical gap after the title, on top of the title size.
const TITLE_SPACING: f32 = 20.0;
/// Vertical gap after a heading, on top of the heading size.
const HEADING_SPACING: f32 = 10.0;
/// Gap after the last body line of a section.
const SECTION_TRAILING_GAP: f32 = 20.0;
/// Space that must remain above the bottom margin before a heading is drawn.
const HEADING_RESERVE: f32 = 100.0;
/// Space that must remain above the bottom margin before a body line is drawn.
const LINE_RESERVE: f32 = 20.0;

// ────────────────────────────────────────────────────────────────────────────
// Render context
// ────────────────────────────────────────────────────────────────────────────

/// Mutable cursor, page and font state for one generation.
struct RenderContext {
    page: Option<PageHandle>,
    cursor_y: f32,
    config: PageConfig,
    regular: &'static FontMetricTable,
}

impl RenderContext {
    fn new(config: PageConfig) -> Self {
        Self {
            page: None,
            cursor_y: config.top(),
            config,
            regular: get_metrics(FontFace::Regular),
        }
    }

    /// True when less than `reserve` points remain above the bottom margin.
    fn is_full(&self, reserve: f32) -> bool {
        self.cursor_y < self.config.margin + reserve
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Composition log
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    Heading,
    Line,
    ImportedPage,
}

/// One item placed into the output, in placement order.
///
/// `drawn` is false for blank paragraph lines and for text the font could not
/// encode; both still consume vertical space.
#[derive(Debug, Clone)]
pub struct ComposedBlock {
    pub kind: BlockKind,
    pub text: String,
    pub page: usize,
    pub y: f32,
    pub drawn: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Composer
// ────────────────────────────────────────────────────────────────────────────

pub struct Composer {
    document: GeneratedDocument,
    ctx: RenderContext,
    blocks: Vec<ComposedBlock>,
}

impl Composer {
    /// Creates a document with its first page allocated and the cursor at the top margin.
    pub fn new(config: PageConfig) -> Self {
        let mut composer = Self {
            document: GeneratedDocument::new(config),
            ctx: RenderContext::new(config),
            blocks: Vec::new(),
        };
        composer.new_page();
        composer
    }

    pub fn config(&self) -> &PageConfig {
        &self.ctx.config
    }

    pub fn cursor_y(&self) -> f32 {
        self.ctx.cursor_y
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn blocks(&self) -> &[ComposedBlock] {
        &self.blocks
    }

    /// Draws the title at the cursor. Titles are never paginated.
    pub fn add_title(&mut self, text: &str) {
        if self.ctx.page.is_none() {
            self.new_page();
        }
        let text = sanitize(text);
        let size = self.ctx.config.title_size;
        self.place(BlockKind::Title, text, FontFace::Bold, size);
        self.ctx.cursor_y -= size + TITLE_SPACING;
    }

    /// Draws a heading followed by its word-wrapped body.
    ///
    /// The heading reserve keeps a heading from being stranded at the bottom
    /// of a page without any of its body underneath.
    pub fn add_section(&mut self, heading: &str, body: &str) {
        if self.ctx.page.is_none() || self.ctx.is_full(HEADING_RESERVE) {
            self.new_page();
        }

        let heading = sanitize(heading);
        let heading_size = self.ctx.config.heading_size;
        self.place(BlockKind::Heading, heading, FontFace::Bold, heading_size);
        self.ctx.cursor_y -= heading_size + HEADING_SPACING;

        let lines = wrap_text(&sanitize(body), self.ctx.regular, &self.ctx.config);
        let text_size = self.ctx.config.text_size;
        for line in lines {
            if self.ctx.is_full(LINE_RESERVE) {
                self.new_page();
            }
            self.place(BlockKind::Line, line, FontFace::Regular, text_size);
            self.ctx.cursor_y -= self.ctx.config.line_height;
        }

        self.ctx.cursor_y -= SECTION_TRAILING_GAP;
    }

    /// Stages every page of a parsed foreign document for import.
    pub fn stage_import(&mut self, source: Document) -> Result<StagedPages, lopdf::Error> {
        self.document.stage_import(source)
    }

    /// Appends staged pages after everything composed so far.
    ///
    /// Later text goes onto a new page so it can never land before the imported pages.
    pub fn commit_import(&mut self, staged: StagedPages) {
        let first = self.document.page_count();
        let count = staged.page_count();
        self.document.commit_import(staged);
        self.ctx.page = None;

        self.blocks.extend((first..first + count).map(|page| ComposedBlock {
            kind: BlockKind::ImportedPage,
            text: String::new(),
            page,
            y: 0.0,
            drawn: true,
        }));
    }

    /// Serializes the composed document.
    pub fn finish(self) -> Result<Vec<u8>, lopdf::Error> {
        debug!(
            pages = self.document.page_count(),
            blocks = self.blocks.len(),
            "Serializing composed document"
        );
        self.document.finish()
    }

    fn new_page(&mut self) -> PageHandle {
        let page = self.document.add_page();
        self.ctx.page = Some(page);
        self.ctx.cursor_y = self.ctx.config.top();
        debug!(page = page.index(), "Allocated page");
        page
    }

    /// Draws `text` at the cursor when it has visible content, and records the block.
    fn place(&mut self, kind: BlockKind, text: String, face: FontFace, size: f32) {
        let page = match self.ctx.page {
            Some(page) => page,
            None => self.new_page(),
        };

        let drawn = if text.trim().is_empty() {
            false
        } else {
            let x = self.ctx.config.margin;
            let y = self.ctx.cursor_y;
            match self.document.draw_text(page, &text, face, size, x, y) {
                DrawOutcome::Drawn => true,
                DrawOutcome::Skipped => {
                    warn!(kind = ?kind, text = %text, "Dropped text with unsupported glyphs");
                    false
                }
            }
        };

        self.blocks.push(ComposedBlock {
            kind,
            text,
            page: page.index(),
            y: self.ctx.cursor_y,
            drawn,
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
