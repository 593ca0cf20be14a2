//! Static font-metric tables for the two standard PDF faces used in the summary.
//!
//! Widths come from the Adobe Core 14 AFM files and are stored in glyph-space
//! units (1/1000 em). Both faces are written with `WinAnsiEncoding`, so the
//! drawable glyph set is printable ASCII plus a handful of WinAnsi typographic
//! characters. Anything else is reported as unmeasurable (`None`) instead of an
//! error; callers decide whether to skip the word or the line.
//!
//! Index into `widths` = (char as usize) - 32.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

/// The two faces embedded into every generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    /// Body text.
    Regular,
    /// Title and section headings.
    Bold,
}

impl FontFace {
    /// PostScript name written into the font dictionary.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name used in content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Fixed page geometry and type sizes for the summary document.
///
/// All values are in PDF points. Only a single portrait layout is supported;
/// pages allocated during pagination always reuse these dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub title_size: f32,
    pub heading_size: f32,
    pub text_size: f32,
    pub line_height: f32,
}

impl PageConfig {
    /// Usable width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Cursor position at the top of a fresh page.
    pub fn top(&self) -> f32 {
        self.page_height - self.margin
    }
}

/// Returns the default page config: A4 portrait, 50pt margins, 24/16/12pt type.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width: 595.28,
        page_height: 841.89,
        margin: 50.0,
        title_size: 24.0,
        heading_size: 16.0,
        text_size: 12.0,
        line_height: 18.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font face.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub face: FontFace,
    widths: [u16; 95],
    /// Widths for the non-ASCII WinAnsi glyphs, in `WIN_ANSI_EXTRAS` order.
    extra_widths: [u16; 10],
}

/// Non-ASCII characters that `WinAnsiEncoding` can draw, with their byte codes.
const WIN_ANSI_EXTRAS: [(char, u8); 10] = [
    ('\u{2018}', 0x91), // ‘
    ('\u{2019}', 0x92), // ’
    ('\u{201C}', 0x93), // “
    ('\u{201D}', 0x94), // ”
    ('\u{2022}', 0x95), // •
    ('\u{2013}', 0x96), // –
    ('\u{2014}', 0x97), // —
    ('\u{2026}', 0x85), // …
    ('\u{20AC}', 0x80), // €
    ('\u{2122}', 0x99), // ™
];

impl FontMetricTable {
    /// Width of a single glyph in 1/1000 em, or `None` if the face cannot draw it.
    pub fn glyph_width(&self, c: char) -> Option<u16> {
        let code = c as usize;
        if (32..=126).contains(&code) {
            return Some(self.widths[code - 32]);
        }
        WIN_ANSI_EXTRAS
            .iter()
            .position(|(extra, _)| *extra == c)
            .map(|i| self.extra_widths[i])
    }

    /// Measures the rendered width of a string in points at `size`.
    ///
    /// Returns `None` when any character is outside the drawable glyph set.
    pub fn measure_str(&self, s: &str, size: f32) -> Option<f32> {
        let mut units = 0u32;
        for c in s.chars() {
            units += u32::from(self.glyph_width(c)?);
        }
        Some(units as f32 * size / 1000.0)
    }
}

/// Encodes text into `WinAnsiEncoding` bytes for a `Tj` operand.
///
/// Returns `None` if any character has no WinAnsi code point.
pub fn encode_win_ansi(s: &str) -> Option<Vec<u8>> {
    s.chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..=0x7E).contains(&code) {
                Some(code as u8)
            } else {
                WIN_ANSI_EXTRAS
                    .iter()
                    .find(|(extra, _)| *extra == c)
                    .map(|(_, byte)| *byte)
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::Regular,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    // ‘    ’    “    ”    •    –    —    …     €    ™
    extra_widths: [222, 222, 333, 333, 350, 556, 1000, 1000, 556, 1000],
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::Bold,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    extra_widths: [278, 278, 500, 500, 350, 556, 1000, 1000, 556, 1000],
};

/// Returns the static metric table for a given face.
pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Regular => &HELVETICA_TABLE,
        FontFace::Bold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
