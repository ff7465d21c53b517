//! Fonts

use deng_core::ResourceUri;

/// How a font's glyphs are stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontKind {
    /// Single glyph atlas texture
    #[default]
    Bitmap,
    /// One patch per glyph (classic game fonts)
    Composite,
}

/// CPU-side description of a font
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDef {
    pub kind: FontKind,
    /// Line height in pixels
    pub line_height: u16,
    /// Atlas texture or first glyph patch
    pub source: Option<ResourceUri>,
}

impl FontDef {
    pub fn new(kind: FontKind, line_height: u16) -> Self {
        Self {
            kind,
            line_height,
            source: None,
        }
    }

    pub fn with_source(mut self, source: ResourceUri) -> Self {
        self.source = Some(source);
        self
    }
}

/// A font resource
#[derive(Debug)]
pub struct Font {
    def: FontDef,
}

impl Font {
    pub fn new(def: FontDef) -> Self {
        Self { def }
    }

    pub fn def(&self) -> &FontDef {
        &self.def
    }

    pub fn line_height(&self) -> u16 {
        self.def.line_height
    }
}
