//! Workbook style registry
//!
//! Fonts, fills, borders, and cell xfs live in deduplicated pools owned by
//! the workbook; cells carry an index into the xf pool. The registries are
//! never process-wide: every workbook owns its own, so documents can be
//! copied between workbooks without sharing mutable state.

use ahash::AHashMap;

use super::{Alignment, Border, Fill, Font, NumberFormats};

/// One entry of the cell-xf pool: the (font, fill, border, number format,
/// alignment) tuple a cell style index resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellXf {
    pub font: u32,
    pub fill: u32,
    pub border: u32,
    pub number_format: u16,
    pub alignment: Option<Alignment>,
}

/// Deduplicated style pools for one workbook.
#[derive(Debug)]
pub struct StyleRegistry {
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    xfs: Vec<CellXf>,
    number_formats: NumberFormats,
    font_index: AHashMap<Font, u32>,
    fill_index: AHashMap<Fill, u32>,
    border_index: AHashMap<Border, u32>,
    xf_index: AHashMap<CellXf, u32>,
}

impl StyleRegistry {
    /// Registry seeded with the mandatory defaults: font 0, the none/gray125
    /// fill pair, border 0, and xf 0.
    pub fn new() -> Self {
        let mut reg = Self {
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            xfs: Vec::new(),
            number_formats: NumberFormats::new(),
            font_index: AHashMap::new(),
            fill_index: AHashMap::new(),
            border_index: AHashMap::new(),
            xf_index: AHashMap::new(),
        };
        reg.add_font(Font::default());
        reg.add_fill(Fill::NONE);
        reg.add_fill(Fill::GRAY_125);
        reg.add_border(Border::default());
        reg.add_xf(CellXf::default());
        reg
    }

    /// Get-or-insert a font, returning its index.
    pub fn add_font(&mut self, font: Font) -> u32 {
        if let Some(&idx) = self.font_index.get(&font) {
            return idx;
        }
        let idx = self.fonts.len() as u32;
        self.font_index.insert(font.clone(), idx);
        self.fonts.push(font);
        idx
    }

    /// Get-or-insert a fill, returning its index.
    pub fn add_fill(&mut self, fill: Fill) -> u32 {
        if let Some(&idx) = self.fill_index.get(&fill) {
            return idx;
        }
        let idx = self.fills.len() as u32;
        self.fill_index.insert(fill, idx);
        self.fills.push(fill);
        idx
    }

    /// Get-or-insert a border, returning its index.
    pub fn add_border(&mut self, border: Border) -> u32 {
        if let Some(&idx) = self.border_index.get(&border) {
            return idx;
        }
        let idx = self.borders.len() as u32;
        self.border_index.insert(border, idx);
        self.borders.push(border);
        idx
    }

    /// Get-or-insert a cell xf, returning the style index cells store.
    pub fn add_xf(&mut self, xf: CellXf) -> u32 {
        if let Some(&idx) = self.xf_index.get(&xf) {
            return idx;
        }
        let idx = self.xfs.len() as u32;
        self.xf_index.insert(xf.clone(), idx);
        self.xfs.push(xf);
        idx
    }

    pub fn font(&self, idx: u32) -> Option<&Font> {
        self.fonts.get(idx as usize)
    }

    /// In-place font mutation. The dedup index entry for the old definition
    /// is dropped so later identical inserts do not alias the mutated slot.
    pub fn font_mut(&mut self, idx: u32) -> Option<&mut Font> {
        let font = self.fonts.get_mut(idx as usize)?;
        self.font_index.remove(font);
        Some(font)
    }

    pub fn fill(&self, idx: u32) -> Option<&Fill> {
        self.fills.get(idx as usize)
    }

    pub fn border(&self, idx: u32) -> Option<&Border> {
        self.borders.get(idx as usize)
    }

    pub fn xf(&self, idx: u32) -> Option<&CellXf> {
        self.xfs.get(idx as usize)
    }

    pub fn number_formats(&self) -> &NumberFormats {
        &self.number_formats
    }

    pub fn number_formats_mut(&mut self) -> &mut NumberFormats {
        &mut self.number_formats
    }

    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn borders(&self) -> &[Border] {
        &self.borders
    }

    pub fn xfs(&self) -> &[CellXf] {
        &self.xfs
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn seeded_defaults() {
        let reg = StyleRegistry::new();
        assert_eq!(reg.fonts().len(), 1);
        assert_eq!(reg.fills().len(), 2);
        assert_eq!(reg.fills()[1], Fill::GRAY_125);
        assert_eq!(reg.borders().len(), 1);
        assert_eq!(reg.xfs().len(), 1);
    }

    #[test]
    fn xf_deduplication() {
        let mut reg = StyleRegistry::new();
        let mut bold = Font::default();
        bold.set_bold(true);
        let font = reg.add_font(bold.clone());

        let a = reg.add_xf(CellXf {
            font,
            ..Default::default()
        });
        let b = reg.add_xf(CellXf {
            font,
            ..Default::default()
        });
        assert_eq!(a, b);
        assert_eq!(reg.xfs().len(), 2);

        // A distinct tuple gets a distinct index
        let fill = reg.add_fill(Fill::solid(Color::rgb(255, 255, 0)));
        let c = reg.add_xf(CellXf {
            font,
            fill,
            ..Default::default()
        });
        assert_ne!(a, c);
    }

    #[test]
    fn font_mut_invalidates_dedup_entry() {
        let mut reg = StyleRegistry::new();
        let mut italic = Font::default();
        italic.set_italic(true);
        let idx = reg.add_font(italic.clone());

        reg.font_mut(idx).unwrap().set_bold(true);

        // Re-adding the original italic font must not alias the mutated slot.
        let again = reg.add_font(italic);
        assert_ne!(idx, again);
    }
}
