//! Shared string table

use ahash::AHashMap;

use crate::rich_text::RichText;

/// Workbook-wide deduplicating string registry.
///
/// Identical content with identical run formatting always maps to the same
/// stable index; entries keep insertion order. The entry count is the
/// authority for round-trip equality checks.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    entries: Vec<RichText>,
    index: AHashMap<RichText, u32>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `value`, appending a new entry only when no identical
    /// entry (content and formatting) exists yet.
    pub fn get_or_create(&mut self, value: RichText) -> u32 {
        if let Some(&idx) = self.index.get(&value) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        self.index.insert(value.clone(), idx);
        self.entries.push(value);
        idx
    }

    /// Existing index for `value`, if interned.
    pub fn lookup(&self, value: &RichText) -> Option<u32> {
        self.index.get(value).copied()
    }

    /// Entry at `idx`.
    pub fn get(&self, idx: u32) -> Option<&RichText> {
        self.entries.get(idx as usize)
    }

    /// Number of distinct entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &RichText> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Font;

    #[test]
    fn identical_insertions_do_not_grow_the_table() {
        let mut sst = SharedStringTable::new();
        let a = sst.get_or_create(RichText::plain("alpha"));
        let b = sst.get_or_create(RichText::plain("beta"));
        assert_eq!((a, b), (0, 1));
        assert_eq!(sst.count(), 2);

        assert_eq!(sst.get_or_create(RichText::plain("alpha")), 0);
        assert_eq!(sst.get_or_create(RichText::plain("beta")), 1);
        assert_eq!(sst.count(), 2);
    }

    #[test]
    fn run_formatting_distinguishes_entries() {
        let mut sst = SharedStringTable::new();
        let plain = sst.get_or_create(RichText::plain("text"));

        let mut bold = Font::default();
        bold.set_bold(true);
        let mut formatted = RichText::plain("text");
        formatted.apply_font(0, 4, bold);
        let rich = sst.get_or_create(formatted.clone());

        assert_ne!(plain, rich);
        assert_eq!(sst.count(), 2);
        // Re-inserting the formatted value is still a no-op
        assert_eq!(sst.get_or_create(formatted), rich);
        assert_eq!(sst.count(), 2);
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut sst = SharedStringTable::new();
        for s in ["z", "a", "m"] {
            sst.get_or_create(RichText::plain(s));
        }
        let texts: Vec<String> = sst.iter().map(|r| r.text()).collect();
        assert_eq!(texts, ["z", "a", "m"]);
    }
}
