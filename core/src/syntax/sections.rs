//! Sections open at the current parse position
//!
//! Only exists while a trigger is being built. Jumps ask it how far out they
//! reach and which sections they cross; the answers are baked into the items.

use crate::engine::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionCategory {
    Conditional,
    Loop,
}

/// Which sections a query counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionFilter {
    Any,
    Loop,
    Conditional,
}

impl SectionFilter {
    pub fn matches(self, category: SectionCategory) -> bool {
        match self {
            SectionFilter::Any => true,
            SectionFilter::Loop => category == SectionCategory::Loop,
            SectionFilter::Conditional => category == SectionCategory::Conditional,
        }
    }

    /// Singular or plural noun for diagnostics
    pub fn noun(self, count: usize) -> &'static str {
        match (self, count == 1) {
            (SectionFilter::Any, true) => "section",
            (SectionFilter::Any, false) => "sections",
            (SectionFilter::Loop, true) => "loop",
            (SectionFilter::Loop, false) => "loops",
            (SectionFilter::Conditional, true) => "conditional",
            (SectionFilter::Conditional, false) => "conditionals",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSection {
    pub id: ItemId,
    pub category: SectionCategory,
}

impl OpenSection {
    /// Loops hold iteration state that has to be cleared when a jump leaves them
    pub fn has_exit_handler(&self) -> bool {
        self.category == SectionCategory::Loop
    }
}

/// Stored outermost first; queries answer innermost first
#[derive(Debug, Default)]
pub struct SectionStack {
    open: Vec<OpenSection>,
}

impl SectionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: OpenSection) {
        self.open.push(section);
    }

    pub fn pop(&mut self) -> Option<OpenSection> {
        self.open.pop()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn count(&self, filter: SectionFilter) -> usize {
        self.current(filter).count()
    }

    /// Open sections matching `filter`, innermost first
    pub fn current(&self, filter: SectionFilter) -> impl Iterator<Item = OpenSection> + '_ {
        self.open
            .iter()
            .rev()
            .copied()
            .filter(move |section| filter.matches(section.category))
    }

    /// Every open section from the innermost out to the `levels`-th innermost
    /// section matching `filter`, innermost first. The last entry is that
    /// outermost match. Empty if fewer than `levels` sections match.
    pub fn innermost(&self, levels: usize, filter: SectionFilter) -> Vec<OpenSection> {
        let mut seen = 0;
        let mut crossed = Vec::new();
        for section in self.open.iter().rev() {
            crossed.push(*section);
            if filter.matches(section.category) {
                seen += 1;
                if seen == levels {
                    return crossed;
                }
            }
        }
        Vec::new()
    }

    /// Sections nested inside `outer`, innermost first. Empty if `outer` is not open.
    pub fn until(&self, outer: ItemId) -> Vec<OpenSection> {
        match self.open.iter().position(|section| section.id == outer) {
            Some(index) => self.open[index + 1..].iter().rev().copied().collect(),
            None => Vec::new(),
        }
    }
}
