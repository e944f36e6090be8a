//! Static jump declarations

use serde::{Deserialize, Serialize};

/// What an item does to the enclosing control flow whenever it is reached.
///
/// Declared at load time, never evaluated per event. Ordered from weakest to
/// strongest: `None < StopSections(1) < StopSections(2) < ... < StopTrigger`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum ExecutionIntent {
    #[default]
    None,
    /// Abandons this many enclosing sections, counted innermost first
    StopSections(usize),
    StopTrigger,
}

impl ExecutionIntent {
    /// `StopSections(levels)`, or `None` for zero levels
    pub fn stop_sections(levels: usize) -> Self {
        if levels == 0 {
            ExecutionIntent::None
        } else {
            ExecutionIntent::StopSections(levels)
        }
    }

    /// Whether code after this item is unreachable
    pub fn stops(self) -> bool {
        self != ExecutionIntent::None
    }

    /// The intent as seen from the enclosing section: one level has been used up
    /// by leaving the section the item sits in.
    pub fn use_level(self) -> Self {
        match self {
            ExecutionIntent::StopSections(levels) => ExecutionIntent::stop_sections(levels - 1),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(ExecutionIntent::None < ExecutionIntent::StopSections(1));
        assert!(ExecutionIntent::StopSections(1) < ExecutionIntent::StopSections(3));
        assert!(ExecutionIntent::StopSections(99) < ExecutionIntent::StopTrigger);
    }

    #[test]
    fn test_use_level() {
        assert_eq!(ExecutionIntent::StopSections(1).use_level(), ExecutionIntent::None);
        assert_eq!(ExecutionIntent::StopSections(3).use_level(), ExecutionIntent::StopSections(2));
        assert_eq!(ExecutionIntent::StopTrigger.use_level(), ExecutionIntent::StopTrigger);
        assert_eq!(ExecutionIntent::None.use_level(), ExecutionIntent::None);
    }

    #[test]
    fn test_zero_levels_is_none() {
        assert_eq!(ExecutionIntent::stop_sections(0), ExecutionIntent::None);
        assert!(!ExecutionIntent::stop_sections(0).stops());
    }
}
