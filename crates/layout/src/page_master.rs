//! Page geometry and the rules that pick a master for each page.
//!
//! Selection is a pure function of the page's position (`PageSlot`), so the page
//! search can ask for any page number in any order and re-ask after it learns
//! which page is the last one.

use crate::LayoutError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMaster {
    pub name: String,
    /// Width of the body region, used as the line measure.
    pub region_width: i32,
    /// Height of the body region, the space the page search fills.
    pub region_height: i32,
}

impl PageMaster {
    pub fn new(name: impl Into<String>, region_width: i32, region_height: i32) -> Self {
        Self {
            name: name.into(),
            region_width,
            region_height,
        }
    }
}

/// Where a page sits in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    /// 0-based index within the page sequence.
    pub index: usize,
    /// Printed page number, which decides odd/even.
    pub number: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_blank: bool,
}

impl PageSlot {
    pub fn new(index: usize, first_number: usize, is_last: bool) -> Self {
        Self {
            index,
            number: first_number + index,
            is_first: index == 0,
            is_last,
            is_blank: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OddOrEven {
    #[default]
    Any,
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PagePosition {
    #[default]
    Any,
    First,
    Last,
    Rest,
    Only,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlankOrNotBlank {
    #[default]
    Any,
    Blank,
    NotBlank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalMaster {
    pub master: String,
    #[serde(default)]
    pub odd_or_even: OddOrEven,
    #[serde(default)]
    pub page_position: PagePosition,
    #[serde(default)]
    pub blank_or_not: BlankOrNotBlank,
}

impl ConditionalMaster {
    pub fn matches(&self, slot: &PageSlot) -> bool {
        let parity = match self.odd_or_even {
            OddOrEven::Any => true,
            OddOrEven::Odd => slot.number % 2 == 1,
            OddOrEven::Even => slot.number % 2 == 0,
        };
        let position = match self.page_position {
            PagePosition::Any => true,
            PagePosition::First => slot.is_first,
            PagePosition::Last => slot.is_last,
            PagePosition::Rest => !slot.is_first && !slot.is_last,
            PagePosition::Only => slot.is_first && slot.is_last,
        };
        let blank = match self.blank_or_not {
            BlankOrNotBlank::Any => true,
            BlankOrNotBlank::Blank => slot.is_blank,
            BlankOrNotBlank::NotBlank => !slot.is_blank,
        };
        parity && position && blank
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SubSequence {
    Single {
        master: String,
    },
    #[serde(rename_all = "camelCase")]
    Repeatable {
        master: String,
        /// `None` repeats without limit.
        #[serde(default)]
        max_repeats: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    Alternatives {
        #[serde(default)]
        max_repeats: Option<usize>,
        conditions: Vec<ConditionalMaster>,
    },
}

impl SubSequence {
    /// Number of pages this sub-sequence covers, `None` for unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            SubSequence::Single { .. } => Some(1),
            SubSequence::Repeatable { max_repeats, .. }
            | SubSequence::Alternatives { max_repeats, .. } => *max_repeats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSequenceMaster {
    pub name: String,
    pub sub_sequences: Vec<SubSequence>,
}

/// Picks the master of a page.
pub trait PageMasterPolicy: Send + Sync + Debug {
    fn select(&self, slot: &PageSlot) -> Result<&PageMaster, LayoutError>;
}

/// A single master used for every page.
impl PageMasterPolicy for PageMaster {
    fn select(&self, _slot: &PageSlot) -> Result<&PageMaster, LayoutError> {
        Ok(self)
    }
}

/// A page sequence master together with the simple masters it refers to.
#[derive(Debug, Clone)]
pub struct SequenceMasterPolicy {
    sequence: PageSequenceMaster,
    masters: HashMap<String, PageMaster>,
}

impl SequenceMasterPolicy {
    /// Fails when a sub-sequence names a master that is not in `masters`.
    pub fn new(
        sequence: PageSequenceMaster,
        masters: impl IntoIterator<Item = PageMaster>,
    ) -> Result<Self, LayoutError> {
        let masters: HashMap<String, PageMaster> =
            masters.into_iter().map(|m| (m.name.clone(), m)).collect();
        let referenced = sequence.sub_sequences.iter().flat_map(|sub| match sub {
            SubSequence::Single { master } | SubSequence::Repeatable { master, .. } => {
                vec![master.as_str()]
            }
            SubSequence::Alternatives { conditions, .. } => {
                conditions.iter().map(|c| c.master.as_str()).collect()
            }
        });
        for name in referenced {
            if !masters.contains_key(name) {
                return Err(LayoutError::UnknownPageMaster(name.to_string()));
            }
        }
        Ok(Self { sequence, masters })
    }

    pub fn sequence(&self) -> &PageSequenceMaster {
        &self.sequence
    }

    fn master(&self, name: &str) -> Result<&PageMaster, LayoutError> {
        self.masters
            .get(name)
            .ok_or_else(|| LayoutError::UnknownPageMaster(name.to_string()))
    }
}

impl PageMasterPolicy for SequenceMasterPolicy {
    fn select(&self, slot: &PageSlot) -> Result<&PageMaster, LayoutError> {
        let mut offset = slot.index;
        for sub in &self.sequence.sub_sequences {
            match sub.capacity() {
                Some(capacity) if offset >= capacity => {
                    offset -= capacity;
                    continue;
                }
                _ => {}
            }
            return match sub {
                SubSequence::Single { master } | SubSequence::Repeatable { master, .. } => {
                    self.master(master)
                }
                SubSequence::Alternatives { conditions, .. } => {
                    let condition = conditions.iter().find(|c| c.matches(slot)).ok_or_else(|| {
                        LayoutError::NoMatchingPageMaster {
                            sequence: self.sequence.name.clone(),
                            page_index: slot.index,
                        }
                    })?;
                    self.master(&condition.master)
                }
            };
        }
        Err(LayoutError::PageMasterExhausted {
            sequence: self.sequence.name.clone(),
            page_index: slot.index,
        })
    }
}
