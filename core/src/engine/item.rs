//! The execution graph
//!
//! Items live in an arena owned by their trigger and refer to each other by
//! [`ItemId`]. `next` is the structural successor; a section's body ends by
//! linking its last item back to the section (loops) or past the conditional
//! chain.

use super::delay::{Await, Delay};
use super::intent::ExecutionIntent;
use super::jumps::{Continue, Exit, Return};
use super::section::{Section, SectionKind};
use crate::elements::{Condition, Effect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an item in its trigger's graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub(crate) usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One executable node
#[derive(Debug)]
pub struct TriggerItem {
    pub(crate) parent: Option<ItemId>,
    pub(crate) next: Option<ItemId>,
    pub(crate) depth: usize,
    pub(crate) kind: ItemKind,
}

/// Exactly one category per item
#[derive(Debug)]
pub enum ItemKind {
    Effect(EffectItem),
    Condition(Box<dyn Condition>),
    Section(Section),
}

/// Effects, including the ones the engine itself interprets
#[derive(Debug)]
pub enum EffectItem {
    Host(Box<dyn Effect>),
    /// Runs `effect` only when `guard` holds
    Guarded { guard: Box<dyn Condition>, effect: ItemId },
    Delay(Delay),
    Await(Await),
    Continue(Continue),
    Exit(Exit),
    Return(Return),
}

impl TriggerItem {
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn next(&self) -> Option<ItemId> {
        self.next
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Section nesting depth, used to indent traces
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn execution_intent(&self) -> ExecutionIntent {
        match &self.kind {
            ItemKind::Effect(EffectItem::Host(effect)) => effect.execution_intent(),
            ItemKind::Effect(EffectItem::Continue(jump)) => jump.intent,
            ItemKind::Effect(EffectItem::Exit(jump)) => jump.intent,
            ItemKind::Effect(EffectItem::Return(_)) => ExecutionIntent::StopTrigger,
            ItemKind::Effect(_) | ItemKind::Condition(_) => ExecutionIntent::None,
            ItemKind::Section(section) => section.intent,
        }
    }
}

impl fmt::Display for TriggerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ItemKind::Effect(EffectItem::Host(effect)) => write!(f, "{effect:?}"),
            ItemKind::Effect(EffectItem::Guarded { guard, effect }) => write!(f, "if {guard:?}: {effect}"),
            ItemKind::Effect(EffectItem::Delay(delay)) => write!(f, "wait {:?}", delay.duration),
            ItemKind::Effect(EffectItem::Await(wait)) => write!(f, "await {:?}", wait.operation),
            ItemKind::Effect(EffectItem::Continue(jump)) => write!(f, "continue {}", jump.target),
            ItemKind::Effect(EffectItem::Exit(jump)) => match jump.target {
                Some(section) => write!(f, "exit {section}"),
                None => f.write_str("stop"),
            },
            ItemKind::Effect(EffectItem::Return(ret)) => write!(f, "return {:?}", ret.value),
            ItemKind::Condition(condition) => write!(f, "{condition:?}"),
            ItemKind::Section(section) => write!(f, "{section}"),
        }
    }
}

/// Arena of items for one trigger
#[derive(Debug, Default)]
pub struct ItemGraph {
    items: Vec<TriggerItem>,
}

impl ItemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Id the next pushed item will receive
    pub(crate) fn next_id(&self) -> ItemId {
        ItemId(self.items.len())
    }

    pub(crate) fn push(&mut self, kind: ItemKind, parent: Option<ItemId>, depth: usize) -> ItemId {
        let id = self.next_id();
        self.items.push(TriggerItem { parent, next: None, depth, kind });
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&TriggerItem> {
        self.items.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut TriggerItem> {
        self.items.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> {
        (0..self.items.len()).map(ItemId)
    }

    pub fn next(&self, id: ItemId) -> Option<ItemId> {
        self.get(id).and_then(|item| item.next)
    }

    pub fn set_next(&mut self, id: ItemId, next: Option<ItemId>) {
        if let Some(item) = self.get_mut(id) {
            item.next = next;
        }
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.get(id).and_then(|item| item.parent)
    }

    pub fn set_parent(&mut self, id: ItemId, parent: Option<ItemId>) {
        if let Some(item) = self.get_mut(id) {
            item.parent = parent;
        }
    }

    pub fn section(&self, id: ItemId) -> Option<&Section> {
        match self.get(id).map(|item| &item.kind) {
            Some(ItemKind::Section(section)) => Some(section),
            _ => None,
        }
    }

    pub(crate) fn section_mut(&mut self, id: ItemId) -> Option<&mut Section> {
        match self.get_mut(id).map(|item| &mut item.kind) {
            Some(ItemKind::Section(section)) => Some(section),
            _ => None,
        }
    }

    /// Where control goes when the body of `parent` runs out or a condition in
    /// it fails. The end of the trigger at top level.
    pub fn continuation_of(&self, parent: Option<ItemId>) -> Option<ItemId> {
        let id = parent?;
        self.section(id).and_then(|section| section.after_body(id))
    }

    /// Where control goes when section `id` is exited by a jump
    pub fn exit_target(&self, id: ItemId) -> Option<ItemId> {
        let item = self.get(id)?;
        match &item.kind {
            ItemKind::Section(section) => match &section.kind {
                SectionKind::Conditional(conditional) => conditional.skip_to,
                SectionKind::Loop(_) | SectionKind::While(_) => item.next,
            },
            _ => item.next,
        }
    }
}
