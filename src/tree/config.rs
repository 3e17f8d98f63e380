//! Per-store behavior switches.

/// Which way an explicit-stack depth-first walk visits siblings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackOrder {
    /// Children are pushed in insertion order, so the last child is visited first.
    #[default]
    RightToLeft,
    /// Children are pushed in reverse, so the walk coincides with pre-order.
    LeftToRight,
}

/// What an ordered insert does with a value that is already stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicatePolicy {
    /// Fail with [`TreeError::DuplicateKey`](super::TreeError::DuplicateKey).
    #[default]
    Reject,
    /// Leave the tree untouched and hand back the node already holding the value.
    Ignore,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    pub stack_order: StackOrder,
    pub duplicates: DuplicatePolicy,
}

impl TreeConfig {
    pub fn with_stack_order(mut self, stack_order: StackOrder) -> Self {
        self.stack_order = stack_order;
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }
}
