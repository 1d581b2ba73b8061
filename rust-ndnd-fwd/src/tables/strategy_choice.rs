//! The StrategyChoice table and the strategy registry.
//!
//! A strategy is installed globally under its program name before any
//! namespace can choose it. Longest-prefix match assigns a strategy to
//! every name; the root entry always exists (the forwarder installs the
//! default there at startup).

use crate::strategy::Strategy;
use crate::tables::name_tree::{NameTree, TableRef};
use log::debug;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Index of an installed strategy in the registry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategyId(pub(crate) usize);

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strategy{}", self.0)
    }
}

/// Owns every installed strategy instance.
#[derive(Default)]
pub struct StrategyRegistry {
    slots: Vec<Option<Box<dyn Strategy>>>,
    by_name: HashMap<Name, StrategyId>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy under its program name. Installing the same
    /// name twice returns the existing id.
    pub fn install(&mut self, strategy: Box<dyn Strategy>) -> StrategyId {
        let name = strategy.name().clone();
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = StrategyId(self.slots.len());
        debug!("installed strategy {} as {}", name, id);
        self.slots.push(Some(strategy));
        self.by_name.insert(name, id);
        id
    }

    /// Removes an installed strategy. Fails while any choice entry still
    /// points at it.
    pub fn uninstall(&mut self, name: &Name, choices: &StrategyChoice) -> Result<()> {
        let id = self
            .id_of(name)
            .ok_or_else(|| Error::UnknownStrategy(name.to_string()))?;
        if choices.references(id) {
            return Err(Error::Other(format!(
                "strategy {} is still chosen by a namespace",
                name
            )));
        }
        self.slots[id.0] = None;
        self.by_name.remove(name);
        Ok(())
    }

    pub fn id_of(&self, name: &Name) -> Option<StrategyId> {
        self.by_name.get(name).copied()
    }

    pub fn get_mut(&mut self, id: StrategyId) -> Option<&mut dyn Strategy> {
        match self.slots.get_mut(id.0) {
            Some(Some(strategy)) => Some(strategy.as_mut()),
            _ => None,
        }
    }

    pub fn name_of(&self, id: StrategyId) -> Option<&Name> {
        match self.slots.get(id.0) {
            Some(Some(strategy)) => Some(strategy.name()),
            _ => None,
        }
    }
}

/// Maps name prefixes to the strategy governing the subtree.
#[derive(Debug, Default)]
pub struct StrategyChoice {
    choices: HashMap<Name, StrategyId>,
}

impl StrategyChoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy for the subtree rooted at `prefix`. Fails when
    /// `strategy_name` is not installed; the tables stay unchanged then.
    pub fn insert(
        &mut self,
        name_tree: &mut NameTree,
        registry: &StrategyRegistry,
        prefix: &Name,
        strategy_name: &Name,
    ) -> Result<StrategyId> {
        let id = registry
            .id_of(strategy_name)
            .ok_or_else(|| Error::UnknownStrategy(strategy_name.to_string()))?;
        if !self.choices.contains_key(prefix) {
            name_tree.register(prefix, TableRef::StrategyChoice);
        }
        debug!("strategy choice {} -> {}", prefix, strategy_name);
        self.choices.insert(prefix.clone(), id);
        Ok(id)
    }

    /// Sets a choice directly by id; used for the forwarder's root default
    /// where the registry lookup has just happened.
    pub(crate) fn insert_id(&mut self, name_tree: &mut NameTree, prefix: &Name, id: StrategyId) {
        if !self.choices.contains_key(prefix) {
            name_tree.register(prefix, TableRef::StrategyChoice);
        }
        self.choices.insert(prefix.clone(), id);
    }

    /// Removes the choice at `prefix`. The root choice cannot be removed:
    /// every name must have a governing strategy.
    pub fn erase(&mut self, name_tree: &mut NameTree, prefix: &Name) -> Result<()> {
        if prefix.is_empty() {
            return Err(Error::Other(
                "the root strategy choice cannot be removed".into(),
            ));
        }
        if self.choices.remove(prefix).is_some() {
            name_tree.unregister(prefix, TableRef::StrategyChoice);
        }
        Ok(())
    }

    /// Longest-prefix lookup of the strategy governing `name`.
    pub fn find_effective_strategy(
        &self,
        name_tree: &NameTree,
        name: &Name,
    ) -> Option<StrategyId> {
        for prefix in name_tree.ancestors_of(name) {
            if let Some(id) = self.choices.get(&prefix) {
                return Some(*id);
            }
        }
        // The name itself may have no NameTree node yet; the root choice
        // still governs it.
        self.choices.get(&Name::root()).copied()
    }

    pub fn references(&self, id: StrategyId) -> bool {
        self.choices.values().any(|choice| *choice == id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Name, StrategyId)> {
        self.choices.iter().map(|(name, id)| (name, *id))
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}
