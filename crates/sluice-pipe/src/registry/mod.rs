//! Named stage registry.
//!
//! Fluent pipe calls dispatch through a [`Registry`] instead of methods
//! attached to a type. Each registry is independent: stages, bypasses and
//! loaded add-ins of one registry are invisible to every other.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::rc::Rc;

use sluice_core::{AddIn, MapDef, OverwritePolicy, PipeError, Result, StageDef, Value, WrapTarget};
use tracing::debug;

use crate::bypass::{methods, BypassDef};
use crate::confluence::Confluence;
use crate::map_stage::map_stage;
use crate::pipe::Pipe;
use crate::reservoir::Reservoir;

/// A registered name.
#[derive(Debug, Clone)]
pub enum Entry {
    Stage(Rc<StageDef>),
    /// Opens the bypass.
    BypassOpen(Rc<BypassDef>),
    /// Closes a bypass opened by the definition's opener.
    BypassClose(Rc<BypassDef>),
}

pub struct Registry {
    entries: BTreeMap<String, Entry>,
    catalog: BTreeMap<String, AddIn>,
    loaded: BTreeMap<String, Vec<String>>,
    overwrite: OverwritePolicy,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry holding the standard bypasses.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for def in methods::standard() {
            registry.insert_bypass(Rc::new(def));
        }
        registry
    }

    /// Creates a registry with no names at all.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            catalog: BTreeMap::new(),
            loaded: BTreeMap::new(),
            overwrite: OverwritePolicy::default(),
        }
    }

    /// Makes add-ins available to [`load`](Self::load).
    pub fn with_catalog(mut self, add_ins: impl IntoIterator<Item = AddIn>) -> Self {
        for add_in in add_ins {
            self.provide(add_in);
        }
        self
    }

    /// Makes one add-in available to [`load`](Self::load), replacing any
    /// catalog entry of the same name.
    pub fn provide(&mut self, add_in: AddIn) {
        self.catalog.insert(add_in.name.clone(), add_in);
    }

    pub fn set_overwrite(&mut self, policy: OverwritePolicy) {
        self.overwrite = policy;
    }

    pub fn overwrite(&self) -> OverwritePolicy {
        self.overwrite
    }

    /// Registers a through or terminal stage. Returns the registered name.
    pub fn add_method(&mut self, def: StageDef) -> Result<String> {
        def.spread()?;
        self.check_free(&def.name, def.no_over_write)?;
        let name = def.name.clone();
        debug!(
            event = "add_method",
            name = %name,
            terminal = def.is_terminal(),
            iter_index = def.iter_index,
        );
        self.disown(&name);
        self.entries.insert(name.clone(), Entry::Stage(Rc::new(def)));
        Ok(name)
    }

    /// Registers an element mapping as a through stage. Returns the
    /// registered name.
    pub fn add_map_method(&mut self, def: MapDef) -> Result<String> {
        self.add_method(map_stage(def)?)
    }

    /// Registers a bypass opener and, when it has one, its closer.
    pub fn add_bypass(&mut self, def: BypassDef) -> Result<()> {
        self.check_free(&def.open_name, true)?;
        if let Some(close) = &def.close_name {
            self.check_free(close, true)?;
        }
        self.insert_bypass(Rc::new(def));
        Ok(())
    }

    fn insert_bypass(&mut self, def: Rc<BypassDef>) {
        debug!(event = "add_bypass", open = %def.open_name, close = ?def.close_name);
        self.disown(&def.open_name);
        if let Some(close) = &def.close_name {
            self.disown(close);
            self.entries
                .insert(close.clone(), Entry::BypassClose(def.clone()));
        }
        self.entries
            .insert(def.open_name.clone(), Entry::BypassOpen(def));
    }

    /// Registers an existing stage under `name` with its own spread
    /// directives.
    pub fn alias(
        &mut self,
        name: &str,
        stage: &str,
        star_wrap: Option<WrapTarget>,
        double_star_wrap: Option<WrapTarget>,
    ) -> Result<String> {
        let Some(Entry::Stage(def)) = self.entries.get(stage) else {
            return Err(PipeError::UnknownStage(stage.to_string()));
        };
        let mut def = StageDef::clone(def).named(name);
        def.star_wrap = star_wrap;
        def.double_star_wrap = double_star_wrap;
        def.no_over_write = true;
        self.add_method(def)
    }

    /// Removes a registered name.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_none() {
            return Err(PipeError::UnknownStage(name.to_string()));
        }
        self.disown(name);
        debug!(event = "remove", name = %name);
        Ok(())
    }

    /// Forgets which loaded add-in registered `name`; unloading that
    /// add-in then leaves the name alone.
    fn disown(&mut self, name: &str) {
        for methods in self.loaded.values_mut() {
            methods.retain(|m| m != name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, name: &str) -> Result<&Entry> {
        self.entries
            .get(name)
            .ok_or_else(|| PipeError::UnknownStage(name.to_string()))
    }

    /// The stage registered under `name`, if it is a stage.
    pub fn stage_def(&self, name: &str) -> Option<&StageDef> {
        match self.entries.get(name) {
            Some(Entry::Stage(def)) => Some(def),
            _ => None,
        }
    }

    /// Registers every stage of the named add-ins.
    ///
    /// Either all add-ins load or none do: on failure the registry is left
    /// as it was.
    pub fn load(&mut self, add_ins: &[&str]) -> Result<()> {
        let entries = self.entries.clone();
        let loaded = self.loaded.clone();
        let result = add_ins.iter().try_for_each(|name| self.load_one(name));
        if result.is_err() {
            self.entries = entries;
            self.loaded = loaded;
        }
        result
    }

    fn load_one(&mut self, name: &str) -> Result<()> {
        let add_in = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| PipeError::UnknownAddIn(name.to_string()))?;
        let mut added = Vec::with_capacity(add_in.stages.len() + add_in.maps.len());
        for def in add_in.stages {
            added.push(self.add_method(def)?);
        }
        for def in add_in.maps {
            added.push(self.add_map_method(def)?);
        }
        debug!(event = "load", add_in = %name, methods = added.len());
        self.loaded.entry(name.to_string()).or_default().extend(added);
        Ok(())
    }

    /// Removes every name the given add-ins registered and forgets them.
    ///
    /// Fails without removing anything if one of them is not loaded.
    pub fn unload(&mut self, add_ins: &[&str]) -> Result<()> {
        if let Some(missing) = add_ins.iter().find(|n| !self.loaded.contains_key(**n)) {
            return Err(PipeError::NotLoaded(missing.to_string()));
        }
        for name in add_ins {
            if let Some(methods) = self.loaded.remove(*name) {
                for method in &methods {
                    self.entries.remove(method);
                }
                debug!(event = "unload", add_in = %name, methods = methods.len());
            }
        }
        Ok(())
    }

    /// Names of loaded add-ins.
    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(String::as_str)
    }

    /// An empty, deferred pipe.
    pub fn pipe(&self) -> Pipe<'_> {
        Pipe::with_reservoir(self, Reservoir::new(), false)
    }

    /// A pipe preloaded with `data`. Terminal stages on it compute at once.
    pub fn pipe_with<I>(&self, data: I) -> Pipe<'_>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        Pipe::with_reservoir(self, Reservoir::filled(data), true)
    }

    /// A fan-out pipe fed through stream handles.
    pub fn pipe_multi(&self) -> Pipe<'_> {
        Pipe::with_confluence(self, Confluence::new())
    }

    fn check_free(&self, name: &str, no_over_write: bool) -> Result<()> {
        let protected = no_over_write && self.overwrite == OverwritePolicy::Protect;
        if protected && self.entries.contains_key(name) {
            debug!(event = "name_taken", name = %name);
            return Err(PipeError::NameTaken(name.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.entries.len())
            .field("catalog", &self.catalog.keys().collect::<Vec<_>>())
            .field("loaded", &self.loaded.keys().collect::<Vec<_>>())
            .field("overwrite", &self.overwrite)
            .finish()
    }
}
