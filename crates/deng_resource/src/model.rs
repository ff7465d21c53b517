//! Model definitions
//!
//! Only the registry lives here: which sub-models replace which mobj state.
//! Loading and drawing models is the renderer's job.

use crate::error::{ResourceError, ResourceResult};

/// One sub-model of a definition
#[derive(Clone, Debug, PartialEq)]
pub struct SubModelDef {
    /// Model file path
    pub model: String,
    /// Skin texture path, if not taken from the model file
    pub skin: Option<String>,
    pub frame: u32,
}

/// Model definition for one mobj state
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDef {
    /// Definition id (free text, may be empty)
    pub id: String,
    /// Mobj state name
    pub state: String,
    pub sub_models: Vec<SubModelDef>,
    /// Distance scale applied on top of `rend-model-distance`
    pub resize: f32,
}

impl ModelDef {
    pub fn new(id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
            sub_models: Vec::new(),
            resize: 1.0,
        }
    }

    pub fn with_sub_model(mut self, model: impl Into<String>, skin: Option<&str>, frame: u32) -> Self {
        self.sub_models.push(SubModelDef {
            model: model.into(),
            skin: skin.map(str::to_string),
            frame,
        });
        self
    }
}

/// Registry of model definitions
#[derive(Debug, Default)]
pub struct ModelDefs {
    defs: Vec<ModelDef>,
}

impl ModelDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. A definition for a state that already has one
    /// replaces it. Returns the definition's index.
    pub fn add(&mut self, def: ModelDef) -> usize {
        if let Some(index) = self.position_for_state(&def.state) {
            self.defs[index] = def;
            return index;
        }
        self.defs.push(def);
        self.defs.len() - 1
    }

    /// Definition by index
    pub fn get(&self, index: usize) -> ResourceResult<&ModelDef> {
        self.defs
            .get(index)
            .ok_or_else(|| ResourceError::MissingModelDef(format!("#{}", index)))
    }

    /// Definition by id (case-insensitive)
    pub fn by_id(&self, id: &str) -> ResourceResult<&ModelDef> {
        self.defs
            .iter()
            .find(|def| !def.id.is_empty() && def.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| ResourceError::MissingModelDef(id.to_string()))
    }

    /// Definition for a mobj state (case-insensitive)
    pub fn for_state(&self, state: &str) -> ResourceResult<&ModelDef> {
        self.position_for_state(state)
            .map(|index| &self.defs[index])
            .ok_or_else(|| ResourceError::MissingModelDef(state.to_string()))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDef> {
        self.defs.iter()
    }

    pub fn clear(&mut self) {
        self.defs.clear();
    }

    fn position_for_state(&self, state: &str) -> Option<usize> {
        self.defs.iter().position(|def| def.state.eq_ignore_ascii_case(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut defs = ModelDefs::new();
        defs.add(ModelDef::new("imp", "S_TROO_STND").with_sub_model("Models/imp.md2", None, 0));
        defs.add(ModelDef::new("", "S_PLAY"));

        assert_eq!(defs.for_state("s_troo_stnd").unwrap().id, "imp");
        assert_eq!(defs.by_id("IMP").unwrap().state, "S_TROO_STND");
        assert_eq!(defs.get(1).unwrap().state, "S_PLAY");
    }

    #[test]
    fn test_missing() {
        let defs = ModelDefs::new();
        assert!(matches!(defs.get(3), Err(ResourceError::MissingModelDef(ref s)) if s == "#3"));
        assert!(matches!(defs.for_state("S_NONE"), Err(ResourceError::MissingModelDef(_))));
        assert!(defs.by_id("").is_err());
    }

    #[test]
    fn test_same_state_replaces() {
        let mut defs = ModelDefs::new();
        let a = defs.add(ModelDef::new("a", "S_POSS_RUN1"));
        let b = defs.add(ModelDef::new("b", "S_POSS_RUN1"));
        assert_eq!(a, b);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.for_state("S_POSS_RUN1").unwrap().id, "b");
    }
}
