//! Content tables: heroes, spells and effect templates
//!
//! Content is static JSON. A content file holds any mix of the three tables;
//! a content directory is every `.json` file beneath it, merged in path order
//! so later files override earlier ones.

use crate::core::{Effect, EffectName, Hero, HeroId, SpellId, SpellSpec};
use crate::{ClashError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lookup seam the round engine consumes
///
/// Content is treated as already validated; a missing id is a content error
/// that the engine degrades to a no-op.
pub trait ContentSource {
    fn spell(&self, id: &SpellId) -> Option<&SpellSpec>;
    fn effect(&self, name: &EffectName) -> Option<&Effect>;
    fn hero(&self, id: &HeroId) -> Option<&Hero>;
}

/// On-disk content layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFile {
    pub heroes: Vec<Hero>,
    pub spells: Vec<SpellSpec>,
    pub effects: Vec<Effect>,
}

/// Normalize an id for lookup: ASCII-fold, lowercase, spaces to underscores
fn content_key(id: &str) -> String {
    deunicode::deunicode(id.trim())
        .to_lowercase()
        .replace([' ', '-'], "_")
}

#[derive(Debug, Clone, Default)]
pub struct ContentDatabase {
    heroes: FxHashMap<String, Hero>,
    spells: FxHashMap<String, SpellSpec>,
    effects: FxHashMap<String, Effect>,
}

impl ContentDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: ContentFile) -> Self {
        let mut db = ContentDatabase::new();
        db.merge(file);
        db
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ContentFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| ClashError::InvalidContent(format!("{}: {e}", path.display())))
    }

    /// Load every `.json` file under a directory tree
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ClashError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Content folder not found: {dir:?}"),
            )));
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in jwalk::WalkDir::new(dir).skip_hidden(true) {
            let entry = entry.map_err(|e| {
                ClashError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|s| s.to_str()) == Some("json")
            {
                paths.push(path);
            }
        }
        // jwalk yields in parallel; merge order must not depend on it
        paths.sort();

        let mut db = ContentDatabase::new();
        for path in paths {
            let json = std::fs::read_to_string(&path)?;
            let file: ContentFile = serde_json::from_str(&json).map_err(|e| {
                ClashError::InvalidContent(format!("{}: {e}", path.display()))
            })?;
            db.merge(file);
        }
        Ok(db)
    }

    /// Directory load on the blocking pool
    pub async fn load_from_dir_async(dir: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::load_from_dir(&dir)).await?
    }

    pub fn merge(&mut self, file: ContentFile) {
        for hero in file.heroes {
            self.add_hero(hero);
        }
        for spell in file.spells {
            self.add_spell(spell);
        }
        for effect in file.effects {
            self.add_effect(effect);
        }
    }

    pub fn add_hero(&mut self, hero: Hero) {
        self.heroes.insert(content_key(hero.id.as_str()), hero);
    }

    pub fn add_spell(&mut self, spell: SpellSpec) {
        self.spells.insert(content_key(spell.id.as_str()), spell);
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.insert(content_key(effect.name.as_str()), effect);
    }

    pub fn hero_count(&self) -> usize {
        self.heroes.len()
    }

    pub fn spell_count(&self) -> usize {
        self.spells.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Export back into the file layout, sorted by id
    pub fn to_file(&self) -> ContentFile {
        let mut file = ContentFile {
            heroes: self.heroes.values().cloned().collect(),
            spells: self.spells.values().cloned().collect(),
            effects: self.effects.values().cloned().collect(),
        };
        file.heroes.sort_by(|a, b| a.id.cmp(&b.id));
        file.spells.sort_by(|a, b| a.id.cmp(&b.id));
        file.effects.sort_by(|a, b| a.name.cmp(&b.name));
        file
    }
}

impl ContentSource for ContentDatabase {
    fn spell(&self, id: &SpellId) -> Option<&SpellSpec> {
        self.spells.get(&content_key(id.as_str()))
    }

    fn effect(&self, name: &EffectName) -> Option<&Effect> {
        self.effects.get(&content_key(name.as_str()))
    }

    fn hero(&self, id: &HeroId) -> Option<&Hero> {
        self.heroes.get(&content_key(id.as_str()))
    }
}
