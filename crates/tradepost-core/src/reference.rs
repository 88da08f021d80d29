use serde::{Deserialize, Serialize};

/// Static lists a client uses to build listing and catalog forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLists {
    pub rarity: Vec<String>,
    pub types: Vec<String>,
    pub stats: Vec<String>,
    pub mods: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ReferenceLists {
    fn default() -> Self {
        Self {
            rarity: owned(&["common", "magic", "rare", "unique", "set"]),
            types: owned(&[
                "sword", "axe", "mace", "bow", "staff", "shield", "helm", "armor", "gloves",
                "boots", "belt", "ring", "amulet",
            ]),
            stats: owned(&[
                "damage",
                "defense",
                "attack speed",
                "block chance",
                "durability",
                "required level",
            ]),
            mods: owned(&[
                "fire damage",
                "cold damage",
                "lightning damage",
                "poison damage",
                "life",
                "mana",
                "strength",
                "dexterity",
                "all resistances",
                "magic find",
            ]),
        }
    }
}
