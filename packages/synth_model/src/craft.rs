//! Static parameters of a craft: character stats, recipe data and the
//! definition derived from both.

use serde::{Deserialize, Serialize};

/// Current character stats, including gear and consumables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    pub craftsmanship: i32,
    pub control: i32,
    pub cp: i32,
    /// Level of the job currently crafting.
    pub level: i32,
    pub manipulation_unlocked: bool,
    pub specialist: bool,
    pub splendorous: bool,
}

/// Per-level constants of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    pub class_job_level: i32,
    pub progress_divider: i32,
    pub progress_modifier: i32,
    pub quality_divider: i32,
    pub quality_modifier: i32,
}

/// What the host knows about a recipe, already resolved from game data.
///
/// Durability, difficulty and max quality are the final values after the
/// recipe's own factors are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeDescriptor {
    pub id: u32,
    /// Item produced by the recipe; used to look up collectible breakpoints.
    pub item_id: u32,
    pub level_table: Option<LevelTable>,
    pub durability: i32,
    pub difficulty: i32,
    pub max_quality: i32,
    pub required_quality: i32,
    pub is_expert: bool,
    pub is_collectable: bool,
    pub can_hq: bool,
}

/// Everything about a craft that stays fixed for one session.
///
/// Built once by [`build_craft_definition`](crate::build_craft_definition) and
/// shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CraftDefinition {
    pub stat_craftsmanship: i32,
    pub stat_control: i32,
    pub stat_cp: i32,
    pub stat_level: i32,
    pub unlocked_manipulation: bool,
    pub specialist: bool,
    pub splendorous: bool,

    pub collectable: bool,
    pub expert: bool,
    pub level: i32,
    pub durability: i32,
    /// Progress needed to complete the craft.
    pub progress: i32,
    pub progress_divider: i32,
    pub progress_modifier: i32,
    pub quality_divider: i32,
    pub quality_modifier: i32,
    pub quality_max: i32,

    /// Quality breakpoints, ascending. Empty slots are filled from below.
    pub quality_min1: i32,
    pub quality_min2: i32,
    pub quality_min3: i32,
}

impl CraftDefinition {
    /// The lowest breakpoint strictly above `quality`, if any.
    pub fn next_breakpoint(&self, quality: i32) -> Option<i32> {
        [self.quality_min1, self.quality_min2, self.quality_min3]
            .into_iter()
            .find(|&min| min > quality)
    }
}
