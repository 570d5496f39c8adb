//! Quality breakpoint tables and the craft-definition builder.
//!
//! Collectible breakpoints live in three different game tables. They are
//! consulted in a fixed order and the first table that knows the item wins:
//!
//! 1. collectable shop refine rows
//! 2. customer-order (satisfaction supply) rows
//! 3. restoration supply rows, matched by the trade-in item
//!
//! All of them store collectability, which is a tenth of quality.

use serde::{Deserialize, Serialize};

use crate::craft::{CharacterStats, CraftDefinition, RecipeDescriptor};

const COLLECTABILITY_SCALE: i32 = 10;

const DEFAULT_PROGRESS_DIVIDER: i32 = 180;
const DEFAULT_PROGRESS_MODIFIER: i32 = 100;
const DEFAULT_QUALITY_DIVIDER: i32 = 180;
const DEFAULT_QUALITY_MODIFIER: i32 = 180;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectableShopRow {
    pub item_id: u32,
    pub low: i32,
    pub mid: i32,
    pub high: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionSupplyRow {
    pub item_id: u32,
    pub low: i32,
    pub mid: i32,
    pub high: i32,
}

/// One restoration supply row covers several trade-in items; ratings are
/// stored in parallel arrays indexed like `trade_in_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationSupplyRow {
    pub trade_in_items: Vec<u32>,
    pub base_ratings: Vec<i32>,
    pub mid_ratings: Vec<i32>,
    pub high_ratings: Vec<i32>,
}

impl RestorationSupplyRow {
    fn ratings_for(&self, item_id: u32) -> Option<(i32, i32, i32)> {
        let index = self.trade_in_items.iter().position(|&id| id == item_id)?;
        Some((
            self.base_ratings.get(index).copied().unwrap_or(0),
            self.mid_ratings.get(index).copied().unwrap_or(0),
            self.high_ratings.get(index).copied().unwrap_or(0),
        ))
    }
}

/// Read access to the game tables holding collectible breakpoints.
pub trait BreakpointTables {
    fn collectable_shop(&self, item_id: u32) -> Option<CollectableShopRow>;
    fn satisfaction_supply(&self, item_id: u32) -> Option<SatisfactionSupplyRow>;
    fn restoration_supply(&self, item_id: u32) -> Option<RestorationSupplyRow>;
}

/// In-memory tables, e.g. loaded from a capture file or built in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticBreakpoints {
    pub collectable_shop: Vec<CollectableShopRow>,
    pub satisfaction_supply: Vec<SatisfactionSupplyRow>,
    pub restoration_supply: Vec<RestorationSupplyRow>,
}

impl BreakpointTables for StaticBreakpoints {
    fn collectable_shop(&self, item_id: u32) -> Option<CollectableShopRow> {
        self.collectable_shop
            .iter()
            .find(|row| row.item_id == item_id)
            .cloned()
    }

    fn satisfaction_supply(&self, item_id: u32) -> Option<SatisfactionSupplyRow> {
        self.satisfaction_supply
            .iter()
            .find(|row| row.item_id == item_id)
            .cloned()
    }

    fn restoration_supply(&self, item_id: u32) -> Option<RestorationSupplyRow> {
        self.restoration_supply
            .iter()
            .find(|row| row.trade_in_items.contains(&item_id))
            .cloned()
    }
}

/// Collectability breakpoints for an item, first table wins.
fn resolve_collectability(tables: &dyn BreakpointTables, item_id: u32) -> Option<(i32, i32, i32)> {
    if let Some(row) = tables.collectable_shop(item_id) {
        return Some((row.low, row.mid, row.high));
    }
    if let Some(row) = tables.satisfaction_supply(item_id) {
        return Some((row.low, row.mid, row.high));
    }
    tables
        .restoration_supply(item_id)
        .and_then(|row| row.ratings_for(item_id))
}

/// Fill empty upper slots from below so that the highest slot is always usable.
///
/// `(X, 0, 0)` becomes `(X, X, X)` and `(X, Y, 0)` becomes `(X, X, Y)`.
pub fn normalize_thresholds(min1: i32, min2: i32, min3: i32) -> (i32, i32, i32) {
    let (mut min2, mut min3) = (min2, min3);
    if min3 == 0 {
        min3 = min2;
        min2 = min1;
    }
    if min3 == 0 {
        min3 = min2;
    }
    (min1, min2, min3)
}

/// Build the definition of a craft from the current character and a recipe.
pub fn build_craft_definition(
    stats: &CharacterStats,
    recipe: &RecipeDescriptor,
    tables: &dyn BreakpointTables,
) -> CraftDefinition {
    let lt = recipe.level_table.as_ref();
    let mut craft = CraftDefinition {
        stat_craftsmanship: stats.craftsmanship,
        stat_control: stats.control,
        stat_cp: stats.cp,
        stat_level: stats.level,
        unlocked_manipulation: stats.manipulation_unlocked,
        specialist: stats.specialist,
        splendorous: stats.splendorous,
        collectable: recipe.is_collectable,
        expert: recipe.is_expert,
        level: lt.map_or(0, |lt| lt.class_job_level),
        durability: recipe.durability,
        progress: recipe.difficulty,
        progress_divider: lt.map_or(DEFAULT_PROGRESS_DIVIDER, |lt| lt.progress_divider),
        progress_modifier: lt.map_or(DEFAULT_PROGRESS_MODIFIER, |lt| lt.progress_modifier),
        quality_divider: lt.map_or(DEFAULT_QUALITY_DIVIDER, |lt| lt.quality_divider),
        quality_modifier: lt.map_or(DEFAULT_QUALITY_MODIFIER, |lt| lt.quality_modifier),
        quality_max: recipe.max_quality,
        ..Default::default()
    };

    if craft.collectable {
        let (low, mid, high) = resolve_collectability(tables, recipe.item_id).unwrap_or_default();
        let (min1, min2, min3) = normalize_thresholds(
            low * COLLECTABILITY_SCALE,
            mid * COLLECTABILITY_SCALE,
            high * COLLECTABILITY_SCALE,
        );
        craft.quality_min1 = min1;
        craft.quality_min2 = min2;
        craft.quality_min3 = min3;
    } else if recipe.required_quality > 0 {
        craft.quality_min1 = recipe.required_quality;
        craft.quality_min2 = recipe.required_quality;
        craft.quality_min3 = recipe.required_quality;
        craft.quality_max = recipe.required_quality;
    } else if recipe.can_hq {
        craft.quality_min3 = craft.quality_max;
    }

    craft
}
