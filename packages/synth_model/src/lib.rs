//! # Synthesis model
//!
//! Plain value types describing a single synthesis (craft) session.
//!
//! - [`CraftDefinition`] holds everything that stays fixed for the duration of
//!   one session: character stats, recipe constants and quality breakpoints.
//! - [`StepSnapshot`] holds the dynamic values of one observed step.
//! - [`OutcomeOracle`] is the seam to an external step simulator. Nothing in
//!   this crate implements it.
//!
//! Definitions are built with [`build_craft_definition`], which resolves
//! collectible breakpoints through a [`BreakpointTables`] implementation.
//!
//! ```rust
//! use synth_model::{
//!     CharacterStats, RecipeDescriptor, StaticBreakpoints, build_craft_definition,
//! };
//!
//! let stats = CharacterStats {
//!     craftsmanship: 4000,
//!     control: 3900,
//!     cp: 600,
//!     level: 100,
//!     ..Default::default()
//! };
//! let recipe = RecipeDescriptor {
//!     id: 35000,
//!     item_id: 44000,
//!     durability: 80,
//!     difficulty: 6600,
//!     max_quality: 12000,
//!     can_hq: true,
//!     ..Default::default()
//! };
//!
//! let craft = build_craft_definition(&stats, &recipe, &StaticBreakpoints::default());
//! assert_eq!(craft.quality_min3, 12000);
//! ```

pub mod breakpoints;
pub mod condition;
pub mod craft;
pub mod oracle;
pub mod skill;
pub mod step;

pub use breakpoints::{
    BreakpointTables, CollectableShopRow, RestorationSupplyRow, SatisfactionSupplyRow,
    StaticBreakpoints, build_craft_definition,
};
pub use condition::Condition;
pub use craft::{CharacterStats, CraftDefinition, LevelTable, RecipeDescriptor};
pub use oracle::{OutcomeOracle, Simulation};
pub use skill::Skill;
pub use step::{BuffCounters, StepDeltas, StepSnapshot};
