#![allow(dead_code)]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use synth_model::{
    BreakpointTables, CharacterStats, CraftDefinition, OutcomeOracle, RecipeDescriptor,
    Simulation, Skill, StaticBreakpoints, StepDeltas, StepSnapshot,
};
use synth_tracker::{
    AdvanceStep, CraftHost, CraftMessage, PhaseSignal, QuickSynthProgress, SessionEngine,
    SessionEvent, SessionPhase, StepFlags, TrackerConfig, UiSnapshot,
};

pub const RECIPE_ID: u32 = 35000;
pub const UNKNOWN_RECIPE_ID: u32 = 99999;
pub const TARGET_PROGRESS: i32 = 1000;
pub const MAX_QUALITY: i32 = 4000;
pub const DURABILITY: i32 = 40;

pub const BASIC_SYNTHESIS: u32 = 100001;
pub const BASIC_TOUCH: u32 = 100002;
pub const FINAL_APPRAISAL: u32 = 100339;
pub const MASTERS_MEND: u32 = 100003;

// --- Signals ---

pub const IDLE: PhaseSignal = PhaseSignal {
    preparing: false,
    active: false,
    transitioning: false,
};
pub const MENU: PhaseSignal = PhaseSignal {
    preparing: true,
    active: true,
    transitioning: false,
};
pub const BUSY: PhaseSignal = PhaseSignal {
    preparing: false,
    active: true,
    transitioning: true,
};
pub const CRAFTING: PhaseSignal = PhaseSignal {
    preparing: false,
    active: true,
    transitioning: false,
};
/// Quick synthesis closed; the transition flag lingers.
pub const MENU_AFTER_QUICK: PhaseSignal = PhaseSignal {
    preparing: true,
    active: true,
    transitioning: true,
};

// --- Host ---

/// Host whose every reading is a plain field the test sets between calls.
pub struct FakeHost {
    pub signal: PhaseSignal,
    pub ui: Option<UiSnapshot>,
    pub quick: Option<QuickSynthProgress>,
    pub recipes: HashMap<u32, RecipeDescriptor>,
    pub stats: CharacterStats,
    pub actions: HashMap<u32, Skill>,
    pub tables: StaticBreakpoints,
}

impl Default for FakeHost {
    fn default() -> Self {
        let recipe = RecipeDescriptor {
            id: RECIPE_ID,
            item_id: 44000,
            durability: DURABILITY,
            difficulty: TARGET_PROGRESS,
            max_quality: MAX_QUALITY,
            can_hq: true,
            ..Default::default()
        };
        Self {
            signal: IDLE,
            ui: None,
            quick: None,
            recipes: HashMap::from([(RECIPE_ID, recipe)]),
            stats: CharacterStats {
                craftsmanship: 4000,
                control: 3900,
                cp: 600,
                level: 100,
                ..Default::default()
            },
            actions: HashMap::from([
                (BASIC_SYNTHESIS, Skill::BasicSynthesis),
                (BASIC_TOUCH, Skill::BasicTouch),
                (FINAL_APPRAISAL, Skill::FinalAppraisal),
                (MASTERS_MEND, Skill::MastersMend),
            ]),
            tables: StaticBreakpoints::default(),
        }
    }
}

impl CraftHost for FakeHost {
    fn phase_signal(&self) -> PhaseSignal {
        self.signal
    }

    fn poll_ui_snapshot(&self) -> Option<UiSnapshot> {
        self.ui.clone()
    }

    fn poll_quick_synth(&self) -> Option<QuickSynthProgress> {
        self.quick
    }

    fn resolve_recipe(&self, recipe_id: u32) -> Option<RecipeDescriptor> {
        self.recipes.get(&recipe_id).cloned()
    }

    fn character_stats(&self) -> CharacterStats {
        self.stats.clone()
    }

    fn resolve_action(&self, action_id: u32) -> Skill {
        self.actions.get(&action_id).copied().unwrap_or_default()
    }

    fn breakpoints(&self) -> &dyn BreakpointTables {
        &self.tables
    }
}

// --- Oracle ---

/// Synthesis actions add `progress`, touches add `quality`, everything else
/// only costs durability. Master's Mend restores 30.
#[derive(Debug, Clone, Copy)]
pub struct LinearOracle {
    pub progress: i32,
    pub quality: i32,
    pub durability_cost: i32,
}

impl Default for LinearOracle {
    fn default() -> Self {
        Self {
            progress: 300,
            quality: 250,
            durability_cost: 10,
        }
    }
}

impl OutcomeOracle for LinearOracle {
    fn simulate(
        &self,
        craft: &CraftDefinition,
        step: &StepSnapshot,
        action: Skill,
        failed: bool,
        _chain_position: u32,
    ) -> Simulation {
        let mut deltas = StepDeltas::default();
        match action {
            _ if failed => {}
            Skill::BasicSynthesis | Skill::CarefulSynthesis | Skill::RapidSynthesis => {
                deltas.progress = self.progress
            }
            Skill::BasicTouch | Skill::StandardTouch | Skill::AdvancedTouch => {
                deltas.quality = self.quality
            }
            _ => {}
        }
        deltas.durability = match action {
            Skill::MastersMend => (craft.durability - step.durability).min(30),
            Skill::FinalAppraisal => 0,
            _ => -self.durability_cost,
        };

        let mut next = step.clone();
        next.index += 1;
        next.progress += deltas.progress;
        next.quality += deltas.quality;
        next.durability += deltas.durability;
        Simulation { deltas, next }
    }
}

// --- Messages ---

/// Action result as the game reports it for `step` after executing `action_id`.
pub fn advance(action_id: u32, step: &StepSnapshot, complete: bool) -> CraftMessage {
    CraftMessage::AdvanceAction(AdvanceStep {
        action_id,
        flags: StepFlags {
            last_action_succeeded: true,
            complete_success: complete,
            complete_fail: false,
        },
        step_index: step.index,
        progress: step.progress,
        quality: step.quality,
        durability: step.durability,
        condition_plus_one: 1,
        ..Default::default()
    })
}

pub fn with_deltas(message: CraftMessage, progress: i32, quality: i32, durability: i32) -> CraftMessage {
    match message {
        CraftMessage::AdvanceAction(step) => CraftMessage::AdvanceAction(AdvanceStep {
            delta_progress: progress,
            delta_quality: quality,
            delta_durability: durability,
            ..step
        }),
        other => other,
    }
}

pub fn start_info(recipe_id: u32) -> CraftMessage {
    CraftMessage::StartInfo {
        recipe_id,
        starting_quality: 0,
    }
}

/// Window values showing `step`.
pub fn ui_for(step_index: i32, progress: i32, quality: i32, durability: i32) -> UiSnapshot {
    UiSnapshot {
        step_index,
        progress,
        quality,
        durability,
        remaining_cp: 600,
        ..Default::default()
    }
}

// --- Harness ---

/// Engine plus host plus a manual clock. Every event the engine emits is
/// also appended to `events`.
pub struct Harness<O: OutcomeOracle = LinearOracle> {
    pub engine: SessionEngine<O>,
    pub host: FakeHost,
    pub now: Instant,
    pub events: Vec<SessionEvent>,
}

impl Harness<LinearOracle> {
    pub fn new() -> Self {
        Self::with(LinearOracle::default(), TrackerConfig::default())
    }
}

impl<O: OutcomeOracle> Harness<O> {
    pub fn with(oracle: O, config: TrackerConfig) -> Self {
        Self {
            engine: SessionEngine::new(oracle, config),
            host: FakeHost::default(),
            now: Instant::now(),
            events: Vec::new(),
        }
    }

    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let events = self.engine.tick_at(&self.host, self.now);
        self.events.extend(events.iter().cloned());
        events
    }

    pub fn signal(&mut self, signal: PhaseSignal) -> Vec<SessionEvent> {
        self.host.signal = signal;
        self.tick()
    }

    pub fn send(&mut self, message: CraftMessage) {
        self.engine.handle_message_at(&message, &self.host, self.now);
    }

    pub fn wait(&mut self, millis: u64) {
        self.now += Duration::from_millis(millis);
    }

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }

    /// From `Unknown` to sitting in the crafting menu.
    pub fn open_menu(&mut self) {
        self.signal(MENU);
        self.signal(MENU);
        assert_eq!(self.phase(), SessionPhase::IdleBetween);
    }

    /// From the crafting menu to the first step of a fresh craft.
    pub fn start_craft(&mut self) {
        self.open_menu();
        self.signal(BUSY);
        assert_eq!(self.phase(), SessionPhase::AwaitingStart);
        self.send(CraftMessage::StartPrepare);
        self.send(start_info(RECIPE_ID));
        self.send(CraftMessage::StartReady);
        self.host.ui = Some(ui_for(1, 0, 0, DURABILITY));
        self.signal(CRAFTING);
        assert_eq!(self.phase(), SessionPhase::Active);
    }

    /// Executes an action: the transition flag comes up and the engine
    /// starts waiting for the result.
    pub fn begin_action(&mut self) {
        self.signal(BUSY);
        assert_eq!(self.phase(), SessionPhase::AwaitingActionResult);
    }

    pub fn current_step(&self) -> StepSnapshot {
        self.engine
            .session()
            .map(|s| s.step.clone())
            .expect("no session held")
    }

    pub fn diagnostic_codes(&mut self) -> Vec<&'static str> {
        self.engine
            .drain_diagnostics()
            .into_iter()
            .map(|r| r.diagnostic.code())
            .collect()
    }
}

pub fn count<F: Fn(&SessionEvent) -> bool>(events: &[SessionEvent], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

pub fn is_advanced(e: &SessionEvent) -> bool {
    matches!(e, SessionEvent::Advanced { .. })
}

pub fn is_finished(e: &SessionEvent) -> bool {
    matches!(e, SessionEvent::Finished { .. })
}
