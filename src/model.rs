use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

pub(crate) const SAVE_VERSION: u32 = 1;
pub(crate) const GAUGE_MAX: f32 = 100.0;

pub(crate) fn clamp_gauge(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, GAUGE_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Mood {
    Happy,
    Sad,
    Sleeping,
    Hungry,
    Dirty,
    Tired,
    Dead,
}

impl Mood {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Sleeping => "sleeping",
            Mood::Hungry => "hungry",
            Mood::Dirty => "dirty",
            Mood::Tired => "tired",
            Mood::Dead => "dead",
        }
    }
}

/// A discrete owner command that goes through the action table.
/// Revival is not one of these: it replaces the pet instead of changing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PetAction {
    Feed,
    Play,
    Clean,
    ToggleSleep,
}

impl PetAction {
    pub(crate) fn awards_xp(self) -> bool {
        !matches!(self, PetAction::ToggleSleep)
    }

    /// Stat a casual thought should talk about after this action.
    pub(crate) fn reason(self) -> Option<ReasonCode> {
        match self {
            PetAction::Feed => Some(ReasonCode::Hunger),
            PetAction::Play => Some(ReasonCode::Happiness),
            PetAction::Clean => Some(ReasonCode::Hygiene),
            PetAction::ToggleSleep => None,
        }
    }

    pub(crate) fn progressive(self) -> &'static str {
        match self {
            PetAction::Feed => "FEEDING...",
            PetAction::Play => "PLAYING...",
            PetAction::Clean => "CLEANING...",
            PetAction::ToggleSleep => "Zzz...",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ReasonCode {
    Hunger,
    Energy,
    Happiness,
    Hygiene,
    Boredom,
    LevelUp,
}

impl ReasonCode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ReasonCode::Hunger => "hunger",
            ReasonCode::Energy => "energy",
            ReasonCode::Happiness => "happiness",
            ReasonCode::Hygiene => "hygiene",
            ReasonCode::Boredom => "boredom",
            ReasonCode::LevelUp => "level_up",
        }
    }
}

/// The persisted state of one pet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PetSnapshot {
    pub(crate) hunger: f32,
    pub(crate) energy: f32,
    pub(crate) happiness: f32,
    pub(crate) hygiene: f32,
    pub(crate) health: f32,
    pub(crate) level: u32,
    pub(crate) xp: u32,
    pub(crate) is_dead: bool,
    #[serde(default)]
    pub(crate) is_sleeping: bool,
    pub(crate) last_updated_at: DateTime<Utc>,
}

impl PetSnapshot {
    pub(crate) fn fresh(initial: &InitialStats, now: DateTime<Utc>) -> Self {
        Self {
            hunger: clamp_gauge(initial.hunger),
            energy: clamp_gauge(initial.energy),
            happiness: clamp_gauge(initial.happiness),
            hygiene: clamp_gauge(initial.hygiene),
            health: clamp_gauge(initial.health),
            level: 1,
            xp: 0,
            is_dead: false,
            is_sleeping: false,
            last_updated_at: now,
        }
    }

    /// Hunger, energy, happiness, hygiene. Health is derived from these.
    pub(crate) fn primary_gauges(&self) -> [f32; 4] {
        [self.hunger, self.energy, self.happiness, self.hygiene]
    }

    /// Pulls a stored record back inside the invariants. Records written by
    /// older builds or edited by hand can carry anything.
    pub(crate) fn normalized(mut self, leveling: &Leveling) -> Self {
        self.hunger = clamp_gauge(self.hunger);
        self.energy = clamp_gauge(self.energy);
        self.happiness = clamp_gauge(self.happiness);
        self.hygiene = clamp_gauge(self.hygiene);
        self.health = clamp_gauge(self.health);
        self.level = self.level.max(1);
        let threshold = leveling.threshold();
        if self.xp >= threshold {
            self.level = self.level.saturating_add(self.xp / threshold);
            self.xp %= threshold;
        }
        if self.health <= 0.0 {
            self.is_dead = true;
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct InitialStats {
    pub(crate) hunger: f32,
    pub(crate) energy: f32,
    pub(crate) happiness: f32,
    pub(crate) hygiene: f32,
    pub(crate) health: f32,
}

impl Default for InitialStats {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            energy: 80.0,
            happiness: 80.0,
            hygiene: 80.0,
            health: 100.0,
        }
    }
}

/// Points lost per hour while awake.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DecayRates {
    pub(crate) hunger: f32,
    pub(crate) energy: f32,
    pub(crate) happiness: f32,
    pub(crate) hygiene: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            hunger: 8.0,
            energy: 5.0,
            happiness: 7.0,
            hygiene: 4.0,
        }
    }
}

/// Per-hour rates while asleep. Energy is a gain, the rest are losses.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SleepRates {
    pub(crate) energy_gain: f32,
    pub(crate) hunger: f32,
    pub(crate) happiness: f32,
    pub(crate) hygiene: f32,
}

impl Default for SleepRates {
    fn default() -> Self {
        Self {
            energy_gain: 8.0,
            hunger: 4.0,
            happiness: 2.0,
            hygiene: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PenaltyPolicy {
    /// One penalty rate as soon as any gauge is critical.
    Flat,
    /// The penalty rate once per critical gauge.
    PerCriticalGauge,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct HealthRules {
    pub(crate) critical_threshold: f32,
    pub(crate) penalty_per_hour: f32,
    pub(crate) penalty_policy: PenaltyPolicy,
    pub(crate) thriving_threshold: f32,
    pub(crate) recovery_per_hour: f32,
}

impl Default for HealthRules {
    fn default() -> Self {
        Self {
            critical_threshold: 10.0,
            penalty_per_hour: 20.0,
            penalty_policy: PenaltyPolicy::Flat,
            thriving_threshold: 50.0,
            recovery_per_hour: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FeedEffect {
    pub(crate) hunger: f32,
    pub(crate) hygiene_cost: f32,
    pub(crate) health: f32,
}

impl Default for FeedEffect {
    fn default() -> Self {
        Self {
            hunger: 35.0,
            hygiene_cost: 5.0,
            health: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PlayEffect {
    pub(crate) happiness: f32,
    pub(crate) energy_cost: f32,
    pub(crate) hunger_cost: f32,
}

impl Default for PlayEffect {
    fn default() -> Self {
        Self {
            happiness: 30.0,
            energy_cost: 20.0,
            hunger_cost: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CleanEffect {
    pub(crate) hygiene: f32,
    /// Dogs dislike baths. Off by default.
    pub(crate) happiness_cost: f32,
}

impl Default for CleanEffect {
    fn default() -> Self {
        Self {
            hygiene: 60.0,
            happiness_cost: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ActionEffects {
    pub(crate) feed: FeedEffect,
    pub(crate) play: PlayEffect,
    pub(crate) clean: CleanEffect,
    /// Granted once when the pet falls asleep, not when it wakes.
    pub(crate) sleep_energy_bonus: f32,
}

impl Default for ActionEffects {
    fn default() -> Self {
        Self {
            feed: FeedEffect::default(),
            play: PlayEffect::default(),
            clean: CleanEffect::default(),
            sleep_energy_bonus: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Leveling {
    pub(crate) xp_per_action: u32,
    pub(crate) xp_for_next_level: u32,
}

impl Leveling {
    /// Never zero, so rollover always terminates.
    pub(crate) fn threshold(&self) -> u32 {
        self.xp_for_next_level.max(1)
    }
}

impl Default for Leveling {
    fn default() -> Self {
        Self {
            xp_per_action: 10,
            xp_for_next_level: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MoodThresholds {
    pub(crate) hungry_below: f32,
    pub(crate) dirty_below: f32,
    pub(crate) sad_below: f32,
    /// Unset means low energy while awake does not change the mood.
    pub(crate) tired_below: Option<f32>,
    /// Gauges under this pick the reason of the greeting thought on load.
    pub(crate) complaint_below: f32,
}

impl Default for MoodThresholds {
    fn default() -> Self {
        Self {
            hungry_below: 25.0,
            dirty_below: 25.0,
            sad_below: 30.0,
            tired_below: None,
            complaint_below: 30.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Timing {
    pub(crate) action_visual_ms: i64,
    pub(crate) thought_ms: i64,
    pub(crate) advisory_ms: i64,
    pub(crate) casual_thought_chance: f32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            action_visual_ms: 2_000,
            thought_ms: 5_000,
            advisory_ms: 2_000,
            casual_thought_chance: 0.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Rules {
    pub(crate) initial: InitialStats,
    pub(crate) decay: DecayRates,
    pub(crate) sleep: SleepRates,
    pub(crate) health: HealthRules,
    pub(crate) actions: ActionEffects,
    pub(crate) leveling: Leveling,
    pub(crate) mood: MoodThresholds,
    pub(crate) timing: Timing,
    /// Projections over shorter intervals are skipped and the time carries over.
    pub(crate) min_elapsed_secs: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            initial: InitialStats::default(),
            decay: DecayRates::default(),
            sleep: SleepRates::default(),
            health: HealthRules::default(),
            actions: ActionEffects::default(),
            leveling: Leveling::default(),
            mood: MoodThresholds::default(),
            timing: Timing::default(),
            min_elapsed_secs: 1.0,
        }
    }
}

/* -----------------------------
   Transient display state
------------------------------ */

/// A display value that stops being shown at `expires_at`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Timed<T> {
    pub(crate) value: T,
    pub(crate) expires_at: DateTime<Utc>,
}

impl<T> Timed<T> {
    pub(crate) fn new(value: T, now: DateTime<Utc>, millis: i64) -> Self {
        Self {
            value,
            expires_at: now + ChronoDuration::milliseconds(millis.max(0)),
        }
    }

    pub(crate) fn visible(&self, now: DateTime<Utc>) -> Option<&T> {
        (now < self.expires_at).then_some(&self.value)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Transient {
    pub(crate) action: Option<Timed<PetAction>>,
    pub(crate) thought: Option<Timed<String>>,
}

impl Transient {
    pub(crate) fn visible_action(&self, now: DateTime<Utc>) -> Option<PetAction> {
        self.action.as_ref().and_then(|a| a.visible(now)).copied()
    }

    /// The bubble is hidden while an action animation plays.
    pub(crate) fn visible_thought(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.visible_action(now).is_some() {
            return None;
        }
        self.thought
            .as_ref()
            .and_then(|t| t.visible(now))
            .map(String::as_str)
    }
}

/* -----------------------------
   Chat
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ChatRole {
    User,
    Pet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: ChatRole,
    pub(crate) text: String,
}

impl ChatMessage {
    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub(crate) fn pet(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Pet,
            text: text.into(),
        }
    }
}

/* -----------------------------
   Save file + away recap
------------------------------ */

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SaveFile {
    pub(crate) version: u32,
    pub(crate) owner_id: String,
    pub(crate) saved_at: DateTime<Utc>,
    pub(crate) pet: PetSnapshot,
}

/// What happened while the program was closed.
#[derive(Clone, Debug)]
pub(crate) struct AwayRecap {
    pub(crate) elapsed: ChronoDuration,
    pub(crate) before: PetSnapshot,
    pub(crate) after: PetSnapshot,
    pub(crate) died: bool,
}

impl AwayRecap {
    pub(crate) fn has_anything(&self) -> bool {
        if self.elapsed < ChronoDuration::minutes(1) {
            return false;
        }
        let dropped = self
            .before
            .primary_gauges()
            .iter()
            .zip(self.after.primary_gauges())
            .any(|(b, a)| b - a >= 5.0);
        self.died || dropped || self.after.health < self.before.health
    }
}
