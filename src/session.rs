use crate::model::{
    AwayRecap, ChatMessage, Mood, PetAction, PetSnapshot, ReasonCode, Rules, Timed, Transient,
};
use crate::sim::{self, ActionOutcome, Dice, Rejection};
use crate::storage::PetStore;
use crate::thoughts::{ChatRequest, ThoughtRequest, Ticket};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

pub(crate) const SLEEPING_ADVISORY: &str = "Zzz... *snore* 💤";
pub(crate) const REVIVE_GREETING: &str = "I'm back! Woof! ♡";
pub(crate) const CHAT_HISTORY_LIMIT: usize = 20;

/// What `act` did and what, if anything, the pet wants to say about it.
#[derive(Clone, Debug)]
pub(crate) struct ActReport {
    pub(crate) outcome: ActionOutcome,
    pub(crate) follow_up: Option<ThoughtRequest>,
}

/// One owner's pet plus everything the screen needs around it.
///
/// Every method takes `now` from the caller; nothing in here reads a clock.
/// Each transition that changes the snapshot is saved before returning.
pub(crate) struct PetSession {
    owner: String,
    store: Box<dyn PetStore>,
    rules: Rules,
    pet: PetSnapshot,
    transient: Transient,
    chat: Vec<ChatMessage>,
    recap: Option<AwayRecap>,
    dice: Dice,
    pending_thought: Option<Ticket>,
    pending_chat: Option<Ticket>,
}

impl PetSession {
    /// Loads the owner's pet, catches it up to `now` and saves it.
    ///
    /// Also returns the greeting thought to request, if any.
    pub(crate) fn open(
        owner: impl Into<String>,
        store: Box<dyn PetStore>,
        rules: Rules,
        seed: u64,
        now: DateTime<Utc>,
    ) -> (Self, Option<ThoughtRequest>) {
        let owner = owner.into();
        let stored = match store.load(&owner) {
            Ok(Some(pet)) => Some(pet.normalized(&rules.leveling)),
            Ok(None) => {
                info!(owner = %owner, "no pet on record, adopting a new puppy");
                None
            }
            Err(err) => {
                warn!(owner = %owner, error = %err, "stored pet is unreadable, adopting a new puppy");
                None
            }
        };

        let mut session = Self {
            owner,
            store,
            pet: PetSnapshot::fresh(&rules.initial, now),
            rules,
            transient: Transient::default(),
            chat: Vec::new(),
            recap: None,
            dice: Dice::new(seed),
            pending_thought: None,
            pending_chat: None,
        };

        let greeting = match stored {
            None => Some(ReasonCode::Boredom),
            Some(before) => {
                let projection = sim::project(&before, now, &session.rules);
                if projection.changed() {
                    let recap = AwayRecap {
                        elapsed: now - before.last_updated_at,
                        before,
                        after: projection.snapshot.clone(),
                        died: projection.died,
                    };
                    if recap.has_anything() {
                        session.recap = Some(recap);
                    }
                }
                if projection.died {
                    info!(owner = %session.owner, "pet passed away while its owner was gone");
                }
                session.pet = projection.snapshot;
                (!session.pet.is_dead).then(|| sim::reason_for(&session.pet, &session.rules.mood))
            }
        };
        session.persist();

        let request = greeting.map(|reason| session.thought_request(reason));
        (session, request)
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.owner, &self.pet) {
            warn!(owner = %self.owner, error = %err, "could not save pet, keeping it in memory");
        }
    }

    fn thought_request(&self, reason: ReasonCode) -> ThoughtRequest {
        ThoughtRequest {
            snapshot: self.pet.clone(),
            reason,
        }
    }

    /// Brings the pet current. Returns true if this tick killed it.
    pub(crate) fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let projection = sim::project(&self.pet, now, &self.rules);
        if !projection.changed() {
            return false;
        }
        self.pet = projection.snapshot;
        self.persist();
        if projection.died {
            info!(owner = %self.owner, level = self.pet.level, "pet died");
            self.transient = Transient::default();
            self.pending_thought = None;
        }
        projection.died
    }

    pub(crate) fn act(&mut self, action: PetAction, now: DateTime<Utc>) -> ActReport {
        self.tick(now);

        let outcome = self.pet.apply(action, &self.rules);
        let timing = self.rules.timing;
        let follow_up = match outcome {
            ActionOutcome::Rejected(Rejection::Dead) => None,
            ActionOutcome::Rejected(Rejection::Sleeping) => {
                self.transient.thought = Some(Timed::new(
                    SLEEPING_ADVISORY.to_string(),
                    now,
                    timing.advisory_ms,
                ));
                self.pending_thought = None;
                None
            }
            ActionOutcome::Applied {
                action,
                levels_gained,
            } => {
                self.persist();
                debug!(?action, level = self.pet.level, xp = self.pet.xp, "action applied");
                if action != PetAction::ToggleSleep {
                    self.transient.action = Some(Timed::new(action, now, timing.action_visual_ms));
                    self.transient.thought = None;
                }
                if levels_gained > 0 {
                    info!(level = self.pet.level, "level up");
                    Some(self.thought_request(ReasonCode::LevelUp))
                } else {
                    match action.reason() {
                        Some(reason) if self.dice.roll(timing.casual_thought_chance) => {
                            Some(self.thought_request(reason))
                        }
                        _ => None,
                    }
                }
            }
        };

        ActReport { outcome, follow_up }
    }

    /// Replaces the pet with a new puppy.
    pub(crate) fn revive(&mut self, now: DateTime<Utc>) {
        info!(owner = %self.owner, previous_level = self.pet.level, "adopting a new puppy");
        self.pet = sim::revive(&self.rules, now);
        self.persist();
        self.transient = Transient {
            action: None,
            thought: Some(Timed::new(
                REVIVE_GREETING.to_string(),
                now,
                self.rules.timing.thought_ms,
            )),
        };
        self.chat.clear();
        self.recap = None;
        self.pending_thought = None;
        self.pending_chat = None;
    }

    /// Records the owner's line and returns the reply request. Ignored when
    /// the pet is dead or the text is blank.
    pub(crate) fn send_chat(&mut self, text: &str, now: DateTime<Utc>) -> Option<ChatRequest> {
        self.tick(now);
        let text = text.trim();
        if text.is_empty() || self.pet.is_dead {
            return None;
        }
        let history = self.chat.clone();
        self.push_chat(ChatMessage::user(text));
        Some(ChatRequest {
            message: text.to_string(),
            snapshot: self.pet.clone(),
            history,
        })
    }

    fn push_chat(&mut self, msg: ChatMessage) {
        self.chat.push(msg);
        if self.chat.len() > CHAT_HISTORY_LIMIT {
            let excess = self.chat.len() - CHAT_HISTORY_LIMIT;
            self.chat.drain(..excess);
        }
    }

    /// A newer thought request makes older ones stale.
    pub(crate) fn expect_thought(&mut self, ticket: Ticket) {
        self.pending_thought = Some(ticket);
    }

    pub(crate) fn expect_chat(&mut self, ticket: Ticket) {
        self.pending_chat = Some(ticket);
    }

    /// Shows a finished thought if it is still the one we are waiting for.
    pub(crate) fn accept_thought(&mut self, ticket: Ticket, text: String, now: DateTime<Utc>) -> bool {
        if self.pending_thought != Some(ticket) || self.pet.is_dead {
            debug!(?ticket, "dropping stale thought");
            return false;
        }
        self.pending_thought = None;
        self.transient.thought = Some(Timed::new(text, now, self.rules.timing.thought_ms));
        true
    }

    pub(crate) fn accept_chat_reply(&mut self, ticket: Ticket, text: String) -> bool {
        if self.pending_chat != Some(ticket) {
            debug!(?ticket, "dropping stale chat reply");
            return false;
        }
        self.pending_chat = None;
        self.push_chat(ChatMessage::pet(text));
        true
    }

    pub(crate) fn awaiting_chat(&self) -> bool {
        self.pending_chat.is_some()
    }

    pub(crate) fn snapshot(&self) -> &PetSnapshot {
        &self.pet
    }

    pub(crate) fn mood(&self) -> Mood {
        sim::derive_mood(&self.pet, &self.rules.mood)
    }

    pub(crate) fn transient(&self) -> &Transient {
        &self.transient
    }

    pub(crate) fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub(crate) fn recap(&self) -> Option<&AwayRecap> {
        self.recap.as_ref()
    }

    pub(crate) fn dismiss_recap(&mut self) {
        self.recap = None;
    }

    pub(crate) fn rules(&self) -> &Rules {
        &self.rules
    }

    pub(crate) fn owner(&self) -> &str {
        &self.owner
    }
}
