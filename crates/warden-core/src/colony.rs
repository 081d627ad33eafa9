//! In-memory colony simulation.
//!
//! A small but real world for the executor to mutate: colonists with moods
//! and skills, resource stocks, active threats, a calendar, and a capped
//! in-game message log. Rich enough to drive every wire scenario; all state
//! lives on the simulation thread and is only ever touched through the
//! [`Simulation`] trait.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use warden_types::{ColonyEvent, ErrorCode, MessageStyle};

use crate::simulation::Simulation;

/// Executor ticks per in-game day.
const TICKS_PER_DAY: u64 = 240;

/// In-game days per season.
const DAYS_PER_SEASON: u32 = 15;

/// Maximum entries retained in the in-game message log.
const MESSAGE_LOG_CAP: usize = 100;

// ---------------------------------------------------------------------------
// World data
// ---------------------------------------------------------------------------

/// Season of the colony calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// First quarter of the year.
    Spring,
    /// Second quarter.
    Summer,
    /// Third quarter.
    Fall,
    /// Fourth quarter.
    Winter,
}

impl Season {
    /// Display label used in snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
            Self::Winter => "Winter",
        }
    }

    /// Calendar quadrum label for this season.
    pub const fn quadrum(self) -> &'static str {
        match self {
            Self::Spring => "Q1",
            Self::Summer => "Q2",
            Self::Fall => "Q3",
            Self::Winter => "Q4",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Fall,
            Self::Fall => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }
}

/// Tracked stockpile resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Currency on hand.
    Silver,
    /// Edible meals and preserved food.
    Food,
    /// Medical supplies.
    Medicine,
    /// Machine components.
    Components,
}

impl Resource {
    /// Snapshot key for this resource.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Silver => "silver",
            Self::Food => "food",
            Self::Medicine => "medicine",
            Self::Components => "components",
        }
    }
}

/// Per-colonist skill levels surfaced in snapshots.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Skills {
    /// Ranged combat skill.
    pub shooting: u8,
    /// Close combat skill.
    pub melee: u8,
    /// Food preparation skill.
    pub cooking: u8,
}

/// One colonist.
#[derive(Debug, Clone, Serialize)]
pub struct Colonist {
    /// Short display name.
    pub name: String,
    /// Mood percentage, 0-100.
    pub mood: u8,
    /// Overall health percentage, 0-100.
    pub health: u8,
    /// Label of the current activity.
    pub current_activity: String,
    /// Skill levels.
    pub skills: Skills,
    /// Trait labels.
    pub traits: Vec<String>,
}

/// Threat summary surfaced in snapshots.
#[derive(Debug, Clone, Copy, Default)]
struct Threats {
    active_raids: u32,
    manhunter_packs: u32,
    toxic_fallout: bool,
}

impl Threats {
    const fn nearby_enemies(self) -> bool {
        self.active_raids > 0 || self.manhunter_packs > 0
    }
}

/// One entry in the in-game message log.
#[derive(Debug, Clone, Serialize)]
struct GameMessage {
    text: String,
    style: MessageStyle,
    day: u32,
}

/// A loaded colony.
#[derive(Debug, Clone)]
pub struct Colony {
    /// Colony display name.
    pub name: String,
    /// Total colony wealth.
    pub wealth: u32,
    /// Day of the in-game year.
    pub day: u32,
    /// Current season.
    pub season: Season,
    colonists: Vec<Colonist>,
    resources: BTreeMap<Resource, u32>,
    threats: Threats,
    powered_down: bool,
    cold_snap: bool,
    messages: VecDeque<GameMessage>,
}

impl Colony {
    /// A small starting colony used by the demo binary and tests.
    pub fn demo() -> Self {
        let colonist = |name: &str, mood, shooting, melee, cooking, traits: &[&str]| Colonist {
            name: name.to_owned(),
            mood,
            health: 100,
            current_activity: "Idle".to_owned(),
            skills: Skills {
                shooting,
                melee,
                cooking,
            },
            traits: traits.iter().map(|t| (*t).to_owned()).collect(),
        };

        let mut resources = BTreeMap::new();
        resources.insert(Resource::Silver, 800);
        resources.insert(Resource::Food, 120);
        resources.insert(Resource::Medicine, 30);
        resources.insert(Resource::Components, 25);

        Self {
            name: "New Hope".to_owned(),
            wealth: 24_000,
            day: 12,
            season: Season::Spring,
            colonists: vec![
                colonist("Mara", 72, 8, 4, 2, &["Industrious"]),
                colonist("Dusk", 55, 3, 9, 0, &["Brawler", "Night owl"]),
                colonist("Pell", 81, 1, 2, 11, &["Gourmand"]),
            ],
            resources,
            threats: Threats::default(),
            powered_down: false,
            cold_snap: false,
            messages: VecDeque::new(),
        }
    }

    /// Number of colonists.
    pub fn population(&self) -> usize {
        self.colonists.len()
    }

    /// Current stock of one resource.
    pub fn stock(&self, resource: Resource) -> u32 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    /// Number of unresolved hostile raids.
    pub const fn active_raids(&self) -> u32 {
        self.threats.active_raids
    }

    /// Number of retained in-game log messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    fn add_resource(&mut self, resource: Resource, amount: u32) {
        let stock = self.resources.entry(resource).or_insert(0);
        *stock = stock.saturating_add(amount);
    }

    fn hit_moods(&mut self, amount: u8) {
        for colonist in &mut self.colonists {
            colonist.mood = colonist.mood.saturating_sub(amount);
        }
    }

    fn log_message(&mut self, text: String, style: MessageStyle) {
        self.messages.push_back(GameMessage {
            text,
            style,
            day: self.day,
        });
        while self.messages.len() > MESSAGE_LOG_CAP {
            self.messages.pop_front();
        }
    }

    fn end_of_day(&mut self) {
        self.day = self.day.wrapping_add(1);
        if self.day % DAYS_PER_SEASON == 0 {
            self.season = self.season.next();
        }

        // Standing effects resolve on the day boundary.
        self.threats.active_raids = self.threats.active_raids.saturating_sub(1);
        self.threats.manhunter_packs = self.threats.manhunter_packs.saturating_sub(1);
        self.powered_down = false;
        self.cold_snap = false;
    }
}

// ---------------------------------------------------------------------------
// Simulation host
// ---------------------------------------------------------------------------

/// [`Simulation`] implementation hosting at most one loaded [`Colony`].
#[derive(Debug, Default)]
pub struct ColonySim {
    colony: Option<Colony>,
    ticks: u64,
}

impl ColonySim {
    /// A host with no colony loaded; every query answers
    /// `NO_COLONY_LOADED`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A host with the demo colony loaded.
    pub fn with_demo_colony() -> Self {
        Self {
            colony: Some(Colony::demo()),
            ticks: 0,
        }
    }

    /// Load a colony, replacing any current one.
    pub fn load(&mut self, colony: Colony) {
        self.colony = Some(colony);
    }

    /// The loaded colony, if any.
    pub const fn colony(&self) -> Option<&Colony> {
        self.colony.as_ref()
    }

    fn colony_mut(&mut self) -> Result<&mut Colony, ErrorCode> {
        self.colony.as_mut().ok_or(ErrorCode::NoColonyLoaded)
    }
}

impl Simulation for ColonySim {
    fn advance(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % TICKS_PER_DAY == 0 {
            if let Some(colony) = self.colony.as_mut() {
                colony.end_of_day();
            }
        }
    }

    fn colony_loaded(&self) -> bool {
        self.colony.is_some()
    }

    fn snapshot(
        &self,
        include_colonists: bool,
        include_resources: bool,
    ) -> Result<Value, ErrorCode> {
        let colony = self.colony.as_ref().ok_or(ErrorCode::NoColonyLoaded)?;

        let colonists: Value = if include_colonists {
            json!(colony.colonists)
        } else {
            json!([])
        };

        let resources: Value = if include_resources {
            let stocks: serde_json::Map<String, Value> = colony
                .resources
                .iter()
                .map(|(resource, amount)| (resource.as_str().to_owned(), json!(amount)))
                .collect();
            Value::Object(stocks)
        } else {
            json!({})
        };

        Ok(json!({
            "colony": {
                "name": colony.name,
                "wealth": colony.wealth,
                "day": colony.day,
                "season": colony.season.label(),
                "quadrum": colony.season.quadrum(),
            },
            "colonists": colonists,
            "resources": resources,
            "threats": {
                "active_raids": colony.threats.active_raids,
                "nearby_enemies": colony.threats.nearby_enemies(),
                "toxic_fallout": colony.threats.toxic_fallout,
            },
        }))
    }

    fn trigger_event(&mut self, event: ColonyEvent, points: u32) -> Result<(), ErrorCode> {
        let colony = self.colony_mut()?;
        let mut rng = rand::rng();

        match event {
            ColonyEvent::Raid => {
                if colony.colonists.is_empty() {
                    // Nothing to raid; the storyteller refuses.
                    return Err(ErrorCode::EventFailed);
                }
                let budget = if points == 0 { 500 } else { points };
                let raiders = (budget / 100).clamp(1, 50);
                colony.threats.active_raids = colony.threats.active_raids.saturating_add(1);
                colony.hit_moods(rng.random_range(5..=12));
                colony.log_message(
                    format!("A raid of {raiders} hostiles has arrived"),
                    MessageStyle::Negative,
                );
            }
            ColonyEvent::SolarFlare => {
                colony.powered_down = true;
                colony.log_message(
                    "A solar flare has disabled all powered equipment".to_owned(),
                    MessageStyle::Negative,
                );
            }
            ColonyEvent::ColdSnap => {
                colony.cold_snap = true;
                let spoiled = colony.stock(Resource::Food) / 10;
                let stock = colony.resources.entry(Resource::Food).or_insert(0);
                *stock = stock.saturating_sub(spoiled);
                colony.log_message(
                    "A cold snap has settled over the region".to_owned(),
                    MessageStyle::Negative,
                );
            }
            ColonyEvent::Manhunter => {
                colony.threats.manhunter_packs =
                    colony.threats.manhunter_packs.saturating_add(1);
                colony.hit_moods(rng.random_range(2..=6));
                colony.log_message(
                    "A pack of man-hunting animals is circling the colony".to_owned(),
                    MessageStyle::Negative,
                );
            }
            ColonyEvent::CargoPod => {
                let budget = if points == 0 { 500 } else { points };
                let silver = rng.random_range(budget / 10..=budget / 5).max(10);
                colony.add_resource(Resource::Silver, silver);
                colony.wealth = colony.wealth.saturating_add(silver);
                colony.log_message(
                    format!("Cargo pods crashed nearby carrying {silver} silver"),
                    MessageStyle::Positive,
                );
            }
        }

        info!(event = %event, points, "colony event triggered");
        Ok(())
    }

    fn post_message(&mut self, text: &str, style: MessageStyle) -> Result<(), ErrorCode> {
        let colony = self.colony_mut()?;
        if text.trim().is_empty() {
            return Err(ErrorCode::InvalidRequest);
        }
        colony.log_message(text.to_owned(), style);
        Ok(())
    }
}
