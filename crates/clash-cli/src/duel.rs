//! JSON match files.
//!
//! A match file lists the fighters and, optionally, the seed and time limit:
//!
//! ```json
//! {
//!   "seed": 7,
//!   "fighters": [
//!     { "name": "Red", "team": 0, "position": [0.0, 0.0], "archetype": "aggressive" },
//!     { "name": "Blue", "team": 1, "position": [4.0, 0.0], "difficulty": "hard" }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use clash_core::ai::{AiProfile, Archetype, Difficulty};
use serde::{Deserialize, Serialize};

/// One AI fighter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FighterSetup {
    /// Display name.
    pub name: String,
    /// Team number; fighters never hit teammates.
    #[serde(default)]
    pub team: u32,
    /// Spawn position.
    #[serde(default)]
    pub position: [f32; 2],
    /// Play style preset.
    #[serde(default)]
    pub archetype: Archetype,
    /// Skill preset applied on top of the play style.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Full profile; replaces the presets when given.
    #[serde(default)]
    pub profile: Option<AiProfile>,
}

impl FighterSetup {
    /// A preset fighter.
    pub fn preset(name: &str, team: u32, x: f32, archetype: Archetype, difficulty: Difficulty) -> Self {
        Self {
            name: name.to_string(),
            team,
            position: [x, 0.0],
            archetype,
            difficulty,
            profile: None,
        }
    }

    /// The decision parameters this fighter runs with.
    pub fn resolve_profile(&self) -> AiProfile {
        self.profile.clone().unwrap_or_else(|| {
            AiProfile::archetype(self.archetype).with_difficulty(self.difficulty)
        })
    }
}

/// A whole match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelSetup {
    /// Master seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Time limit in simulated seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Fighters in spawn order.
    pub fighters: Vec<FighterSetup>,
}

fn default_seed() -> u64 {
    42
}

fn default_max_duration() -> f32 {
    180.0
}

impl DuelSetup {
    /// Two fighters four units apart.
    pub fn pair(red: FighterSetup, blue: FighterSetup) -> Self {
        Self {
            seed: default_seed(),
            max_duration_secs: default_max_duration(),
            fighters: vec![red, blue],
        }
    }

    /// Loads and checks a match file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read match file {}", path.display()))?;
        let setup: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse match file {}", path.display()))?;
        setup.validate()?;
        Ok(setup)
    }

    /// Requires two teams and valid profiles.
    pub fn validate(&self) -> Result<()> {
        let mut teams: Vec<u32> = self.fighters.iter().map(|f| f.team).collect();
        teams.sort_unstable();
        teams.dedup();
        if teams.len() < 2 {
            bail!("a match needs fighters on at least two teams");
        }
        if !(self.max_duration_secs.is_finite() && self.max_duration_secs > 0.0) {
            bail!("max_duration_secs must be positive, got {}", self.max_duration_secs);
        }
        for fighter in &self.fighters {
            fighter
                .resolve_profile()
                .validate()
                .with_context(|| format!("invalid profile for fighter {}", fighter.name))?;
        }
        Ok(())
    }
}
