//! Name-pattern rules deciding which actors are tracked.

use crate::actor::ActorKind;
use crate::config::Config;

/// Ordered classification rules; the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierRules {
    pub player_type_name: String,
    pub npc_prefixes: Vec<String>,
    pub npc: Vec<String>,
    pub mesh: Vec<String>,
    /// Track actors that match nothing else
    pub track_all: bool,
}

impl ClassifierRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            player_type_name: config.actors.player_type_name.clone(),
            npc_prefixes: config.actors.npc_prefixes.clone(),
            npc: config.actors.npc.clone(),
            mesh: config.actors.mesh.clone(),
            track_all: config.debug.actors,
        }
    }

    pub fn classify(&self, address: u64, name: &str, local_pawn: u64) -> Option<ActorKind> {
        if name == self.player_type_name && address != local_pawn {
            return Some(ActorKind::Player);
        }

        let npc_prefix = self
            .npc_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()));
        if npc_prefix && contains_any(name, &self.npc) {
            return Some(ActorKind::Npc);
        }

        if contains_any(name, &self.mesh) {
            return Some(ActorKind::Mesh);
        }

        self.track_all.then_some(ActorKind::Generic)
    }
}

pub(crate) fn contains_any(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| name.contains(pattern.as_str()))
}
