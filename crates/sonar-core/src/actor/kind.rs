use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Classification tag of a tracked actor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    #[strum(serialize = "player")]
    Player,
    #[strum(serialize = "npc")]
    Npc,
    #[strum(serialize = "mesh")]
    Mesh,
    #[strum(serialize = "actor")]
    Generic,
}

impl ActorKind {
    /// Whether the variant carries a health pair.
    pub fn has_health(&self) -> bool {
        matches!(self, ActorKind::Player | ActorKind::Npc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ActorKind::Player.to_string(), "player");
        assert_eq!(ActorKind::Generic.to_string(), "actor");
        let name: &'static str = ActorKind::Npc.into();
        assert_eq!(name, "npc");
    }

    #[test]
    fn test_has_health() {
        assert!(ActorKind::Player.has_health());
        assert!(ActorKind::Npc.has_health());
        assert!(!ActorKind::Mesh.has_health());
        assert!(!ActorKind::Generic.has_health());
    }
}
