/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and music; the core
/// never touches audio itself.

use crate::domain::entity::Archetype;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerJumped,
    PlayerDashed,
    PlayerAttack { combo: u8 },
    PlayerHurt,
    PlayerDied,
    EnemyAttack { archetype: Archetype },
    EnemyHurt { archetype: Archetype },
    EnemyKilled { archetype: Archetype },
    DuwendeVanished,
    /// The boss saw the player for the first time — switch music.
    BossSpotted,
    BossSpecial,
    BossImpact,
    /// Boss died — switch music back.
    BossDefeated,
    LevelCleared,
}
