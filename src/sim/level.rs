/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Text format:
///   Line 1 (optional): `# Level Name`
///   Remaining lines: map rows
///
/// ## Tile legend:
///   '#' = earth (solid)          '=' = stone (solid)
///   'P' = player spawn
///   'S' = Sigbin spawn           'D' = Duwende spawn
///   'T' = Tikbalang spawn        ' ' = empty
///
/// Spawn markers sit in empty space; the entity's feet are placed on
/// the bottom edge of the marker tile. The decoded grid and spawn list
/// are immutable once loaded.

use std::path::Path;

use crate::domain::enemy::Enemy;
use crate::domain::entity::Archetype;
use crate::domain::player::Player;
use crate::domain::tile::TileGrid;
use crate::sim::world::{Phase, WorldState};

/// One decoded level: immutable grid plus typed spawn entries.
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

pub struct SpawnEntry {
    pub archetype: Archetype,
    pub tile_x: usize,
    pub tile_y: usize,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the level at `index` into the world. Past the last level, the
/// game is complete.
pub fn load_level(world: &mut WorldState, index: usize, levels_dir: &Path) {
    let levels = load_all(levels_dir);

    if index >= levels.len() {
        world.phase = Phase::GameComplete;
        return;
    }

    let def = &levels[index];
    world.level_index = index;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();

    let (grid, player_spawn, spawns) = decode(&def.rows);
    world.grid = grid;

    let (px, py) = player_spawn.unwrap_or((1, 1));
    world.player = Player::spawn(px, py);

    world.enemies = spawns
        .iter()
        .map(|s| Enemy::spawn(s.archetype, s.tile_x, s.tile_y))
        .collect();

    world.tick = 0;
    world.clock_ms = 0;
    world.phase = Phase::Playing;
    world.anim_tick = 0;
    world.camera.center_on(world.player.hitbox.center_x(), world.grid.width_px());
    world.set_message(&def.name, 80);
}

pub fn level_count(levels_dir: &Path) -> usize {
    load_all(levels_dir).len()
}

/// Decode map rows into a grid, the player spawn and the enemy spawn
/// list.
pub fn decode(rows: &[String]) -> (TileGrid, Option<(usize, usize)>, Vec<SpawnEntry>) {
    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut cells = vec![vec![0u8; width]; height];
    let mut player_spawn = None;
    let mut spawns = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            match ch {
                '#' => cells[y][x] = 1,
                '=' => cells[y][x] = 2,
                'P' => player_spawn = Some((x, y)),
                'S' => spawns.push(SpawnEntry { archetype: Archetype::Sigbin, tile_x: x, tile_y: y }),
                'D' => spawns.push(SpawnEntry { archetype: Archetype::Duwende, tile_x: x, tile_y: y }),
                'T' => spawns.push(SpawnEntry { archetype: Archetype::Tikbalang, tile_x: x, tile_y: y }),
                _ => {}
            }
        }
    }

    (TileGrid::new(cells), player_spawn, spawns)
}

// ══════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════

fn load_all(levels_dir: &Path) -> Vec<LevelDef> {
    let from_dir = load_from_directory(levels_dir);
    if !from_dir.is_empty() {
        return from_dir;
    }
    embedded_levels()
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut paths: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |x| x == "txt"))
            .collect(),
        Err(_) => return vec![],
    };
    paths.sort();

    let mut levels = Vec::new();
    for path in paths {
        let Ok(text) = std::fs::read_to_string(&path) else { continue };
        if let Some(def) = parse_level(&text, &path) {
            levels.push(def);
        }
    }
    levels
}

fn parse_level(text: &str, path: &Path) -> Option<LevelDef> {
    let mut name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut rows = Vec::new();

    for line in text.lines() {
        if let Some(title) = line.strip_prefix('#').filter(|_| rows.is_empty() && line.starts_with("# ")) {
            name = title.trim().to_string();
            continue;
        }
        rows.push(line.to_string());
    }

    // Trim trailing blank lines
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return None;
    }
    Some(LevelDef { name, rows })
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

fn embedded(name: &str, map: &str) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.lines().skip(1).map(|l| l.to_string()).collect(),
    }
}

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        embedded("The Forest Edge", LEVEL_1),
        embedded("Duwende Mounds", LEVEL_2),
        embedded("The Tikbalang's Ridge", LEVEL_3),
    ]
}

const LEVEL_1: &str = "
=                                                  =
=                                                  =
=                                                  =
=                                                  =
=                                                  =
=                                                  =
=                 ####                             =
=                                    S             =
=         ###                 ###########          =
=                                                  =
=   P              S                          S    =
=  ###        #######################        ###   =
=                                                  =
====================================================";

const LEVEL_2: &str = "
=                                                  =
=                                                  =
=                                                  =
=               D                                  =
=          #########                               =
=                                                  =
=                            D                     =
=       S              ############                =
=   #########                                      =
=                                         D        =
=   P                 S              #########     =
=  ######      ###############                     =
=                                          S       =
====================================================";

const LEVEL_3: &str = "
=                                                  =
=                                                  =
=                                                  =
=                                                  =
=          ####                 ####               =
=                                                  =
=                                                  =
=                    ######                        =
=                                                  =
=                                                  =
=   P          S                        T          =
=  ####################################################
=                                                  =
====================================================";

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reads_tiles_and_spawns() {
        let rows: Vec<String> = vec![
            "=   =".into(),
            "  P  ".into(),
            " S D ".into(),
            "#####".into(),
        ];
        let (grid, player, spawns) = decode(&rows);
        assert_eq!(grid.width_tiles(), 5);
        assert_eq!(grid.height_tiles(), 4);
        assert!(grid.is_tile_solid(0, 0));
        assert!(grid.is_tile_solid(2, 3));
        assert!(!grid.is_tile_solid(2, 1));
        assert_eq!(player, Some((2, 1)));
        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[0].archetype, Archetype::Sigbin);
        assert_eq!(spawns[0].tile_x, 1);
        assert_eq!(spawns[1].archetype, Archetype::Duwende);
    }

    #[test]
    fn embedded_levels_decode_cleanly() {
        for def in embedded_levels() {
            let (grid, player, spawns) = decode(&def.rows);
            assert!(grid.width_tiles() > 0, "{}", def.name);
            assert!(player.is_some(), "{} has no player spawn", def.name);
            assert!(!spawns.is_empty(), "{} has no enemies", def.name);
        }
    }

    #[test]
    fn boss_level_contains_tikbalang() {
        let levels = embedded_levels();
        let (_, _, spawns) = decode(&levels[2].rows);
        assert!(spawns.iter().any(|s| s.archetype == Archetype::Tikbalang));
    }

    #[test]
    fn parse_level_reads_title_and_trims() {
        let text = "# My Stage\n=   =\n#####\n\n\n";
        let def = parse_level(text, Path::new("x.txt")).unwrap();
        assert_eq!(def.name, "My Stage");
        assert_eq!(def.rows.len(), 2);
    }
}
