//! Built-in Sokoban levels and their parser.
//!
//! Codes: 0 wall, 1 box, 2 target, 3 player, 4 box on target, 5 floor, 6 player on target.
//! Rows may be ragged; short rows are padded with wall on the right.

use std::collections::BTreeSet;

use thiserror::Error;

pub type Pos = (u32, u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("no level {0}")]
    UnknownLevel(usize),
    #[error("level has no rows")]
    Empty,
    #[error("unknown cell code {code} at ({x}, {y})")]
    UnknownCode { code: u8, x: u32, y: u32 },
    #[error("level needs exactly one player, found {0}")]
    PlayerCount(usize),
    #[error("level has no boxes")]
    NoBoxes,
    #[error("{boxes} boxes but {targets} targets")]
    BoxTargetMismatch { boxes: usize, targets: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTag {
    Wall,
    Floor,
    Target,
}

/// A parsed level: static tags plus the starting overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelData {
    pub width: u32,
    pub height: u32,
    pub tags: Vec<CellTag>,
    pub player: Pos,
    pub boxes: BTreeSet<Pos>,
}

impl LevelData {
    pub fn tag(&self, (x, y): Pos) -> CellTag {
        if x >= self.width || y >= self.height {
            return CellTag::Wall;
        }
        self.tags[(y * self.width + x) as usize]
    }

    pub fn targets(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(move |&p| self.tag(p) == CellTag::Target)
    }
}

pub fn level_count() -> usize {
    LEVELS.len()
}

/// Raw rows of level `id` (1-based).
pub fn raw_level(id: usize) -> Option<&'static [&'static [u8]]> {
    id.checked_sub(1).and_then(|i| LEVELS.get(i)).copied()
}

pub fn parse_level(rows: &[&[u8]]) -> Result<LevelData, LevelError> {
    let height = rows.len() as u32;
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
    if height == 0 || width == 0 {
        return Err(LevelError::Empty);
    }
    let mut tags = vec![CellTag::Wall; (width * height) as usize];
    let mut players = Vec::new();
    let mut boxes = BTreeSet::new();
    for (y, row) in rows.iter().enumerate() {
        for (x, &code) in row.iter().enumerate() {
            let p = (x as u32, y as u32);
            let tag = match code {
                0 => CellTag::Wall,
                1 => {
                    boxes.insert(p);
                    CellTag::Floor
                }
                2 => CellTag::Target,
                3 => {
                    players.push(p);
                    CellTag::Floor
                }
                4 => {
                    boxes.insert(p);
                    CellTag::Target
                }
                5 => CellTag::Floor,
                6 => {
                    players.push(p);
                    CellTag::Target
                }
                code => return Err(LevelError::UnknownCode { code, x: p.0, y: p.1 }),
            };
            tags[(p.1 * width + p.0) as usize] = tag;
        }
    }
    let &[player] = players.as_slice() else {
        return Err(LevelError::PlayerCount(players.len()));
    };
    if boxes.is_empty() {
        return Err(LevelError::NoBoxes);
    }
    let targets = tags.iter().filter(|t| **t == CellTag::Target).count();
    if targets != boxes.len() {
        return Err(LevelError::BoxTargetMismatch {
            boxes: boxes.len(),
            targets,
        });
    }
    Ok(LevelData {
        width,
        height,
        tags,
        player,
        boxes,
    })
}

pub fn load_level(id: usize) -> Result<LevelData, LevelError> {
    let rows = raw_level(id).ok_or(LevelError::UnknownLevel(id))?;
    parse_level(rows)
}

static LEVELS: [&[&[u8]]; 20] = [
    LEVEL_1,
    LEVEL_2,
    LEVEL_3,
    LEVEL_4,
    LEVEL_5,
    LEVEL_6,
    LEVEL_7,
    LEVEL_8,
    LEVEL_9,
    LEVEL_10,
    LEVEL_11,
    LEVEL_12,
    LEVEL_13,
    LEVEL_14,
    LEVEL_15,
    LEVEL_16,
    LEVEL_17,
    LEVEL_18,
    LEVEL_19,
    LEVEL_20,
];

const LEVEL_1: &[&[u8]] = &[
    &[0, 0, 0, 0, 0],
    &[0, 5, 5, 3, 0],
    &[0, 2, 1, 5, 0],
    &[0, 0, 0, 0, 0],
];

const LEVEL_2: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 5, 5, 0],
    &[0, 5, 1, 1, 5, 0],
    &[0, 2, 3, 5, 2, 0],
    &[0],
];

const LEVEL_3: &[&[u8]] = &[
    &[0],
    &[0, 2, 5, 5, 0, 5, 0],
    &[0, 5, 1, 5, 5, 5, 0],
    &[0, 5, 0, 1, 0, 5, 0],
    &[0, 2, 5, 5, 3, 5, 0],
    &[0],
];

const LEVEL_4: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 5, 5, 5, 0],
    &[0, 2, 3, 1, 5, 5, 0],
    &[0, 0, 0, 5, 1, 2, 0],
    &[0, 2, 0, 0, 1, 5, 0],
    &[0, 5, 0, 5, 2, 5, 0],
    &[0, 1, 5, 4, 1, 1, 2, 0],
    &[0, 5, 5, 5, 2, 5, 5, 0],
    &[0],
];

const LEVEL_5: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 2, 5, 0],
    &[0, 0, 0, 5, 5, 0],
    &[0, 0, 0, 4, 3, 5, 5, 0],
    &[0, 0, 0, 5, 5, 1, 5, 0],
    &[0, 0, 0, 5, 5, 0],
    &[0],
];

const LEVEL_6: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 5, 5, 0],
    &[0, 5, 5, 5, 5, 5, 1, 5, 0],
    &[0, 5, 0, 5, 5, 0, 1, 5, 0],
    &[0, 5, 2, 5, 2, 0, 3, 5, 0],
    &[0],
];

const LEVEL_7: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 5, 5, 5, 0],
    &[0, 5, 1, 5, 2, 5, 0],
    &[0, 5, 0, 3, 0, 5, 0],
    &[0, 5, 2, 5, 1, 5, 0],
    &[0, 5, 5, 5, 0],
    &[0],
];

const LEVEL_8: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 5, 5, 5, 5, 0],
    &[0, 0, 0, 1, 1, 5, 5, 0],
    &[0, 5, 5, 2, 0, 5, 5, 0],
    &[0, 3, 5, 2, 2, 1, 5, 0],
    &[0, 0, 0, 0, 5, 5, 5, 0],
    &[0],
];

const LEVEL_9: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 5, 5, 0],
    &[0, 5, 0, 3, 5, 0],
    &[0, 5, 1, 4, 5, 0],
    &[0, 5, 2, 4, 5, 0],
    &[0, 5, 5, 5, 5, 0],
    &[0],
];

const LEVEL_10: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 5, 5, 5, 5, 0],
    &[0, 5, 1, 5, 1, 5, 5, 0],
    &[0, 0, 5, 0, 0, 5, 0],
    &[0, 5, 2, 5, 5, 2, 5, 0],
    &[0, 5, 5, 5, 3, 5, 5, 0],
    &[0],
];

const LEVEL_11: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 2, 5, 5, 0],
    &[0, 5, 1, 0, 1, 5, 0],
    &[0, 2, 5, 3, 5, 2, 0],
    &[0, 5, 1, 0, 1, 5, 0],
    &[0, 5, 5, 2, 5, 5, 0],
    &[0],
];

const LEVEL_12: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 5, 5, 5, 0],
    &[0, 0, 0, 1, 5, 5, 0],
    &[0, 0, 0, 5, 5, 1, 0],
    &[0, 5, 5, 1, 5, 1, 5, 0],
    &[0, 2, 2, 5, 3, 5, 5, 0],
    &[0, 2, 2, 0],
    &[0],
];

const LEVEL_13: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 5, 0, 5, 5, 0],
    &[0, 5, 1, 5, 5, 5, 1, 0],
    &[0, 5, 5, 0, 0, 5, 5, 0],
    &[0, 2, 5, 5, 3, 5, 2, 0],
    &[0],
];

const LEVEL_14: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 5, 0, 5, 5, 5, 0],
    &[0, 5, 1, 5, 5, 5, 1, 5, 0],
    &[0, 5, 5, 0, 0, 0, 5, 5, 0],
    &[0, 5, 2, 5, 3, 5, 2, 5, 0],
    &[0, 5, 5, 5, 1, 5, 5, 5, 0],
    &[0, 5, 5, 5, 2, 5, 5, 5, 0],
    &[0],
];

const LEVEL_15: &[&[u8]] = &[
    &[0],
    &[0, 0, 0, 2, 5, 5, 5, 0],
    &[0, 0, 0, 1, 0, 0, 5, 0],
    &[0, 5, 5, 3, 5, 1, 2, 0],
    &[0, 5, 1, 5, 5, 0],
    &[0, 2, 5, 5, 0],
    &[0],
];

const LEVEL_16: &[&[u8]] = &[
    &[0],
    &[0, 2, 5, 5, 5, 2, 0],
    &[0, 5, 1, 1, 1, 5, 0],
    &[0, 5, 5, 3, 5, 5, 0],
    &[0, 2, 5, 5, 5, 5, 0],
    &[0],
];

const LEVEL_17: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 0, 5, 5, 5, 0],
    &[0, 5, 1, 5, 5, 1, 5, 0],
    &[0, 5, 5, 0, 2, 5, 5, 0],
    &[0, 0, 5, 0, 2, 0, 5, 0],
    &[0, 3, 5, 5, 5, 1, 5, 0],
    &[0, 5, 5, 5, 2, 5, 0],
    &[0],
];

const LEVEL_18: &[&[u8]] = &[
    &[0],
    &[0, 2, 5, 5, 0, 5, 5, 2, 0],
    &[0, 5, 1, 5, 5, 5, 1, 5, 0],
    &[0, 0, 5, 5, 3, 5, 5, 0],
    &[0, 5, 1, 5, 5, 5, 1, 5, 0],
    &[0, 2, 5, 5, 0, 5, 5, 2, 0],
    &[0],
];

const LEVEL_19: &[&[u8]] = LEVEL_18;

const LEVEL_20: &[&[u8]] = &[
    &[0],
    &[0, 5, 5, 5, 0, 0, 5, 5, 5, 0],
    &[0, 5, 1, 5, 5, 5, 5, 1, 5, 0],
    &[0, 5, 5, 0, 2, 2, 0, 5, 5, 0],
    &[0, 3, 5, 5, 5, 2, 5, 5, 5, 0],
    &[0, 5, 5, 0, 5, 5, 0, 5, 5, 0],
    &[0, 5, 5, 5, 5, 5, 5, 1, 5, 0],
    &[0, 5, 5, 5, 0, 0, 5, 5, 5, 0],
    &[0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_level_parses() {
        for id in 1..=level_count() {
            let level = load_level(id).unwrap_or_else(|e| panic!("level {id}: {e}"));
            assert_eq!(level.targets().count(), level.boxes.len());
        }
    }

    #[test]
    fn duplicate_levels_are_kept() {
        assert_eq!(level_count(), 20);
        assert_eq!(raw_level(18), raw_level(19));
    }

    #[test]
    fn ragged_rows_are_padded_with_wall() {
        let level = load_level(2).unwrap();
        assert_eq!(level.width, 6);
        assert_eq!(level.tag((5, 0)), CellTag::Wall);
        assert_eq!(level.tag((1, 3)), CellTag::Target);
    }

    #[test]
    fn invalid_data_is_reported() {
        assert_eq!(load_level(0), Err(LevelError::UnknownLevel(0)));
        assert_eq!(load_level(21), Err(LevelError::UnknownLevel(21)));
        assert_eq!(parse_level(&[]), Err(LevelError::Empty));
        assert_eq!(
            parse_level(&[&[0, 9, 0]]),
            Err(LevelError::UnknownCode { code: 9, x: 1, y: 0 })
        );
        assert_eq!(parse_level(&[&[5, 1, 2]]), Err(LevelError::PlayerCount(0)));
        assert_eq!(
            parse_level(&[&[3, 1, 2, 2]]),
            Err(LevelError::BoxTargetMismatch {
                boxes: 1,
                targets: 2
            })
        );
        assert_eq!(parse_level(&[&[3, 5, 5]]), Err(LevelError::NoBoxes));
    }
}
