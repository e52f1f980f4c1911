use crate::error::ScrambleParseError;
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Puzzle a scramble is generated for
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
pub enum CubeSize {
    #[serde(rename = "2x2x2")]
    #[value(name = "2x2x2")]
    #[strum(serialize = "2x2x2")]
    Two,
    #[default]
    #[serde(rename = "3x3x3")]
    #[value(name = "3x3x3")]
    #[strum(serialize = "3x3x3")]
    Three,
    #[serde(rename = "4x4x4")]
    #[value(name = "4x4x4")]
    #[strum(serialize = "4x4x4")]
    Four,
}

impl CubeSize {
    pub fn scramble_length(self) -> usize {
        match self {
            CubeSize::Two | CubeSize::Three => 20,
            CubeSize::Four => 45,
        }
    }

    /// Faces that may be drawn at `position` of a scramble for this puzzle.
    pub fn faces_at(self, position: usize) -> &'static [Face] {
        match self {
            CubeSize::Two => &TWO_BY_TWO_FACES,
            CubeSize::Three => &OUTER_FACES,
            CubeSize::Four if position < FOUR_BY_FOUR_OUTER_PREFIX => &OUTER_FACES,
            CubeSize::Four => &OUTER_AND_WIDE_FACES,
        }
    }
}

impl FromStr for CubeSize {
    type Err = ScrambleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2x2x2" => Ok(CubeSize::Two),
            "3x3x3" => Ok(CubeSize::Three),
            "4x4x4" => Ok(CubeSize::Four),
            other => Err(ScrambleParseError::UnknownCubeSize(other.to_string())),
        }
    }
}

/// Rotation axis shared by a pair of opposite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    RightLeft,
    UpDown,
    FrontBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Face {
    R,
    L,
    U,
    D,
    F,
    B,
    Rw,
    Uw,
    Fw,
}

impl Face {
    /// Outer face a (possibly wide) move turns.
    pub fn base(self) -> Face {
        match self {
            Face::R | Face::Rw => Face::R,
            Face::U | Face::Uw => Face::U,
            Face::F | Face::Fw => Face::F,
            Face::L => Face::L,
            Face::D => Face::D,
            Face::B => Face::B,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Face::R | Face::L | Face::Rw => Axis::RightLeft,
            Face::U | Face::D | Face::Uw => Axis::UpDown,
            Face::F | Face::B | Face::Fw => Axis::FrontBack,
        }
    }

    pub fn is_wide(self) -> bool {
        match self {
            Face::Rw | Face::Uw | Face::Fw => true,
            Face::R | Face::L | Face::U | Face::D | Face::F | Face::B => false,
        }
    }

    /// `Rw` and `R` count as the same face for adjacency purposes.
    pub fn same_face(self, other: Face) -> bool {
        self.base() == other.base()
    }

    pub fn is_opposite(self, other: Face) -> bool {
        self.axis() == other.axis() && !self.same_face(other)
    }
}

impl FromStr for Face {
    type Err = ScrambleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "R" => Face::R,
            "L" => Face::L,
            "U" => Face::U,
            "D" => Face::D,
            "F" => Face::F,
            "B" => Face::B,
            "Rw" => Face::Rw,
            "Uw" => Face::Uw,
            "Fw" => Face::Fw,
            other => return Err(ScrambleParseError::UnknownFace(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    None,
    Prime,
    Double,
}

impl Modifier {
    fn suffix(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Prime => "'",
            Modifier::Double => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: Face,
    pub modifier: Modifier,
}

impl Move {
    pub fn new(face: Face, modifier: Modifier) -> Self {
        Self { face, modifier }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face, self.modifier.suffix())
    }
}

impl FromStr for Move {
    type Err = ScrambleParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (face, modifier) = if let Some(face) = token.strip_suffix('\'') {
            (face, Modifier::Prime)
        } else if let Some(face) = token.strip_suffix('2') {
            (face, Modifier::Double)
        } else {
            (token, Modifier::None)
        };

        if face.ends_with('\'') || face.ends_with('2') {
            return Err(ScrambleParseError::UnknownModifier(token.to_string()));
        }

        Ok(Move::new(face.parse()?, modifier))
    }
}

const OUTER_FACES: [Face; 6] = [Face::R, Face::L, Face::U, Face::D, Face::F, Face::B];

const OUTER_AND_WIDE_FACES: [Face; 9] = [
    Face::R,
    Face::L,
    Face::U,
    Face::D,
    Face::F,
    Face::B,
    Face::Rw,
    Face::Uw,
    Face::Fw,
];

const TWO_BY_TWO_FACES: [Face; 3] = [Face::R, Face::U, Face::F];

const MODIFIERS: [Modifier; 3] = [Modifier::None, Modifier::Prime, Modifier::Double];

/// 4x4x4 scrambles start with this many outer-layer-only moves.
const FOUR_BY_FOUR_OUTER_PREFIX: usize = 20;

/// True when `candidate` would add a redundant turn after `previous`.
///
/// Rejects a repeat of the last face, and an `A B A` sandwich where `B` turns
/// the face opposite `A` (the two `A` turns commute past `B` and merge).
pub fn is_redundant(previous: &[Move], candidate: Move) -> bool {
    let mut recent = previous.iter().rev();
    match (recent.next(), recent.next()) {
        (Some(last), _) if last.face.same_face(candidate.face) => true,
        (Some(last), Some(before)) => {
            last.face.is_opposite(candidate.face) && before.face.same_face(candidate.face)
        }
        _ => false,
    }
}

/// An immutable, legal move sequence for one puzzle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scramble {
    cube_size: CubeSize,
    moves: Vec<Move>,
}

impl Scramble {
    pub fn generate(cube_size: CubeSize) -> Self {
        Self::generate_with(cube_size, &mut rand::thread_rng())
    }

    /// Rejection-sample every position until it is legal. There is no retry cap:
    /// every position has at least one legal draw, so this terminates almost surely.
    pub fn generate_with<R: Rng + ?Sized>(cube_size: CubeSize, rng: &mut R) -> Self {
        let length = cube_size.scramble_length();
        let mut moves = Vec::with_capacity(length);

        while moves.len() < length {
            let faces = cube_size.faces_at(moves.len());
            let next = draw_move(&moves, faces, rng);
            moves.push(next);
        }

        Self { cube_size, moves }
    }

    /// Parse a space-separated scramble for `cube_size`.
    pub fn parse(cube_size: CubeSize, text: &str) -> Result<Self, ScrambleParseError> {
        let moves = text
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<Move>, _>>()?;
        Ok(Self { cube_size, moves })
    }

    pub fn cube_size(&self) -> CubeSize {
        self.cube_size
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Check length, face set and adjacency rules.
    pub fn is_legal(&self) -> bool {
        self.moves.len() == self.cube_size.scramble_length()
            && self.moves.iter().enumerate().all(|(i, mv)| {
                self.cube_size.faces_at(i).contains(&mv.face) && !is_redundant(&self.moves[..i], *mv)
            })
    }
}

impl fmt::Display for Scramble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.moves.iter().join(" "))
    }
}

fn draw_move<R: Rng + ?Sized>(previous: &[Move], faces: &[Face], rng: &mut R) -> Move {
    loop {
        let face = faces[rng.gen_range(0..faces.len())];
        let modifier = MODIFIERS[rng.gen_range(0..MODIFIERS.len())];
        let candidate = Move::new(face, modifier);

        if !is_redundant(previous, candidate) {
            return candidate;
        }
    }
}

/// Generate a fresh scramble string for `cube_size`.
pub fn generate_scramble(cube_size: CubeSize) -> String {
    Scramble::generate(cube_size).to_string()
}
