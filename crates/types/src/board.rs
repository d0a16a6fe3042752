use crate::hand::Hand;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Position {
    #[default]
    North,
    East,
    South,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partnership {
    NS,
    EW,
}

impl Partnership {
    pub fn contains(self, pos: Position) -> bool {
        pos.partnership() == self
    }

    pub fn idx(self) -> usize {
        match self {
            Partnership::NS => 0,
            Partnership::EW => 1,
        }
    }
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::North,
        Position::East,
        Position::South,
        Position::West,
    ];

    pub fn partnership(self) -> Partnership {
        match self {
            Position::North | Position::South => Partnership::NS,
            Position::East | Position::West => Partnership::EW,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Position::North => Position::East,
            Position::East => Position::South,
            Position::South => Position::West,
            Position::West => Position::North,
        }
    }

    pub fn idx(self) -> usize {
        match self {
            Position::North => 0,
            Position::East => 1,
            Position::South => 2,
            Position::West => 3,
        }
    }

    pub fn partner(self) -> Self {
        match self {
            Position::North => Position::South,
            Position::South => Position::North,
            Position::East => Position::West,
            Position::West => Position::East,
        }
    }

    /// Right-hand opponent (previous in clockwise bidding order).
    pub fn rho(self) -> Self {
        self.partner().next()
    }

    pub fn to_char(self) -> char {
        match self {
            Position::North => 'N',
            Position::East => 'E',
            Position::South => 'S',
            Position::West => 'W',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(Position::North),
            'E' => Some(Position::East),
            'S' => Some(Position::South),
            'W' => Some(Position::West),
            _ => None,
        }
    }

    /// Seat number (1-4) counted from the dealer.
    pub fn seat_from(self, dealer: Position) -> u8 {
        ((self.idx() + 4 - dealer.idx()) % 4) as u8 + 1
    }

    pub fn dealer_from_board_number(board_number: u32) -> Self {
        let index = (board_number + 3) % 4;
        Position::ALL[index as usize]
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), s.trim().len()) {
            (Some(c), 1) => Position::from_char(c).ok_or(()),
            _ => match s.trim().to_ascii_lowercase().as_str() {
                "north" => Ok(Position::North),
                "east" => Ok(Position::East),
                "south" => Ok(Position::South),
                "west" => Ok(Position::West),
                _ => Err(()),
            },
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Vulnerability {
    #[default]
    None,
    NS,
    EW,
    Both,
}

impl Vulnerability {
    pub fn is_vulnerable(self, pos: Position) -> bool {
        match self {
            Vulnerability::None => false,
            Vulnerability::NS => pos == Position::North || pos == Position::South,
            Vulnerability::EW => pos == Position::East || pos == Position::West,
            Vulnerability::Both => true,
        }
    }

    /// Whether the opponents of `pos` are vulnerable.
    pub fn opponents_vulnerable(self, pos: Position) -> bool {
        self.is_vulnerable(pos.next())
    }

    pub fn from_board_number(board_number: u32) -> Self {
        // http://www.jazclass.aust.com/bridge/scoring/score11.htm
        match board_number % 16 {
            1 | 8 | 11 | 14 => Vulnerability::None,
            2 | 5 | 12 | 15 => Vulnerability::NS,
            3 | 6 | 9 | 0 => Vulnerability::EW,
            4 | 7 | 10 | 13 => Vulnerability::Both,
            _ => unreachable!(),
        }
    }
}

impl FromStr for Vulnerability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "-" | "love" => Ok(Vulnerability::None),
            "ns" | "n-s" => Ok(Vulnerability::NS),
            "ew" | "e-w" => Ok(Vulnerability::EW),
            "both" | "all" => Ok(Vulnerability::Both),
            _ => Err(()),
        }
    }
}

/// A dealt board: dealer, vulnerability and up to four hands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub dealer: Position,
    pub vulnerability: Vulnerability,
    pub hands: HashMap<Position, Hand>,
}

impl Board {
    pub fn new(
        dealer: Position,
        vulnerability: Vulnerability,
        hands: HashMap<Position, Hand>,
    ) -> Self {
        Self {
            dealer,
            vulnerability,
            hands,
        }
    }

    pub fn get_hand(&self, pos: Position) -> Option<&Hand> {
        self.hands.get(&pos)
    }
}
