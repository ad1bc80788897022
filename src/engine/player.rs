use std::ops::Not;

/// One of the two colours. Red moves first.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Player {
    Red = 0,
    Black = 1,
}

impl Player {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn next(self) -> Player {
        !self
    }

    pub fn notate(self) -> &'static str {
        match self {
            Player::Red => "r",
            Player::Black => "b",
        }
    }
}

/// `next(p) = p XOR 1`.
impl Not for Player {
    type Output = Player;
    fn not(self) -> Player {
        match self {
            Player::Red => Player::Black,
            Player::Black => Player::Red,
        }
    }
}

impl From<u8> for Player {
    fn from(value: u8) -> Self {
        match value {
            0 => Player::Red,
            1 => Player::Black,
            _ => panic!("expected a player bit of 0 or 1, got {value}"),
        }
    }
}

impl TryFrom<&str> for Player {
    type Error = anyhow::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "0" | "r" | "red" => Ok(Player::Red),
            "1" | "b" | "black" => Ok(Player::Black),
            _ => Err(anyhow::anyhow!("invalid player token {value}")),
        }
    }
}
