//! Hands, fingers and the character assignment between them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
    Thumb,
}

impl Finger {
    /// Fixed finger order used for iteration everywhere
    pub const ALL: [Finger; 5] = [
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
        Finger::Thumb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
            Self::Thumb => "thumb",
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A character together with the finger and hand that type it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySlot {
    pub finger: Finger,
    pub hand: Hand,
    pub ch: char,
}

/// Character assignment of one hand, keyed by finger
pub type FingerChars = BTreeMap<Finger, Vec<char>>;

/// Which characters each finger of each hand types.
///
/// Built through [`HandFingerMap::new`], which rejects characters assigned
/// more than once and lowercases everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandFingerMap {
    left: FingerChars,
    right: FingerChars,
}

/// A character assigned to two (hand, finger) slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateChar {
    pub ch: char,
    pub first: (Hand, Finger),
    pub second: (Hand, Finger),
}

impl HandFingerMap {
    pub fn new(left: FingerChars, right: FingerChars) -> Result<Self, DuplicateChar> {
        let normalize = |chars: FingerChars| -> FingerChars {
            chars
                .into_iter()
                .map(|(finger, cs)| (finger, cs.into_iter().flat_map(char::to_lowercase).collect()))
                .collect()
        };
        let map = Self {
            left: normalize(left),
            right: normalize(right),
        };

        let mut seen: BTreeMap<char, (Hand, Finger)> = BTreeMap::new();
        for hand in Hand::ALL {
            for finger in Finger::ALL {
                for &ch in map.chars(hand, finger) {
                    if let Some(&first) = seen.get(&ch) {
                        return Err(DuplicateChar {
                            ch,
                            first,
                            second: (hand, finger),
                        });
                    }
                    seen.insert(ch, (hand, finger));
                }
            }
        }

        Ok(map)
    }

    /// Characters typed by `finger` of `hand`, in configured order
    pub fn chars(&self, hand: Hand, finger: Finger) -> &[char] {
        self.hand(hand)
            .get(&finger)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn hand(&self, hand: Hand) -> &FingerChars {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    /// Every finger of `hand` except `finger`, in finger order, with its characters
    pub fn other_fingers(&self, hand: Hand, finger: Finger) -> Vec<(Finger, &[char])> {
        Finger::ALL
            .iter()
            .filter(|&&f| f != finger)
            .map(|&f| (f, self.chars(hand, f)))
            .collect()
    }

    /// All characters of `hand` concatenated in finger order
    pub fn hand_chars(&self, hand: Hand) -> Vec<char> {
        Finger::ALL
            .iter()
            .flat_map(|&f| self.chars(hand, f).iter().copied())
            .collect()
    }

    pub fn total_chars(&self) -> usize {
        Hand::ALL.iter().map(|&h| self.hand_chars(h).len()).sum()
    }

    /// Look up where `ch` lives
    pub fn locate(&self, ch: char) -> Option<KeySlot> {
        let ch = ch.to_lowercase().next()?;
        Hand::ALL.iter().find_map(|&hand| {
            Finger::ALL
                .iter()
                .find(|&&finger| self.chars(hand, finger).contains(&ch))
                .map(|&finger| KeySlot { finger, hand, ch })
        })
    }
}
