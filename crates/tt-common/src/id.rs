//! Detector channel identity types.
//!
//! A channel is the input port of the time tagger a detector is wired to.
//! Channel numbers come straight from the acquisition files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Detector channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChannelId {
    fn from(ch: u32) -> Self {
        ChannelId(ch)
    }
}

impl FromStr for ChannelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(ChannelId)
            .map_err(|e| format!("invalid channel id '{}': {}", s, e))
    }
}

/// An ordered pair of channels: `a` is the reference, `b` the target.
///
/// Text form is `A,B` (e.g. `2,3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelPair {
    pub a: ChannelId,
    pub b: ChannelId,
}

impl ChannelPair {
    pub fn new(a: impl Into<ChannelId>, b: impl Into<ChannelId>) -> Self {
        ChannelPair {
            a: a.into(),
            b: b.into(),
        }
    }

    /// The same pair with reference and target exchanged.
    pub fn swapped(self) -> Self {
        ChannelPair {
            a: self.b,
            b: self.a,
        }
    }
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.a, self.b)
    }
}

impl FromStr for ChannelPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let mut parts = trimmed.split(',');
        let a = parts
            .next()
            .ok_or_else(|| format!("invalid channel pair '{}'", s))?;
        let b = parts
            .next()
            .ok_or_else(|| format!("invalid channel pair '{}': expected A,B", s))?;
        if parts.next().is_some() {
            return Err(format!("invalid channel pair '{}': expected A,B", s));
        }
        Ok(ChannelPair {
            a: a.parse()?,
            b: b.parse()?,
        })
    }
}

impl From<(u32, u32)> for ChannelPair {
    fn from((a, b): (u32, u32)) -> Self {
        ChannelPair::new(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_parses_with_whitespace() {
        assert_eq!(" 3 ".parse::<ChannelId>().unwrap(), ChannelId(3));
        assert!("x".parse::<ChannelId>().is_err());
        assert!("-1".parse::<ChannelId>().is_err());
    }

    #[test]
    fn channel_pair_round_trips_text_form() {
        let pair: ChannelPair = "2,3".parse().unwrap();
        assert_eq!(pair, ChannelPair::new(2, 3));
        assert_eq!(pair.to_string(), "(2,3)");
        assert_eq!("(2,3)".parse::<ChannelPair>().unwrap(), pair);
    }

    #[test]
    fn channel_pair_rejects_wrong_arity() {
        assert!("2".parse::<ChannelPair>().is_err());
        assert!("1,2,3".parse::<ChannelPair>().is_err());
    }

    #[test]
    fn channel_pair_swap() {
        assert_eq!(ChannelPair::new(1, 3).swapped(), ChannelPair::new(3, 1));
    }

    #[test]
    fn channel_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&ChannelId(7)).unwrap(), "7");
    }
}
