//! Rank and thread decoding.
//!
//! A rank token is either one of the aggregate names below, a literal rank
//! (`12`), or a rank with a thread suffix (`12.3`). Aggregates are stored as
//! negative sentinels and never carry a thread id.

use crate::core::FormatError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolicRank {
    AllRanks,
    AnyRank,
    RankAverage,
    RankMaximum,
    RankMinimum,
    Unknown,
}

impl SymbolicRank {
    pub const ALL: [SymbolicRank; 6] = [
        Self::AllRanks,
        Self::AnyRank,
        Self::RankAverage,
        Self::RankMaximum,
        Self::RankMinimum,
        Self::Unknown,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Self::AllRanks => "All Ranks",
            Self::AnyRank => "Any Rank",
            Self::RankAverage => "Rank Average",
            Self::RankMaximum => "Rank Maximum",
            Self::RankMinimum => "Rank Minimum",
            Self::Unknown => "Unknown",
        }
    }

    pub fn sentinel(&self) -> i64 {
        match self {
            Self::AllRanks => -1,
            Self::AnyRank => -2,
            Self::RankAverage => -3,
            Self::RankMaximum => -4,
            Self::RankMinimum => -5,
            Self::Unknown => -6,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rank| rank.token() == token)
    }

    /// Aggregate spellings used by files older than 2.0.0.
    pub fn from_legacy_token(token: &str) -> Option<Self> {
        match token {
            "all" => Some(Self::AllRanks),
            "average of all" => Some(Self::RankAverage),
            "max of all" => Some(Self::RankMaximum),
            "min of all" => Some(Self::RankMinimum),
            _ => None,
        }
    }
}

/// Which half of a rank token to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankComponent {
    Rank,
    Thread,
}

/// Decode one component of a rank token.
pub fn decode_rank(token: &str, component: RankComponent) -> Result<Option<i64>, FormatError> {
    if let Some(symbolic) = SymbolicRank::from_token(token) {
        return Ok(match component {
            RankComponent::Rank => Some(symbolic.sentinel()),
            RankComponent::Thread => None,
        });
    }

    let invalid = || FormatError::InvalidRank(token.to_string());

    if is_digits(token) {
        return match component {
            RankComponent::Rank => token.parse::<i64>().map(Some).map_err(|_| invalid()),
            RankComponent::Thread => Ok(None),
        };
    }

    let (rank, thread) = token.split_once('.').ok_or_else(invalid)?;
    if !is_digits(rank) || !is_digits(thread) {
        return Err(invalid());
    }
    let selected = match component {
        RankComponent::Rank => rank,
        RankComponent::Thread => thread,
    };
    selected.parse::<i64>().map(Some).map_err(|_| invalid())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A fully decoded rank as stored with parameters and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RankId {
    pub rank: i64,
    pub thread: Option<i64>,
}

impl RankId {
    pub fn parse(token: &str) -> Result<Self, FormatError> {
        let rank = decode_rank(token, RankComponent::Rank)?
            .ok_or_else(|| FormatError::InvalidRank(token.to_string()))?;
        let thread = decode_rank(token, RankComponent::Thread)?;
        Ok(Self { rank, thread })
    }

    pub fn symbolic(rank: SymbolicRank) -> Self {
        Self {
            rank: rank.sentinel(),
            thread: None,
        }
    }

    pub fn literal(rank: i64) -> Self {
        Self { rank, thread: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_symbolic_ranks() {
        for symbolic in SymbolicRank::ALL {
            assert_eq!(
                decode_rank(symbolic.token(), RankComponent::Rank).unwrap(),
                Some(symbolic.sentinel())
            );
            assert_eq!(decode_rank(symbolic.token(), RankComponent::Thread).unwrap(), None);
        }
        assert_eq!(RankId::parse("Rank Minimum").unwrap().rank, -5);
        assert_eq!(RankId::parse("Unknown").unwrap(), RankId::symbolic(SymbolicRank::Unknown));
    }

    #[test]
    fn test_numeric_rank() {
        assert_eq!(decode_rank("17", RankComponent::Rank).unwrap(), Some(17));
        assert_eq!(decode_rank("17", RankComponent::Thread).unwrap(), None);
    }

    #[test]
    fn test_rank_with_thread() {
        assert_eq!(RankId::parse("3.2").unwrap(), RankId { rank: 3, thread: Some(2) });
    }

    #[test]
    fn test_rejects_other_tokens() {
        for token in ["", "-1", "all ranks", "1.2.3", "1.", ".4", "a.b", "1.x", " 1"] {
            assert!(
                matches!(decode_rank(token, RankComponent::Rank), Err(FormatError::InvalidRank(_))),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_legacy_tokens() {
        assert_eq!(SymbolicRank::from_legacy_token("max of all"), Some(SymbolicRank::RankMaximum));
        assert_eq!(SymbolicRank::from_legacy_token("All Ranks"), None);
    }

    proptest! {
        #[test]
        fn prop_numeric_tokens_decode(rank in 0i64..1_000_000) {
            let token = rank.to_string();
            prop_assert_eq!(decode_rank(&token, RankComponent::Rank).unwrap(), Some(rank));
            prop_assert_eq!(decode_rank(&token, RankComponent::Thread).unwrap(), None);
        }

        #[test]
        fn prop_rank_thread_tokens_decode(rank in 0i64..100_000, thread in 0i64..1024) {
            let token = format!("{}.{}", rank, thread);
            prop_assert_eq!(RankId::parse(&token).unwrap(), RankId { rank, thread: Some(thread) });
        }

        #[test]
        fn prop_alphabetic_tokens_rejected(token in "[a-z ]{1,12}") {
            prop_assume!(SymbolicRank::from_token(&token).is_none());
            prop_assert!(decode_rank(&token, RankComponent::Rank).is_err());
            prop_assert!(decode_rank(&token, RankComponent::Thread).is_err());
        }
    }
}
