//! Position close resolution.
//!
//! Exchanges such as SHFE and INE keep separate today and yesterday
//! buckets per position and require a close order to name the bucket it
//! reduces. The resolver turns a requested close volume into the ordered
//! list of (offset, volume) legs that covers it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trading_core::types::{Direction, Offset, Position};

use crate::config::{ActionConfig, ClosePattern};

/// How a close is split across today and yesterday volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseSplitPolicy {
    /// No split: a single plain close
    Plain,
    /// Close today's volume first, then yesterday's
    TodayFirst,
    /// Close yesterday's volume first
    YesterdayFirst,
}

impl CloseSplitPolicy {
    /// Effective policy for an exchange: the configured pattern where the
    /// exchange keeps today/yesterday buckets, a plain close elsewhere.
    pub fn for_exchange(pattern: ClosePattern, in_today_set: bool) -> Self {
        if in_today_set {
            pattern.into()
        } else {
            CloseSplitPolicy::Plain
        }
    }
}

impl From<ClosePattern> for CloseSplitPolicy {
    fn from(pattern: ClosePattern) -> Self {
        match pattern {
            ClosePattern::Today => CloseSplitPolicy::TodayFirst,
            ClosePattern::Yesterday => CloseSplitPolicy::YesterdayFirst,
        }
    }
}

/// One order's worth of a close plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseLeg {
    pub offset: Offset,
    pub volume: u32,
}

impl CloseLeg {
    pub fn new(offset: Offset, volume: u32) -> Self {
        Self { offset, volume }
    }
}

/// Why a close request could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseWarning {
    #[error("no {direction} position to close")]
    NoPosition { direction: Direction },

    #[error("insufficient {direction} position: requested {requested}, held {available}")]
    InsufficientPosition {
        direction: Direction,
        requested: u32,
        available: u32,
    },
}

/// Ordered close legs, or the warning explaining an empty plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosePlan {
    legs: Vec<CloseLeg>,
    warning: Option<CloseWarning>,
}

impl ClosePlan {
    /// Build a plan from derived legs, dropping zero-volume legs.
    pub fn from_legs(legs: impl IntoIterator<Item = CloseLeg>) -> Self {
        Self {
            legs: legs.into_iter().filter(|leg| leg.volume > 0).collect(),
            warning: None,
        }
    }

    /// An empty plan carrying the reason it is empty.
    pub fn unresolved(warning: CloseWarning) -> Self {
        Self {
            legs: Vec::new(),
            warning: Some(warning),
        }
    }

    /// Legs in submission order.
    pub fn legs(&self) -> &[CloseLeg] {
        &self.legs
    }

    pub fn warning(&self) -> Option<&CloseWarning> {
        self.warning.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Sum of all leg volumes.
    pub fn total_volume(&self) -> u32 {
        self.legs.iter().map(|leg| leg.volume).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CloseLeg> {
        self.legs.iter()
    }
}

impl IntoIterator for ClosePlan {
    type Item = CloseLeg;
    type IntoIter = std::vec::IntoIter<CloseLeg>;

    fn into_iter(self) -> Self::IntoIter {
        self.legs.into_iter()
    }
}

/// Resolve a close request against a position snapshot.
///
/// The snapshot is only read. An absent position or a request larger than
/// the position yields an empty plan with a warning; a zero request yields
/// an empty plan without one.
pub fn resolve(
    position: Option<&Position>,
    direction_to_close: Direction,
    requested_volume: u32,
    exchange_in_today_set: bool,
    policy: CloseSplitPolicy,
) -> ClosePlan {
    let Some(position) = position else {
        return ClosePlan::unresolved(CloseWarning::NoPosition {
            direction: direction_to_close,
        });
    };

    if requested_volume > position.volume {
        return ClosePlan::unresolved(CloseWarning::InsufficientPosition {
            direction: direction_to_close,
            requested: requested_volume,
            available: position.volume,
        });
    }

    if !exchange_in_today_set {
        return ClosePlan::from_legs([CloseLeg::new(Offset::Close, requested_volume)]);
    }

    match policy {
        CloseSplitPolicy::Plain => {
            ClosePlan::from_legs([CloseLeg::new(Offset::Close, requested_volume)])
        }
        CloseSplitPolicy::TodayFirst => {
            let today = position.today_volume().min(requested_volume);
            ClosePlan::from_legs([
                CloseLeg::new(Offset::CloseToday, today),
                CloseLeg::new(Offset::CloseYesterday, requested_volume - today),
            ])
        }
        CloseSplitPolicy::YesterdayFirst => {
            let yesterday = position.yd_volume;
            if yesterday >= requested_volume {
                ClosePlan::from_legs([CloseLeg::new(Offset::CloseYesterday, requested_volume)])
            } else {
                // Leg offsets follow the established split: the first leg is
                // sized by the yesterday bucket but carries CLOSE_TODAY.
                ClosePlan::from_legs([
                    CloseLeg::new(Offset::CloseToday, yesterday),
                    CloseLeg::new(Offset::CloseYesterday, requested_volume - yesterday),
                ])
            }
        }
    }
}

/// Resolver bound to the configured exchange set and close pattern.
#[derive(Debug, Clone)]
pub struct CloseResolver {
    config: ActionConfig,
}

impl CloseResolver {
    pub fn new(config: ActionConfig) -> Self {
        Self { config }
    }

    /// Effective split policy for a position's exchange.
    pub fn policy_for(&self, position: &Position) -> CloseSplitPolicy {
        CloseSplitPolicy::for_exchange(
            self.config.close_pattern,
            self.config.distinguishes_today(position.exchange),
        )
    }

    /// Plan a close of `volume` lots from the `direction_to_close` book.
    pub fn plan(
        &self,
        position: Option<&Position>,
        direction_to_close: Direction,
        volume: u32,
    ) -> ClosePlan {
        let (in_today_set, policy) = match position {
            Some(p) => (self.config.distinguishes_today(p.exchange), self.policy_for(p)),
            None => (false, CloseSplitPolicy::Plain),
        };
        resolve(position, direction_to_close, volume, in_today_set, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::Exchange;

    const ALL_POLICIES: [CloseSplitPolicy; 3] = [
        CloseSplitPolicy::Plain,
        CloseSplitPolicy::TodayFirst,
        CloseSplitPolicy::YesterdayFirst,
    ];

    fn long(total: u32, yd: u32) -> Position {
        Position::new("rb2110", Exchange::Shfe, Direction::Long, total, yd)
    }

    fn legs(plan: &ClosePlan) -> Vec<(Offset, u32)> {
        plan.iter().map(|leg| (leg.offset, leg.volume)).collect()
    }

    #[test]
    fn test_today_first_fits_today_bucket() {
        let position = long(10, 4);
        let plan = resolve(Some(&position), Direction::Long, 5, true, CloseSplitPolicy::TodayFirst);
        assert_eq!(legs(&plan), vec![(Offset::CloseToday, 5)]);
        assert!(plan.warning().is_none());
    }

    #[test]
    fn test_today_first_spills_into_yesterday() {
        let position = long(10, 4);
        let plan = resolve(Some(&position), Direction::Long, 8, true, CloseSplitPolicy::TodayFirst);
        assert_eq!(
            legs(&plan),
            vec![(Offset::CloseToday, 6), (Offset::CloseYesterday, 2)]
        );
    }

    #[test]
    fn test_today_first_with_inconsistent_snapshot() {
        let mut position = long(3, 0);
        position.yd_volume = 5;
        let plan = resolve(Some(&position), Direction::Long, 3, true, CloseSplitPolicy::TodayFirst);
        assert_eq!(legs(&plan), vec![(Offset::CloseYesterday, 3)]);
    }

    #[test]
    fn test_yesterday_first_fits_yesterday_bucket() {
        let position = long(10, 4);
        let plan =
            resolve(Some(&position), Direction::Long, 3, true, CloseSplitPolicy::YesterdayFirst);
        assert_eq!(legs(&plan), vec![(Offset::CloseYesterday, 3)]);
    }

    #[test]
    fn test_yesterday_first_split() {
        let position = long(10, 4);
        let plan =
            resolve(Some(&position), Direction::Long, 7, true, CloseSplitPolicy::YesterdayFirst);
        assert_eq!(
            legs(&plan),
            vec![(Offset::CloseToday, 4), (Offset::CloseYesterday, 3)]
        );
        assert_eq!(plan.total_volume(), 7);
    }

    #[test]
    fn test_outside_today_set_is_single_plain_close() {
        let position = long(10, 4);
        for policy in ALL_POLICIES {
            let plan = resolve(Some(&position), Direction::Long, 7, false, policy);
            assert_eq!(legs(&plan), vec![(Offset::Close, 7)]);
        }
    }

    #[test]
    fn test_insufficient_position_is_empty_with_warning() {
        let position = long(10, 4);
        for policy in ALL_POLICIES {
            for in_today_set in [true, false] {
                let plan = resolve(Some(&position), Direction::Long, 11, in_today_set, policy);
                assert!(plan.is_empty());
                assert_eq!(
                    plan.warning(),
                    Some(&CloseWarning::InsufficientPosition {
                        direction: Direction::Long,
                        requested: 11,
                        available: 10,
                    })
                );
            }
        }
    }

    #[test]
    fn test_absent_position_is_empty_with_warning() {
        for policy in ALL_POLICIES {
            let plan = resolve(None, Direction::Short, 1, true, policy);
            assert!(plan.is_empty());
            assert_eq!(
                plan.warning(),
                Some(&CloseWarning::NoPosition {
                    direction: Direction::Short
                })
            );
        }
    }

    #[test]
    fn test_zero_volume_legs_are_omitted() {
        // No today volume: today-first goes straight to yesterday.
        let position = long(5, 5);
        let plan = resolve(Some(&position), Direction::Long, 3, true, CloseSplitPolicy::TodayFirst);
        assert_eq!(legs(&plan), vec![(Offset::CloseYesterday, 3)]);

        // No yesterday volume: the sized-by-yesterday leg disappears.
        let position = long(5, 0);
        let plan =
            resolve(Some(&position), Direction::Long, 3, true, CloseSplitPolicy::YesterdayFirst);
        assert_eq!(legs(&plan), vec![(Offset::CloseYesterday, 3)]);

        let plan = resolve(Some(&position), Direction::Long, 0, true, CloseSplitPolicy::TodayFirst);
        assert!(plan.is_empty());
        assert!(plan.warning().is_none());
    }

    #[test]
    fn test_legs_always_sum_to_request() {
        for total in 0..=8u32 {
            for yd in 0..=total {
                let position = long(total, yd);
                for requested in 0..=total {
                    for policy in ALL_POLICIES {
                        for in_today_set in [true, false] {
                            let plan =
                                resolve(Some(&position), Direction::Long, requested, in_today_set, policy);
                            assert_eq!(plan.total_volume(), requested);
                            assert!(plan.iter().all(|leg| leg.volume > 0));
                            assert!(plan.legs().len() <= 2);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_resolver_uses_configured_exchanges() {
        let resolver = CloseResolver::new(ActionConfig::default());

        let shfe = long(10, 4);
        assert_eq!(resolver.policy_for(&shfe), CloseSplitPolicy::TodayFirst);
        let plan = resolver.plan(Some(&shfe), Direction::Long, 8);
        assert_eq!(
            legs(&plan),
            vec![(Offset::CloseToday, 6), (Offset::CloseYesterday, 2)]
        );

        let dce = Position::new("m2109", Exchange::Dce, Direction::Long, 10, 4);
        assert_eq!(resolver.policy_for(&dce), CloseSplitPolicy::Plain);
        let plan = resolver.plan(Some(&dce), Direction::Long, 8);
        assert_eq!(legs(&plan), vec![(Offset::Close, 8)]);

        let yesterday = CloseResolver::new(
            ActionConfig::default().with_close_pattern(ClosePattern::Yesterday),
        );
        assert_eq!(yesterday.policy_for(&shfe), CloseSplitPolicy::YesterdayFirst);
    }

    #[test]
    fn test_policy_for_exchange() {
        assert_eq!(
            CloseSplitPolicy::for_exchange(ClosePattern::Yesterday, true),
            CloseSplitPolicy::YesterdayFirst
        );
        assert_eq!(
            CloseSplitPolicy::for_exchange(ClosePattern::Yesterday, false),
            CloseSplitPolicy::Plain
        );
    }
}
