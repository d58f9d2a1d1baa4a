//! Dominant-justification scoring.
//!
//! A document carries one counter per moral framework. The dominant justification is the
//! framework with the highest counter; ties go to the framework listed first in
//! [`JustificationPoints::PRIORITY`], and a document with no points at all is `UNCHECKED`.

use crate::labels::Justification;
use serde::{Deserialize, Serialize};

/// The six justification counters of a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JustificationPoints {
    pub auth: u32,
    pub care: u32,
    pub loyal: u32,
    pub fair: u32,
    pub pur: u32,
    pub non: u32,
}

impl JustificationPoints {
    /// Scored frameworks in tie-break order. This order is observable behaviour.
    pub const PRIORITY: [Justification; 6] = [
        Justification::Auth,
        Justification::Care,
        Justification::Loyal,
        Justification::Fair,
        Justification::Pur,
        Justification::Non,
    ];

    /// Counter for `justification`, or `None` for [`Justification::Unchecked`].
    pub fn get(&self, justification: Justification) -> Option<u32> {
        match justification {
            Justification::Auth => Some(self.auth),
            Justification::Care => Some(self.care),
            Justification::Loyal => Some(self.loyal),
            Justification::Fair => Some(self.fair),
            Justification::Pur => Some(self.pur),
            Justification::Non => Some(self.non),
            Justification::Unchecked => None,
        }
    }

    /// Counters paired with their framework, in priority order.
    pub fn ranked(&self) -> [(Justification, u32); 6] {
        Self::PRIORITY.map(|j| (j, self.get(j).unwrap_or_default()))
    }

    pub fn is_empty(&self) -> bool {
        self.ranked().iter().all(|(_, points)| *points == 0)
    }

    /// Returns the dominant justification.
    pub fn dominant(&self) -> Justification {
        let mut best = Justification::Unchecked;
        let mut best_points = 0;
        for (justification, points) in self.ranked() {
            // Strictly greater keeps the earliest label on ties.
            if points > best_points {
                best = justification;
                best_points = points;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: [u32; 6]) -> JustificationPoints {
        let [auth, care, loyal, fair, pur, non] = values;
        JustificationPoints {
            auth,
            care,
            loyal,
            fair,
            pur,
            non,
        }
    }

    #[test]
    fn test_all_zero_is_unchecked() {
        assert_eq!(JustificationPoints::default().dominant(), Justification::Unchecked);
        assert!(JustificationPoints::default().is_empty());
    }

    #[test]
    fn test_single_maximum_wins() {
        assert_eq!(points([1, 0, 0, 7, 2, 0]).dominant(), Justification::Fair);
        assert_eq!(points([0, 0, 0, 0, 0, 1]).dominant(), Justification::Non);
    }

    #[test]
    fn test_auth_care_tie_resolves_to_auth() {
        assert_eq!(points([3, 3, 0, 0, 0, 0]).dominant(), Justification::Auth);
    }

    #[test]
    fn test_every_tie_resolves_to_earliest_label() {
        let priority = JustificationPoints::PRIORITY;
        for first in 0..priority.len() {
            for second in (first + 1)..priority.len() {
                let mut values = [0u32; 6];
                values[first] = 5;
                values[second] = 5;
                assert_eq!(
                    points(values).dominant(),
                    priority[first],
                    "tie between {} and {}",
                    priority[first],
                    priority[second]
                );
            }
        }
    }

    #[test]
    fn test_full_tie_resolves_to_auth() {
        assert_eq!(points([4; 6]).dominant(), Justification::Auth);
    }

    #[test]
    fn test_get_unchecked_has_no_counter() {
        assert_eq!(points([1, 2, 3, 4, 5, 6]).get(Justification::Unchecked), None);
        assert_eq!(points([1, 2, 3, 4, 5, 6]).get(Justification::Pur), Some(5));
    }
}
