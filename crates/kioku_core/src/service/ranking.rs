//! Priority ranking for review selection.
//!
//! # Responsibility
//! - Score candidates by mastery level and staleness.
//! - Order a candidate pool with uniformly random tie-breaking.
//!
//! # Invariants
//! - Lower score means higher review priority.
//! - Ranking is pure: no store access, no side effects beyond the caller's
//!   random source.

use crate::model::item::{Item, ReviewState};
use rand::seq::SliceRandom;
use rand::Rng;

/// Weight on the mastery level; well-known items sink in priority.
pub const LEVEL_WEIGHT: f64 = 2.0;
/// Weight per day since the last review; stale items rise in priority.
pub const STALENESS_WEIGHT: f64 = 0.5;
/// Fixed staleness credit for never-reviewed items, so they rank ahead of a
/// same-level item reviewed within the last two days but do not swamp
/// genuinely stale ones.
pub const UNREVIEWED_CREDIT: f64 = 1.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Scores one item's review state at the given instant.
///
/// `level*LEVEL_WEIGHT - credit`, where `credit` is the fixed
/// [`UNREVIEWED_CREDIT`] for never-reviewed items and otherwise grows with
/// elapsed days at [`STALENESS_WEIGHT`]. Lower scores are selected first.
pub fn priority_score(review: &ReviewState, now_epoch_ms: i64) -> f64 {
    let credit = match review.last_reviewed {
        None => UNREVIEWED_CREDIT,
        Some(reviewed_at) => {
            let elapsed_ms = now_epoch_ms.saturating_sub(reviewed_at).max(0);
            (elapsed_ms as f64 / MS_PER_DAY) * STALENESS_WEIGHT
        }
    };
    f64::from(review.level) * LEVEL_WEIGHT - credit
}

/// Orders `pool` by ascending priority score and keeps the first `limit`.
///
/// The pool is shuffled before the stable sort, so items tied on the score
/// come back in uniformly random order, re-randomized per call. Pools smaller
/// than `limit` are returned whole.
pub fn rank(
    mut pool: Vec<Item>,
    limit: usize,
    now_epoch_ms: i64,
    rng: &mut impl Rng,
) -> Vec<Item> {
    pool.shuffle(rng);
    pool.sort_by(|a, b| {
        priority_score(a.review(), now_epoch_ms)
            .total_cmp(&priority_score(b.review(), now_epoch_ms))
    });
    pool.truncate(limit);
    pool
}

#[cfg(test)]
mod tests {
    use super::{priority_score, rank, UNREVIEWED_CREDIT};
    use crate::model::item::{Item, Kanji, ReviewState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DAY_MS: i64 = 86_400_000;

    fn kanji_item(id: i64, level: u8, last_reviewed: Option<i64>) -> Item {
        Item::Kanji(Kanji {
            id,
            character: "字".to_string(),
            meaning: "character".to_string(),
            grade: 1,
            review: ReviewState {
                level,
                last_reviewed,
                review_count: 0,
                enabled: true,
            },
        })
    }

    #[test]
    fn lower_level_scores_ahead_of_higher_level() {
        let now = 100 * DAY_MS;
        let weak = ReviewState {
            level: 1,
            last_reviewed: Some(now - DAY_MS),
            review_count: 1,
            enabled: true,
        };
        let strong = ReviewState {
            level: 4,
            last_reviewed: Some(now - DAY_MS),
            review_count: 1,
            enabled: true,
        };
        assert!(priority_score(&weak, now) < priority_score(&strong, now));
    }

    #[test]
    fn staler_item_scores_ahead_at_equal_level() {
        let now = 100 * DAY_MS;
        let stale = ReviewState {
            level: 2,
            last_reviewed: Some(now - 10 * DAY_MS),
            review_count: 1,
            enabled: true,
        };
        let fresh = ReviewState {
            level: 2,
            last_reviewed: Some(now),
            review_count: 1,
            enabled: true,
        };
        assert!(priority_score(&stale, now) < priority_score(&fresh, now));
    }

    #[test]
    fn never_reviewed_gets_the_fixed_credit() {
        let now = 100 * DAY_MS;
        let unreviewed = ReviewState::unlearned();
        assert_eq!(priority_score(&unreviewed, now), -UNREVIEWED_CREDIT);

        // Outranks a level-0 item reviewed moments ago, trails one stale
        // for longer than the credit buys.
        let just_reviewed = ReviewState {
            last_reviewed: Some(now),
            review_count: 1,
            ..ReviewState::unlearned()
        };
        let long_stale = ReviewState {
            last_reviewed: Some(now - 30 * DAY_MS),
            review_count: 1,
            ..ReviewState::unlearned()
        };
        assert!(priority_score(&unreviewed, now) < priority_score(&just_reviewed, now));
        assert!(priority_score(&long_stale, now) < priority_score(&unreviewed, now));
    }

    #[test]
    fn clock_skew_never_produces_negative_staleness() {
        let reviewed_in_future = ReviewState {
            level: 0,
            last_reviewed: Some(10 * DAY_MS),
            review_count: 1,
            enabled: true,
        };
        assert_eq!(priority_score(&reviewed_in_future, 0), 0.0);
    }

    #[test]
    fn rank_orders_by_score_and_truncates() {
        let now = 100 * DAY_MS;
        let pool = vec![
            kanji_item(1, 5, Some(now - DAY_MS)),
            kanji_item(2, 0, None),
            kanji_item(3, 2, Some(now - 20 * DAY_MS)),
        ];

        let mut rng = StdRng::seed_from_u64(7);
        let ranked = rank(pool, 2, now, &mut rng);

        let ids: Vec<_> = ranked.iter().map(Item::id).collect();
        // Scores: id 2 -> -1.0, id 3 -> 4 - 10 = -6.0, id 1 -> 10 - 0.5 = 9.5.
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn rank_is_deterministic_for_a_seeded_rng() {
        let now = 100 * DAY_MS;
        let pool = || {
            vec![
                kanji_item(1, 0, None),
                kanji_item(2, 0, None),
                kanji_item(3, 0, None),
            ]
        };

        let first: Vec<_> = rank(pool(), 3, now, &mut StdRng::seed_from_u64(42))
            .iter()
            .map(Item::id)
            .collect();
        let second: Vec<_> = rank(pool(), 3, now, &mut StdRng::seed_from_u64(42))
            .iter()
            .map(Item::id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ties_are_spread_roughly_uniformly() {
        let now = 100 * DAY_MS;
        let mut rng = StdRng::seed_from_u64(1);
        let mut first_counts = [0u32; 3];

        for _ in 0..300 {
            let pool = vec![
                kanji_item(1, 0, None),
                kanji_item(2, 0, None),
                kanji_item(3, 0, None),
            ];
            let ranked = rank(pool, 3, now, &mut rng);
            first_counts[(ranked[0].id() - 1) as usize] += 1;
        }

        // Expect ~100 each; a tie-break that always favors one item would
        // put 300 in a single bucket.
        for count in first_counts {
            assert!((50..=250).contains(&count), "skewed tie-break: {first_counts:?}");
        }
    }
}
