use std::collections::HashMap;

use uuid::Uuid;

use crate::model::Schedule;

/// Collision half-window given to point schedules so they occupy a sliver of
/// the axis instead of a zero-width interval.
pub const POINT_PAD_MS: i64 = 15 * 60 * 1000;

/// One interval competing for a display row on a shared track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneItem {
    pub id: Uuid,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl LaneItem {
    pub fn from_schedule(id: Uuid, schedule: &Schedule) -> Self {
        let (start, end) = schedule.span_ms();
        if schedule.is_point() {
            Self {
                id,
                start_ms: start - POINT_PAD_MS,
                end_ms: end + POINT_PAD_MS,
            }
        } else {
            Self {
                id,
                start_ms: start,
                end_ms: end,
            }
        }
    }
}

/// Row assignments for a packed track: dense 0-based rows, no two items in a
/// row overlapping.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    pub rows: HashMap<Uuid, usize>,
    pub row_count: usize,
}

impl RowLayout {
    pub fn row_of(&self, id: Uuid) -> usize {
        self.rows.get(&id).copied().unwrap_or(0)
    }
}

/// Greedy earliest-fit interval packing.
///
/// Items are visited by ascending start (ties by id, so equal starts pack the
/// same way every frame) and land in the lowest-indexed row whose last end is
/// at or before their start. Optimal in row count for this visit order; other
/// tie-breaks can occasionally pack tighter, which is accepted.
pub fn pack_rows(items: &[LaneItem]) -> RowLayout {
    let mut ordered: Vec<&LaneItem> = items.iter().collect();
    ordered.sort_by_key(|item| (item.start_ms, item.id));

    let mut rows: HashMap<Uuid, usize> = HashMap::with_capacity(items.len());
    let mut row_ends: Vec<i64> = Vec::new();

    for item in ordered {
        let row = match row_ends.iter().position(|&end| end <= item.start_ms) {
            Some(row) => row,
            None => {
                row_ends.push(i64::MIN);
                row_ends.len() - 1
            }
        };
        row_ends[row] = item.end_ms;
        rows.insert(item.id, row);
    }

    RowLayout {
        row_count: row_ends.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(start: i64, end: i64) -> LaneItem {
        LaneItem {
            id: Uuid::new_v4(),
            start_ms: start,
            end_ms: end,
        }
    }

    #[test]
    fn overlapping_chain_reuses_freed_row() {
        let a = item(0, 10);
        let b = item(5, 15);
        let c = item(12, 20);
        let layout = pack_rows(&[a, b, c]);
        assert_eq!(layout.row_of(a.id), 0);
        assert_eq!(layout.row_of(b.id), 1);
        assert_eq!(layout.row_of(c.id), 0);
        assert_eq!(layout.row_count, 2);
    }

    #[test]
    fn disjoint_intervals_share_row_zero() {
        let a = item(0, 5);
        let b = item(10, 15);
        let layout = pack_rows(&[a, b]);
        assert_eq!(layout.row_of(a.id), 0);
        assert_eq!(layout.row_of(b.id), 0);
        assert_eq!(layout.row_count, 1);
    }

    #[test]
    fn touching_endpoints_do_not_collide() {
        let a = item(0, 10);
        let b = item(10, 20);
        let layout = pack_rows(&[a, b]);
        assert_eq!(layout.row_of(b.id), 0);
    }

    #[test]
    fn points_get_a_collision_window() {
        let at = chrono::Utc::now();
        let lane = LaneItem::from_schedule(Uuid::new_v4(), &Schedule::point(at));
        assert_eq!(lane.end_ms - lane.start_ms, 2 * POINT_PAD_MS);
    }

    #[test]
    fn equal_starts_pack_deterministically() {
        let mut items = vec![item(0, 10), item(0, 10), item(0, 10)];
        let first = pack_rows(&items);
        items.reverse();
        let second = pack_rows(&items);
        for it in &items {
            assert_eq!(first.row_of(it.id), second.row_of(it.id));
        }
        assert_eq!(first.row_count, 3);
    }
}
