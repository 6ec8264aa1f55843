//! Occlusion resolver - decides which labels of a lane stay visible
//!
//! Items must already be sorted by date and carry fresh `screen_y`/`height`.
//! Collisions are only looked for between date-consecutive runs: the forward
//! scan for an item stops at the first successor it does not overlap. With a
//! single non-decreasing scale that run is contiguous. A winner that is not
//! itself hidden hides all of its neighbors, so a low-priority item sitting
//! between two winners is hidden by both while the winners stay visible even
//! if they never touch each other.

use crate::item::{overlap_y, Item};

/// Minimum vertical overlap in pixels that counts as a collision
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 4.0;

/// Indices of `items` ordered by descending priority, ties keep date order
pub fn priority_order(items: &[Item]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    // stable: equal priorities stay in ascending date order
    order.sort_by(|&a, &b| items[b].priority.cmp(&items[a].priority));
    order
}

/// Recompute `overlap_neighbors` and `hidden` for every item
pub fn resolve(items: &mut [Item], by_priority: &[usize], threshold: f64) {
    for item in items.iter_mut() {
        item.overlap_neighbors.clear();
        item.hidden = false;
    }

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if overlap_y(&items[i], &items[j]) <= threshold {
                break;
            }
            items[i].overlap_neighbors.push(j);
            items[j].overlap_neighbors.push(i);
        }
    }

    for &winner in by_priority {
        if items[winner].hidden {
            continue;
        }
        for k in 0..items[winner].overlap_neighbors.len() {
            let neighbor = items[winner].overlap_neighbors[k];
            items[neighbor].hidden = true;
        }
    }
}

/// Count of items currently visible
pub fn visible_count(items: &[Item]) -> usize {
    items.iter().filter(|item| !item.hidden).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{FixedMetrics, RawRecord};

    fn item(title: &str, date: &str, priority: i32, y: f64) -> Item {
        let record = RawRecord::new(title, date).with_priority(priority);
        let mut item = Item::from_record(0, &record, &FixedMetrics::default()).unwrap();
        item.screen_y = y;
        item.height = 16.0;
        item
    }

    fn run(items: &mut Vec<Item>) {
        let order = priority_order(items);
        resolve(items, &order, DEFAULT_OVERLAP_THRESHOLD);
    }

    #[test]
    fn test_higher_priority_wins() {
        let mut items = vec![item("low", "1900", 1, 100.0), item("high", "1901", 5, 108.0)];
        run(&mut items);
        assert!(items[0].hidden);
        assert!(!items[1].hidden);
        assert_eq!(items[0].overlap_neighbors, vec![1]);
        assert_eq!(items[1].overlap_neighbors, vec![0]);
    }

    #[test]
    fn test_small_overlap_is_not_a_collision() {
        // boxes overlap by exactly 4px, not more
        let mut items = vec![item("a", "1900", 0, 100.0), item("b", "1901", 0, 112.0)];
        run(&mut items);
        assert!(items.iter().all(|i| !i.hidden));
        assert!(items[0].overlap_neighbors.is_empty());
    }

    #[test]
    fn test_chain_hides_middle_only() {
        // A overlaps B, B overlaps C, A and C are apart; priority A > C > B
        let mut items = vec![
            item("A", "1900", 3, 100.0),
            item("B", "1901", 1, 110.0),
            item("C", "1902", 2, 120.0),
        ];
        run(&mut items);
        assert!(!items[0].hidden);
        assert!(items[1].hidden);
        assert!(!items[2].hidden);
        assert_eq!(items[1].overlap_neighbors.len(), 2);
    }

    #[test]
    fn test_equal_priority_earlier_date_wins() {
        let mut items = vec![item("first", "1900", 0, 100.0), item("second", "1901", 0, 105.0)];
        run(&mut items);
        assert!(!items[0].hidden);
        assert!(items[1].hidden);
    }

    #[test]
    fn test_scan_stops_at_first_gap() {
        // third item overlaps the first but sits after a non-overlapping one
        let mut items = vec![
            item("a", "1900", 0, 100.0),
            item("b", "1901", 0, 140.0),
            item("c", "1902", 5, 102.0),
        ];
        run(&mut items);
        assert!(items[0].overlap_neighbors.is_empty());
        assert_eq!(visible_count(&items), 3);
    }

    #[test]
    fn test_state_is_rebuilt_each_pass() {
        let mut items = vec![item("low", "1900", 1, 100.0), item("high", "1901", 5, 108.0)];
        run(&mut items);
        assert!(items[0].hidden);
        items[1].screen_y = 300.0;
        run(&mut items);
        assert!(!items[0].hidden);
        assert!(items[0].overlap_neighbors.is_empty());
    }
}
