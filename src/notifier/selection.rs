use crate::datamodel::{NotifiedSet, Offer, great_circle_distance};
use geo::Point;
use std::time::Duration;

/// An offer chosen for notification in the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedOffer {
    pub offer: Offer,
    pub distance_meters: f64,
    /// Delay of this offer's notification relative to the end of the cycle.
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRules {
    pub radius_meters: f64,
    pub max_per_cycle: usize,
    pub stagger: Duration,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            radius_meters: 1000.0,
            max_per_cycle: 3,
            stagger: Duration::from_secs(2),
        }
    }
}

/// Picks the nearest un-notified offers within the radius.
///
/// The sort is stable, so offers at the same distance keep their catalog
/// order. Candidate `i` is delayed by `i * stagger`.
pub fn select_candidates(
    location: Point,
    offers: Vec<Offer>,
    notified: &NotifiedSet,
    rules: &SelectionRules,
) -> Vec<SelectedOffer> {
    let mut candidates: Vec<(Offer, f64)> = offers
        .into_iter()
        .filter(|offer| !notified.contains(&offer.key))
        .map(|offer| {
            let distance = great_circle_distance(location, offer.coordinate);
            (offer, distance)
        })
        .filter(|(_, distance)| *distance <= rules.radius_meters)
        .collect();

    candidates.sort_by(|(_, a), (_, b)| a.total_cmp(b));
    candidates.truncate(rules.max_per_cycle);

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, (offer, distance_meters))| SelectedOffer {
            offer,
            distance_meters,
            delay: rules.stagger * index as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{bogota, offer_north_of};

    fn keys(selected: &[SelectedOffer]) -> Vec<&str> {
        selected.iter().map(|s| s.offer.key.as_str()).collect()
    }

    #[test]
    fn test_radius_and_notified_filter() {
        let origin = bogota();
        let offers = vec![
            offer_north_of(origin, "A", 500.0),
            offer_north_of(origin, "B", 1500.0),
            offer_north_of(origin, "C", 200.0),
        ];
        let notified: NotifiedSet = std::iter::once("C".to_string()).collect();

        let selected = select_candidates(origin, offers, &notified, &SelectionRules::default());

        assert_eq!(keys(&selected), vec!["A"]);
        assert!((selected[0].distance_meters - 500.0).abs() < 1.0);
        assert_eq!(selected[0].delay, Duration::ZERO);
    }

    #[test]
    fn test_never_selects_beyond_radius() {
        let origin = bogota();
        let offers = vec![
            offer_north_of(origin, "far", 1001.5),
            offer_north_of(origin, "farther", 5000.0),
        ];

        let selected = select_candidates(
            origin,
            offers,
            &NotifiedSet::new(),
            &SelectionRules::default(),
        );
        assert!(selected.is_empty());
    }

    #[test]
    fn test_three_nearest_with_stagger() {
        let origin = bogota();
        let offers = vec![
            offer_north_of(origin, "d900", 900.0),
            offer_north_of(origin, "d100", 100.0),
            offer_north_of(origin, "d700", 700.0),
            offer_north_of(origin, "d300", 300.0),
            offer_north_of(origin, "d500", 500.0),
        ];

        let selected = select_candidates(
            origin,
            offers,
            &NotifiedSet::new(),
            &SelectionRules::default(),
        );

        assert_eq!(keys(&selected), vec!["d100", "d300", "d500"]);
        let delays: Vec<Duration> = selected.iter().map(|s| s.delay).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let origin = bogota();
        let offers = vec![
            offer_north_of(origin, "second", 400.0),
            offer_north_of(origin, "tie-1", 200.0),
            offer_north_of(origin, "tie-2", 200.0),
            offer_north_of(origin, "tie-3", 200.0),
            offer_north_of(origin, "tie-4", 200.0),
        ];

        let selected = select_candidates(
            origin,
            offers,
            &NotifiedSet::new(),
            &SelectionRules::default(),
        );
        assert_eq!(keys(&selected), vec!["tie-1", "tie-2", "tie-3"]);
    }

    #[test]
    fn test_notified_never_reselected_even_when_closest() {
        let origin = bogota();
        let offers = vec![
            offer_north_of(origin, "here", 0.0),
            offer_north_of(origin, "near", 10.0),
        ];
        let notified: NotifiedSet = ["here", "near"].into_iter().map(String::from).collect();

        let selected = select_candidates(origin, offers, &notified, &SelectionRules::default());
        assert!(selected.is_empty());
    }

    #[test]
    fn test_custom_rules() {
        let origin = bogota();
        let offers = vec![
            offer_north_of(origin, "a", 100.0),
            offer_north_of(origin, "b", 200.0),
            offer_north_of(origin, "c", 300.0),
        ];
        let rules = SelectionRules {
            radius_meters: 250.0,
            max_per_cycle: 5,
            stagger: Duration::from_secs(5),
        };

        let selected = select_candidates(origin, offers, &NotifiedSet::new(), &rules);
        assert_eq!(keys(&selected), vec!["a", "b"]);
        assert_eq!(selected[1].delay, Duration::from_secs(5));
    }
}
