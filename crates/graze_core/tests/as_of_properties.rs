use chrono::Days;
use graze_core::test_fixtures::{make_rng, random_biomass_series};
use graze_core::{last_entry_on_or_before, BiomassObservation};
use rand::Rng;

const ITERATIONS: usize = 200;

#[test]
fn test_as_of_lookup_is_monotonic_in_query_date() {
    let mut rng = make_rng();
    for _ in 0..ITERATIONS {
        let len = rng.gen_range(0..40);
        let series = random_biomass_series(&mut rng, len);
        let Some(first) = series.first().map(|o| o.date) else {
            continue;
        };
        let d1 = first + Days::new(rng.gen_range(0..120));
        let d2 = d1 + Days::new(rng.gen_range(0..60));
        for field in [
            (|o: &BiomassObservation| o.raw) as fn(&BiomassObservation) -> Option<f64>,
            |o: &BiomassObservation| o.smoothed,
        ] {
            let early = last_entry_on_or_before(&series, d1, field);
            let late = last_entry_on_or_before(&series, d2, field);
            if let Some((early_date, _)) = early {
                assert!(early_date <= d1);
                let (late_date, _) = late.expect("a value found for d1 is still visible at d2");
                assert!(late_date >= early_date, "{late_date} < {early_date}");
                assert!(late_date <= d2);
            }
        }
    }
}

#[test]
fn test_as_of_lookup_never_reads_the_future() {
    let mut rng = make_rng();
    for _ in 0..ITERATIONS {
        let series = random_biomass_series(&mut rng, 25);
        let last = series.last().expect("series is non-empty").date;
        let query = last - Days::new(rng.gen_range(0..60));
        if let Some((found, value)) =
            last_entry_on_or_before(&series, query, BiomassObservation::smoothed_or_raw)
        {
            assert!(found <= query);
            // Nothing usable sits between the match and the query date.
            assert!(series
                .iter()
                .filter(|o| o.date > found && o.date <= query)
                .all(|o| o.smoothed_or_raw().is_none()));
            assert!(value.is_finite());
        }
    }
}
