use proptest::prelude::*;

use capstan_types::{mul_div, EpochClock, EpochSeries, Timestamp};

const WEEK: u64 = 604_800;

proptest! {
    /// Epoch indices never decrease as time advances.
    #[test]
    fn epoch_is_monotone_in_time(
        start in 0u64..1_000_000_000,
        t1 in 0u64..2_000_000_000,
        dt in 0u64..100_000_000,
    ) {
        let clock = EpochClock::new(Timestamp::new(start), WEEK);
        let e1 = clock.current_epoch(Timestamp::new(t1));
        let e2 = clock.current_epoch(Timestamp::new(t1 + dt));
        prop_assert!(e2 >= e1);
    }

    /// An epoch boundary maps back to its own epoch.
    #[test]
    fn boundary_round_trip(start in 0u64..1_000_000_000, epoch in 0u64..100_000) {
        let clock = EpochClock::new(Timestamp::new(start), WEEK);
        prop_assert_eq!(clock.current_epoch(clock.epoch_boundary(epoch)), epoch);
    }

    /// A lead clock reads the same index as the calendar clock shifted
    /// forward by the lead.
    #[test]
    fn lead_clock_equals_shifted_calendar(
        start in 1_000_000u64..1_000_000_000,
        lead in 0u64..WEEK,
        t in 0u64..2_000_000_000,
    ) {
        let calendar = EpochClock::new(Timestamp::new(start), WEEK);
        let lead_clock = calendar.with_lead(lead);
        prop_assert_eq!(
            lead_clock.current_epoch(Timestamp::new(t)),
            calendar.current_epoch(Timestamp::new(t.saturating_add(lead))),
        );
    }

    /// Elapsed-in is confined to [0, epoch length].
    #[test]
    fn elapsed_in_bounds(
        start in 0u64..1_000_000_000,
        epoch in 0u64..10_000,
        t in 0u64..3_000_000_000,
    ) {
        let clock = EpochClock::new(Timestamp::new(start), WEEK);
        let elapsed = clock.elapsed_in(epoch, Timestamp::new(t));
        prop_assert!(elapsed <= WEEK);
    }

    /// A series write is visible from its own epoch onward until the next
    /// write, and invisible before it.
    #[test]
    fn series_forward_fill(
        e1 in 0u64..1_000,
        gap in 1u64..1_000,
        v1 in 0u128..1_000_000,
        v2 in 0u128..1_000_000,
    ) {
        let e2 = e1 + gap;
        let mut series = EpochSeries::new();
        series.set(e1, v1);
        series.set(e2, v2);

        if e1 > 0 {
            prop_assert_eq!(series.value_at(e1 - 1), 0);
        }
        prop_assert_eq!(series.value_at(e1), v1);
        prop_assert_eq!(series.value_at(e2 - 1), v1);
        prop_assert_eq!(series.value_at(e2), v2);
        prop_assert_eq!(series.value_at(e2 + 10_000), v2);
    }

    /// mul_div agrees with native arithmetic whenever the product fits.
    #[test]
    fn mul_div_matches_native(
        a in 0u128..u64::MAX as u128,
        b in 0u128..u64::MAX as u128,
        d in 1u128..u64::MAX as u128,
    ) {
        prop_assert_eq!(mul_div(a, b, d).unwrap(), a * b / d);
    }

    /// Scaling numerator and denominator together leaves the share intact.
    #[test]
    fn mul_div_scale_invariant(
        amount in 0u128..1_000_000_000_000,
        weight in 1u128..1_000_000,
        total in 1u128..1_000_000,
        scale in 1u128..1_000_000_000_000_000_000,
    ) {
        let weight = weight.min(total);
        let plain = mul_div(amount, weight, total).unwrap();
        let scaled = mul_div(amount, weight * scale, total * scale).unwrap();
        prop_assert_eq!(plain, scaled);
    }

    /// A pro-rata share never exceeds the bucket it is carved from.
    #[test]
    fn share_bounded_by_bucket(
        bucket in 0u128..(1u128 << 100),
        weight in 0u128..(1u128 << 100),
        total in 1u128..(1u128 << 100),
    ) {
        let weight = weight.min(total);
        let share = mul_div(bucket, weight, total).unwrap();
        prop_assert!(share <= bucket);
    }
}
