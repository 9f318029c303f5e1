use chrono::{DateTime, Duration, FixedOffset};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vote_dumps::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn candidates() -> (Candidate, Candidate) {
    (Candidate::new("bidenj"), Candidate::new("trumpd"))
}

// A deterministic, bumpy series: mostly growing totals with a few corrections,
// repeated shares and a dump without new votes.
fn bumpy_series() -> TimeSeries {
    let start: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2020-11-03T19:00:00-05:00")
        .unwrap();
    let (b, t) = candidates();
    let mut snapshots = vec![Snapshot::empty(start)];
    let mut seed: u64 = 17;
    let mut total: i64 = 5000;
    for i in 1..60i64 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let r = (seed >> 33) % 1000;
        total = match r % 10 {
            0 => total - 300,
            1 => total,
            _ => total + (r as i64) * 7,
        };
        let share1 = Decimal::new(400 + (r % 150) as i64, 3);
        let share2 = Decimal::new(350 + ((r / 7) % 100) as i64, 3);
        snapshots.push(Snapshot::new(
            [(b.clone(), share1), (t.clone(), share2)].into_iter().collect(),
            total,
            start + Duration::minutes(10 * i),
        ));
    }
    TimeSeries::new(snapshots)
}

#[test]
fn scenario_single_dump() {
    init();
    let (b, t) = candidates();
    let ts = |s: &str| DateTime::parse_from_rfc3339(s).unwrap();
    let series = TimeSeries::new(vec![
        Snapshot::empty(ts("2020-11-03T20:00:00Z")),
        Snapshot::new(
            [(b.clone(), dec!(0.6)), (t.clone(), dec!(0.35))]
                .into_iter()
                .collect(),
            1000,
            ts("2020-11-03T20:30:00Z"),
        ),
    ]);
    let report = Report::from_series(&series, &b, &t).unwrap();
    assert_eq!(report.len(), 1);
    let e = &report.entries()[0];
    assert_eq!(e.candidate1.total_votes, dec!(600.000));
    assert_eq!(e.candidate2.total_votes, dec!(350.000));
    assert_eq!(e.third_party.vote_share, dec!(0.05));
    assert_eq!(e.third_party.total_votes, dec!(50.000));
    for bucket in Bucket::ALL {
        assert_eq!(e.data(bucket).delta_votes, e.data(bucket).total_votes);
    }
}

#[test]
fn one_entry_per_non_empty_snapshot() {
    init();
    let (b, t) = candidates();
    let series = bumpy_series();
    let report = Report::from_series(&series, &b, &t).unwrap();
    assert_eq!(report.len(), series.len() - 1);
    for (e, s) in report.entries().iter().zip(series.snapshots().iter().skip(1)) {
        assert_eq!(e.original_index, s.index());
        assert_eq!(e.total_votes, s.total_votes());
    }
}

#[test]
fn json_round_trip_with_and_without_annotations() {
    init();
    let (b, t) = candidates();
    let report = Report::from_series(&bumpy_series(), &b, &t).unwrap();
    assert_eq!(Report::from_json(&report.to_json().unwrap()).unwrap(), report);

    let annotated = annotate(&report);
    assert_eq!(annotated.strip(), report);
    let js = annotated.to_json().unwrap();
    assert_eq!(AnnotatedReport::from_json(&js).unwrap().strip(), report);
    assert_eq!(Report::from_json(&js).unwrap(), report);
}

#[test]
fn sorted_reports_are_non_increasing() {
    let (b, t) = candidates();
    let report = Report::from_series(&bumpy_series(), &b, &t).unwrap();
    for name in [
        "deltaVotes",
        "totalVotes",
        "deltaSeconds",
        "candidate1.deltaVoteShare",
        "thirdParty.deltaVotes",
    ] {
        let metric: Metric = name.parse().unwrap();
        let sorted = report.sort_by_metric(metric);
        assert_eq!(sorted.len(), report.len());
        let values: Vec<Decimal> = sorted.entries().iter().map(|e| metric.value(e)).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]), "{}", name);
    }
}

#[test]
fn heuristics_over_a_series() {
    init();
    let (b, t) = candidates();
    let series = bumpy_series();

    let lost = LostVotes::new(&b, &t);
    let mut total_lost = VoteLossData::EMPTY;
    for (prev, curr) in series.non_empty_pairs() {
        let l = lost.apply(prev, curr).unwrap();
        if l != VoteLossData::EMPTY {
            assert!(l.total_votes_lost < Decimal::ZERO);
            assert!(l.candidate1_votes_lost < Decimal::ZERO);
            assert!(l.candidate2_votes_lost < Decimal::ZERO);
            assert_eq!(
                l.total_votes_lost,
                Decimal::from(curr.total_votes() - prev.total_votes())
            );
        }
        total_lost += l;
    }
    assert_eq!(lost.over_series(&series).unwrap(), total_lost);

    let fraud = FindFraud::new(&b, &t, true);
    for f in [fraud.clone(), fraud.swap_bias()] {
        let mut total = VoteSwapData::EMPTY;
        for (prev, curr) in series.non_empty_pairs() {
            let s = f.apply(prev, curr).unwrap();
            let loss = |c: &Candidate| (prev.exact_votes(c) - curr.exact_votes(c)).max(Decimal::ZERO);
            let loss3 = (prev.exact_third_party_votes(&b, &t) - curr.exact_third_party_votes(&b, &t))
                .max(Decimal::ZERO);
            assert!(s.candidate1_to_candidate2 >= Decimal::ZERO);
            assert!(s.candidate1_to_third_party >= Decimal::ZERO);
            assert!(s.candidate2_to_candidate1 >= Decimal::ZERO);
            assert!(s.candidate2_to_third_party >= Decimal::ZERO);
            assert!(s.third_party_to_candidate1 >= Decimal::ZERO);
            assert!(s.third_party_to_candidate2 >= Decimal::ZERO);
            assert!(s.lost_by_candidate1() <= loss(&b));
            assert!(s.lost_by_candidate2() <= loss(&t));
            assert!(s.lost_by_third_party() <= loss3);
            total += s;
        }
        assert_eq!(f.over_series(&series).unwrap(), total);
    }
}
