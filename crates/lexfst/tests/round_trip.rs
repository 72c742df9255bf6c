//! Round-trip tests: build an FST, load it back (from memory and from a
//! file), and compare everything it yields against the inserted pairs.

use std::collections::BTreeMap;

use lexfst::{Builder, BuilderConfig, Fst, FstError};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn small_sample() -> BTreeMap<Vec<u8>, u64> {
    [("mon", 2u64), ("thurs", 5), ("tues", 3), ("tye", 99)]
        .into_iter()
        .map(|(k, v)| (k.as_bytes().to_vec(), v))
        .collect()
}

/// Deterministic xorshift generator so the data set is reproducible.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

/// About a thousand lowercase words with random values.
fn thousand_words() -> BTreeMap<Vec<u8>, u64> {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let mut map = BTreeMap::new();
    while map.len() < 1000 {
        let len = 1 + (rng.next() % 12) as usize;
        let word: Vec<u8> = (0..len).map(|_| b'a' + (rng.next() % 26) as u8).collect();
        map.insert(word, rng.next());
    }
    map
}

fn build_bytes(pairs: &BTreeMap<Vec<u8>, u64>, config: BuilderConfig) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new(), config).unwrap();
    builder.extend(pairs.iter().map(|(k, &v)| (k, v))).unwrap();
    builder.into_inner().unwrap()
}

/// Drain the iterator with the cursor protocol, checking the end signal.
fn collect_all(fst: &Fst) -> BTreeMap<Vec<u8>, u64> {
    let mut got = BTreeMap::new();
    let mut it = fst.iter().unwrap();
    let mut previous: Option<Vec<u8>> = None;
    loop {
        let Some((key, value)) = it.current() else {
            break;
        };
        if let Some(prev) = &previous {
            assert!(prev.as_slice() < key, "keys out of order: {prev:?} then {key:?}");
        }
        previous = Some(key.to_vec());
        got.insert(key.to_vec(), value);
        match it.advance() {
            Ok(()) => {}
            Err(FstError::IteratorDone) => break,
            Err(e) => panic!("iterator error: {e}"),
        }
    }
    got
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn round_trip_simple() {
    let sample = small_sample();
    let fst = Fst::from_bytes(build_bytes(&sample, BuilderConfig::default())).unwrap();

    assert_eq!(collect_all(&fst), sample);
    for absent in ["mo", "monr", "thur", "thurp", "tue", "tuesd", "x", ""] {
        assert!(
            !fst.contains(absent.as_bytes()).unwrap(),
            "expected not to contain {absent:?}"
        );
    }
}

#[test]
fn round_trip_through_file() {
    let sample = thousand_words();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.fst");

    let mut builder = Builder::create(&path, BuilderConfig::default()).unwrap();
    for (k, &v) in &sample {
        builder.insert(k, v).unwrap();
    }
    builder.close().unwrap();
    drop(builder);

    let mut mapped = Fst::open(&path).unwrap();
    assert_eq!(mapped.len(), sample.len() as u64);
    assert_eq!(collect_all(&mapped), sample);
    mapped.close();
    mapped.close();

    let buffered = Fst::open_buffered(&path).unwrap();
    for (k, &v) in &sample {
        assert_eq!(buffered.get(k).unwrap(), Some(v), "key {k:?}");
    }
}

#[test]
fn round_trip_thousand_with_small_registry() {
    let sample = thousand_words();
    for config in [
        BuilderConfig::default(),
        BuilderConfig::default().with_registry(1, 1),
        BuilderConfig::default().with_registry(7, 3),
        BuilderConfig::without_registry(),
    ] {
        let fst = Fst::from_bytes(build_bytes(&sample, config)).unwrap();
        assert_eq!(collect_all(&fst), sample, "config {config:?}");
    }
}

#[test]
fn round_trip_empty() {
    let fst = Fst::from_bytes(build_bytes(&BTreeMap::new(), BuilderConfig::default())).unwrap();
    assert_eq!(fst.len(), 0);
    let it = fst.iter().unwrap();
    assert!(it.is_done());
    assert_eq!(it.current(), None);
}

#[test]
fn round_trip_empty_string() {
    let mut builder = Builder::new(Vec::new(), BuilderConfig::default()).unwrap();
    builder.insert(b"", 0).unwrap();
    let fst = Fst::from_bytes(builder.into_inner().unwrap()).unwrap();

    assert_eq!(fst.len(), 1);
    assert_eq!(collect_all(&fst), BTreeMap::from([(Vec::new(), 0)]));
    assert!(!fst.contains(b"a").unwrap());
}

#[test]
fn round_trip_empty_string_and_others() {
    let mut builder = Builder::new(Vec::new(), BuilderConfig::default()).unwrap();
    builder.insert(b"", 0).unwrap();
    builder.insert(b"a", 0).unwrap();
    let fst = Fst::from_bytes(builder.into_inner().unwrap()).unwrap();

    assert_eq!(fst.len(), 2);
    assert_eq!(
        collect_all(&fst),
        BTreeMap::from([(Vec::new(), 0), (b"a".to_vec(), 0)])
    );
}

#[test]
fn week_scenario() {
    let pairs: BTreeMap<Vec<u8>, u64> = [("mon", 1), ("tue", 3), ("tuesday", 2), ("wednesday", 4)]
        .into_iter()
        .map(|(k, v)| (k.as_bytes().to_vec(), v))
        .collect();
    let fst = Fst::from_bytes(build_bytes(&pairs, BuilderConfig::default())).unwrap();
    assert_eq!(fst.get(b"tue").unwrap(), Some(3));
    assert_eq!(fst.get(b"tuesday").unwrap(), Some(2));
    assert!(!fst.contains(b"tu").unwrap());
    assert_eq!(fst.len(), 4);
}

#[test]
fn shared_suffixes_are_merged() {
    let days: BTreeMap<Vec<u8>, u64> = ["friday", "monday", "saturday", "sunday", "thursday", "tuesday", "wednesday"]
        .into_iter()
        .map(|k| (k.as_bytes().to_vec(), 0))
        .collect();
    let minimal = Fst::from_bytes(build_bytes(&days, BuilderConfig::default())).unwrap();
    let plain = Fst::from_bytes(build_bytes(&days, BuilderConfig::without_registry())).unwrap();

    let key_bytes: usize = days.keys().map(Vec::len).sum();
    let minimal_nodes = minimal.node_count().unwrap();
    assert!(minimal_nodes < plain.node_count().unwrap());
    assert!(minimal_nodes < key_bytes);
    assert!(minimal.size_bytes() < plain.size_bytes());
    assert_eq!(collect_all(&minimal), collect_all(&plain));
}

#[test]
fn corrupt_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.fst");
    std::fs::write(&path, b"definitely not an fst, just some bytes here!").unwrap();
    let err = Fst::open(&path).unwrap_err();
    assert!(err.is_corrupt(), "unexpected error: {err}");

    let missing = dir.path().join("missing.fst");
    assert!(matches!(Fst::open(&missing), Err(FstError::Read(_))));
}

#[test]
fn fst_is_shared_across_threads() {
    let sample = thousand_words();
    let fst = Fst::from_bytes(build_bytes(&sample, BuilderConfig::default())).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(collect_all(&fst), sample));
        }
    });
}

proptest! {
    #[test]
    fn arbitrary_maps_round_trip(
        pairs in prop::collection::btree_map(
            prop::collection::vec(any::<u8>(), 0..8),
            any::<u64>(),
            0..64,
        )
    ) {
        let fst = Fst::from_bytes(build_bytes(&pairs, BuilderConfig::default())).unwrap();
        prop_assert_eq!(fst.len(), pairs.len() as u64);
        prop_assert_eq!(collect_all(&fst), pairs.clone());
        for (k, &v) in &pairs {
            prop_assert_eq!(fst.get(k).unwrap(), Some(v));
        }
    }

    #[test]
    fn ranges_match_btree_ranges(
        pairs in prop::collection::btree_map(
            prop::collection::vec(0u8..4, 0..5),
            0u64..1000,
            0..32,
        ),
        start in prop::collection::vec(0u8..4, 0..5),
        end in prop::collection::vec(0u8..4, 0..5),
    ) {
        let fst = Fst::from_bytes(build_bytes(&pairs, BuilderConfig::default())).unwrap();
        let got: Vec<(Vec<u8>, u64)> = fst
            .range(Some(start.as_slice()), Some(end.as_slice()))
            .unwrap()
            .into_pairs()
            .map(Result::unwrap)
            .collect();
        let want: Vec<(Vec<u8>, u64)> = pairs
            .iter()
            .filter(|(k, _)| k.as_slice() >= start.as_slice() && k.as_slice() < end.as_slice())
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        prop_assert_eq!(got, want);
    }
}
