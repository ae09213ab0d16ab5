use chordal::{
    matching_chords, most_likely_chord, registry, AbstractChord, Chord, ChordFactors, ChordSpec,
    Error, Interval, IntervalList, Inversion, MatchParams, Note, NoteList,
};
use pretty_assertions::assert_eq;

fn note(name: &str) -> Note {
    Note::parse(name).unwrap()
}

#[test]
fn major_seventh_factors_and_suffix() {
    let chord = AbstractChord::new("maj7").unwrap();
    assert_eq!(
        chord.factors(),
        &ChordFactors::from_pairs(&[(1, 0), (3, 0), (5, 0), (7, 0)])
    );
    assert_eq!(chord.suffix(), "maj7");
}

#[test]
fn inverted_minor_matches_sixth_without_fifth() {
    let inverted = Chord::new("Am/C").unwrap();
    let sixth = Chord::new("C6(no5)").unwrap();
    assert_eq!(inverted.notes(), sixth.notes());
    assert_eq!(inverted.intervals(), sixth.intervals());
    assert_eq!(inverted.intervals().values(), vec![0, 4, 9]);
}

#[test]
fn unusual_spelling_resolves_inversion() {
    let spelled = Chord::new("E#m7/C").unwrap();
    let built = AbstractChord::new("m7")
        .unwrap()
        .invert(2)
        .unwrap()
        .on_root(note("F"));
    assert_eq!(spelled.notes(), built.notes());
    assert_eq!(spelled.inversion(), 2);
    assert_eq!(spelled, built);
}

#[test]
fn matches_major_seventh_exactly() {
    let notes = NoteList::parse("C E G B").unwrap();
    let matches = matching_chords(&notes, &MatchParams::default()).unwrap();
    assert_eq!(matches[0].chord.name(), "Cmaj7");
    assert_eq!(matches[0].scores.recall, 1.0);
    assert_eq!(matches[0].scores.precision, 1.0);
}

#[test]
fn assumed_root_prefers_dominant_seventh() {
    let notes = NoteList::parse("D F# A C").unwrap();
    let matches = matching_chords(&notes, &MatchParams::default()).unwrap();
    assert_eq!(matches[0].chord.name(), "D7");
    assert_eq!(matches[0].chord.root(), note("D"));
}

#[test]
fn out_of_range_inversion_fails() {
    let result = ChordSpec::name("").inverted(Inversion::Index(5)).build_abstract();
    assert!(matches!(
        result,
        Err(Error::InversionOutOfRange {
            inversion: 5,
            order: 3
        })
    ));
    assert!(Chord::new("C/5").is_err());
}

#[test]
fn every_registered_name_round_trips() {
    let reg = registry();
    for name in reg.all_names() {
        let chord = AbstractChord::new(&name).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(chord.suffix(), name);
        for inversion in 1..chord.order() {
            let inverted = chord.invert(inversion).unwrap();
            let expected = format!("{name}/{inversion}");
            assert_eq!(inverted.suffix(), expected);
            let reparsed = AbstractChord::new(&expected).unwrap();
            assert_eq!(reparsed, inverted);
        }
    }
}

#[test]
fn concrete_chords_round_trip_through_names() {
    let reg = registry();
    for name in reg.all_names() {
        let chord = AbstractChord::new(&name).unwrap().on_root(note("D"));
        let distinct = chord.root_notes().pitch_classes().len() == chord.order();
        let inversions = if distinct { chord.order() } else { 1 };
        for inversion in 0..inversions {
            let inverted = chord.invert(Inversion::Index(inversion)).unwrap();
            let reparsed = Chord::new(&inverted.name()).unwrap();
            assert_eq!(reparsed, inverted, "{}", inverted.name());
        }
    }
}

#[test]
fn root_position_intervals_invert_to_themselves() {
    for name in ["", "m7", "maj9", "dim7", "13"] {
        let intervals = AbstractChord::new(name).unwrap().root_intervals().clone();
        assert_eq!(intervals.invert(0), intervals);
    }
}

#[test]
fn factor_distance_reapplies() {
    let names = ["", "m", "7", "maj7", "sus4", "dim7", "9", "m11", "7#9", "6(no5)", "add13"];
    for a in names {
        for b in names {
            let fa = AbstractChord::new(a).unwrap().factors().clone();
            let fb = AbstractChord::new(b).unwrap().factors().clone();
            let distance = fa.distance(&fb);
            assert_eq!(fb.apply(&distance).unwrap(), fa, "'{a}' from '{b}'");
        }
    }
}

#[test]
fn consonance_falls_with_ratio_complexity() {
    assert_eq!(Interval::new(0).consonance(), 1.0);
    assert!(Interval::new(7).consonance() > Interval::new(6).consonance());
    assert!(Interval::new(12).consonance() > Interval::new(1).consonance());
    assert!(Interval::new(4).consonance() > Interval::new(11).consonance());
}

#[test]
fn intervals_are_read_as_inversions_when_less_rare() {
    let intervals = IntervalList::from_values(&[0, 3, 8]).unwrap();
    let chord = ChordSpec::intervals(intervals).on(note("E")).build().unwrap();
    assert_eq!(chord.root(), note("C"));
    assert_eq!(chord.bass(), note("E"));
    assert_eq!(chord.name(), "C/E");
}

#[test]
fn unnamed_structures_get_a_placeholder() {
    let factors = ChordFactors::from_pairs(&[(1, 0), (2, -1), (4, 1)]);
    let chord = AbstractChord::from_factors(factors.clone());
    assert_eq!(chord.suffix(), "(?)");
    assert_eq!(chord.rarity(), chordal::UNNAMED_RARITY);
    let named = AbstractChord::from_factors(factors).with_assigned_name("cluster");
    assert_eq!(named.suffix(), "cluster");
}

#[test]
fn most_likely_always_answers() {
    let notes = NoteList::parse("C Db").unwrap();
    let best = most_likely_chord(&notes, &MatchParams::most_likely()).unwrap();
    assert_eq!(best.chord.bass(), note("C"));
}
