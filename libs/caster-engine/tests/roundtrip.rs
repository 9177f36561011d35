use caster_api::chrono::{DateTime, FixedOffset, NaiveDate};
use caster_api::serde_json::{self, json, Value};
use caster_api::{Cast, ValueObject};
use caster_engine::Caster;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, ValueObject)]
struct Reading {
    label: String,
    count: u32,
    delta: i64,
    ratio: f64,
    level: f32,
    active: bool,
    taken: DateTime<FixedOffset>,
    day: NaiveDate,
    note: Option<String>,
    tags: Vec<String>,
}

fn datetime() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (0i64..4_102_444_800, -12i32..=14, 0u32..1000).prop_map(|(secs, hours, millis)| {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap();
        DateTime::from_timestamp(secs, millis * 1_000_000)
            .unwrap()
            .with_timezone(&offset)
    })
}

fn reading() -> impl Strategy<Value = Reading> {
    (
        "[a-zA-Z0-9 ]{0,16}",
        any::<u32>(),
        any::<i64>(),
        -1_000_000i32..1_000_000,
        -100_000i32..100_000,
        any::<bool>(),
        datetime(),
        proptest::option::of("[a-z]{1,8}"),
        proptest::collection::vec("[a-z]{0,6}", 0..4),
    )
        .prop_map(|(label, count, delta, quarters, tenths, active, taken, note, tags)| Reading {
            label,
            count,
            delta,
            // Multiples of 0.25 survive the text round trip exactly.
            ratio: f64::from(quarters) / 4.0,
            // Tenths are not exact in binary; the f32 codec must still keep them.
            level: tenths as f32 / 10.0,
            active,
            day: taken.date_naive(),
            taken,
            note,
            tags,
        })
}

proptest! {
    #[test]
    fn typed_values_survive_storage(value in reading()) {
        let caster = Caster::<Reading>::single();
        let stored = caster.serialize_one(&value).unwrap();
        let back = caster.deserialize_one(&stored).unwrap().unwrap();

        // DateTime equality compares instants; the offset is checked separately.
        prop_assert_eq!(back.taken.offset(), value.taken.offset());
        prop_assert_eq!(back, value);
    }

    #[test]
    fn stored_documents_survive_a_read_write_cycle(values in proptest::collection::vec(reading(), 0..4)) {
        let caster = Caster::<Reading>::list();
        let stored: Value = Value::Array(
            values.iter().map(|v| Value::Object(v.to_object().unwrap())).collect(),
        );
        let text = stored.to_string();

        let read = caster.deserialize(Some(&text)).unwrap().unwrap();
        let written = caster.serialize(Some(&read)).unwrap().unwrap();
        let rewritten: Value = serde_json::from_str(&written).unwrap();
        prop_assert_eq!(rewritten, stored);
        prop_assert_eq!(read, Cast::Many(values));
    }
}

/// JSON value equality where numbers compare by value (`3` equals `3.0`).
fn json_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equivalent(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_equivalent(x, y)))
        }
        _ => a == b,
    }
}

#[test]
fn hand_written_documents_are_normalized_predictably() {
    let caster = Caster::<Reading>::single();
    // Integer-valued float, short fraction, `Z` offset, absent optional, f32 tenth.
    let stored = json!({
        "label": "gauge",
        "count": 7,
        "delta": -3,
        "ratio": 3,
        "level": 0.1,
        "active": true,
        "taken": "2010-01-12T02:00:00.5Z",
        "day": "2010-01-12",
        "tags": [],
    });

    let read = caster.deserialize(Some(&stored.to_string())).unwrap().unwrap();
    let written = caster.serialize(Some(&read)).unwrap().unwrap();
    let written: Value = serde_json::from_str(&written).unwrap();

    let mut expected = stored.clone();
    expected["ratio"] = json!(3.0);
    expected["taken"] = json!("2010-01-12T02:00:00.500+00:00");
    expected["note"] = Value::Null;
    assert_eq!(written, expected);
    assert_eq!(written["level"], json!(0.1));

    // Same values as far as JSON is concerned, apart from the null `note`.
    let mut without_note = written.clone();
    without_note.as_object_mut().unwrap().remove("note");
    let mut same_instant = stored.clone();
    same_instant["taken"] = written["taken"].clone();
    assert!(json_equivalent(&without_note, &same_instant));

    // The canonical text is a fixed point.
    let again = caster
        .serialize(caster.deserialize(Some(&written.to_string())).unwrap().as_ref())
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_str::<Value>(&again).unwrap(), written);
}

#[test]
fn out_of_range_f32_is_rejected_on_read() {
    let reading = Reading {
        label: String::new(),
        count: 0,
        delta: 0,
        ratio: 0.0,
        level: 0.0,
        active: false,
        taken: DateTime::parse_from_rfc3339("2010-01-12T11:00:00+09:00").unwrap(),
        day: NaiveDate::from_ymd_opt(2010, 1, 12).unwrap(),
        note: None,
        tags: vec![],
    };
    let mut stored = Value::Object(reading.to_object().unwrap());
    stored["level"] = json!(1e300);
    let err = Caster::<Reading>::single()
        .deserialize(Some(&stored.to_string()))
        .unwrap_err();
    assert_eq!(
        err,
        caster_api::CastError::Conversion {
            path: "level".into(),
            expected: "f32".into(),
            found: "number".into(),
        }
    );
}
