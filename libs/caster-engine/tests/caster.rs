use caster_api::chrono::{DateTime, FixedOffset};
use caster_api::serde_json::{json, Value};
use caster_api::{Cast, CastError, ColumnCast, ErrorKind, Mode, ValueObject};
use caster_engine::stored::lookup;
use caster_engine::{Caster, EngineError};

#[derive(Debug, Clone, PartialEq, ValueObject)]
struct Address {
    street: String,
    suburb: String,
    state: String,
    moved: DateTime<FixedOffset>,
}

fn moved() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2010-01-12T11:00:00+09:00").unwrap()
}

fn address(street: &str) -> Address {
    Address {
        street: street.to_string(),
        suburb: "Hill Valley".to_string(),
        state: "California".to_string(),
        moved: moved(),
    }
}

fn address_attributes(street: &str) -> Value {
    json!({
        "street": street,
        "suburb": "Hill Valley",
        "state": "California",
        "moved": "2010-01-12T11:00:00+09:00",
    })
}

fn stored_field(stored: &str, path: &str) -> Value {
    let document: Value = caster_api::serde_json::from_str(stored).unwrap();
    lookup(&document, path).cloned().unwrap_or(Value::Null)
}

#[test]
fn casts_arrays_to_json() {
    let stored = Caster::<Address>::single()
        .serialize_value(Some(&address_attributes("1640 Riverside Drive")))
        .unwrap()
        .unwrap();
    assert_eq!(stored_field(&stored, "street"), json!("1640 Riverside Drive"));
    assert_eq!(stored_field(&stored, "suburb"), json!("Hill Valley"));
    assert_eq!(stored_field(&stored, "state"), json!("California"));
    assert_eq!(stored_field(&stored, "moved"), json!("2010-01-12T11:00:00+09:00"));

    let stored = Caster::<Address>::list()
        .serialize_value(Some(&json!([address_attributes("1641 Riverside Drive")])))
        .unwrap()
        .unwrap();
    assert_eq!(stored_field(&stored, "0->street"), json!("1641 Riverside Drive"));
}

#[test]
fn casts_value_objects_to_json() {
    let stored = Caster::<Address>::single()
        .serialize(Some(&Cast::One(address("1640 Riverside Drive"))))
        .unwrap()
        .unwrap();
    assert_eq!(
        stored,
        r#"{"street":"1640 Riverside Drive","suburb":"Hill Valley","state":"California","moved":"2010-01-12T11:00:00+09:00"}"#
    );
}

#[test]
fn json_to_a_value_object() {
    let stored = address_attributes("1640 Riverside Drive").to_string();
    let address = Caster::<Address>::single()
        .deserialize_one(&stored)
        .unwrap()
        .unwrap();
    assert_eq!(address.street, "1640 Riverside Drive");
    assert_eq!(address.suburb, "Hill Valley");
    assert_eq!(address.state, "California");
    assert_eq!(
        address.moved.to_rfc3339(),
        "2010-01-12T11:00:00+09:00"
    );

    let stored = json!([address_attributes("1641 Riverside Drive")]).to_string();
    let addresses = Caster::<Address>::list()
        .deserialize_many(&stored)
        .unwrap()
        .unwrap();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].street, "1641 Riverside Drive");
}

#[test]
fn throws_for_incorrect_data_structures() {
    let err = Caster::<Address>::single()
        .serialize_value(Some(&json!({ "bad": "thing" })))
        .unwrap_err();
    assert_eq!(
        err,
        CastError::MissingArguments {
            type_name: "Address".into(),
            missing: vec![
                "street".into(),
                "suburb".into(),
                "state".into(),
                "moved".into()
            ],
        }
    );

    let err = Caster::<Address>::single()
        .deserialize(Some(r#"{"bad":"thing"}"#))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingArguments);
}

#[test]
fn rejects_invalid_types() {
    let err = Caster::<Address>::single()
        .serialize_value(Some(&json!("string")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = Caster::<Address>::list()
        .serialize_value(Some(&json!(["string"])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = Caster::<Address>::single()
        .serialize(Some(&Cast::Many(vec![address("x")])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = Caster::<Address>::list()
        .serialize_one(&address("x"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn handles_nullable_columns() {
    for caster in [Caster::<Address>::single(), Caster::<Address>::list()] {
        assert_eq!(caster.serialize(None).unwrap(), None);
        assert_eq!(caster.serialize_value(None).unwrap(), None);
        assert_eq!(caster.serialize_value(Some(&Value::Null)).unwrap(), None);
        assert_eq!(caster.deserialize(None).unwrap(), None);
        assert_eq!(caster.deserialize(Some("null")).unwrap(), None);
    }
}

#[test]
fn empty_list_is_not_null() {
    let caster = Caster::<Address>::list();
    assert_eq!(caster.deserialize(Some("[]")).unwrap(), Some(Cast::Many(vec![])));
    assert_eq!(caster.serialize(Some(&Cast::Many(vec![]))).unwrap().as_deref(), Some("[]"));
}

#[test]
fn shape_must_match_mode_on_read() {
    let stored = address_attributes("x").to_string();
    let err = Caster::<Address>::list().deserialize(Some(&stored)).unwrap_err();
    assert_eq!(
        err,
        CastError::Shape {
            expected: "array",
            found: "object"
        }
    );

    let err = Caster::<Address>::single().deserialize(Some("not json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn list_errors_point_at_the_element() {
    let mut bad = address_attributes("x");
    bad["moved"] = json!("whenever");
    let stored = json!([address_attributes("y"), bad]).to_string();
    let err = Caster::<Address>::list().deserialize(Some(&stored)).unwrap_err();
    assert_eq!(
        err,
        CastError::Conversion {
            path: "[1].moved".into(),
            expected: "datetime".into(),
            found: "string".into(),
        }
    );
}

#[test]
fn extra_stored_keys_are_ignored() {
    let mut stored = address_attributes("1640 Riverside Drive");
    stored["country"] = json!("USA");
    let address = Caster::<Address>::single()
        .deserialize_one(&stored.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(address, self::address("1640 Riverside Drive"));
}

#[test]
fn built_from_directives() {
    let caster = Caster::<Address>::from_directive(r"Caster:\App\Models\Address[]").unwrap();
    assert_eq!(caster.mode(), Mode::List);

    let caster = Caster::<Address>::from_directive(r"Other\Place\Address").unwrap();
    assert_eq!(caster.mode(), Mode::Single);

    let err = Caster::<Address>::from_directive("Person").unwrap_err();
    assert!(matches!(err, EngineError::Directive { .. }));
}

#[test]
fn usable_through_the_host_seam() {
    let columns: Vec<(&str, Box<dyn ColumnCast<Value = Cast<Address>>>)> = vec![
        ("address", Box::new(Caster::<Address>::single())),
        ("addresses", Box::new(Caster::<Address>::list())),
    ];
    let values = [
        Cast::One(address("1640 Riverside Drive")),
        Cast::Many(vec![address("1641 Riverside Drive")]),
    ];
    for ((_, column), value) in columns.iter().zip(&values) {
        let stored = column.set(Some(value)).unwrap();
        assert_eq!(column.get(stored.as_deref()).unwrap().as_ref(), Some(value));
    }
    assert_eq!(Address::type_name(), "Address");
}
