mod support;

use anyhow::{Result, anyhow};
use phi_access::{Guard, GuardedRecord, ModelBuilder, PhiAccessError};
use phi_access_log::Level;
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{ADDRESS, DETAIL, Fixture, PatientInfo, PatientRow, denied};

const GRANT: (&str, &str) = ("wrapping.rs", "checking wrapped members");

#[test]
fn wraps_attributes_and_included_methods() -> Result<()> {
    let fixture = Fixture::new()?;
    let model = fixture
        .phi
        .model(PatientInfo::MODEL)
        .ok_or_else(|| anyhow!("PatientInfo is not registered"))?;

    assert_eq!(
        model.wrapped_members(),
        vec!["first_name", "public_id", "created_at", "updated_at", "birthday"]
    );
    assert_eq!(
        model.extended_relations(),
        vec!["patient_detail", "health_records"]
    );
    assert_eq!(model.primary_key(), "id");
    Ok(())
}

#[test]
fn leaves_excluded_attributes_and_the_primary_key_readable() -> Result<()> {
    let fixture = Fixture::new()?;
    let mary = fixture.create(PatientRow::named("Mary"))?;

    assert_eq!(mary.last_name()?, "Weasley");
    assert!(mary.guard().read("id", || mary.id()).is_ok());
    assert!(denied(mary.first_name()));
    assert!(denied(mary.birthday()));
    assert!(denied(mary.public_id()));
    Ok(())
}

#[test]
fn derived_members_are_guarded_through_what_they_read() -> Result<()> {
    let fixture = Fixture::new()?;
    let mary = fixture.create(PatientRow::named("Mary").health_records(2))?;

    assert!(denied(mary.summary_json()));

    mary.allow_phi(GRANT)?;
    assert_eq!(
        mary.summary_json()?,
        json!({ "id": "public-mary", "first": "Mary", "last": "Weasley" })
    );
    assert_eq!(
        mary.detail_json()?,
        json!({
            "id": "public-mary",
            "first": "Mary",
            "last": "Weasley",
            "detail": DETAIL,
            "health_record_count": 2,
        })
    );
    Ok(())
}

#[test]
fn delegated_members_only_need_access_when_they_read_guarded_data() -> Result<()> {
    let fixture = Fixture::new()?;
    let address = fixture.address(ADDRESS)?;

    assert_eq!(address.inlined(Some("redacted"))?, "redacted");
    assert!(denied(address.inlined(None)));

    address.allow_phi(GRANT)?;
    assert_eq!(address.inlined(None)?, ADDRESS);
    Ok(())
}

#[test]
fn newly_created_records_still_need_a_grant() -> Result<()> {
    let fixture = Fixture::new()?;
    let created = fixture.create(PatientRow::named("Ginny"))?;

    assert!(denied(created.first_name()));
    Ok(())
}

#[test]
fn warns_about_members_that_do_not_exist() -> Result<()> {
    let fixture = Fixture::new()?;

    let model = fixture.phi.register(
        ModelBuilder::new("MissingAttributeModel")
            .attributes(["id", "name"])
            .include_in_phi(["non_existent_method"]),
    )?;

    assert_eq!(model.wrapped_members(), vec!["name"]);
    assert_eq!(
        fixture.sink.messages(Level::Warn),
        vec!["MissingAttributeModel tried to wrap non-existent method (non_existent_method)"]
    );
    Ok(())
}

#[test]
fn rejects_extending_an_undefined_relation() -> Result<()> {
    let fixture = Fixture::new()?;

    let error = fixture
        .phi
        .register(
            ModelBuilder::new("MissingExtendModel")
                .attributes(["id", "name"])
                .extend_phi_access(["non_existent_model"]),
        )
        .unwrap_err();

    match error {
        PhiAccessError::UndefinedRelation { model, name } => {
            assert_eq!(model, "MissingExtendModel");
            assert_eq!(name, "non_existent_model");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fixture.phi.model("MissingExtendModel").is_none());
    Ok(())
}

#[test]
fn refuses_guards_for_unregistered_types() -> Result<()> {
    let fixture = Fixture::new()?;

    let error = Guard::new(&fixture.request, "Unregistered").unwrap_err();

    assert!(matches!(error, PhiAccessError::UnknownModel { model } if model == "Unregistered"));
    Ok(())
}

#[test]
fn registering_again_does_not_wrap_twice() -> Result<()> {
    let fixture = Fixture::new()?;
    support::register(&fixture.phi)?;
    let mary = fixture.create(PatientRow::named("Mary"))?;

    let model = fixture
        .phi
        .model(PatientInfo::MODEL)
        .ok_or_else(|| anyhow!("PatientInfo is not registered"))?;
    assert_eq!(model.wrapped_members().len(), 5);

    mary.allow_phi(GRANT)?;
    mary.first_name()?;
    assert_eq!(fixture.sink.count(Level::Warn), 0);
    assert_eq!(
        fixture
            .sink
            .messages(Level::Info)
            .iter()
            .filter(|message| message.contains(" access by "))
            .count(),
        1
    );
    Ok(())
}

#[test]
fn later_registrations_add_members() -> Result<()> {
    let fixture = Fixture::new()?;
    let address = fixture.address(ADDRESS)?;
    assert!(address.inlined(None).is_err());

    fixture.phi.register(
        ModelBuilder::new("Address")
            .attributes(["id", "patient_info_id", "address"])
            .methods(["inlined"])
            .include_in_phi(["inlined"]),
    )?;

    assert_eq!(
        address.guard().model().wrapped_members(),
        vec!["patient_info_id", "address", "inlined"]
    );
    assert!(denied(address.guard().read("inlined", || ())));
    Ok(())
}
