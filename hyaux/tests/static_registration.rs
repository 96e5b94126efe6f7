use std::collections::BTreeMap;

use hyaux::{AuxDataContainer, AuxDataSchema, SchemaRegistry, conf::RegistryOptions};

struct Comments;
impl AuxDataSchema for Comments {
    const NAME: &'static str = "comments";
    type Type = BTreeMap<u64, String>;
}

struct Alignment;
impl AuxDataSchema for Alignment {
    const NAME: &'static str = "alignment";
    type Type = BTreeMap<u64, u64>;
}

hyaux::register_aux_data_schema!(Comments, Alignment);

#[test]
fn submitted_schemas_are_registered() {
    let registry = SchemaRegistry::new();
    assert_eq!(registry.register_submitted(), Ok(2));
    assert_eq!(registry.names(), ["alignment", "comments"]);
    assert!(registry.check::<Comments>().is_ok());

    // Submissions are idempotent until the registry is locked.
    assert_eq!(registry.register_submitted(), Ok(2));
    registry.lock();
    assert!(registry.register_submitted().unwrap_err().is_locked());
}

#[test]
fn registry_built_from_submissions_is_usable() {
    let registry = SchemaRegistry::with_submitted(RegistryOptions::default()).unwrap();
    let mut container = AuxDataContainer::new();

    let mut comments = BTreeMap::new();
    comments.insert(0x1000, "entry point".to_string());
    container.add::<Comments>(&registry, comments.clone()).unwrap();
    container
        .add::<Alignment>(&registry, BTreeMap::from([(0x1000, 16)]))
        .unwrap();

    assert_eq!(container.get::<Comments>(&registry), Ok(Some(&comments)));
    assert_eq!(
        container.get_raw("comments").unwrap().type_tag,
        "mapping<uint64_t,string>"
    );
}
