use std::sync::Arc;

use hyaux::{
    AuxDataSchema, RawAuxData, SchemaRegistry,
    conf::RegistryOptions,
    tests_utils::{
        BadDeserializationType, BadPair, DuplicateNameType, RegisteredType, UnregisteredType,
        fixture_registry,
    },
};
use hyir::{AuxDataHolder, Context, Ir, IrConfig, Module, magic};

struct Offsets;
impl AuxDataSchema for Offsets {
    const NAME: &'static str = "offsets";
    type Type = Vec<(u64, String)>;
}

fn plain_config() -> IrConfig {
    let mut config = IrConfig::default();
    config.io.compress = false;
    config
}

fn only_registered_type() -> Context {
    let registry = SchemaRegistry::new();
    registry.register::<RegisteredType>().unwrap();
    Context::new(Arc::new(registry))
}

fn saved_example(config: IrConfig) -> (Ir, Vec<u8>) {
    let ctx = Context::with_config(Arc::new(fixture_registry()), config);
    let mut ir = Ir::create(&ctx);
    ir.add_aux_data::<RegisteredType>(&ctx, 5).unwrap();
    ir.add_aux_data::<BadDeserializationType>(&ctx, BadPair { x: 5, y: 10 })
        .unwrap();
    assert_eq!(ir.get_aux_data::<RegisteredType>(&ctx).unwrap(), Some(&5));

    let mut file = Vec::new();
    ir.save(&ctx, &mut file).unwrap();
    (ir, file)
}

#[test]
fn example_scenario_survives_a_reload() {
    let (original, file) = saved_example(IrConfig::default());

    let ctx = only_registered_type();
    let loaded = Ir::load(&ctx, file.as_slice()).unwrap();
    assert_eq!(loaded.uuid(), original.uuid());
    assert_eq!(loaded.aux_data_size(), 2);
    assert_eq!(loaded.get_aux_data::<RegisteredType>(&ctx).unwrap(), Some(&5));

    let err = loaded
        .get_aux_data::<BadDeserializationType>(&ctx)
        .unwrap_err();
    assert!(err.is_unregistered());
    assert!(err.to_string().contains("unregistered or incorrect type"));

    let bad = loaded
        .aux_data()
        .iter()
        .find(|raw| raw.key == "bad deserialization type")
        .unwrap();
    assert_eq!(bad.type_tag, "badbadbad");
    assert_eq!(bad.raw_bytes, [0x05, 0, 0, 0, 0x0A, 0, 0, 0]);
}

#[test]
fn undecodable_entries_are_kept_in_a_registry_that_knows_them() {
    let (_, file) = saved_example(IrConfig::default());

    let ctx = Context::new(Arc::new(fixture_registry()));
    let loaded = Ir::load(&ctx, file.as_slice()).unwrap();

    assert_eq!(loaded.get_aux_data::<BadDeserializationType>(&ctx).unwrap(), None);
    assert_eq!(loaded.aux_data_size(), 2);

    let report = loaded.aux_data_container().decode_all(ctx.registry());
    assert_eq!(report.decoded, ["registered type"]);
    assert_eq!(report.undecodable, ["bad deserialization type"]);
    assert!(!report.is_complete());
}

#[test]
fn raw_triples_are_written_back_unchanged() {
    let (original, file) = saved_example(plain_config());

    let ctx = Context::with_config(Arc::new(SchemaRegistry::new()), plain_config());
    let loaded = Ir::load(&ctx, file.as_slice()).unwrap();
    let expected: Vec<RawAuxData> = original.aux_data().iter().cloned().collect();
    assert_eq!(loaded.aux_data_container().to_raw_entries(), expected);

    let mut again = Vec::new();
    loaded.save(&ctx, &mut again).unwrap();
    assert_eq!(again, file);
}

#[test]
fn compressed_and_plain_files_both_load() {
    let (_, compressed) = saved_example(IrConfig::default());
    let (_, plain) = saved_example(plain_config());

    assert_eq!(&plain[..5], magic::IR_MAGIC);
    if cfg!(feature = "legacy_nozstd") {
        assert_eq!(&compressed[..5], magic::IR_MAGIC);
    } else {
        assert_eq!(&compressed[..5], magic::IR_MAGIC_ZSTD);
    }

    for file in [compressed, plain] {
        let ctx = only_registered_type();
        let loaded = Ir::load(&ctx, file.as_slice()).unwrap();
        assert_eq!(loaded.get_aux_data::<RegisteredType>(&ctx).unwrap(), Some(&5));
    }
}

#[test]
fn modules_keep_their_aux_data() {
    let registry = Arc::new(SchemaRegistry::new());
    registry.register::<Offsets>().unwrap();
    registry.register::<RegisteredType>().unwrap();
    let ctx = Context::new(registry.clone());

    let mut ir = Ir::create(&ctx);
    ir.add_aux_data::<RegisteredType>(&ctx, -1).unwrap();
    let module = ir.add_module(Module::create(&ctx, "libfoo.so"));
    module
        .add_aux_data::<Offsets>(&ctx, vec![(0x1000, "init".into()), (0x2000, "fini".into())])
        .unwrap();
    ir.add_module(Module::create(&ctx, "empty"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.hyir");
    ir.save_to_path(&ctx, &path).unwrap();

    let ctx = Context::new(registry);
    let loaded = Ir::load_from_path(&ctx, &path).unwrap();
    assert_eq!(loaded.modules().len(), 2);
    assert_eq!(loaded.get_aux_data::<RegisteredType>(&ctx).unwrap(), Some(&-1));

    let module = loaded.find_module("libfoo.so").unwrap();
    assert_eq!(module.uuid(), ir.modules()[0].uuid());
    assert_eq!(
        module.get_aux_data::<Offsets>(&ctx).unwrap(),
        Some(&vec![(0x1000, "init".to_string()), (0x2000, "fini".to_string())])
    );
    assert!(loaded.find_module("empty").unwrap().aux_data_empty());
}

#[test]
fn saving_locks_the_registry() {
    let registry = Arc::new(fixture_registry());
    let ctx = Context::new(registry.clone());
    let ir = Ir::create(&ctx);

    assert!(!registry.is_locked());
    ir.save(&ctx, Vec::new()).unwrap();
    assert!(registry.is_locked());

    assert!(registry.register::<UnregisteredType>().unwrap_err().is_locked());
    assert!(registry.register::<RegisteredType>().unwrap_err().is_locked());
    assert!(registry.register::<DuplicateNameType>().unwrap_err().is_locked());
}

#[test]
fn locking_can_be_disabled() {
    let options = RegistryOptions {
        lock_on_serialize: false,
        ..Default::default()
    };
    let registry = Arc::new(SchemaRegistry::with_options(options));
    let ctx = Context::new(registry.clone());

    let mut file = Vec::new();
    Ir::create(&ctx).save(&ctx, &mut file).unwrap();
    Ir::load(&ctx, file.as_slice()).unwrap();

    assert!(!registry.is_locked());
    registry.register::<RegisteredType>().unwrap();
}

#[test]
fn foreign_files_are_rejected() {
    let ctx = only_registered_type();
    let err = Ir::load(&ctx, &b"\x7fELF\x02\x01\x01\x00\x00\x00\x00"[..]).unwrap_err();
    assert!(err.is_bad_magic());
    assert!(!ctx.registry().is_locked());
    ctx.registry().register::<Offsets>().unwrap();

    let mut truncated = saved_example(plain_config()).1;
    truncated.truncate(truncated.len() - 4);
    assert!(Ir::load(&ctx, truncated.as_slice()).unwrap_err().is_encoding());
}

#[test]
fn corrupt_compressed_payload_is_an_encoding_error() {
    let mut file = magic::IR_MAGIC_ZSTD.to_vec();
    for part in [magic::IR_FORMAT_VERSION.0, magic::IR_FORMAT_VERSION.1, magic::IR_FORMAT_VERSION.2] {
        file.extend_from_slice(&part.to_le_bytes());
    }
    file.extend_from_slice(b"definitely not a zstd frame");

    let ctx = only_registered_type();
    assert!(Ir::load(&ctx, file.as_slice()).unwrap_err().is_encoding());
}
