use std::{collections::BTreeMap, hint::black_box};

use criterion::{Criterion, criterion_group, criterion_main};
use hyaux::{AuxDataCodec, AuxDataContainer, AuxDataSchema, RawAuxData, SchemaRegistry};

struct SymbolNames;
impl AuxDataSchema for SymbolNames {
    const NAME: &'static str = "symbolNames";
    type Type = BTreeMap<u64, Vec<String>>;
}

fn sample() -> BTreeMap<u64, Vec<String>> {
    (0..1024u64)
        .map(|addr| (addr * 16, vec![format!("sym_{addr}"), format!("alias_{addr}")]))
        .collect()
}

fn bench_codec(c: &mut Criterion) {
    let value = sample();
    let bytes = value.to_bytes();

    c.bench_function("encode mapping<uint64_t,sequence<string>>", |b| {
        b.iter(|| black_box(&value).to_bytes())
    });

    c.bench_function("decode mapping<uint64_t,sequence<string>>", |b| {
        b.iter(|| <BTreeMap<u64, Vec<String>>>::from_bytes(black_box(&bytes)))
    });
}

fn bench_lazy_get(c: &mut Criterion) {
    let registry = SchemaRegistry::new();
    registry.register::<SymbolNames>().unwrap();
    let raw = RawAuxData {
        key: SymbolNames::NAME.to_string(),
        type_tag: <<SymbolNames as AuxDataSchema>::Type as AuxDataCodec>::type_name(),
        raw_bytes: sample().to_bytes(),
    };

    c.bench_function("first get after load", |b| {
        b.iter(|| {
            let container: AuxDataContainer = [raw.clone()].into_iter().collect();
            black_box(container.get::<SymbolNames>(&registry).unwrap().map(|v| v.len()))
        })
    });
}

criterion_group!(benches, bench_codec, bench_lazy_get);
criterion_main!(benches);
