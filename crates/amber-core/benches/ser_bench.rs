//! Criterion benchmarks for the serialization engine.
//!
//! Three benchmark groups:
//! - `pack_chain` / `unpack_chain`: a 512-node linked graph with weak
//!   back-edges -- measures the reference tracker on deep graphs
//! - `pack_containers`: map- and vector-heavy payloads -- measures the
//!   container codecs
//! - `checkpoint`: full write/read round trip through the envelope

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use amber_core::checkpoint::{read_checkpoint, write_checkpoint};
use amber_core::context::Serializer;
use amber_core::serialize::Serialize;
use amber_core::shared::Shared;
use amber_core::test_utils::{linked_chain, test_registry, Leaf, Node};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_chain(c: &mut Criterion) {
    let reg = test_registry();
    let nodes = linked_chain(512);

    c.bench_function("pack_chain_512", |b| {
        b.iter(|| {
            let mut head = nodes[0].clone();
            let mut ser = Serializer::packing(Arc::clone(&reg));
            ser.root(&mut head).unwrap();
            ser.finish().unwrap()
        })
    });

    let bytes = {
        let mut head = nodes[0].clone();
        let mut ser = Serializer::packing(Arc::clone(&reg));
        ser.root(&mut head).unwrap();
        ser.finish().unwrap()
    };

    c.bench_function("unpack_chain_512", |b| {
        b.iter(|| {
            let mut ser = Serializer::unpacking(Arc::clone(&reg), &bytes);
            let mut head: Shared<Node> = Shared::default();
            ser.root(&mut head).unwrap();
            head
        })
    });
}

fn bench_containers(c: &mut Criterion) {
    let reg = test_registry();

    #[derive(Debug, Default)]
    struct Payload {
        routes: BTreeMap<String, u64>,
        load: HashMap<u32, u64>,
        trace: Vec<f64>,
    }

    impl Serialize for Payload {
        fn serialize(
            &mut self,
            ser: &mut Serializer<'_>,
        ) -> Result<(), amber_core::context::SerError> {
            self.routes.serialize(ser)?;
            self.load.serialize(ser)?;
            self.trace.serialize(ser)
        }
    }

    let mut payload = Payload::default();
    for i in 0..256u32 {
        payload.routes.insert(format!("route-{i}"), u64::from(i));
        payload.load.insert(i, u64::from(i) * 3);
        payload.trace.push(f64::from(i) * 0.5);
    }

    c.bench_function("pack_containers", |b| {
        b.iter(|| {
            let mut ser = Serializer::packing(Arc::clone(&reg));
            ser.root(&mut payload).unwrap();
            ser.finish().unwrap()
        })
    });
}

fn bench_checkpoint(c: &mut Criterion) {
    let reg = test_registry();
    let mut roots: Vec<_> = (0..128)
        .map(|i| {
            Shared::new(Leaf {
                label: format!("leaf-{i}"),
                value: i,
            })
            .into_dyn()
        })
        .collect();

    c.bench_function("checkpoint_write_128", |b| {
        b.iter(|| write_checkpoint(&reg, 0, &mut roots).unwrap())
    });

    let bytes = write_checkpoint(&reg, 0, &mut roots).unwrap();
    c.bench_function("checkpoint_read_128", |b| {
        b.iter(|| read_checkpoint(&reg, &bytes).unwrap())
    });
}

criterion_group!(benches, bench_chain, bench_containers, bench_checkpoint);
criterion_main!(benches);
