//! Graph-shape tests: sharing, cycles, weak back-references, and the
//! byte-identity property the checkpoint diff harness depends on.

use std::sync::Arc;

use amber_core::context::{SerError, Serializer};
use amber_core::id::ObjectId;
use amber_core::shared::{Serializable, Shared};
use amber_core::test_utils::{linked_chain, ring, test_registry, Leaf, Node};
use amber_core::wire::FormatError;

fn pack_nodes(
    reg: &Arc<amber_core::registry::TypeRegistry>,
    head: &mut Shared<Node>,
) -> Vec<u8> {
    let mut ser = Serializer::packing(Arc::clone(reg));
    ser.root(head).unwrap();
    ser.finish().unwrap()
}

fn unpack_node(reg: &Arc<amber_core::registry::TypeRegistry>, bytes: &[u8]) -> Shared<Node> {
    let mut ser = Serializer::unpacking(Arc::clone(reg), bytes);
    let mut head: Shared<Node> = Shared::default();
    ser.root(&mut head).unwrap();
    ser.expect_end().unwrap();
    head
}

#[test]
fn chain_round_trips_with_parents_resolved() {
    let reg = test_registry();
    let nodes = linked_chain(4);
    let mut head = nodes[0].clone();
    let bytes = pack_nodes(&reg, &mut head);

    let restored = unpack_node(&reg, &bytes);
    // walk the chain and check the weak back-links point at the actual
    // predecessor instances
    let mut current = restored.clone();
    for i in 0..4 {
        assert_eq!(current.borrow().name, format!("node-{i}"));
        let next = current.borrow().next.clone();
        match next {
            Some(next) => {
                let parent = next.borrow().parent.upgrade().expect("parent resolves");
                assert!(parent.ptr_eq(&current));
                current = next;
            }
            None => assert_eq!(i, 3),
        }
    }
}

#[test]
fn diamond_sharing_is_preserved() {
    let reg = test_registry();
    // two nodes share one payload object
    let payload = Shared::new(Leaf {
        label: String::from("shared-stats"),
        value: 5,
    })
    .into_dyn();
    let nodes = linked_chain(2);
    nodes[0].borrow_mut().payload = Some(payload.clone());
    nodes[1].borrow_mut().payload = Some(payload);

    let mut head = nodes[0].clone();
    let bytes = pack_nodes(&reg, &mut head);
    let restored = unpack_node(&reg, &bytes);

    let first = restored.borrow().payload.clone().unwrap();
    let tail = restored.borrow().next.clone().unwrap();
    let second = tail.borrow().payload.clone().unwrap();

    // one reconstructed instance, not two copies
    first
        .borrow_mut()
        .as_any_mut()
        .downcast_mut::<Leaf>()
        .unwrap()
        .value = 41;
    let guard = second.borrow();
    assert_eq!(guard.as_any().downcast_ref::<Leaf>().unwrap().value, 41);
}

#[test]
fn cycle_terminates_and_reconstructs_its_topology() {
    let reg = test_registry();
    let nodes = ring(3);
    let mut head = nodes[0].clone();
    let bytes = pack_nodes(&reg, &mut head);

    let restored = unpack_node(&reg, &bytes);
    let second = restored.borrow().next.clone().unwrap();
    let third = second.borrow().next.clone().unwrap();
    let back_to_head = third.borrow().next.clone().unwrap();
    assert!(back_to_head.ptr_eq(&restored), "cycle closes on the head");

    // head's parent is the tail, through the weak back-edge
    let parent = restored.borrow().parent.upgrade().unwrap();
    assert!(parent.ptr_eq(&third));

    // break the cycles so the graphs can be reclaimed
    nodes[2].borrow_mut().next = None;
    third.borrow_mut().next = None;
}

#[test]
fn reencoding_a_restored_cycle_is_byte_identical() {
    let reg = test_registry();
    let nodes = ring(5);
    let mut head = nodes[0].clone();
    let first = pack_nodes(&reg, &mut head);

    let restored = unpack_node(&reg, &first);
    let mut restored_head = restored.clone();
    let second = pack_nodes(&reg, &mut restored_head);
    assert_eq!(first, second);

    nodes[4].borrow_mut().next = None;
    let tail = {
        let mut current = restored.clone();
        for _ in 0..4 {
            let next = current.borrow().next.clone().unwrap();
            current = next;
        }
        current
    };
    tail.borrow_mut().next = None;
}

#[test]
fn self_referential_node_round_trips() {
    let reg = test_registry();
    let node = Shared::new(Node {
        name: String::from("ouroboros"),
        ..Node::default()
    });
    node.borrow_mut().next = Some(node.clone());

    let mut head = node.clone();
    let bytes = pack_nodes(&reg, &mut head);
    let restored = unpack_node(&reg, &bytes);
    let next = restored.borrow().next.clone().unwrap();
    assert!(next.ptr_eq(&restored));

    node.borrow_mut().next = None;
    restored.borrow_mut().next = None;
}

#[test]
fn back_reference_through_wrong_type_is_a_format_error() {
    let reg = test_registry();
    let leaf = Shared::new(Leaf {
        label: String::from("x"),
        value: 1,
    });
    let mut pair = (leaf.clone(), leaf);
    let mut ser = Serializer::packing(Arc::clone(&reg));
    ser.root(&mut pair).unwrap();
    let bytes = ser.finish().unwrap();

    // decode the second handle through an incompatible static type
    let mut ser = Serializer::unpacking(reg, &bytes);
    let mut first: Shared<Leaf> = Shared::default();
    ser.root(&mut first).unwrap();
    let mut second: Shared<Node> = Shared::default();
    let err = ser.root(&mut second).unwrap_err();
    assert!(matches!(
        err,
        SerError::Format(FormatError::BackRefType {
            id: ObjectId(1),
            ..
        })
    ));
}

#[test]
fn truncated_graph_stream_fails_cleanly() {
    let reg = test_registry();
    let nodes = linked_chain(3);
    let mut head = nodes[0].clone();
    let bytes = pack_nodes(&reg, &mut head);

    for cut in [1, 9, bytes.len() / 2, bytes.len() - 1] {
        let mut ser = Serializer::unpacking(Arc::clone(&reg), &bytes[..cut]);
        let mut out: Shared<Node> = Shared::default();
        let err = ser.root(&mut out).unwrap_err();
        assert!(
            matches!(err, SerError::Format(FormatError::UnexpectedEof { .. })),
            "cut at {cut} gave {err:?}"
        );
    }
}

#[test]
fn polymorphic_identity_survives_round_trip() {
    let reg = test_registry();
    let nodes = linked_chain(1);
    nodes[0].borrow_mut().payload = Some(
        Shared::new(Leaf {
            label: String::from("concrete"),
            value: 8,
        })
        .into_dyn(),
    );

    let mut head = nodes[0].clone();
    let bytes = pack_nodes(&reg, &mut head);
    let restored = unpack_node(&reg, &bytes);
    let payload = restored.borrow().payload.clone().unwrap();
    assert_eq!(payload.concrete_type_id(), amber_core::test_utils::LEAF_TYPE);
}
