//! Checkpoint/restart example: serialization round-trip over a shared,
//! cyclic object graph.
//!
//! Builds a small graph with shared payloads and a back-edge, packs it
//! into a checkpoint, restores it, and verifies the restored graph
//! re-encodes to byte-identical output.
//!
//! Run with: `cargo run -p amber-core --example checkpoint_restart`

use amber_core::checkpoint::{read_checkpoint, write_checkpoint};
use amber_core::shared::{Serializable, Shared};
use amber_core::test_utils::{ring, test_registry, Leaf};

fn main() {
    let registry = test_registry();

    // --- Step 1: Build a graph with sharing and a cycle ---

    let nodes = ring(4);
    let stats = Shared::new(Leaf {
        label: String::from("shared-stats"),
        value: 17,
    })
    .into_dyn();
    nodes[0].borrow_mut().payload = Some(stats.clone());
    nodes[2].borrow_mut().payload = Some(stats);

    let mut roots = vec![nodes[0].clone().into_dyn()];

    // --- Step 2: Checkpoint ---

    let bytes = write_checkpoint(&registry, 10, &mut roots).expect("checkpoint should succeed");
    println!("Checkpointed 4-node ring to {} bytes", bytes.len());

    // --- Step 3: Restart ---

    let restored = read_checkpoint(&registry, &bytes).expect("restore should succeed");
    println!("Restored {} root(s) at tick {}", restored.roots.len(), restored.tick);

    // --- Step 4: Verify byte-identical re-encoding ---

    let mut roots_again = restored.roots;
    let second = write_checkpoint(&registry, restored.tick, &mut roots_again)
        .expect("re-encoding should succeed");
    assert_eq!(bytes, second, "re-encoded checkpoint must be byte-identical");
    println!("Re-encoded checkpoint is byte-identical ({} bytes)", second.len());

    // break the cycles so both graphs can be reclaimed
    nodes[3].borrow_mut().next = None;
    if let Some(node) = roots_again[0]
        .borrow_mut()
        .as_any_mut()
        .downcast_mut::<amber_core::test_utils::Node>()
    {
        node.next = None;
    }
}
