use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, ChunkCoord, join_world, split_world};
use proptest::prelude::*;

fn world_axis() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

proptest! {
    // World -> (chunk, local) -> world is the identity, including for
    // negative coordinates (floor division, not truncation).
    #[test]
    fn split_join_round_trip(wx in world_axis(), wy in 0i32..CHUNK_SY as i32, wz in world_axis()) {
        let (coord, local) = split_world(wx, wy, wz);
        prop_assert_eq!(join_world(coord, local), (wx, wy, wz));
    }

    // Locals are always inside the chunk footprint.
    #[test]
    fn split_local_in_range(wx in world_axis(), wz in world_axis()) {
        let (_, (lx, _, lz)) = split_world(wx, 0, wz);
        prop_assert!((0..CHUNK_SX as i32).contains(&lx));
        prop_assert!((0..CHUNK_SZ as i32).contains(&lz));
    }

    // Every block of a chunk maps back to that chunk.
    #[test]
    fn chunk_of_own_base(cx in -10_000i32..=10_000, cz in -10_000i32..=10_000) {
        let coord = ChunkCoord::new(cx, cz);
        let (bx, bz) = coord.base();
        prop_assert_eq!(ChunkCoord::of_world(bx, bz), coord);
        prop_assert_eq!(
            ChunkCoord::of_world(bx + CHUNK_SX as i32 - 1, bz + CHUNK_SZ as i32 - 1),
            coord
        );
        prop_assert_ne!(ChunkCoord::of_world(bx - 1, bz), coord);
    }
}

#[test]
fn negative_world_floors_down() {
    assert_eq!(ChunkCoord::of_world(-1, -1), ChunkCoord::new(-1, -1));
    assert_eq!(
        ChunkCoord::of_world(-(CHUNK_SX as i32), -(CHUNK_SZ as i32)),
        ChunkCoord::new(-1, -1)
    );
    assert_eq!(
        ChunkCoord::of_world(-(CHUNK_SX as i32) - 1, 0),
        ChunkCoord::new(-2, 0)
    );
}
