use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, CHUNK_VOLUME, VoxelGrid};
use proptest::prelude::*;

proptest! {
    // idx maps each in-bounds (x,y,z) to a unique in-range slot.
    #[test]
    fn idx_is_bijective(_dummy in 0u8..1) {
        let mut seen = vec![false; CHUNK_VOLUME];
        for y in 0..CHUNK_SY {
            for z in 0..CHUNK_SZ {
                for x in 0..CHUNK_SX {
                    let i = VoxelGrid::idx(x, y, z);
                    prop_assert!(i < CHUNK_VOLUME);
                    prop_assert!(!seen[i]);
                    seen[i] = true;
                }
            }
        }
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // set then get round-trips through the same linear mapping.
    #[test]
    fn set_get_round_trip(
        x in 0i32..CHUNK_SX as i32,
        y in 0i32..CHUNK_SY as i32,
        z in 0i32..CHUNK_SZ as i32,
        id in 0u8..=255,
    ) {
        let mut grid = VoxelGrid::new();
        prop_assert!(grid.set_block(x, y, z, id));
        prop_assert_eq!(grid.block(x, y, z), id);
        prop_assert_eq!(grid.block_bytes()[VoxelGrid::idx(x as usize, y as usize, z as usize)], id);
    }

    // The persisted byte image reproduces the voxel array exactly.
    #[test]
    fn block_bytes_round_trip(seed in any::<u64>()) {
        let mut grid = VoxelGrid::new();
        let mut v = seed;
        for y in 0..CHUNK_SY as i32 {
            for z in 0..CHUNK_SZ as i32 {
                for x in 0..CHUNK_SX as i32 {
                    v = v.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    grid.set_block(x, y, z, (v >> 56) as u8);
                }
            }
        }
        let dump = grid.block_bytes().to_vec();
        let mut other = VoxelGrid::new();
        prop_assert!(other.load_block_bytes(&dump));
        prop_assert_eq!(other.block_bytes(), dump.as_slice());
    }
}

#[test]
fn load_rejects_wrong_length() {
    let mut grid = VoxelGrid::new();
    assert!(!grid.load_block_bytes(&[0u8; 3]));
    assert!(!grid.load_block_bytes(&vec![0u8; CHUNK_VOLUME + 1]));
}
