use super::*;
use crate::stores::BufStore;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};


fn new_heap(buf: &mut [u8]) -> RawMalloc<BufStore> {
    unsafe { RawMalloc::with_store(BufStore::new(buf.as_mut_ptr(), buf.len())) }
}

unsafe fn fill(p: *mut u8, len: usize, byte: u8) {
    unsafe { write_bytes(p, byte, len) };
}

unsafe fn bytes<'a>(p: *mut u8, len: usize) -> &'a [u8] {
    unsafe { core::slice::from_raw_parts(p, len) }
}

#[test]
fn test_1() {
    let mut buf = vec![0_u8; 1024];
    let mut heap = new_heap(&mut buf);

    assert!(heap.allocate(0).is_null());
    assert_eq!(heap.break_offset(), 0);
    assert_eq!(heap.block_count(), 0);

    let p = heap.allocate(16);
    assert!(!p.is_null());
    let before = heap.blocks();
    assert!(heap.allocate(0).is_null());
    assert_eq!(heap.blocks(), before);
    assert_eq!(heap.break_offset(), HEADER_SIZE + 16);
}

#[test]
fn test_2() {
    let mut buf = vec![0_u8; 1 << 20];
    let mut heap = new_heap(&mut buf);
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut live: Vec<(*mut u8, usize, u8)> = vec![];

    for round in 0..20 {
        for i in 0..50 {
            let size = rng.gen_range(1..=256);
            let p = heap.allocate(size);
            assert!(!p.is_null());
            let byte = (round * 50 + i) as u8;
            unsafe { fill(p, size, byte) };
            live.push((p, size, byte));
        }

        let mut kept = vec![];
        for (p, size, byte) in live.drain(..) {
            assert!(
                unsafe { bytes(p, size) }.iter().all(|&b| b == byte),
                "Allocation at {p:?} was overwritten."
            );
            if rng.gen_bool(0.5) {
                unsafe { heap.deallocate(p) };
            } else {
                kept.push((p, size, byte));
            }
        }
        live = kept;
    }

    for (p, size, byte) in live {
        assert!(unsafe { bytes(p, size) }.iter().all(|&b| b == byte));
    }
}

#[test]
fn test_3() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    let a = heap.allocate(32);
    let _b = heap.allocate(8);
    unsafe {
        fill(a, 32, 0xFF);
        heap.deallocate(a);
    }

    // Reuses `a`'s dirty block.
    let c = heap.zero_allocate(4, 8);
    assert_eq!(c, a);
    assert!(unsafe { bytes(c, 32) }.iter().all(|&b| b == 0));

    for (count, elem_size) in [(1, 1), (3, 7), (10, 4), (100, 3)] {
        let p = heap.zero_allocate(count, elem_size);
        assert!(!p.is_null());
        assert!(unsafe { bytes(p, count * elem_size) }.iter().all(|&b| b == 0));
        unsafe { fill(p, count * elem_size, 0xAA) };
    }
}

#[test]
fn test_4() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    let base = heap.allocate(10);
    let start = heap.break_offset();

    let a = heap.allocate(40);
    let b = heap.allocate(24);
    assert_eq!(heap.break_offset(), start + 2 * HEADER_SIZE + 64);

    unsafe { heap.deallocate(b) };
    assert_eq!(heap.break_offset(), start + HEADER_SIZE + 40);
    unsafe { heap.deallocate(a) };
    assert_eq!(heap.break_offset(), start);
    assert_eq!(heap.block_count(), 1);

    unsafe { heap.deallocate(base) };
    assert_eq!(heap.break_offset(), 0);
    assert_eq!(heap.block_count(), 0);
}

#[test]
fn test_5() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    let a = heap.allocate(64);
    let _b = heap.allocate(64);
    let _c = heap.allocate(64);
    let program_break = heap.break_offset();

    unsafe { heap.deallocate(a) };
    assert_eq!(heap.break_offset(), program_break);
    assert!(heap.blocks()[0].is_free);

    let d = heap.allocate(50);
    assert_eq!(d, a);
    assert_eq!(heap.break_offset(), program_break);
    assert_eq!(heap.block_count(), 3);
    // No splitting, the whole block goes to `d`.
    assert_eq!(unsafe { heap.block_size(NonNull::new(d).unwrap()) }, 64);
}

#[test]
fn test_6() {
    const BUF_SIZE: usize = 256;
    let mut buf = vec![0_u8; BUF_SIZE];
    let mut heap = new_heap(&mut buf);

    let a = heap.allocate(100);
    assert!(!a.is_null());
    unsafe { fill(a, 100, 0x42) };
    let program_break = heap.break_offset();
    let before = heap.blocks();

    let remaining = BUF_SIZE - program_break;
    assert!(heap.allocate(remaining - HEADER_SIZE + 1).is_null());
    assert!(heap.allocate(usize::MAX).is_null());
    assert!(heap.allocate(usize::MAX - HEADER_SIZE + 1).is_null());
    assert_eq!(heap.break_offset(), program_break);
    assert_eq!(heap.blocks(), before);
    assert!(unsafe { bytes(a, 100) }.iter().all(|&b| b == 0x42));

    // The arena can be filled to the last byte.
    assert!(!heap.allocate(remaining - HEADER_SIZE).is_null());
    assert_eq!(heap.break_offset(), BUF_SIZE);
    assert!(heap.allocate(1).is_null());
}

#[test]
fn test_7() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    let a = heap.allocate(8);
    for i in 0..8 {
        unsafe { *a.add(i) = i as u8 + 1 };
    }

    unsafe {
        assert_eq!(heap.reallocate(a, 8), a);
        assert_eq!(heap.reallocate(a, 1), a);
        assert_eq!(heap.block_size(NonNull::new(a).unwrap()), 8);

        let p = heap.reallocate(a, 32);
        assert!(!p.is_null());
        assert_ne!(p, a);
        assert_eq!(p, a.add(8 + HEADER_SIZE));
        assert_eq!(bytes(p, 8), &[1, 2, 3, 4, 5, 6, 7, 8]);

        // The old block wasn't at the break anymore, so it's kept as a free block.
        let blocks = heap.blocks();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_free);
        assert!(!blocks[1].is_free);

        assert_eq!(heap.reallocate(p, 20), p);
    }
}

#[test]
fn test_8() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    tracing::subscriber::with_default(logging::subscriber(), || {
        let a = heap.allocate(40);
        let b = heap.allocate(40);
        let program_break = heap.break_offset();
        assert_eq!(program_break, 2 * (HEADER_SIZE + 40));

        unsafe { heap.deallocate(a) };
        assert_eq!(heap.break_offset(), program_break);

        let c = heap.allocate(20);
        assert_eq!(c, a);
        assert_eq!(heap.block_count(), 2);
        assert_eq!(heap.break_offset(), program_break);
        assert_eq!(
            heap.blocks(),
            vec![
                BlockInfo {
                    offset: 0,
                    size: 40,
                    is_free: false
                },
                BlockInfo {
                    offset: HEADER_SIZE + 40,
                    size: 40,
                    is_free: false
                },
            ]
        );
        assert_eq!(unsafe { b.offset_from(c) }, (HEADER_SIZE + 40) as isize);
    });
}

#[test]
fn test_9() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    unsafe {
        let p = heap.reallocate(null_mut(), 16);
        assert!(!p.is_null());
        assert_eq!(heap.block_size(NonNull::new(p).unwrap()), 16);

        // Resizing to zero neither frees nor succeeds.
        assert!(heap.reallocate(p, 0).is_null());
        assert!(heap.reallocate(null_mut(), 0).is_null());
        assert_eq!(heap.block_count(), 1);
        assert!(!heap.blocks()[0].is_free);

        heap.deallocate(null_mut());
        assert_eq!(heap.block_count(), 1);
    }
}

#[test]
fn test_10() {
    let mut buf = vec![0_u8; 128];
    let mut heap = new_heap(&mut buf);

    let a = heap.allocate(40);
    unsafe { fill(a, 40, 0x17) };
    let before = heap.blocks();

    unsafe {
        assert!(heap.reallocate(a, 100).is_null());
        assert_eq!(heap.blocks(), before);
        assert!(bytes(a, 40).iter().all(|&b| b == 0x17));

        // `a` is still live and still at the break.
        heap.deallocate(a);
    }
    assert_eq!(heap.break_offset(), 0);
}

#[test]
fn test_11() {
    let mut buf = vec![0_u8; 1024];
    let mut heap = new_heap(&mut buf);

    assert!(heap.zero_allocate(0, 8).is_null());
    assert!(heap.zero_allocate(8, 0).is_null());
    assert!(heap.zero_allocate(usize::MAX, 2).is_null());
    assert!(heap.zero_allocate(2, usize::MAX / 2 + 1).is_null());
    assert_eq!(heap.break_offset(), 0);

    assert_eq!(heap.__calloc(0, 1), Err(AllocError::ZeroSize));
    assert_eq!(heap.__calloc(usize::MAX, 2), Err(AllocError::Overflow));
    assert_eq!(heap.__calloc(1024, 1), Err(AllocError::OutOfMemory));
}

#[test]
fn test_12() {
    let mut buf = vec![0_u8; 1024];
    let mut heap = new_heap(&mut buf);

    let a = heap.allocate(16);
    let b = heap.allocate(16);
    unsafe {
        // Not at the break, only marked.
        heap.deallocate(a);
        // At the break, unlinked and reclaimed.
        heap.deallocate(b);
    }
    assert_eq!(heap.break_offset(), HEADER_SIZE + 16);
    assert_eq!(
        heap.blocks(),
        vec![BlockInfo {
            offset: 0,
            size: 16,
            is_free: true
        }]
    );

    // `a` is never reclaimed on its own, only reused.
    let c = heap.allocate(8);
    assert_eq!(c, a);
    let d = heap.allocate(8);
    assert_eq!(d, b);
}

#[test]
fn test_13() {
    let mut buf = vec![0_u8; 4096];
    let mut heap = new_heap(&mut buf);

    let big = heap.allocate(200);
    let _x = heap.allocate(1);
    let tight = heap.allocate(10);
    let _y = heap.allocate(1);

    unsafe {
        heap.deallocate(big);
        heap.deallocate(tight);
    }
    // First fit in creation order, not best fit.
    assert_eq!(heap.allocate(10), big);
    assert_eq!(heap.allocate(10), tight);
    assert_eq!(heap.block_count(), 4);
}

#[test]
fn test_14() {
    let mut buf = vec![0_u8; 1 << 16];
    let mut heap = new_heap(&mut buf);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..10 {
        let mut stack = vec![];
        for _ in 0..rng.gen_range(1..64) {
            let p = heap.allocate(rng.gen_range(1..128));
            assert!(!p.is_null());
            stack.push(p);
        }
        while let Some(p) = stack.pop() {
            unsafe { heap.deallocate(p) };
        }
        assert_eq!(heap.break_offset(), 0);
        assert_eq!(heap.block_count(), 0);
    }
}

#[test]
fn test_15() {
    let mut buf = vec![0_u8; 64];
    let mut heap = new_heap(&mut buf);

    assert_eq!(heap.__alloc(0), Err(AllocError::ZeroSize));
    assert_eq!(heap.__alloc(64), Err(AllocError::OutOfMemory));
    assert!(heap.__alloc(64 - HEADER_SIZE).is_ok());
}
