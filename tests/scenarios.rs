//! End-to-end scenarios exercising each primitive through its public API.

use riptide::{mpmc, spsc};

#[test]
fn spsc_queue_drain_and_refill() {
    let (mut tx, mut rx) = spsc::Queue::<i32, 4>::new();

    tx.push(-1024).unwrap();
    tx.push(111).unwrap();
    tx.push(654).unwrap();

    assert_eq!(rx.pop(), Some(-1024));
    assert_eq!(rx.pop(), Some(111));
    assert_eq!(rx.pop(), Some(654));

    // The indices have wrapped; the queue keeps working
    tx.push(5).unwrap();
    tx.push(1000).unwrap();

    assert_eq!(rx.pop(), Some(5));
    assert_eq!(rx.pop(), Some(1000));
}

#[test]
fn mpmc_queue_fills_to_capacity() {
    let q = mpmc::Queue::<u8, 8>::new();

    for v in [1, 1, 2, 3, 5, 8, 13, 21] {
        q.push(v).unwrap();
    }
    assert_eq!(q.push(34), Err(riptide::Full(34)));

    assert_eq!(q.pop(), Some(1));
    q.push(34).unwrap();
}

#[test]
fn bipartite_wrap_returns_front_span() {
    let (mut wr, mut rd) = spsc::BipartiteBuffer::<u32, 512>::new();

    let mut grant = wr.grant(320).unwrap();
    let first_ptr = grant.as_ptr() as usize;
    for slot in grant.iter_mut() {
        slot.write(0xE5A1_D2C3);
    }
    unsafe { grant.commit(320) };

    let view = rd.read().unwrap();
    assert_eq!(view.as_ptr() as usize, first_ptr);
    assert_eq!(view.len(), 320);
    assert!(view.iter().all(|&v| v == 0xE5A1_D2C3));
    view.release(320);

    // 191 slots remain at the end, so a grant of 240 must come from the
    // front of the array
    let mut grant = wr.grant(240).unwrap();
    assert_eq!(grant.as_ptr() as usize, first_ptr);
    for slot in grant.iter_mut() {
        slot.write(0xA3B2_C1D0);
    }
    unsafe { grant.commit(240) };

    let view = rd.read().unwrap();
    assert_eq!(view.as_ptr() as usize, first_ptr);
    assert_eq!(view.len(), 240);
    assert!(view.iter().all(|&v| v == 0xA3B2_C1D0));
}

#[test]
fn bipartite_write_ending_at_array_end_stays_readable() {
    let (mut wr, mut rd) = spsc::BipartiteBuffer::<u8, 16>::new();

    let mut grant = wr.grant(8).unwrap();
    for slot in grant.iter_mut() {
        slot.write(0xAA);
    }
    unsafe { grant.commit(8) };
    rd.read().unwrap().release(8);

    // This span ends exactly at the end of the backing array
    let mut grant = wr.grant(8).unwrap();
    let write_ptr = grant.as_ptr() as usize;
    for slot in grant.iter_mut() {
        slot.write(0xBB);
    }
    unsafe { grant.commit(8) };

    let view = rd.read().unwrap();
    assert_eq!(view.as_ptr() as usize, write_ptr);
    assert_eq!(&*view, &[0xBB; 8]);
}

#[test]
fn spsc_priority_queue_orders_across_levels() {
    let (mut tx, mut rx) = spsc::PriorityQueue::<u64, 10, 4>::new();

    tx.push(256, 2).unwrap();
    tx.push(1024, 0).unwrap();
    tx.push(128, 1).unwrap();
    tx.push(512, 3).unwrap();

    assert_eq!(rx.pop(), Some(512));
    assert_eq!(rx.pop(), Some(256));
    assert_eq!(rx.pop(), Some(128));
    assert_eq!(rx.pop(), Some(1024));
    assert_eq!(rx.pop(), None);
}

#[test]
fn mpmc_priority_queue_orders_across_levels() {
    let q = mpmc::PriorityQueue::<u64, 16, 4>::new();

    q.push(256, 2).unwrap();
    q.push(1024, 0).unwrap();
    q.push(128, 1).unwrap();
    q.push(512, 3).unwrap();

    assert_eq!(q.pop(), Some(512));
    assert_eq!(q.pop(), Some(256));
    assert_eq!(q.pop(), Some(128));
    assert_eq!(q.pop(), Some(1024));
    assert_eq!(q.pop(), None);
}

#[test]
fn ring_buffer_round_trip_preserves_bytes() {
    let (mut wr, mut rd) = spsc::RingBuffer::<u8, 512>::new();

    let src: Vec<u8> = (0..200).collect();
    wr.write(&src).unwrap();

    let mut dst = vec![0u8; 200];
    rd.read(&mut dst).unwrap();
    assert_eq!(dst, src);

    assert_eq!(rd.available(), 0);
    assert_eq!(wr.free(), 511);
}

#[test]
fn ring_buffer_clear_resets_quiescent_buffer() {
    let (mut wr, mut rd) = spsc::RingBuffer::<u16, 128>::new();

    wr.write(&[7; 100]).unwrap();
    rd.skip(10).unwrap();

    spsc::RingBuffer::clear(&mut wr, &mut rd);

    assert_eq!(rd.available(), 0);
    assert_eq!(wr.free(), 127);
}
