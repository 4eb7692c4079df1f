mod common;

use blkdev::DeviceId;
use common::Fixture;

fn ids(fx: &Fixture) -> Vec<(u32, u32)> {
    let mut found = Vec::new();
    for dd in fx.disks.iter() {
        found.push((dd.id().major, dd.id().minor));
        fx.disks.release(dd);
    }
    found
}

#[test]
fn empty_registry_yields_nothing() {
    let fx = Fixture::new();
    assert!(fx.disks.first().is_none());
    assert!(fx.disks.next(DeviceId::new(0, 0)).is_none());
    assert!(ids(&fx).is_empty());
}

#[test]
fn walk_is_ordered_across_majors() {
    let fx = Fixture::new();
    // Created out of order, across empty majors and past the initial table sizes.
    for (major, minor) in [(9, 0), (0, 0), (3, 12), (3, 1), (40, 2), (0, 7)] {
        fx.physical(major, minor, 16);
    }
    assert_eq!(ids(&fx), [(0, 0), (0, 7), (3, 1), (3, 12), (9, 0), (40, 2)]);
}

#[test]
fn next_is_strictly_greater() {
    let fx = Fixture::new();
    fx.physical(1, 0, 16);
    fx.physical(1, 5, 16);
    fx.physical(4, 0, 16);

    let dd = fx.disks.next(DeviceId::new(1, 0)).unwrap();
    assert_eq!(dd.id(), DeviceId::new(1, 5));
    fx.disks.release(dd);

    // Identifiers that are not registered work as cursors too.
    let dd = fx.disks.next(DeviceId::new(1, 2)).unwrap();
    assert_eq!(dd.id(), DeviceId::new(1, 5));
    fx.disks.release(dd);

    let dd = fx.disks.next(DeviceId::new(1, u32::MAX)).unwrap();
    assert_eq!(dd.id(), DeviceId::new(4, 0));
    fx.disks.release(dd);

    assert!(fx.disks.next(DeviceId::new(4, 0)).is_none());
}

#[test]
fn walk_takes_a_use_per_step() {
    let fx = Fixture::new();
    fx.physical(2, 3, 16);

    let dd = fx.disks.first().unwrap();
    assert_eq!(dd.use_count(), 1);
    let again = fx.disks.next(DeviceId::new(2, 2)).unwrap();
    assert_eq!(again.use_count(), 2);
    fx.disks.release(dd);
    fx.disks.release(again);
    assert_eq!(fx.uses(2, 3), 0);
}

#[test]
fn pending_devices_are_skipped() {
    let fx = Fixture::new();
    fx.physical(1, 0, 100);
    fx.physical(1, 1, 100);
    fx.physical(5, 0, 100);
    fx.logical((2, 0), (1, 1), 0, 10);

    let held = fx.disks.obtain(DeviceId::new(1, 1)).unwrap();
    fx.disks.delete(DeviceId::new(1, 1)).unwrap();
    assert_eq!(ids(&fx), [(1, 0), (5, 0)]);

    fx.disks.release(held);
    assert_eq!(ids(&fx), [(1, 0), (5, 0)]);
}

#[test]
fn iterator_can_be_rewound() {
    let fx = Fixture::new();
    fx.physical(0, 1, 16);
    fx.physical(7, 7, 16);

    let mut iter = fx.disks.iter();
    let first = iter.next().unwrap();
    assert_eq!(first.id(), DeviceId::new(0, 1));
    fx.disks.release(first);

    iter.rewind();
    let mut seen = Vec::new();
    for dd in &mut iter {
        seen.push(dd.id());
        fx.disks.release(dd);
    }
    assert_eq!(seen, [DeviceId::new(0, 1), DeviceId::new(7, 7)]);
    // Exhausted iterators stay exhausted.
    assert!(iter.next().is_none());

    assert_eq!(fx.uses(0, 1), 0);
    assert_eq!(fx.uses(7, 7), 0);
}

#[test]
fn devices_created_behind_the_cursor_are_not_seen() {
    let fx = Fixture::new();
    fx.physical(3, 0, 16);
    fx.physical(6, 0, 16);

    let mut iter = fx.disks.iter();
    let dd = iter.next().unwrap();
    fx.disks.release(dd);

    fx.physical(1, 0, 16);
    fx.physical(4, 0, 16);
    let rest: Vec<DeviceId> = iter
        .map(|dd| {
            let id = dd.id();
            fx.disks.release(dd);
            id
        })
        .collect();
    assert_eq!(rest, [DeviceId::new(4, 0), DeviceId::new(6, 0)]);
}
