use super::*;

#[test]
fn test_names_start_at_one() {
    let mut names = NameAllocator::new();
    assert_eq!(names.generate(), 1);
    assert_eq!(names.generate(), 2);
    assert_eq!(names.live_count(), 2);
    assert_eq!(names.highest(), 2);
}

#[test]
fn test_released_names_come_back_most_recent_first() {
    let mut names = NameAllocator::new();
    let a = names.generate();
    let _b = names.generate();
    let c = names.generate();
    assert!(names.release(a));
    assert!(names.release(c));

    assert_eq!(names.generate(), c);
    assert_eq!(names.generate(), a);
    assert_eq!(names.generate(), 4);
    assert_eq!(names.highest(), 4);
}

#[test]
fn test_release_of_dead_name_is_refused() {
    let mut names = NameAllocator::new();
    let a = names.generate();
    assert!(names.release(a));
    assert!(!names.release(a), "double release");
    assert!(!names.release(0), "0 is never live");
    assert!(!names.release(17), "never generated");

    assert_eq!(names.generate(), a);
    assert_eq!(names.generate(), 2, "double release did not queue the name twice");
}

#[test]
fn test_liveness_tracking() {
    let mut names = NameAllocator::new();
    let a = names.generate();
    assert!(names.is_live(a));
    names.release(a);
    assert!(!names.is_live(a));
    assert_eq!(names.live_count(), 0);
}
