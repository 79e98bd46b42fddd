//! Integration tests for PersistentArray.
//!
//! Most tests use a branching factor of 4 so that a handful of elements
//! already produce multi-level trees.

use persistent_array::array::{ArrayError, PersistentArray};
use rstest::rstest;

type SmallArray = PersistentArray<i32, 4>;

fn contents<const B: usize>(array: &PersistentArray<i32, B>) -> Vec<i32> {
    array.iter().copied().collect()
}

// =============================================================================
// Scenario: six pushes, take, update
// =============================================================================

#[rstest]
fn test_six_pushes_grow_height_once() {
    let mut array = SmallArray::new();
    let mut heights = Vec::new();
    for _ in 0..6 {
        array = array.push_back(42);
        heights.push(array.height());
    }

    assert_eq!(heights, vec![1, 1, 1, 1, 2, 2]);
    assert_eq!(array.len(), 6);
    array.validate().unwrap();
}

#[rstest]
fn test_take_three_of_six() {
    let array: SmallArray = std::iter::repeat_n(42, 6).collect();
    let taken = array.take(3).unwrap();

    assert_eq!(contents(&taken), vec![42, 42, 42]);
    assert_eq!(taken.height(), 1);
    taken.validate().unwrap();
}

#[rstest]
fn test_update_first_leaves_original_unchanged() {
    let array: SmallArray = std::iter::repeat_n(42, 6).collect();
    let updated = array.update(0, |x| x + 1).unwrap();

    assert_eq!(contents(&updated), vec![43, 42, 42, 42, 42, 42]);
    assert_eq!(contents(&array), vec![42; 6]);
}

// =============================================================================
// Out-of-range reporting
// =============================================================================

#[rstest]
#[case(0, 0)]
#[case(3, 3)]
#[case(5, 100)]
fn test_update_out_of_range(#[case] size: i32, #[case] index: usize) {
    let array: SmallArray = (0..size).collect();
    let error = array.update(index, |x| x + 1).unwrap_err();

    assert_eq!(
        error,
        ArrayError::IndexOutOfRange {
            index,
            size: array.len(),
        }
    );
    assert_eq!(contents(&array), (0..size).collect::<Vec<_>>());
}

#[rstest]
#[case(0, 1)]
#[case(9, 10)]
fn test_take_out_of_range(#[case] size: i32, #[case] count: usize) {
    let array: SmallArray = (0..size).collect();
    assert_eq!(
        array.take(count).unwrap_err(),
        ArrayError::CountOutOfRange {
            count,
            size: array.len(),
        }
    );
}

#[rstest]
fn test_into_update_out_of_range_returns_array() {
    let array: SmallArray = (0..9).collect();
    let rejected = array.into_update(9, |x| x + 1).unwrap_err();

    assert_eq!(
        rejected.error(),
        ArrayError::IndexOutOfRange { index: 9, size: 9 }
    );
    assert_eq!(contents(&rejected.into_array()), (0..9).collect::<Vec<_>>());
}

#[rstest]
fn test_into_take_out_of_range_returns_array() {
    let array: SmallArray = (0..9).collect();
    let rejected = array.into_take(10).unwrap_err();

    assert_eq!(rejected.to_string(), "count out of range: the size is 9 but the count is 10");
    assert_eq!(rejected.into_array().len(), 9);
}

// =============================================================================
// Take
// =============================================================================

#[rstest]
#[case(0, 0)]
#[case(1, 1)]
#[case(4, 1)]
#[case(5, 2)]
#[case(16, 2)]
#[case(17, 3)]
#[case(64, 3)]
fn test_take_collapses_to_minimal_height(#[case] count: usize, #[case] height: usize) {
    let array: SmallArray = (0..64).collect();
    let taken = array.take(count).unwrap();

    assert_eq!(taken.len(), count);
    assert_eq!(taken.height(), height);
    taken.validate().unwrap();
}

#[rstest]
fn test_take_full_size_shares_root() {
    let array: SmallArray = (0..20).collect();
    let taken = array.take(20).unwrap();
    assert!(taken.ptr_eq(&array));
}

#[rstest]
fn test_take_zero_is_empty() {
    let array: SmallArray = (0..20).collect();
    let taken = array.take(0).unwrap();
    assert!(taken.is_empty());
    assert_eq!(taken, SmallArray::new());
}

#[rstest]
fn test_push_after_take_fills_relaxed_tree() {
    let array: SmallArray = (0..30).collect();
    let mut relaxed = array.take(22).unwrap();
    for value in 22..80 {
        relaxed = relaxed.push_back(value);
        relaxed.validate().unwrap();
    }

    assert_eq!(contents(&relaxed), (0..80).collect::<Vec<_>>());
    assert_eq!(contents(&array), (0..30).collect::<Vec<_>>());
}

#[rstest]
fn test_repeated_take_and_push_interleaved() {
    let mut array = SmallArray::new();
    let mut model = Vec::new();
    for round in 0..20 {
        for value in 0..7 {
            array = array.push_back(round * 10 + value);
            model.push(round * 10 + value);
        }
        let keep = model.len() * 2 / 3;
        array = array.take(keep).unwrap();
        model.truncate(keep);
        array.validate().unwrap();
    }
    assert_eq!(contents(&array), model);
}

// =============================================================================
// Sharing and ownership transfer
// =============================================================================

#[rstest]
fn test_update_never_shares_root() {
    let array: SmallArray = (0..10).collect();
    let updated = array.update(3, |x| x * 2).unwrap();
    assert!(!updated.ptr_eq(&array));
    assert_eq!(updated.get(3), Some(&6));
    assert_eq!(array.get(3), Some(&3));
}

#[rstest]
fn test_transfer_on_shared_array_leaves_other_owner_intact() {
    let array: SmallArray = (0..10).collect();
    let other_owner = array.clone();

    let updated = array.into_update(9, |x| x + 100).unwrap();
    let pushed = updated.into_push_back(10);
    let taken = pushed.into_take(5).unwrap();

    assert_eq!(contents(&other_owner), (0..10).collect::<Vec<_>>());
    assert_eq!(contents(&taken), vec![0, 1, 2, 3, 4]);
}

#[rstest]
fn test_transfer_matches_sharing() {
    let source: SmallArray = (0..37).collect();

    let shared = source
        .push_back(37)
        .update(20, |x| -x)
        .unwrap()
        .take(30)
        .unwrap();
    let transferred = source
        .clone()
        .into_push_back(37)
        .into_update(20, |x| -x)
        .unwrap()
        .into_take(30)
        .unwrap();

    assert_eq!(shared, transferred);
    assert_eq!(source.len(), 37);
}

#[rstest]
fn test_mut_conveniences() {
    let mut array = SmallArray::new();
    for value in 0..10 {
        array.push_back_mut(value);
    }
    array.update_mut(0, |x| x + 100).unwrap();
    array.take_mut(5).unwrap();

    assert_eq!(contents(&array), vec![100, 1, 2, 3, 4]);
    assert!(array.update_mut(5, |x| x + 1).is_err());
    assert!(array.take_mut(6).is_err());
    assert_eq!(array.len(), 5);
}

// =============================================================================
// Conveniences
// =============================================================================

#[rstest]
fn test_default_branching_factor_holds_many_elements() {
    let array: PersistentArray<i32> = (0..2000).collect();
    assert_eq!(array.height(), 3);
    assert_eq!(array.get(1999), Some(&1999));
    assert_eq!(array.iter().len(), 2000);
}

#[rstest]
fn test_owned_iteration_matches_borrowed() {
    let array: SmallArray = (0..50).collect();
    let borrowed: Vec<i32> = (&array).into_iter().copied().collect();
    let owned: Vec<i32> = array.into_iter().collect();
    assert_eq!(borrowed, owned);
}

#[rstest]
fn test_extend_and_display() {
    let mut array = SmallArray::from_slice(&[1, 2]);
    array.extend([3, 4, 5]);
    assert_eq!(array.to_string(), "[1, 2, 3, 4, 5]");
    assert_eq!(format!("{array:?}"), "[1, 2, 3, 4, 5]");
}

#[rstest]
fn test_equal_arrays_hash_equal() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(array: &SmallArray) -> u64 {
        let mut hasher = DefaultHasher::new();
        array.hash(&mut hasher);
        hasher.finish()
    }

    let built: SmallArray = (0..9).collect();
    let taken = (0..20).collect::<SmallArray>().take(9).unwrap();
    assert_eq!(built, taken);
    assert_eq!(hash_of(&built), hash_of(&taken));
}

#[rstest]
fn test_first_last_and_index() {
    let array: SmallArray = (10..20).collect();
    assert_eq!(array.first(), Some(&10));
    assert_eq!(array.last(), Some(&19));
    assert_eq!(array[5], 15);
    assert_eq!(SmallArray::new().first(), None);
}
