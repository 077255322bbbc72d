use super::*;

#[test]
fn random_names_are_canonical_dashed_hex_and_unique() {
    let factory = RandomNameFactory;
    let a = factory.next_name();
    let b = factory.next_name();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
    assert_eq!(a.chars().filter(|&c| c == '-').count(), 4);
}
