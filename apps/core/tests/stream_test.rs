use lumina_core::stream::{trim_for_display, StreamAccumulator};
use proptest::prelude::*;

fn transcript_of<'a>(fragments: impl IntoIterator<Item = &'a String>) -> String {
    let mut buffer = StreamAccumulator::new();
    for fragment in fragments {
        buffer.push(fragment);
    }
    buffer.transcript().to_string()
}

#[test]
fn redelivered_final_fragment_is_ignored() {
    let mut buffer = StreamAccumulator::new();
    buffer.push("The answer is ");
    buffer.push("42.");
    assert!(!buffer.push("42."));

    assert_eq!(buffer.transcript(), "The answer is 42.");
}

#[test]
fn reset_reopens_buffer() {
    let mut buffer = StreamAccumulator::new();
    buffer.push("old");
    buffer.complete();

    buffer.reset();

    assert!(!buffer.is_complete());
    assert!(buffer.push("new"));
    assert_eq!(buffer.transcript(), "new");
}

proptest! {
    #[test]
    fn immediate_redelivery_never_changes_transcript(fragments in proptest::collection::vec("[a-z \\n]{1,6}", 0..20)) {
        let doubled: Vec<String> = fragments
            .iter()
            .flat_map(|fragment| [fragment.clone(), fragment.clone()])
            .collect();

        prop_assert_eq!(transcript_of(&doubled), transcript_of(&fragments));
    }

    #[test]
    fn display_trim_is_idempotent(text in "[a\\n\\r =!]{0,80}") {
        let once = trim_for_display(&text);
        prop_assert_eq!(trim_for_display(&once), once.clone());
        prop_assert!(!once.contains("\n\n\n"));
        prop_assert!(!once.contains('\r'));
    }
}
