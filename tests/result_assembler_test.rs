use verbatim::application::ports::ErrorKind;
use verbatim::application::services::{AssemblyError, assemble_transcript};
use verbatim::domain::TranscriptFragment;

fn fragment(index: usize, text: &str) -> TranscriptFragment {
    TranscriptFragment::new(index, text.to_string(), 0.5)
}

#[test]
fn given_fragments_in_any_order_when_assembling_then_joined_in_segment_order() {
    let orders = [[0, 1, 2], [2, 1, 0], [1, 2, 0], [2, 0, 1]];

    for order in orders {
        let fragments = order
            .iter()
            .map(|&i| fragment(i, &format!("text{i}")))
            .collect();

        let text = assemble_transcript(fragments, 3).unwrap();

        assert_eq!(text, "text0\ntext1\ntext2");
    }
}

#[test]
fn given_single_fragment_when_assembling_then_text_is_returned_verbatim() {
    let raw = "  Buongiorno a tutti.\n\nIniziamo.  ";

    let text = assemble_transcript(vec![fragment(0, raw)], 1).unwrap();

    assert_eq!(text, raw);
}

#[test]
fn given_empty_fragment_text_when_assembling_then_position_is_preserved() {
    let fragments = vec![fragment(0, "a"), fragment(1, ""), fragment(2, "c")];

    let text = assemble_transcript(fragments, 3).unwrap();

    assert_eq!(text, "a\n\nc");
}

#[test]
fn given_gap_in_indices_when_assembling_then_missing_index_reported() {
    let fragments = vec![fragment(0, "a"), fragment(2, "c")];

    let err = assemble_transcript(fragments, 3).unwrap_err();

    assert_eq!(err, AssemblyError::MissingIndex(1));
    assert_eq!(err.kind(), ErrorKind::AssemblyInvariant);
}

#[test]
fn given_trailing_fragment_missing_when_assembling_then_missing_index_reported() {
    let fragments = vec![fragment(0, "a"), fragment(1, "b")];

    let err = assemble_transcript(fragments, 3).unwrap_err();

    assert_eq!(err, AssemblyError::MissingIndex(2));
}

#[test]
fn given_duplicate_index_when_assembling_then_rejected() {
    let fragments = vec![fragment(0, "a"), fragment(1, "b"), fragment(1, "b again")];

    let err = assemble_transcript(fragments, 3).unwrap_err();

    assert_eq!(err, AssemblyError::DuplicateIndex(1));
}

#[test]
fn given_more_fragments_than_segments_when_assembling_then_unexpected_index() {
    let fragments = vec![fragment(0, "a"), fragment(1, "b")];

    let err = assemble_transcript(fragments, 1).unwrap_err();

    assert_eq!(err, AssemblyError::UnexpectedIndex(1));
}

#[test]
fn given_no_fragments_when_assembling_then_rejected() {
    assert_eq!(
        assemble_transcript(Vec::new(), 2).unwrap_err(),
        AssemblyError::NoFragments
    );
}
