//! Tests for outbound fragmentation.

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    num::NonZeroUsize,
};

use rstest::rstest;

use crate::fragment::{
    Fragment,
    FragmentError,
    FragmentKind,
    Fragmenter,
    MAX_PAYLOAD_SIZE,
    SequenceNumber,
};

const PEER: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(192, 168, 2, 10), 41830);

fn fragmenter(max: usize) -> Fragmenter {
    Fragmenter::new(NonZeroUsize::new(max).expect("non-zero")).expect("within datagram limit")
}

fn assert_fragment(fragments: &[Fragment], index: usize, payload: &[u8], kind: FragmentKind) {
    let fragment = fragments
        .get(index)
        .expect("fragment missing at requested index");
    assert_eq!(fragment.payload(), payload);
    assert_eq!(fragment.kind(), kind);
    assert_eq!(
        fragment.sequence().get(),
        u32::try_from(index + 1).expect("small index")
    );
}

#[test]
fn fragmenter_splits_request_line_into_three_fragments() {
    let fragments = fragmenter(8)
        .split("GET /file HTTP/1.1", PEER)
        .expect("split request");

    assert_eq!(fragments.len(), 3);
    assert_fragment(&fragments, 0, b"GET /fil", FragmentKind::Data);
    assert_fragment(&fragments, 1, b"e HTTP/1", FragmentKind::Data);
    assert_fragment(&fragments, 2, b".1", FragmentKind::Terminal);
}

#[test]
fn fragmenter_marks_single_chunk_terminal() {
    let fragments = fragmenter(64).split("ping", PEER).expect("split");

    assert_eq!(fragments.len(), 1);
    assert_fragment(&fragments, 0, b"ping", FragmentKind::Terminal);
}

#[test]
fn fragmenter_handles_empty_text() {
    let fragments = fragmenter(8).split("", PEER).expect("split empty");

    assert_eq!(fragments.len(), 1);
    assert_fragment(&fragments, 0, b"", FragmentKind::Terminal);
}

#[rstest]
#[case(4, 8, 2)]
#[case(4, 9, 3)]
#[case(1, 5, 5)]
#[case(1013, 1013, 1)]
#[case(1013, 1014, 2)]
fn fragmenter_produces_ceiling_count(
    #[case] max: usize,
    #[case] len: usize,
    #[case] expected: usize,
) {
    let text = "x".repeat(len);
    let fragments = fragmenter(max).split(&text, PEER).expect("split");

    assert_eq!(fragments.len(), expected);
    assert!(fragments.iter().all(|f| f.payload().len() <= max));
    let terminals = fragments.iter().filter(|f| f.kind().is_terminal()).count();
    assert_eq!(terminals, 1);
    assert!(fragments.last().is_some_and(|f| f.kind().is_terminal()));
}

#[test]
fn fragmenter_addresses_every_fragment_to_peer() {
    let fragments = fragmenter(2).split("abcdef", PEER).expect("split");

    assert!(fragments.iter().all(|f| f.peer() == PEER));
}

#[test]
fn fragmenter_rejects_payload_cap_beyond_datagram() {
    let err = Fragmenter::new(NonZeroUsize::new(MAX_PAYLOAD_SIZE + 1).expect("non-zero"))
        .expect_err("cap larger than a datagram must be rejected");

    assert_eq!(
        err,
        FragmentError::PayloadTooLarge {
            len: MAX_PAYLOAD_SIZE + 1,
            max: MAX_PAYLOAD_SIZE,
        }
    );
}

#[test]
fn default_fragmenter_uses_datagram_payload_limit() {
    assert_eq!(
        Fragmenter::default().max_payload_size().get(),
        MAX_PAYLOAD_SIZE
    );
}

#[test]
fn fragmenter_cuts_multibyte_text_on_byte_boundaries() {
    let text = "héllo wörld";
    let fragments = fragmenter(3).split(text, PEER).expect("split");

    let joined: Vec<u8> = fragments
        .iter()
        .flat_map(|f| f.payload().iter().copied())
        .collect();
    assert_eq!(joined, text.as_bytes());
    assert_eq!(
        fragments.first().map(Fragment::sequence),
        Some(SequenceNumber::first())
    );
}
