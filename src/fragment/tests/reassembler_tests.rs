//! Tests for inbound reassembly ordering, completeness and merging.

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    num::NonZeroUsize,
};

use proptest::prelude::*;

use crate::fragment::{
    Fragment,
    FragmentKind,
    Fragmenter,
    Reassembler,
    ReassemblyError,
    SequenceNumber,
};

const PEER: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 41830);

fn fragment(kind: FragmentKind, sequence: u32, payload: &[u8]) -> Fragment {
    Fragment::with_raw_sequence(kind, sequence, *PEER.ip(), PEER.port(), payload.to_vec())
        .expect("valid fragment")
}

fn split(text: &str, max: usize) -> Vec<Fragment> {
    Fragmenter::new(NonZeroUsize::new(max).expect("non-zero"))
        .expect("within datagram limit")
        .split(text, PEER)
        .expect("split")
}

#[test]
fn reassembler_completes_single_terminal_fragment() {
    let mut reassembler = Reassembler::new();
    reassembler.add_fragment(fragment(FragmentKind::Terminal, 1, b"hello"));

    assert!(reassembler.is_complete());
    assert_eq!(reassembler.merge().expect("merge"), b"hello");
}

#[test]
fn reassembler_waits_for_terminal_fragment() {
    let mut reassembler = Reassembler::new();
    reassembler.add_fragment(fragment(FragmentKind::Data, 1, b"ab"));
    reassembler.add_fragment(fragment(FragmentKind::Data, 2, b"cd"));

    assert!(!reassembler.is_complete());
    assert_eq!(reassembler.highest(), SequenceNumber::new(2));
    assert_eq!(reassembler.terminal(), None);
}

#[test]
fn reassembler_waits_for_gap_before_terminal() {
    let mut reassembler = Reassembler::new();
    reassembler.add_fragment(fragment(FragmentKind::Data, 1, b"ab"));
    reassembler.add_fragment(fragment(FragmentKind::Terminal, 3, b"ef"));
    assert!(!reassembler.is_complete());

    reassembler.add_fragment(fragment(FragmentKind::Data, 2, b"cd"));
    assert!(reassembler.is_complete());
    assert_eq!(reassembler.merge().expect("merge"), b"abcdef");
}

#[test]
fn reassembler_overwrites_duplicate_sequence() {
    let mut reassembler = Reassembler::new();
    reassembler.add_fragment(fragment(FragmentKind::Data, 1, b"xx"));
    reassembler.add_fragment(fragment(FragmentKind::Data, 1, b"ab"));
    reassembler.add_fragment(fragment(FragmentKind::Terminal, 2, b"cd"));

    assert_eq!(reassembler.buffered_len(), 2);
    assert_eq!(reassembler.merge().expect("merge"), b"abcd");
}

#[test]
fn reassembler_stays_complete_after_redelivery() {
    let mut reassembler = Reassembler::new();
    for f in split("complete message", 4) {
        reassembler.add_fragment(f);
    }
    assert!(reassembler.is_complete());

    for f in split("complete message", 4) {
        reassembler.add_fragment(f);
        assert!(reassembler.is_complete());
    }
    assert_eq!(reassembler.merge().expect("merge"), b"complete message");
}

#[test]
fn reassembler_ignores_fragments_beyond_terminal() {
    let mut reassembler = Reassembler::new();
    reassembler.add_fragment(fragment(FragmentKind::Terminal, 1, b"only"));
    reassembler.add_fragment(fragment(FragmentKind::Data, 2, b"stray"));

    assert!(reassembler.is_complete());
    assert_eq!(reassembler.merge().expect("merge"), b"only");
}

#[test]
fn merge_before_completion_reports_incomplete_message() {
    let mut reassembler = Reassembler::new();
    reassembler.add_fragment(fragment(FragmentKind::Terminal, 2, b"cd"));

    let err = reassembler
        .merge()
        .expect_err("merge must fail without fragment 1");
    assert_eq!(
        err,
        ReassemblyError::IncompleteMessage {
            received: 1,
            terminal: SequenceNumber::new(2),
        }
    );
}

#[test]
fn empty_reassembler_is_incomplete() {
    let reassembler = Reassembler::new();

    assert!(!reassembler.is_complete());
    assert!(matches!(
        reassembler.merge(),
        Err(ReassemblyError::IncompleteMessage {
            received: 0,
            terminal: None,
        })
    ));
}

#[test]
fn request_line_reassembles_in_reverse_order() {
    let body = "GET /file HTTP/1.1";
    let fragments = split(body, 8);
    assert_eq!(fragments.len(), 3);

    let mut reassembler = Reassembler::new();
    for f in fragments.into_iter().rev() {
        reassembler.add_fragment(f);
    }

    let merged = reassembler.merge().expect("merge");
    assert_eq!(merged.len(), 18);
    assert_eq!(merged, body.as_bytes());
}

proptest! {
    #[test]
    fn split_then_merge_reproduces_text(body in ".{0,300}", max in 1_usize..64) {
        let mut reassembler = Reassembler::new();
        for f in split(&body, max) {
            reassembler.add_fragment(f);
        }

        prop_assert!(reassembler.is_complete());
        prop_assert_eq!(reassembler.merge().expect("merge"), body.into_bytes());
    }

    #[test]
    fn any_arrival_order_yields_same_message(
        (body, order) in ".{1,200}".prop_flat_map(|body| {
            let count = body.len().div_ceil(7);
            (Just(body), Just((0..count).collect::<Vec<_>>()).prop_shuffle())
        })
    ) {
        let fragments = split(&body, 7);
        let mut reassembler = Reassembler::new();
        for (position, &index) in order.iter().enumerate() {
            let is_last = position + 1 == order.len();
            prop_assert_eq!(reassembler.is_complete(), false);
            reassembler.add_fragment(fragments[index].clone());
            if is_last {
                prop_assert!(reassembler.is_complete());
            }
        }

        prop_assert_eq!(reassembler.merge().expect("merge"), body.into_bytes());
    }
}
