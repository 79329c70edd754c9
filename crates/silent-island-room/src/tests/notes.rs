//! Notes and observer transitions.

use super::*;
use crate::config::RoomConfig;
use crate::protocol::{ClientMessage, Recipient, Sender, ServerMessage};

#[test]
fn note_reaches_target_without_name() {
    let (mut room, ids) = started_room(6, RoomConfig::default());
    let out = participant(&mut room, ids[0], note(" meet later ", ids[1]));

    assert!(matches!(
        received(&out, Sender::Participant(ids[0]))[..],
        [ServerMessage::NoteSent { remaining: 2 }]
    ));
    assert!(matches!(
        received(&out, Sender::Participant(ids[1]))[..],
        [ServerMessage::NoteReceived { from, text, reply: false }] if *from == ids[0] && text == "meet later"
    ));
    assert!(received(&out, Sender::Moderator).is_empty());
    assert!(received(&out, Sender::Participant(ids[2])).is_empty());
}

#[test]
fn replies_share_the_quota() {
    let (mut room, ids) = started_room(6, RoomConfig::default());
    participant(&mut room, ids[0], note("one", ids[1]));
    participant(
        &mut room,
        ids[0],
        ClientMessage::ReplyNote {
            target: ids[2],
            text: "two".into(),
        },
    );
    let out = participant(&mut room, ids[0], note("three", ids[3]));
    assert!(matches!(out[0].message, ServerMessage::NoteSent { remaining: 0 }));

    let out = participant(&mut room, ids[0], note("four", ids[4]));
    assert_eq!(error_code(&out), Some("note_quota_exhausted"));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].recipient, Recipient::Participant(ids[0]));
}

#[test]
fn invalid_notes_are_rejected() {
    let (mut room, ids) = started_room(6, RoomConfig::default());
    let cases = [
        (note("", ids[1]), "note_length"),
        (note(&"x".repeat(101), ids[1]), "note_length"),
        (note("me", ids[0]), "note_to_self"),
        (
            note("who", silent_island_core::ParticipantId::new(50)),
            "unknown_participant",
        ),
    ];
    for (message, code) in cases {
        assert_eq!(error_code(&participant(&mut room, ids[0], message)), Some(code));
    }
    // failures do not consume the quota
    let out = participant(&mut room, ids[0], note("ok", ids[1]));
    assert!(matches!(out[0].message, ServerMessage::NoteSent { remaining: 2 }));
}

#[test]
fn removed_participant_is_silenced_then_observes() {
    let (mut room, ids) = started_room(6, fragile_config());
    open_voting(&mut room);
    let resister = ids[0];
    participant(&mut room, resister, ClientMessage::Vote { choice: "resist".into() });
    for id in &ids[1..] {
        participant(&mut room, *id, ClientMessage::Vote { choice: "comply".into() });
    }
    let out = room.dispatch(Sender::Moderator, ClientMessage::EndVoting, at(0));
    let Some(ServerMessage::HostRoundResult { result, .. }) = received(&out, Sender::Moderator).pop() else {
        panic!("expected host result");
    };
    assert!(result.removed.contains(&resister));
    assert_eq!(room.pending_observers(), result.removed.len());

    let out = participant(&mut room, resister, note("help", ids[1]));
    assert_eq!(error_code(&out), Some("sender_removed"));

    let out = participant(&mut room, ids[1], ClientMessage::GetPlayers);
    let listed = received(&out, Sender::Participant(ids[1]));
    let [ServerMessage::PlayerList { players }] = listed[..] else {
        panic!("expected player list");
    };
    assert!(players.iter().all(|p| p.id != resister));

    assert!(room.poll(at(0)).is_empty());
    let out = room.poll(at(1));
    assert!(received(&out, Sender::Participant(resister))
        .iter()
        .any(|m| matches!(m, ServerMessage::ObserverMode)));
    assert!(room.engine().participant(resister).unwrap().is_observer());
    assert!(room.poll(at(2)).is_empty());
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn accepted_notes_stop_at_quota(lengths in proptest::collection::vec(0usize..130, 0..12)) {
            let (mut room, ids) = started_room(6, RoomConfig::default());
            let mut accepted = 0;
            for len in &lengths {
                let out = participant(&mut room, ids[0], note(&"n".repeat(*len), ids[1]));
                if error_code(&out).is_none() {
                    accepted += 1;
                }
            }
            let valid = lengths.iter().filter(|l| (1..=100).contains(*l)).count();
            prop_assert_eq!(accepted, valid.min(3));
        }
    }
}
