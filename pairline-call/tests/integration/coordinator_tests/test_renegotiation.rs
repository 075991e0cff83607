use pairline_call::{ConnectionEvent, SignalingState};
use pairline_core::{Inbound, SessionDescription};

use crate::integration::coordinator_tests::{establish_as_callee, incoming_call};
use crate::integration::{create_test_coordinator, init_tracing, peer, settle, wait_for_snapshot};

fn nego_final(from: Option<&str>, sdp: &str) -> Inbound {
    Inbound::NegoFinal {
        from: from.map(peer),
        answer: SessionDescription::answer(sdp),
    }
}

#[tokio::test]
async fn test_negotiation_needed_sends_nego_offer() {
    init_tracing();

    let test = create_test_coordinator();
    let alice = peer("alice");
    establish_as_callee(&test, &alice).await;

    test.factory
        .connection(0)
        .fire(ConnectionEvent::NegotiationNeeded)
        .await;
    assert!(test.bus.wait_for_events("nego-offer", 1, 2000).await);

    test.bus.deliver(nego_final(Some("alice"), "alice-answer"));
    let snapshot = wait_for_snapshot(&test.handle, 2000, |s| {
        s.session(&alice)
            .is_some_and(|s| s.state == SignalingState::Stable)
    })
    .await;
    assert!(snapshot.is_some());
}

#[tokio::test]
async fn test_nego_final_without_sender_goes_to_partner() {
    init_tracing();

    let test = create_test_coordinator();
    let alice = peer("alice");
    establish_as_callee(&test, &alice).await;

    test.factory
        .connection(0)
        .fire(ConnectionEvent::NegotiationNeeded)
        .await;
    assert!(test.bus.wait_for_events("nego-offer", 1, 2000).await);

    test.bus.deliver(nego_final(None, "alice-answer"));
    let snapshot = wait_for_snapshot(&test.handle, 2000, |s| {
        s.session(&alice)
            .is_some_and(|s| s.state == SignalingState::Stable)
    })
    .await;
    assert!(snapshot.is_some());
}

#[tokio::test]
async fn test_negotiation_during_open_offer_is_deferred() {
    init_tracing();

    let test = create_test_coordinator();
    let alice = peer("alice");
    establish_as_callee(&test, &alice).await;
    let connection = test.factory.connection(0);

    connection.fire(ConnectionEvent::NegotiationNeeded).await;
    assert!(test.bus.wait_for_events("nego-offer", 1, 2000).await);
    connection.fire(ConnectionEvent::NegotiationNeeded).await;

    let deferred = wait_for_snapshot(&test.handle, 2000, |s| {
        s.session(&alice).is_some_and(|s| s.pending_negotiation)
    })
    .await;
    assert!(deferred.is_some());
    assert_eq!(test.bus.count("nego-offer"), 1);

    test.bus.deliver(nego_final(Some("alice"), "alice-answer"));
    assert!(test.bus.wait_for_events("nego-offer", 2, 2000).await);
}

#[tokio::test]
async fn test_polite_callee_rolls_back_on_collision() {
    init_tracing();

    let test = create_test_coordinator();
    let alice = peer("alice");
    establish_as_callee(&test, &alice).await;
    let connection = test.factory.connection(0);

    connection.fire(ConnectionEvent::NegotiationNeeded).await;
    assert!(test.bus.wait_for_events("nego-offer", 1, 2000).await);

    test.bus.deliver(Inbound::NegoOffer {
        from: alice.clone(),
        offer: SessionDescription::offer("alice-renegotiation"),
    });
    assert!(test.bus.wait_for_events("nego-done", 1, 2000).await);

    assert!(connection.ops().contains(&"rollback".to_owned()));
    // The abandoned offer is sent again once the remote one is answered.
    assert!(test.bus.wait_for_events("nego-offer", 2, 2000).await);
}

#[tokio::test]
async fn test_impolite_caller_keeps_its_offer() {
    init_tracing();

    let test = create_test_coordinator();
    let bob = peer("bob");

    test.bus.deliver(Inbound::PeerJoined { id: bob.clone() });
    assert!(test.bus.wait_for_events("call", 1, 2000).await);
    test.bus.deliver(Inbound::CallAccepted {
        from: bob.clone(),
        answer: SessionDescription::answer("bob-answer"),
    });
    // Attached tracks put a renegotiation offer on the wire.
    assert!(test.bus.wait_for_events("nego-offer", 1, 2000).await);

    test.bus.deliver(Inbound::NegoOffer {
        from: bob.clone(),
        offer: SessionDescription::offer("bob-renegotiation"),
    });
    settle().await;

    assert_eq!(test.bus.count("nego-done"), 0);
    let snapshot = test.handle.snapshot().await.unwrap();
    assert_eq!(
        snapshot.session(&bob).unwrap().state,
        SignalingState::HaveLocalOffer
    );
    assert!(!test.factory.connection(0).ops().contains(&"rollback".to_owned()));
}

#[tokio::test]
async fn test_repeated_nego_offer_resends_answer() {
    init_tracing();

    let test = create_test_coordinator();
    let alice = peer("alice");
    establish_as_callee(&test, &alice).await;
    let renegotiation = Inbound::NegoOffer {
        from: alice.clone(),
        offer: SessionDescription::offer("alice-renegotiation"),
    };

    test.bus.deliver(renegotiation.clone());
    test.bus.deliver(renegotiation);
    assert!(test.bus.wait_for_events("nego-done", 2, 2000).await);

    let answered = test
        .factory
        .connection(0)
        .ops()
        .iter()
        .filter(|op| *op == "create-answer")
        .count();
    assert_eq!(answered, 2);
}

#[tokio::test]
async fn test_events_from_replaced_connection_are_dropped() {
    init_tracing();

    let test = create_test_coordinator();
    let alice = peer("alice");

    establish_as_callee(&test, &alice).await;
    test.bus.deliver(Inbound::CallEnded {
        from: alice.clone(),
    });
    settle().await;

    test.bus.deliver(incoming_call(&alice, "remote-offer-2"));
    assert!(test.bus.wait_for_events("call-accepted", 2, 2000).await);
    assert_eq!(test.factory.created(), 2);

    test.factory
        .connection(0)
        .fire(ConnectionEvent::NegotiationNeeded)
        .await;
    settle().await;
    assert_eq!(test.bus.count("nego-offer"), 0);

    test.factory
        .connection(1)
        .fire(ConnectionEvent::NegotiationNeeded)
        .await;
    assert!(test.bus.wait_for_events("nego-offer", 1, 2000).await);
}
