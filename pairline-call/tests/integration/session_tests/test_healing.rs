use pairline_call::{SessionError, SignalingState};

use crate::integration::init_tracing;
use crate::integration::session_tests::create_test_session;
use crate::utils::MockConnectionFactory;

#[tokio::test]
async fn test_offer_after_close_opens_new_connection() {
    init_tracing();

    let factory = MockConnectionFactory::new();
    let (mut session, _events) = create_test_session(factory.clone());

    session.create_offer().await.expect("first offer");
    let first_generation = session.generation();

    session.close().await;
    assert_eq!(session.state(), SignalingState::Closed);
    assert!(factory.connection(0).is_closed());

    session.create_offer().await.expect("offer after close");
    assert_eq!(session.state(), SignalingState::HaveLocalOffer);
    assert_eq!(factory.created(), 2);
    assert!(session.generation() > first_generation);
    assert_eq!(factory.last().generation(), session.generation());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    init_tracing();

    let factory = MockConnectionFactory::new();
    let (mut session, _events) = create_test_session(factory.clone());
    session.create_offer().await.unwrap();

    session.close().await;
    session.close().await;

    assert_eq!(session.state(), SignalingState::Closed);
    let closes = factory
        .connection(0)
        .ops()
        .iter()
        .filter(|op| *op == "close")
        .count();
    assert_eq!(closes, 1);
}

#[tokio::test]
async fn test_externally_closed_connection_is_replaced() {
    init_tracing();

    let factory = MockConnectionFactory::new();
    let (mut session, _events) = create_test_session(factory.clone());
    session.create_offer().await.unwrap();

    factory.connection(0).mark_closed();
    session.create_offer().await.unwrap();

    assert_eq!(factory.created(), 2);
    assert_eq!(factory.last().ops(), vec!["create-offer"]);
}

#[tokio::test]
async fn test_live_connection_is_reused() {
    init_tracing();

    let factory = MockConnectionFactory::new();
    let (mut session, _events) = create_test_session(factory.clone());

    session.ensure_live().await.unwrap();
    let generation = session.generation();
    session.ensure_live().await.unwrap();
    session.create_offer().await.unwrap();

    assert_eq!(factory.created(), 1);
    assert_eq!(session.generation(), generation);
}

#[tokio::test]
async fn test_factory_failure_surfaces_as_connection_error() {
    init_tracing();

    let factory = MockConnectionFactory::new();
    factory.fail_creation();
    let (mut session, _events) = create_test_session(factory.clone());

    let err = session.create_offer().await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(_)));
    assert_eq!(session.generation(), 0);
}
