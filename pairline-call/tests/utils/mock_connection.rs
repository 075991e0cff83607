use anyhow::{Result, bail};
use async_trait::async_trait;
use pairline_call::{
    ConnectionEvent, ConnectionFactory, EventSink, IceGatheringState, PeerConnection,
};
use pairline_core::{MediaTrack, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// SDP body a mock connection refuses to apply.
pub const MALFORMED_SDP: &str = "malformed";

#[derive(Debug, Default)]
struct ConnectionLog {
    ops: Vec<String>,
    tracks: Vec<String>,
    closed: bool,
    descriptions: usize,
}

/// Test-side view of one mock connection.
#[derive(Clone)]
pub struct MockConnectionHandle {
    pub index: usize,
    log: Arc<Mutex<ConnectionLog>>,
    ice: Arc<Mutex<IceGatheringState>>,
    sink: EventSink,
}

impl MockConnectionHandle {
    pub fn generation(&self) -> u64 {
        self.sink.generation()
    }

    pub fn ops(&self) -> Vec<String> {
        self.log.lock().unwrap().ops.clone()
    }

    pub fn tracks(&self) -> Vec<String> {
        self.log.lock().unwrap().tracks.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.log.lock().unwrap().closed
    }

    /// Simulate the native side closing on its own.
    pub fn mark_closed(&self) {
        self.log.lock().unwrap().closed = true;
    }

    pub fn set_ice(&self, state: IceGatheringState) {
        *self.ice.lock().unwrap() = state;
    }

    pub async fn fire(&self, event: ConnectionEvent) {
        self.sink.send(event).await;
    }
}

pub struct MockConnection {
    index: usize,
    log: Arc<Mutex<ConnectionLog>>,
    ice: Arc<Mutex<IceGatheringState>>,
    sink: EventSink,
}

impl MockConnection {
    fn record(&self, op: impl Into<String>) {
        self.log.lock().unwrap().ops.push(op.into());
    }

    fn next_sdp(&self, kind: &str) -> String {
        let mut log = self.log.lock().unwrap();
        log.descriptions += 1;
        format!("{kind}-{}-{}", self.index, log.descriptions)
    }
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record("create-offer");
        Ok(SessionDescription::offer(self.next_sdp("offer")))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record("create-answer");
        Ok(SessionDescription::answer(self.next_sdp("answer")))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        if desc.sdp == MALFORMED_SDP {
            bail!("unparseable session description");
        }
        let kind = match desc.kind {
            SdpKind::Offer => "offer",
            SdpKind::Answer => "answer",
        };
        self.record(format!("set-remote-{kind}"));
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.record("rollback");
        Ok(())
    }

    async fn add_track(&self, track: &MediaTrack, _stream_id: &str) -> Result<()> {
        {
            let mut log = self.log.lock().unwrap();
            if log.tracks.iter().any(|t| t == track.id()) {
                return Ok(());
            }
            log.tracks.push(track.id().to_owned());
            log.ops.push(format!("add-track-{}", track.id()));
        }
        self.sink.notify(ConnectionEvent::NegotiationNeeded);
        Ok(())
    }

    fn has_track(&self, track_id: &str) -> bool {
        self.log.lock().unwrap().tracks.iter().any(|t| t == track_id)
    }

    fn ice_gathering_state(&self) -> IceGatheringState {
        *self.ice.lock().unwrap()
    }

    fn is_closed(&self) -> bool {
        self.log.lock().unwrap().closed
    }

    async fn close(&self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.ops.push("close".to_owned());
        log.closed = true;
        Ok(())
    }
}

/// Factory handing out [`MockConnection`]s and keeping a handle to each.
pub struct MockConnectionFactory {
    ice: IceGatheringState,
    fail: AtomicBool,
    created: Mutex<Vec<MockConnectionHandle>>,
}

impl MockConnectionFactory {
    pub fn new() -> Arc<Self> {
        Self::with_ice(IceGatheringState::Complete)
    }

    /// Connections start in the given gathering state.
    pub fn with_ice(ice: IceGatheringState) -> Arc<Self> {
        Arc::new(Self {
            ice,
            fail: AtomicBool::new(false),
            created: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_creation(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn connection(&self, index: usize) -> MockConnectionHandle {
        self.created.lock().unwrap()[index].clone()
    }

    pub fn last(&self) -> MockConnectionHandle {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no connection created")
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn create(&self, events: EventSink) -> Result<Box<dyn PeerConnection>> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("connection creation refused");
        }

        let mut created = self.created.lock().unwrap();
        let handle = MockConnectionHandle {
            index: created.len(),
            log: Arc::new(Mutex::new(ConnectionLog::default())),
            ice: Arc::new(Mutex::new(self.ice)),
            sink: events,
        };
        created.push(handle.clone());

        Ok(Box::new(MockConnection {
            index: handle.index,
            log: handle.log,
            ice: handle.ice,
            sink: handle.sink,
        }))
    }
}
