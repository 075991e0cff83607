use crate::transport::connection::{
    ConnectionFactory, ConnectionState, IceGatheringState, PeerConnection,
};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{ConnectionEvent, EventSink};
use anyhow::{Context, Result};
use async_trait::async_trait;
use pairline_core::{MediaTrack, RemoteTrack, SdpKind, SessionDescription, TrackKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

const GATHERING_NEW: u8 = 0;
const GATHERING_ACTIVE: u8 = 1;
const GATHERING_COMPLETE: u8 = 2;

/// Builds [`WebRtcConnection`]s from one shared webrtc API object.
pub struct WebRtcConnectionFactory {
    api: API,
    config: TransportConfig,
}

impl WebRtcConnectionFactory {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api, config })
    }
}

#[async_trait]
impl ConnectionFactory for WebRtcConnectionFactory {
    async fn create(&self, events: EventSink) -> Result<Box<dyn PeerConnection>> {
        let connection = WebRtcConnection::new(&self.api, &self.config, events).await?;
        Ok(Box::new(connection))
    }
}

pub struct WebRtcConnection {
    events: EventSink,
    peer_connection: Arc<RTCPeerConnection>,
    local_tracks: Mutex<HashMap<String, Arc<TrackLocalStaticSample>>>,
    gathering: Arc<AtomicU8>,
    closed: Arc<AtomicBool>,
}

impl WebRtcConnection {
    pub async fn new(api: &API, config: &TransportConfig, events: EventSink) -> Result<Self> {
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let gathering = Arc::new(AtomicU8::new(GATHERING_NEW));
        let closed = Arc::new(AtomicBool::new(false));

        let state_sink = events.clone();
        let state_closed = closed.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let sink = state_sink.clone();
                let closed = state_closed.clone();

                Box::pin(async move {
                    info!("Connection state for {} changed: {:?}", sink.remote(), s);
                    let state = match s {
                        RTCPeerConnectionState::New => ConnectionState::New,
                        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => ConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => ConnectionState::Failed,
                        RTCPeerConnectionState::Closed => {
                            closed.store(true, Ordering::SeqCst);
                            ConnectionState::Closed
                        }
                        RTCPeerConnectionState::Unspecified => return,
                    };
                    sink.send(ConnectionEvent::StateChanged(state)).await;
                })
            },
        ));

        let nego_sink = events.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let sink = nego_sink.clone();
            Box::pin(async move {
                sink.send(ConnectionEvent::NegotiationNeeded).await;
            })
        }));

        let ice_sink = events.clone();
        let ice_gathering = gathering.clone();
        peer_connection.on_ice_gathering_state_change(Box::new(
            move |s: RTCIceGathererState| {
                let sink = ice_sink.clone();
                let state = match s {
                    RTCIceGathererState::Gathering => IceGatheringState::Gathering,
                    RTCIceGathererState::Complete => IceGatheringState::Complete,
                    _ => IceGatheringState::New,
                };
                ice_gathering.store(encode_gathering(state), Ordering::SeqCst);

                Box::pin(async move {
                    sink.send(ConnectionEvent::IceGatheringChanged(state)).await;
                })
            },
        ));

        // Candidates travel inside the SDP once gathering completes.
        let candidate_sink = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let remote = candidate_sink.remote().clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                if let Ok(str_candidate) = serde_json::to_string(&json_candidate) {
                    debug!("Local ICE candidate for {}: {}", remote, str_candidate);
                }
            })
        }));

        let track_sink = events.clone();
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let sink = track_sink.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    _ => return,
                };
                debug!("Remote {:?} track {} from {}", kind, track.id(), sink.remote());
                sink.send(ConnectionEvent::RemoteTrack {
                    stream_id: track.stream_id(),
                    track: RemoteTrack {
                        id: track.id(),
                        kind,
                    },
                })
                .await;
            })
        }));

        Ok(Self {
            events,
            peer_connection,
            local_tracks: Mutex::new(HashMap::new()),
            gathering,
            closed,
        })
    }

    fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
        match kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                channels: 0,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
        }
    }

    fn to_native(desc: SessionDescription) -> Result<RTCSessionDescription> {
        let native = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        Ok(native)
    }
}

fn encode_gathering(state: IceGatheringState) -> u8 {
    match state {
        IceGatheringState::New => GATHERING_NEW,
        IceGatheringState::Gathering => GATHERING_ACTIVE,
        IceGatheringState::Complete => GATHERING_COMPLETE,
    }
}

#[async_trait]
impl PeerConnection for WebRtcConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let native = Self::to_native(desc)?;
        self.peer_connection.set_remote_description(native).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let Some(mut pending) = self.peer_connection.pending_local_description().await else {
            return Ok(());
        };
        pending.sdp_type = RTCSdpType::Rollback;
        self.peer_connection
            .set_local_description(pending)
            .await
            .context("Failed to roll back local offer")?;
        Ok(())
    }

    async fn add_track(&self, track: &MediaTrack, stream_id: &str) -> Result<()> {
        if self.has_track(track.id()) {
            return Ok(());
        }

        let local = Arc::new(TrackLocalStaticSample::new(
            Self::codec_for(track.kind()),
            track.id().to_owned(),
            stream_id.to_owned(),
        ));
        self.peer_connection
            .add_track(local.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        if let Ok(mut tracks) = self.local_tracks.lock() {
            tracks.insert(track.id().to_owned(), local);
        }
        debug!("Attached track {} for {}", track.id(), self.events.remote());
        Ok(())
    }

    fn has_track(&self, track_id: &str) -> bool {
        self.local_tracks
            .lock()
            .map(|tracks| tracks.contains_key(track_id))
            .unwrap_or(false)
    }

    fn ice_gathering_state(&self) -> IceGatheringState {
        match self.gathering.load(Ordering::SeqCst) {
            GATHERING_COMPLETE => IceGatheringState::Complete,
            GATHERING_ACTIVE => IceGatheringState::Gathering,
            _ => IceGatheringState::New,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Detach every handler registered in `new` before closing.
        self.peer_connection
            .on_peer_connection_state_change(Box::new(|_| Box::pin(async {})));
        self.peer_connection
            .on_negotiation_needed(Box::new(|| Box::pin(async {})));
        self.peer_connection
            .on_ice_gathering_state_change(Box::new(|_| Box::pin(async {})));
        self.peer_connection
            .on_ice_candidate(Box::new(|_| Box::pin(async {})));
        self.peer_connection
            .on_track(Box::new(|_, _, _| Box::pin(async {})));

        self.peer_connection.close().await?;
        if let Ok(mut tracks) = self.local_tracks.lock() {
            tracks.clear();
        }
        Ok(())
    }
}
