use crate::coordinator::call_status::{
    CallRole, CallStatus, CoordinatorSnapshot, EndReason, SessionSnapshot,
};
use crate::coordinator::coordinator_command::CoordinatorCommand;
use crate::coordinator::handle::CoordinatorHandle;
use crate::error::CallError;
use crate::session::{PeerSession, SignalingState};
use crate::transport::{
    ConnectionEvent, ConnectionFactory, ConnectionState, IceGatheringState, TransportEvent,
};
use pairline_core::{
    BusClient, CallConfig, CapturedMedia, Inbound, LocalStream, MediaSource, Outbound,
    ParticipantId, SessionDescription, Subscription,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
struct IcePoll {
    remote: ParticipantId,
    generation: u64,
    attempt: u32,
}

enum OfferReply {
    Fresh(SessionDescription),
    Replay(SessionDescription),
    Ignored,
}

/// Drives one-to-one call setup over the signaling bus.
///
/// Every bus message, connection event, timer and user command is handled
/// on a single task, so handlers never interleave.
pub struct NegotiationCoordinator {
    bus: Arc<dyn BusClient>,
    inbound: Subscription,
    media_source: Arc<dyn MediaSource>,
    factory: Arc<dyn ConnectionFactory>,
    config: CallConfig,
    sessions: HashMap<ParticipantId, PeerSession>,
    partner: Option<ParticipantId>,
    role: Option<CallRole>,
    media: Option<CapturedMedia>,
    awaiting_ice: HashMap<ParticipantId, u64>,
    call_offer: Option<(ParticipantId, SessionDescription)>,
    // last call offer per remote whose call has already ended
    ended_offers: HashMap<ParticipantId, SessionDescription>,
    command_rx: mpsc::Receiver<CoordinatorCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    poll_rx: mpsc::UnboundedReceiver<IcePoll>,
    poll_tx: mpsc::UnboundedSender<IcePoll>,
    status: watch::Sender<CallStatus>,
}

impl NegotiationCoordinator {
    pub fn new(
        bus: Arc<dyn BusClient>,
        inbound: Subscription,
        media_source: Arc<dyn MediaSource>,
        factory: Arc<dyn ConnectionFactory>,
        config: CallConfig,
    ) -> (Self, CoordinatorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (transport_tx, transport_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(CallStatus::Idle);

        let coordinator = Self {
            bus,
            inbound,
            media_source,
            factory,
            config,
            sessions: HashMap::new(),
            partner: None,
            role: None,
            media: None,
            awaiting_ice: HashMap::new(),
            call_offer: None,
            ended_offers: HashMap::new(),
            command_rx,
            transport_rx,
            transport_tx,
            poll_rx,
            poll_tx,
            status,
        };

        (coordinator, CoordinatorHandle::new(command_tx, status_rx))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("Negotiation coordinator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CoordinatorCommand::HangUp) => self.hang_up().await,
                        Some(CoordinatorCommand::Snapshot(reply)) => {
                            let _ = reply.send(self.snapshot());
                        }
                        Some(CoordinatorCommand::Shutdown) | None => {
                            info!("Coordinator shutting down");
                            break;
                        }
                    }
                }

                evt = self.inbound.recv() => {
                    match evt {
                        Some(e) => self.handle_inbound(e).await,
                        None => {
                            warn!("Bus subscription closed");
                            break;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => self.handle_transport_event(evt).await,

                Some(poll) = self.poll_rx.recv() => {
                    if let Err(e) = self.check_ice(poll).await {
                        self.fail(e).await;
                    }
                }
            }
        }

        if self.partner.is_some() || self.media.is_some() {
            self.hang_up().await;
        }
        info!("Negotiation coordinator finished");
    }

    async fn handle_inbound(&mut self, event: Inbound) {
        debug!("Inbound {}", event.name());

        let result = match event {
            Inbound::PeerJoined { id } => self.on_peer_joined(id).await,
            Inbound::PeerLeft { id } | Inbound::CallEnded { from: id } => {
                self.on_remote_ended(id).await;
                Ok(())
            }
            Inbound::Call { from, offer } => self.on_incoming_call(from, offer).await,
            Inbound::CallAccepted { from, answer } => self.on_call_accepted(from, answer).await,
            Inbound::NegoOffer { from, offer } => self.on_nego_offer(from, offer).await,
            Inbound::NegoFinal { from, answer } => self.on_nego_final(from, answer).await,
            Inbound::ReadyForStreams { from } => self.on_ready_for_streams(from).await,
            Inbound::Alert(_) | Inbound::Violation(_) => Ok(()),
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
    }

    async fn on_peer_joined(&mut self, remote: ParticipantId) -> Result<(), CallError> {
        if !self.claim_partner(&remote) {
            return Ok(());
        }

        if let Some(session) = self.sessions.get(&remote) {
            match session.state() {
                SignalingState::HaveLocalOffer => {
                    if let Some(offer) = session.last_offer().cloned() {
                        info!("Repeated peer-joined from {}, resending offer", remote);
                        self.bus.emit(Outbound::Call { to: remote, offer }).await?;
                    }
                    return Ok(());
                }
                SignalingState::HaveRemoteOffer | SignalingState::Stable => {
                    debug!("Already in a call with {}, ignoring peer-joined", remote);
                    return Ok(());
                }
                SignalingState::Idle | SignalingState::Closed => {}
            }
        }

        self.role = Some(CallRole::Caller);
        self.ensure_media().await?;

        let session = Self::session_entry(
            &mut self.sessions,
            &self.factory,
            &self.transport_tx,
            &remote,
        );
        let offer = session.create_offer().await?;

        info!("Calling {}", remote);
        self.publish(CallStatus::Negotiating {
            remote: remote.clone(),
        });
        self.bus.emit(Outbound::Call { to: remote, offer }).await?;
        Ok(())
    }

    async fn on_incoming_call(
        &mut self,
        from: ParticipantId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        if self.ended_offers.get(&from) == Some(&offer) {
            debug!("Ignoring redelivered call from {} after it ended", from);
            return Ok(());
        }
        if !self.claim_partner(&from) {
            return Ok(());
        }
        self.ended_offers.remove(&from);
        self.call_offer = Some((from.clone(), offer.clone()));
        self.role.get_or_insert(CallRole::Callee);
        self.ensure_media().await?;

        match self.answer_offer(&from, offer).await? {
            OfferReply::Fresh(answer) => {
                info!("Accepting call from {}", from);
                self.publish(CallStatus::Negotiating {
                    remote: from.clone(),
                });
                self.bus
                    .emit(Outbound::CallAccepted {
                        to: from.clone(),
                        answer,
                    })
                    .await?;
                self.resume_pending(&from).await
            }
            OfferReply::Replay(answer) => {
                info!("Repeated call from {}, resending answer", from);
                self.bus
                    .emit(Outbound::CallAccepted { to: from, answer })
                    .await?;
                Ok(())
            }
            OfferReply::Ignored => Ok(()),
        }
    }

    async fn on_call_accepted(
        &mut self,
        from: ParticipantId,
        answer: SessionDescription,
    ) -> Result<(), CallError> {
        if !self.is_partner(&from) {
            warn!("call-accepted from {} outside the current call", from);
            return Ok(());
        }
        let Some(session) = self.sessions.get_mut(&from) else {
            warn!("call-accepted from {} without a session", from);
            return Ok(());
        };
        if session.state() != SignalingState::HaveLocalOffer {
            debug!(
                "Ignoring call-accepted from {} in state {:?}",
                from,
                session.state()
            );
            return Ok(());
        }

        session.accept_remote_answer(answer).await?;
        if let Some(stream) = self.media.as_ref().map(CapturedMedia::stream) {
            session.add_local_tracks(stream).await?;
        }

        info!("Call accepted by {}", from);
        self.bus
            .emit(Outbound::ReadyForStreams { to: from.clone() })
            .await?;
        self.resume_pending(&from).await
    }

    async fn on_nego_offer(
        &mut self,
        from: ParticipantId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        if !self.is_partner(&from) {
            warn!("nego-offer from {} outside the current call", from);
            return Ok(());
        }

        match self.answer_offer(&from, offer).await? {
            OfferReply::Fresh(answer) => {
                self.bus
                    .emit(Outbound::NegoDone {
                        to: from.clone(),
                        answer,
                    })
                    .await?;
                self.resume_pending(&from).await
            }
            OfferReply::Replay(answer) => {
                self.bus
                    .emit(Outbound::NegoDone { to: from, answer })
                    .await?;
                Ok(())
            }
            OfferReply::Ignored => Ok(()),
        }
    }

    async fn on_nego_final(
        &mut self,
        from: Option<ParticipantId>,
        answer: SessionDescription,
    ) -> Result<(), CallError> {
        let Some(remote) = from.or_else(|| self.partner.clone()) else {
            warn!("nego-final without a call partner");
            return Ok(());
        };
        if !self.is_partner(&remote) {
            warn!("nego-final from {} outside the current call", remote);
            return Ok(());
        }
        let Some(session) = self.sessions.get_mut(&remote) else {
            return Ok(());
        };
        if session.state() != SignalingState::HaveLocalOffer {
            debug!(
                "Ignoring nego-final from {} in state {:?}",
                remote,
                session.state()
            );
            return Ok(());
        }

        session.accept_remote_answer(answer).await?;
        debug!("Renegotiation with {} complete", remote);
        self.resume_pending(&remote).await
    }

    async fn on_ready_for_streams(&mut self, from: ParticipantId) -> Result<(), CallError> {
        if !self.is_partner(&from) {
            return Ok(());
        }
        let Some(generation) = self.sessions.get(&from).map(PeerSession::generation) else {
            warn!("ready-for-streams from {} without a session", from);
            return Ok(());
        };

        self.awaiting_ice.insert(from.clone(), generation);
        self.check_ice(IcePoll {
            remote: from,
            generation,
            attempt: 0,
        })
        .await
    }

    async fn on_remote_ended(&mut self, remote: ParticipantId) {
        if !self.is_partner(&remote) && !self.sessions.contains_key(&remote) {
            debug!("Ignoring end of call from {}", remote);
            return;
        }
        info!("Call with {} ended remotely", remote);
        self.teardown(EndReason::RemoteHangup).await;
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let TransportEvent {
            remote,
            generation,
            event,
        } = event;

        let current = self.sessions.get(&remote).map(PeerSession::generation);
        if current != Some(generation) {
            debug!(
                "Dropping {:?} from stale connection #{} for {}",
                event, generation, remote
            );
            return;
        }

        let result = match event {
            ConnectionEvent::NegotiationNeeded => self.on_negotiation_needed(&remote).await,
            ConnectionEvent::RemoteTrack { stream_id, track } => {
                if let Some(session) = self.sessions.get_mut(&remote) {
                    info!("Remote {:?} track {} from {}", track.kind, track.id, remote);
                    let stream = session.set_remote_track(&stream_id, track).clone();
                    self.publish(CallStatus::Streaming { remote, stream });
                }
                Ok(())
            }
            ConnectionEvent::IceGatheringChanged(IceGatheringState::Complete) => {
                if self.awaiting_ice.get(&remote) == Some(&generation) {
                    self.attach_after_ice(&remote).await
                } else {
                    Ok(())
                }
            }
            ConnectionEvent::IceGatheringChanged(_) => Ok(()),
            ConnectionEvent::StateChanged(state) => match state {
                ConnectionState::Failed => Err(CallError::ConnectionFailed(remote)),
                ConnectionState::Closed => {
                    self.on_remote_ended(remote).await;
                    Ok(())
                }
                ConnectionState::Disconnected => {
                    warn!("Connection to {} interrupted", remote);
                    Ok(())
                }
                ConnectionState::Connected => {
                    info!("Connected to {}", remote);
                    Ok(())
                }
                ConnectionState::New | ConnectionState::Connecting => Ok(()),
            },
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
    }

    async fn on_negotiation_needed(&mut self, remote: &ParticipantId) -> Result<(), CallError> {
        let Some(session) = self.sessions.get_mut(remote) else {
            return Ok(());
        };

        match session.state() {
            SignalingState::Stable => {
                let offer = session.create_offer().await?;
                info!("Renegotiating with {}", remote);
                self.bus
                    .emit(Outbound::NegoOffer {
                        to: remote.clone(),
                        offer,
                    })
                    .await?;
            }
            SignalingState::HaveLocalOffer | SignalingState::HaveRemoteOffer => {
                debug!("Deferring renegotiation with {}", remote);
                session.set_pending_negotiation();
            }
            SignalingState::Idle | SignalingState::Closed => {
                debug!("Renegotiation with {} not needed yet", remote);
            }
        }
        Ok(())
    }

    async fn answer_offer(
        &mut self,
        remote: &ParticipantId,
        offer: SessionDescription,
    ) -> Result<OfferReply, CallError> {
        let polite = self.role == Some(CallRole::Callee);
        let session =
            Self::session_entry(&mut self.sessions, &self.factory, &self.transport_tx, remote);

        if session.has_answered(&offer)
            && let Some(answer) = session.last_answer().cloned()
        {
            return Ok(OfferReply::Replay(answer));
        }

        if session.state() == SignalingState::HaveLocalOffer {
            if !polite {
                info!("Offer collision with {}, keeping local offer", remote);
                return Ok(OfferReply::Ignored);
            }
            info!("Offer collision with {}, rolling back local offer", remote);
            session.rollback().await?;
            session.set_pending_negotiation();
        }

        let answer = session.create_answer(offer).await?;
        Ok(OfferReply::Fresh(answer))
    }

    /// Send a renegotiation that was deferred while an exchange was open.
    async fn resume_pending(&mut self, remote: &ParticipantId) -> Result<(), CallError> {
        let Some(session) = self.sessions.get_mut(remote) else {
            return Ok(());
        };
        if session.state() != SignalingState::Stable || !session.take_pending_negotiation() {
            return Ok(());
        }

        let offer = session.create_offer().await?;
        info!("Resuming deferred renegotiation with {}", remote);
        self.bus
            .emit(Outbound::NegoOffer {
                to: remote.clone(),
                offer,
            })
            .await?;
        Ok(())
    }

    async fn check_ice(&mut self, poll: IcePoll) -> Result<(), CallError> {
        if self.awaiting_ice.get(&poll.remote) != Some(&poll.generation) {
            return Ok(());
        }
        let Some(session) = self.sessions.get(&poll.remote) else {
            self.awaiting_ice.remove(&poll.remote);
            return Ok(());
        };
        if session.generation() != poll.generation {
            self.awaiting_ice.remove(&poll.remote);
            return Ok(());
        }

        if session.ice_gathering_complete() {
            return self.attach_after_ice(&poll.remote).await;
        }

        let checks = poll.attempt + 1;
        if checks >= self.config.ice_poll_max_attempts {
            self.awaiting_ice.remove(&poll.remote);
            return Err(CallError::IceGatheringTimeout(checks));
        }

        debug!(
            "ICE gathering for {} still running (check {}/{})",
            poll.remote, checks, self.config.ice_poll_max_attempts
        );
        let tx = self.poll_tx.clone();
        let delay = self.config.ice_poll_interval();
        let next = IcePoll {
            attempt: checks,
            ..poll
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(next);
        });
        Ok(())
    }

    async fn attach_after_ice(&mut self, remote: &ParticipantId) -> Result<(), CallError> {
        self.awaiting_ice.remove(remote);
        let Some(stream) = self.local_stream() else {
            warn!("No local media to send to {}", remote);
            return Ok(());
        };
        let Some(session) = self.sessions.get_mut(remote) else {
            return Ok(());
        };

        let added = session.add_local_tracks(stream).await?;
        info!("ICE gathering done for {}, attached {} tracks", remote, added);
        Ok(())
    }

    async fn hang_up(&mut self) {
        if self.partner.is_none() && self.media.is_none() {
            debug!("Hang-up without a call in progress");
            return;
        }
        if let Some(partner) = self.partner.clone() {
            info!("Hanging up on {}", partner);
            if let Err(e) = self.bus.emit(Outbound::CallEnded { to: partner }).await {
                warn!("Failed to notify call partner: {}", e);
            }
        }
        self.teardown(EndReason::LocalHangup).await;
    }

    async fn fail(&mut self, err: CallError) {
        error!("Call failed: {}", err);
        let reason = match &err {
            CallError::Media(e) => EndReason::MediaUnavailable(e.to_string()),
            other => EndReason::NegotiationFailed(other.to_string()),
        };

        if let Some(partner) = self.partner.clone()
            && let Err(e) = self.bus.emit(Outbound::CallEnded { to: partner }).await
        {
            warn!("Failed to notify call partner: {}", e);
        }
        self.teardown(reason).await;
    }

    async fn teardown(&mut self, reason: EndReason) {
        for (_, mut session) in self.sessions.drain() {
            session.close().await;
        }
        self.awaiting_ice.clear();
        if let Some((remote, offer)) = self.call_offer.take() {
            self.ended_offers.insert(remote, offer);
        }
        if let Some(media) = self.media.take() {
            media.release();
        }
        self.partner = None;
        self.role = None;

        info!("Call ended: {:?}", reason);
        self.publish(CallStatus::Ended { reason });
    }

    async fn ensure_media(&mut self) -> Result<(), CallError> {
        if self.media.is_none() {
            let media = self.media_source.acquire().await?;
            info!("Acquired local stream {}", media.stream().id());
            self.media = Some(media);
        }
        Ok(())
    }

    fn local_stream(&self) -> Option<Arc<LocalStream>> {
        self.media.as_ref().map(CapturedMedia::stream)
    }

    fn claim_partner(&mut self, remote: &ParticipantId) -> bool {
        match &self.partner {
            Some(current) if current != remote => {
                warn!("Ignoring {} while in a call with {}", remote, current);
                false
            }
            Some(_) => true,
            None => {
                self.partner = Some(remote.clone());
                true
            }
        }
    }

    fn is_partner(&self, remote: &ParticipantId) -> bool {
        self.partner.as_ref() == Some(remote)
    }

    fn session_entry<'a>(
        sessions: &'a mut HashMap<ParticipantId, PeerSession>,
        factory: &Arc<dyn ConnectionFactory>,
        events: &mpsc::Sender<TransportEvent>,
        remote: &ParticipantId,
    ) -> &'a mut PeerSession {
        sessions
            .entry(remote.clone())
            .or_insert_with(|| PeerSession::new(remote.clone(), factory.clone(), events.clone()))
    }

    fn publish(&self, status: CallStatus) {
        self.status.send_replace(status);
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        let mut sessions: Vec<SessionSnapshot> = self
            .sessions
            .values()
            .map(|s| SessionSnapshot {
                remote: s.remote().clone(),
                state: s.state(),
                generation: s.generation(),
                pending_negotiation: s.pending_negotiation(),
                remote_stream: s.remote_stream().cloned(),
            })
            .collect();
        sessions.sort_by(|a, b| a.remote.cmp(&b.remote));

        CoordinatorSnapshot {
            partner: self.partner.clone(),
            role: self.role,
            media_acquired: self.media.is_some(),
            sessions,
        }
    }
}
