/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Session state machine.
//!
//! One [`Session`] drives one gateway connection through its lifecycle:
//! connect, hello, identify or resume, steady state with heartbeats, and
//! supervised reconnection with exponential backoff. The session task owns
//! the connection exclusively; the heartbeat task reaches the wire only
//! through an outbound channel drained here, so every send is serialized.
//!
//! Retryable failures (transport drops, protocol violations, heartbeat
//! timeouts) are absorbed by the supervision loop. A credential rejection is
//! fatal and surfaces to the caller.

use crate::config::SessionConfig;
use crate::dispatcher::{Control, Dispatcher, Subscriber};
use crate::heartbeat::{HeartbeatScheduler, heartbeat_frame};
use crate::sequence::{ResumeState, SequenceTracker};
use crate::state::{Phase, PhaseCell};
use irongate_core::error::{
    AuthenticationError, GatewayError, ProtocolError, Result, TransportError,
};
use irongate_core::types::Envelope;
use irongate_model::cache::EntityCache;
use irongate_transport::connector::{Connection, Connector};
use parking_lot::Mutex;
use rand::Rng;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How one connection cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    /// Orderly shutdown was requested; do not reconnect.
    Shutdown,
    /// The cycle ended for a reason that warrants a prompt reconnect.
    Reconnect,
}

/// What the pump loop should do next, produced by the select and acted on
/// afterwards so the connection is only borrowed in one place.
enum Step {
    Shutdown,
    HeartbeatTimeout(u32),
    Outbound(Value),
    Inbound(Option<Value>),
}

/// A single gateway session.
pub struct Session {
    config: SessionConfig,
    phase: Arc<PhaseCell>,
    sequence: Arc<SequenceTracker>,
    resume: Mutex<Option<String>>,
    dispatcher: Dispatcher,
    cache: Arc<EntityCache>,
    shutdown: CancellationToken,
}

impl Session {
    /// Creates a session over the given cache.
    #[must_use]
    pub fn new(config: SessionConfig, cache: Arc<EntityCache>) -> Self {
        let phase = Arc::new(PhaseCell::new());
        let sequence = Arc::new(SequenceTracker::new());
        let dispatcher = Dispatcher::new(
            config.shard.index,
            Arc::clone(&sequence),
            Arc::clone(&cache),
        );
        Self {
            config,
            phase,
            sequence,
            resume: Mutex::new(None),
            dispatcher,
            cache,
            shutdown: CancellationToken::new(),
        }
    }

    /// Registers a subscriber for decoded dispatch events.
    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.dispatcher.subscribe(subscriber);
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Returns the entity cache this session feeds.
    #[must_use]
    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    /// Returns the resume state held for the next reconnect, if any.
    #[must_use]
    pub fn resume_state(&self) -> Option<ResumeState> {
        self.resume.lock().as_ref().map(|session_id| ResumeState {
            session_id: session_id.clone(),
            sequence: self.sequence.last(),
        })
    }

    /// Returns the token that cancels this session.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the session until shutdown or a fatal error.
    ///
    /// Each connection cycle that ends retryably is followed by an
    /// exponentially growing, jittered backoff delay; a cycle that reaches
    /// the live phase resets the delay.
    ///
    /// # Errors
    /// Returns [`GatewayError::Authentication`] if the remote rejects the
    /// credentials. Retryable failures never surface here.
    pub async fn run(&self, connector: &dyn Connector, endpoint: &str) -> Result<()> {
        let mut delay = self.config.backoff_base;
        let result = loop {
            self.phase.transition(Phase::Connecting);
            let outcome = self.connection_cycle(connector, endpoint).await;
            // A cycle that got as far as Connected leaves the phase there
            // until the Reconnecting transition below; that is the signal
            // to start the backoff progression over.
            let reached_live = self.phase.get() == Phase::Connected;
            match outcome {
                Ok(CycleEnd::Shutdown) => break Ok(()),
                Ok(CycleEnd::Reconnect) => {
                    delay = self.config.backoff_base;
                }
                Err(GatewayError::Authentication(err)) => {
                    error!(shard = %self.config.shard, %err, "session failed permanently");
                    break Err(GatewayError::Authentication(err));
                }
                Err(err) => {
                    if reached_live {
                        delay = self.config.backoff_base;
                    }
                    warn!(shard = %self.config.shard, %err, "connection cycle failed, will retry");
                }
            }

            if self.shutdown.is_cancelled() {
                break Ok(());
            }
            self.phase.transition(Phase::Reconnecting);

            let jitter_ms = u64::try_from(self.config.jitter_max.as_millis()).unwrap_or(u64::MAX);
            let sleep_for = delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms));
            debug!(shard = %self.config.shard, delay_ms = sleep_for.as_millis() as u64, "backing off before reconnect");
            tokio::select! {
                () = self.shutdown.cancelled() => break Ok(()),
                () = tokio::time::sleep(sleep_for) => {}
            }
            delay = (delay * 2).min(self.config.backoff_max);
        };

        self.phase.transition(Phase::Closing);
        self.phase.transition(Phase::Disconnected);
        result
    }

    async fn connection_cycle(&self, connector: &dyn Connector, endpoint: &str) -> Result<CycleEnd> {
        let mut conn = tokio::time::timeout(self.config.connect_timeout, connector.open(endpoint))
            .await
            .map_err(|_| TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "connect timed out".to_string(),
            })??;
        let result = self.drive(conn.as_mut(), endpoint).await;
        conn.close().await;
        result
    }

    /// Drives one open connection from hello to its end.
    async fn drive(&self, conn: &mut dyn Connection, endpoint: &str) -> Result<CycleEnd> {
        let interval = match self.await_hello(conn, endpoint).await? {
            Some(interval) => interval,
            None => return Ok(CycleEnd::Shutdown),
        };

        self.send_handshake(conn).await?;

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Value>(8);
        let (timeout_tx, mut timeout_rx) = mpsc::channel::<u32>(1);
        let mut heartbeat: Option<HeartbeatScheduler> = None;

        let result = loop {
            let step = tokio::select! {
                () = self.shutdown.cancelled() => Step::Shutdown,
                Some(missed) = timeout_rx.recv() => Step::HeartbeatTimeout(missed),
                Some(frame) = outbound_rx.recv() => Step::Outbound(frame),
                frame = conn.recv() => Step::Inbound(frame),
            };

            match step {
                Step::Shutdown => break Ok(CycleEnd::Shutdown),
                Step::HeartbeatTimeout(missed) => {
                    break Err(TransportError::HeartbeatTimeout { missed }.into());
                }
                Step::Outbound(frame) => {
                    if conn.send(frame).await.is_err() {
                        break Err(TransportError::SendClosed.into());
                    }
                }
                Step::Inbound(None) => break Err(TransportError::StreamClosed.into()),
                Step::Inbound(Some(raw)) => {
                    let envelope = match Envelope::from_value(raw) {
                        Ok(envelope) => envelope,
                        Err(err) => break Err(err.into()),
                    };
                    let control = match self.dispatcher.dispatch(envelope).await {
                        Ok(control) => control,
                        Err(err) => break Err(err.into()),
                    };
                    match control {
                        Control::None | Control::Hello { .. } => {}
                        Control::Ready { session_id } => {
                            info!(shard = %self.config.shard, "session ready");
                            *self.resume.lock() = Some(session_id);
                            self.phase.transition(Phase::Connected);
                            if heartbeat.is_none() {
                                heartbeat = Some(self.start_heartbeat(
                                    interval,
                                    outbound_tx.clone(),
                                    timeout_tx.clone(),
                                ));
                            }
                        }
                        Control::Resumed => {
                            info!(shard = %self.config.shard, "session resumed");
                            self.phase.transition(Phase::Connected);
                            if heartbeat.is_none() {
                                heartbeat = Some(self.start_heartbeat(
                                    interval,
                                    outbound_tx.clone(),
                                    timeout_tx.clone(),
                                ));
                            }
                        }
                        Control::HeartbeatAck => {
                            if let Some(hb) = &heartbeat {
                                hb.on_ack();
                            }
                        }
                        Control::HeartbeatRequest => {
                            if conn.send(heartbeat_frame(&self.sequence)).await.is_err() {
                                break Err(TransportError::SendClosed.into());
                            }
                        }
                        Control::Reconnect => {
                            info!(shard = %self.config.shard, "remote requested reconnect");
                            break Ok(CycleEnd::Reconnect);
                        }
                        Control::InvalidSession { resumable } => {
                            if !resumable {
                                *self.resume.lock() = None;
                                self.sequence.reset();
                            }
                            if self.phase.get() == Phase::Identifying {
                                // Invalid session in response to a fresh
                                // identify means the credentials themselves
                                // were refused.
                                break Err(AuthenticationError::Rejected(
                                    "session invalidated during identify".to_string(),
                                )
                                .into());
                            }
                            warn!(shard = %self.config.shard, resumable, "session invalidated, reconnecting");
                            break Ok(CycleEnd::Reconnect);
                        }
                    }
                }
            }
        };

        // The timer task must be gone before the connection closes so no
        // heartbeat races a closed transport.
        if let Some(hb) = heartbeat {
            hb.stop().await;
        }
        result
    }

    /// Waits for the opening hello frame. Returns `None` on shutdown.
    async fn await_hello(
        &self,
        conn: &mut dyn Connection,
        endpoint: &str,
    ) -> Result<Option<Duration>> {
        let raw = tokio::select! {
            () = self.shutdown.cancelled() => return Ok(None),
            () = tokio::time::sleep(self.config.connect_timeout) => {
                return Err(TransportError::ConnectFailed {
                    endpoint: endpoint.to_string(),
                    reason: "no hello before connect timeout".to_string(),
                }
                .into());
            }
            frame = conn.recv() => frame.ok_or(TransportError::StreamClosed)?,
        };
        let envelope = Envelope::from_value(raw)?;
        let opcode = envelope.op;
        match self.dispatcher.dispatch(envelope).await? {
            Control::Hello { interval } => Ok(Some(interval)),
            _ => Err(ProtocolError::UnexpectedOpcode {
                opcode: opcode.as_u8(),
                phase: self.phase.get().to_string(),
            }
            .into()),
        }
    }

    /// Sends the resume or identify frame, entering the matching phase.
    async fn send_handshake(&self, conn: &mut dyn Connection) -> Result<()> {
        let resume_token = self.resume.lock().clone();
        if let Some(session_id) = resume_token {
            self.phase.transition(Phase::Resuming);
            debug!(shard = %self.config.shard, "attempting resume");
            conn.send(json!({
                "op": 6,
                "d": {
                    "token": self.config.token,
                    "session_id": session_id,
                    "seq": self.sequence.last(),
                }
            }))
            .await?;
            Ok(())
        } else {
            self.phase.transition(Phase::Identifying);
            debug!(shard = %self.config.shard, "identifying");
            conn.send(json!({
                "op": 2,
                "d": {
                    "token": self.config.token,
                    "intents": self.config.intents,
                    "shard": [self.config.shard.index, self.config.shard.count],
                    "properties": {
                        "os": std::env::consts::OS,
                        "browser": "irongate",
                        "device": "irongate",
                    }
                }
            }))
            .await?;
            Ok(())
        }
    }

    fn start_heartbeat(
        &self,
        interval: Duration,
        outbound: mpsc::Sender<Value>,
        timeout: mpsc::Sender<u32>,
    ) -> HeartbeatScheduler {
        HeartbeatScheduler::start(
            interval,
            self.config.heartbeat_jitter,
            self.config.max_missed_acks,
            Arc::clone(&self.sequence),
            Arc::clone(&self.phase),
            outbound,
            timeout,
        )
    }

    /// Spawns the session onto the runtime.
    #[must_use]
    pub fn spawn(
        self: Arc<Self>,
        connector: Arc<dyn Connector>,
        endpoint: impl Into<String>,
    ) -> SessionHandle {
        let endpoint = endpoint.into();
        let shutdown = self.shutdown.clone();
        let task =
            tokio::spawn(async move { self.run(connector.as_ref(), &endpoint).await });
        SessionHandle::new(shutdown, task)
    }
}

/// Handle to a spawned session.
#[derive(Debug)]
pub struct SessionHandle {
    shutdown: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl SessionHandle {
    pub(crate) fn new(shutdown: CancellationToken, task: JoinHandle<Result<()>>) -> Self {
        Self { shutdown, task }
    }

    /// Requests an orderly disconnect and waits for the session to finish.
    ///
    /// # Errors
    /// Returns the session's terminal error, if it failed before or during
    /// shutdown.
    pub async fn disconnect(self) -> Result<()> {
        self.shutdown.cancel();
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(GatewayError::Io(std::io::Error::other(err))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irongate_transport::memory::{MemoryConnector, RemoteEnd};
    use serde_json::json;
    use tokio::time::timeout as tokio_timeout;

    const INTERVAL_MS: u64 = 30;
    const WAIT: Duration = Duration::from_millis(500);

    fn test_config() -> SessionConfig {
        SessionConfig::new("test-token")
            .with_intents(513)
            .with_backoff(Duration::from_millis(5), Duration::from_millis(20))
            .with_jitter_max(Duration::from_millis(1))
            .with_heartbeat_jitter(false)
    }

    fn spawn_session(
        config: SessionConfig,
    ) -> (
        Arc<Session>,
        SessionHandle,
        mpsc::UnboundedReceiver<RemoteEnd>,
    ) {
        let (connector, accepted) = MemoryConnector::new();
        let session = Arc::new(Session::new(config, Arc::new(EntityCache::new())));
        let handle = Arc::clone(&session).spawn(Arc::new(connector), "inproc://gateway");
        (session, handle, accepted)
    }

    fn hello() -> Value {
        json!({"op": 10, "d": {"heartbeat_interval": INTERVAL_MS}})
    }

    fn ready(seq: u64) -> Value {
        json!({
            "op": 0, "s": seq, "t": "READY",
            "d": {
                "session_id": "resume-me",
                "user": {"id": "1", "username": "gate"},
                "guilds": []
            }
        })
    }

    /// Plays the remote through hello and a fresh identify, returning the
    /// identify frame.
    async fn handshake(remote: &mut RemoteEnd) -> Value {
        remote.send(hello());
        let identify = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
        remote.send(ready(1));
        identify
    }

    async fn wait_for_phase(session: &Session, phase: Phase) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while session.phase() != phase {
            assert!(tokio::time::Instant::now() < deadline, "never reached {phase}");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn test_fresh_handshake_reaches_connected_and_heartbeats() {
        let (session, handle, mut accepted) = spawn_session(test_config());
        let mut remote = accepted.recv().await.unwrap();

        let identify = handshake(&mut remote).await;
        assert_eq!(identify["op"], 2);
        assert_eq!(identify["d"]["token"], "test-token");
        assert_eq!(identify["d"]["intents"], 513);
        assert_eq!(identify["d"]["shard"], json!([0, 1]));

        wait_for_phase(&session, Phase::Connected).await;
        assert_eq!(
            session.resume_state(),
            Some(ResumeState {
                session_id: "resume-me".to_string(),
                sequence: Some(1),
            })
        );

        // First heartbeat arrives within one interval (jitter disabled) and
        // carries the last seen sequence.
        let frame = tokio_timeout(Duration::from_millis(INTERVAL_MS * 2), remote.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame, json!({"op": 1, "d": 1}));

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_missed_acks_force_reconnect_with_resume() {
        let config = test_config().with_max_missed_acks(2);
        let (session, handle, mut accepted) = spawn_session(config);

        let mut remote = accepted.recv().await.unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        // Never ack: after two unanswered probes the session drops the
        // connection and dials again.
        let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();

        // The second cycle resumes instead of identifying.
        remote.send(hello());
        let resume = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
        assert_eq!(resume["op"], 6);
        assert_eq!(resume["d"]["session_id"], "resume-me");
        assert_eq!(resume["d"]["seq"], 1);

        remote.send(json!({"op": 0, "s": 2, "t": "RESUMED", "d": null}));
        wait_for_phase(&session, Phase::Connected).await;

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_acked_heartbeats_keep_the_session_alive() {
        let config = test_config().with_max_missed_acks(2);
        let (session, handle, mut accepted) = spawn_session(config);

        let mut remote = accepted.recv().await.unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        // Ack every probe for several intervals; no second dial happens.
        for _ in 0..4 {
            let frame = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
            assert_eq!(frame["op"], 1);
            remote.send(json!({"op": 11, "d": null}));
        }
        assert_eq!(session.phase(), Phase::Connected);
        assert!(accepted.try_recv().is_err());

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_resumable_invalid_session_falls_back_to_identify() {
        let config = test_config().with_max_missed_acks(1);
        let (session, handle, mut accepted) = spawn_session(config);

        let mut remote = accepted.recv().await.unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;
        drop(remote);

        // Second cycle: resume attempt refused as non-resumable.
        let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        remote.send(hello());
        let resume = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
        assert_eq!(resume["op"], 6);
        remote.send(json!({"op": 9, "d": false}));

        // Third cycle: resume state was discarded, a fresh identify goes out.
        let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        remote.send(hello());
        let identify = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
        assert_eq!(identify["op"], 2);
        assert_eq!(session.resume_state(), None);

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_session_during_identify_is_fatal() {
        let (_session, handle, mut accepted) = spawn_session(test_config());

        let mut remote = accepted.recv().await.unwrap();
        remote.send(hello());
        let identify = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
        assert_eq!(identify["op"], 2);
        remote.send(json!({"op": 9, "d": false}));

        let err = handle.disconnect().await.unwrap_err();
        assert!(matches!(err, GatewayError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_server_reconnect_request_redials() {
        let (session, handle, mut accepted) = spawn_session(test_config());

        let mut remote = accepted.recv().await.unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        remote.send(json!({"op": 7, "d": null}));
        let remote2 = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        remote2.send(hello());

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_sends_nothing_afterwards() {
        let (session, handle, mut accepted) = spawn_session(test_config());

        let mut remote = accepted.recv().await.unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        handle.disconnect().await.unwrap();
        assert_eq!(session.phase(), Phase::Disconnected);

        // Drain frames raced before the disconnect resolved; the stream
        // then ends with no further sends.
        loop {
            match tokio_timeout(WAIT, remote.recv()).await.unwrap() {
                Some(_) => {}
                None => break,
            }
        }
    }

    #[tokio::test]
    async fn test_backoff_resets_after_live_cycle() {
        let config =
            test_config().with_backoff(Duration::from_millis(50), Duration::from_millis(400));
        let (session, handle, mut accepted) = spawn_session(config);

        let mut remote = accepted.recv().await.unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        // Drop the live connection repeatedly. Every cycle reaches
        // Connected, so each redial waits only the base delay; without the
        // reset the third gap would have doubled twice to ~200ms.
        let mut seq = 2;
        let mut last_gap = Duration::ZERO;
        for _ in 0..3 {
            let dropped_at = tokio::time::Instant::now();
            drop(remote);
            remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
            last_gap = dropped_at.elapsed();

            remote.send(hello());
            let frame = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
            assert_eq!(frame["op"], 6);
            remote.send(json!({"op": 0, "s": seq, "t": "RESUMED", "d": null}));
            seq += 1;
            wait_for_phase(&session, Phase::Connected).await;
        }
        assert!(
            last_gap < Duration::from_millis(150),
            "redial gap grew despite live cycles: {last_gap:?}"
        );

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_remote_times_out_and_redials() {
        let config = test_config().with_connect_timeout(Duration::from_millis(30));
        let (session, handle, mut accepted) = spawn_session(config);

        // First remote never sends hello; the session gives up on it and
        // dials again.
        let _silent = accepted.recv().await.unwrap();
        let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        handle.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_failures_are_retried() {
        let (connector, mut accepted) = MemoryConnector::new();
        connector.fail_next(2);
        let session = Arc::new(Session::new(test_config(), Arc::new(EntityCache::new())));
        let handle = Arc::clone(&session).spawn(Arc::new(connector), "inproc://gateway");

        // Two scripted dial failures, then the third attempt lands.
        let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        handshake(&mut remote).await;
        wait_for_phase(&session, Phase::Connected).await;

        handle.disconnect().await.unwrap();
    }
}
