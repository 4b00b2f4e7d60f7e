//! Push-stream client with automatic reconnection
//!
//! [`StreamClient::connect`] spawns a supervisor task that keeps one logical
//! connection to an endpoint alive, classifies frames into snapshots and
//! commands, and reconnects with exponential backoff after transport errors.
//! The returned [`StreamHandle`] can force an immediate reconnect or close the
//! client for good.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use domain::ServerMessage;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::StreamError;
use crate::reconnect::ReconnectConfig;
use crate::transport::{FrameStream, StreamEndpoint, StreamTransport};

/// Observable state of the logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Opening a connection
    Connecting,
    /// Connected and receiving frames
    Open,
    /// Last connection failed; waiting for backoff or a manual reconnect
    Errored,
    /// Closed by the consumer; terminal
    Closed,
}

/// Receives what the stream delivers
///
/// Callbacks run on the supervisor task and must not block.
pub trait StreamListener: Send + Sync {
    /// A frame whose type equals the endpoint's snapshot type
    fn on_snapshot(&self, data: Value);

    /// Any other frame
    fn on_message(&self, _message: ServerMessage) {}

    /// A transport error; the client recovers on its own
    fn on_error(&self, _error: &StreamError) {}
}

#[derive(Debug)]
enum Control {
    Reconnect,
    Close,
}

/// Entry point for opening push streams
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamClient;

impl StreamClient {
    /// Connect to `endpoint` and keep the connection alive until closed
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(
        transport: Arc<dyn StreamTransport>,
        endpoint: StreamEndpoint,
        reconnect: ReconnectConfig,
        listener: Arc<dyn StreamListener>,
    ) -> StreamHandle {
        let closed = Arc::new(AtomicBool::new(false));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let supervisor = Supervisor {
            transport,
            endpoint,
            reconnect,
            listener,
            closed: Arc::clone(&closed),
            control: control_rx,
            state: state_tx,
            attempt: 0,
        };
        let task = tokio::spawn(supervisor.run());

        StreamHandle {
            closed,
            control: control_tx,
            state: state_rx,
            task: Some(task),
        }
    }
}

/// Handle to a running stream client
///
/// Dropping the handle closes the client.
pub struct StreamHandle {
    closed: Arc<AtomicBool>,
    control: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<ConnectionState>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("closed", &self.is_closed())
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl StreamHandle {
    /// Close the client
    ///
    /// Idempotent. Once this returns, no frame is dispatched and no reconnect
    /// happens, including one whose timer already fired.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closing stream client");
            let _ = self.control.send(Control::Close);
        }
    }

    /// Drop the current connection or pending backoff and connect again now
    ///
    /// Ignored after [`close`](Self::close).
    pub fn reconnect(&self) {
        if self.is_closed() {
            return;
        }
        let _ = self.control.send(Control::Reconnect);
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state transitions
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Close the client and wait for the supervisor to finish
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Stream supervisor ended abnormally");
            }
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// What the supervisor does next
enum Next {
    Connect,
    Backoff(Duration),
    Idle,
    Exit,
}

enum Event {
    Control(Option<Control>),
    Frame(Option<Result<String, StreamError>>),
}

struct Supervisor {
    transport: Arc<dyn StreamTransport>,
    endpoint: StreamEndpoint,
    reconnect: ReconnectConfig,
    listener: Arc<dyn StreamListener>,
    closed: Arc<AtomicBool>,
    control: mpsc::UnboundedReceiver<Control>,
    state: watch::Sender<ConnectionState>,
    attempt: u32,
}

impl Supervisor {
    async fn run(mut self) {
        let mut next = Next::Connect;
        loop {
            if self.is_closed() {
                break;
            }
            next = match next {
                Next::Connect => self.connect_and_stream().await,
                Next::Backoff(delay) => self.wait_backoff(delay).await,
                Next::Idle => self.wait_idle().await,
                Next::Exit => break,
            };
        }
        self.set_state(ConnectionState::Closed);
        debug!(endpoint = %self.endpoint.name(), "Stream supervisor stopped");
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    async fn connect_and_stream(&mut self) -> Next {
        self.set_state(ConnectionState::Connecting);
        debug!(endpoint = %self.endpoint.name(), "Opening stream");

        let opened = tokio::select! {
            biased;
            cmd = self.control.recv() => Err(cmd),
            result = self.transport.open(&self.endpoint) => Ok(result),
        };
        let frames = match opened {
            Err(cmd) => return Self::on_control(cmd),
            Ok(Err(e)) => return self.on_failure(e),
            Ok(Ok(frames)) => frames,
        };
        if self.is_closed() {
            return Next::Exit;
        }

        self.attempt = 0;
        self.set_state(ConnectionState::Open);
        info!(endpoint = %self.endpoint.name(), "Stream connected");

        self.pump(frames).await
    }

    async fn pump(&mut self, mut frames: FrameStream) -> Next {
        loop {
            let event = tokio::select! {
                biased;
                cmd = self.control.recv() => Event::Control(cmd),
                item = frames.next() => Event::Frame(item),
            };
            match event {
                Event::Control(cmd) => return Self::on_control(cmd),
                Event::Frame(Some(Ok(frame))) => self.dispatch(&frame),
                Event::Frame(Some(Err(e))) => return self.on_failure(e),
                Event::Frame(None) => return self.on_failure(StreamError::Ended),
            }
        }
    }

    fn dispatch(&self, frame: &str) {
        if self.is_closed() {
            return;
        }
        let message = match ServerMessage::parse(frame) {
            Ok(message) => message,
            Err(e) => {
                trace!(error = %e, "Dropping unparseable frame");
                return;
            },
        };

        if message.is_snapshot(self.endpoint.snapshot_type()) {
            self.listener.on_snapshot(message.data);
        } else {
            self.listener.on_message(message);
        }
    }

    fn on_control(cmd: Option<Control>) -> Next {
        match cmd {
            Some(Control::Reconnect) => {
                debug!("Manual reconnect requested");
                Next::Connect
            },
            Some(Control::Close) | None => Next::Exit,
        }
    }

    fn on_failure(&mut self, error: StreamError) -> Next {
        if self.is_closed() {
            return Next::Exit;
        }
        self.listener.on_error(&error);
        self.set_state(ConnectionState::Errored);

        if !self.reconnect.enabled {
            warn!(error = %error, "Stream failed; automatic reconnect disabled");
            return Next::Idle;
        }

        let delay = self.reconnect.calculate_delay(self.attempt);
        #[allow(clippy::cast_possible_truncation)]
        let delay_ms = delay.as_millis() as u64;
        warn!(
            attempt = self.attempt,
            delay_ms = delay_ms,
            error = %error,
            "Stream failed, waiting before reconnect"
        );
        self.attempt = self.attempt.saturating_add(1);
        Next::Backoff(delay)
    }

    async fn wait_backoff(&mut self, delay: Duration) -> Next {
        let cmd = tokio::select! {
            biased;
            cmd = self.control.recv() => Some(cmd),
            () = tokio::time::sleep(delay) => None,
        };
        match cmd {
            Some(cmd) => Self::on_control(cmd),
            // The timer may have fired concurrently with close()
            None if self.is_closed() => Next::Exit,
            None => Next::Connect,
        }
    }

    async fn wait_idle(&mut self) -> Next {
        Self::on_control(self.control.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    type FrameSender = mpsc::UnboundedSender<Result<String, StreamError>>;

    enum Script {
        Fail(StreamError),
        Open(mpsc::UnboundedReceiver<Result<String, StreamError>>),
    }

    #[derive(Default)]
    struct FakeTransport {
        scripts: Mutex<VecDeque<Script>>,
        opens: AtomicUsize,
    }

    impl FakeTransport {
        fn refuse_next(&self) {
            self.scripts
                .lock()
                .push_back(Script::Fail(StreamError::ConnectionFailed("refused".into())));
        }

        fn accept_next(&self) -> FrameSender {
            let (tx, rx) = mpsc::unbounded_channel();
            self.scripts.lock().push_back(Script::Open(rx));
            tx
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StreamTransport for FakeTransport {
        async fn open(&self, _endpoint: &StreamEndpoint) -> Result<FrameStream, StreamError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let script = self.scripts.lock().pop_front();
            match script {
                Some(Script::Open(rx)) => Ok(Box::pin(futures::stream::unfold(
                    rx,
                    |mut rx| async move { rx.recv().await.map(|item| (item, rx)) },
                ))),
                Some(Script::Fail(e)) => Err(e),
                None => Err(StreamError::ConnectionFailed("unscripted".into())),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        snapshots: Mutex<Vec<Value>>,
        messages: Mutex<Vec<ServerMessage>>,
        errors: Mutex<Vec<StreamError>>,
    }

    impl StreamListener for Recorder {
        fn on_snapshot(&self, data: Value) {
            self.snapshots.lock().push(data);
        }

        fn on_message(&self, message: ServerMessage) {
            self.messages.lock().push(message);
        }

        fn on_error(&self, error: &StreamError) {
            self.errors.lock().push(error.clone());
        }
    }

    fn reconnect_config() -> ReconnectConfig {
        ReconnectConfig {
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
            ..ReconnectConfig::default()
        }
    }

    fn start(
        transport: &Arc<FakeTransport>,
        reconnect: ReconnectConfig,
    ) -> (StreamHandle, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let handle = StreamClient::connect(
            Arc::clone(transport) as Arc<dyn StreamTransport>,
            StreamEndpoint::named("kiosk"),
            reconnect,
            Arc::clone(&recorder) as Arc<dyn StreamListener>,
        );
        (handle, recorder)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn frame(kind: &str, seq: u64, data: &Value) -> Result<String, StreamError> {
        Ok(json!({ "type": kind, "seq": seq, "data": data }).to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn routes_snapshots_and_messages() {
        let transport = Arc::new(FakeTransport::default());
        let tx = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());

        tx.send(frame("kiosk.snapshot", 1, &json!({ "queue": [] })))
            .unwrap();
        tx.send(frame("speech.start", 2, &json!({ "utterance_id": "u1" })))
            .unwrap();
        settle().await;

        assert_eq!(handle.state(), ConnectionState::Open);
        assert_eq!(*recorder.snapshots.lock(), vec![json!({ "queue": [] })]);
        let messages = recorder.messages.lock();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, "speech.start");
        assert_eq!(messages[0].seq, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drops_malformed_frames_and_keeps_streaming() {
        let transport = Arc::new(FakeTransport::default());
        let tx = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());

        tx.send(Ok("not json".to_string())).unwrap();
        tx.send(Ok("[1, 2]".to_string())).unwrap();
        tx.send(frame("kiosk.snapshot", 3, &json!({}))).unwrap();
        settle().await;

        assert_eq!(handle.state(), ConnectionState::Open);
        assert_eq!(recorder.snapshots.lock().len(), 1);
        assert!(recorder.messages.lock().is_empty());
        assert!(recorder.errors.lock().is_empty());
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_exponentially_between_failures() {
        let transport = Arc::new(FakeTransport::default());
        transport.refuse_next();
        transport.refuse_next();
        let _tx = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(transport.opens(), 1);
        assert_eq!(handle.state(), ConnectionState::Errored);

        // First retry after 1s
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(transport.opens(), 2);

        // Second retry 2s after the first
        tokio::time::sleep(Duration::from_millis(1400)).await;
        assert_eq!(transport.opens(), 2);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.opens(), 3);
        assert_eq!(handle.state(), ConnectionState::Open);
        assert_eq!(recorder.errors.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_open_resets_backoff() {
        let transport = Arc::new(FakeTransport::default());
        transport.refuse_next();
        let tx = transport.accept_next();
        let _next = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(transport.opens(), 2);
        assert_eq!(handle.state(), ConnectionState::Open);

        // Server ends the stream; the next delay starts over at 1s
        drop(tx);
        settle().await;
        assert_eq!(handle.state(), ConnectionState::Errored);
        assert_eq!(recorder.errors.lock().last(), Some(&StreamError::Ended));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(transport.opens(), 3);
        assert_eq!(handle.state(), ConnectionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn read_error_triggers_reconnect() {
        let transport = Arc::new(FakeTransport::default());
        let tx = transport.accept_next();
        let _next = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());
        settle().await;

        tx.send(Err(StreamError::Read("reset".into()))).unwrap();
        settle().await;
        assert_eq!(handle.state(), ConnectionState::Errored);
        assert_eq!(
            *recorder.errors.lock(),
            vec![StreamError::Read("reset".into())]
        );

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(transport.opens(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reconnect_skips_pending_backoff() {
        let transport = Arc::new(FakeTransport::default());
        transport.refuse_next();
        let _tx = transport.accept_next();
        let config = ReconnectConfig {
            initial_delay_ms: 60_000,
            ..reconnect_config()
        };
        let (handle, _recorder) = start(&transport, config);

        settle().await;
        assert_eq!(transport.opens(), 1);
        assert_eq!(handle.state(), ConnectionState::Errored);

        handle.reconnect();
        settle().await;
        assert_eq!(transport.opens(), 2);
        assert_eq!(handle.state(), ConnectionState::Open);

        // The cancelled timer never fires a second connection
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.opens(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reconnect_replaces_open_connection() {
        let transport = Arc::new(FakeTransport::default());
        let first = transport.accept_next();
        let second = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());
        settle().await;

        handle.reconnect();
        settle().await;
        assert_eq!(transport.opens(), 2);

        // Frames on the abandoned connection are ignored
        let _ = first.send(frame("kiosk.snapshot", 1, &json!("old")));
        second
            .send(frame("kiosk.snapshot", 2, &json!("new")))
            .unwrap();
        settle().await;
        assert_eq!(*recorder.snapshots.lock(), vec![json!("new")]);
        assert!(recorder.errors.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_backoff_prevents_reconnect() {
        let transport = Arc::new(FakeTransport::default());
        transport.refuse_next();
        let (handle, _recorder) = start(&transport, reconnect_config());
        let mut state = handle.subscribe();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.close();
        handle.close();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.opens(), 1);
        assert!(handle.is_closed());
        state
            .wait_for(|s| *s == ConnectionState::Closed)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_dispatched_after_close() {
        let transport = Arc::new(FakeTransport::default());
        let tx = transport.accept_next();
        let (handle, recorder) = start(&transport, reconnect_config());

        tx.send(frame("kiosk.snapshot", 1, &json!(1))).unwrap();
        settle().await;
        handle.close();
        let _ = tx.send(frame("kiosk.snapshot", 2, &json!(2)));
        let _ = tx.send(frame("speech.end", 3, &json!({})));
        settle().await;

        assert_eq!(*recorder.snapshots.lock(), vec![json!(1)]);
        assert!(recorder.messages.lock().is_empty());
        assert_eq!(handle.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_after_close_is_ignored() {
        let transport = Arc::new(FakeTransport::default());
        let _tx = transport.accept_next();
        let (handle, _recorder) = start(&transport, reconnect_config());
        settle().await;

        handle.close();
        handle.reconnect();
        settle().await;
        assert_eq!(transport.opens(), 1);
        assert_eq!(handle.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_reconnect_waits_for_manual_trigger() {
        let transport = Arc::new(FakeTransport::default());
        transport.refuse_next();
        let _tx = transport.accept_next();
        let (handle, recorder) = start(&transport, ReconnectConfig::disabled());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(transport.opens(), 1);
        assert_eq!(handle.state(), ConnectionState::Errored);
        assert_eq!(recorder.errors.lock().len(), 1);

        handle.reconnect();
        settle().await;
        assert_eq!(transport.opens(), 2);
        assert_eq!(handle.state(), ConnectionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_closes_client() {
        let transport = Arc::new(FakeTransport::default());
        transport.refuse_next();
        let (handle, _recorder) = start(&transport, reconnect_config());
        let mut state = handle.subscribe();
        settle().await;

        drop(handle);
        state
            .wait_for(|s| *s == ConnectionState::Closed)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_supervisor() {
        let transport = Arc::new(FakeTransport::default());
        let _tx = transport.accept_next();
        let (handle, _recorder) = start(&transport, reconnect_config());
        let state = handle.subscribe();
        settle().await;

        handle.shutdown().await;
        assert_eq!(*state.borrow(), ConnectionState::Closed);
    }
}
