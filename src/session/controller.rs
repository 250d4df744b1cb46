use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::camera::backend::{CaptureHandle, CaptureSource};
use crate::camera::types::CaptureRequest;
use crate::diagnostics::stats::{SessionStats, StatsSnapshot};
use crate::sampler::FrameSampler;
use crate::session::error::SessionError;
use crate::session::render::{
    ConnectionIndicator, ControlAffordances, DisplayState, DisplaySurface, RenderSink,
};
use crate::session::state::Session;
use crate::settings::ClientConfig;
use crate::transport::{
    ConnectionState, ResultPayload, SendOutcome, SessionTransport, TransportEvent,
};

/// Something the event loop has to hand back to the controller.
#[derive(Debug)]
pub enum Wakeup {
    Tick,
    Transport(TransportEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Sent { bytes: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Idle,
    NotOpen,
    NoFrame,
    SendFailed,
}

/// Owns the session state machine and coordinates capture, sampling,
/// transport and rendering. Runs on a single task; every handler completes
/// before the next wakeup is taken.
pub struct SessionController {
    session: Session,
    exercises: Vec<String>,
    period: Duration,
    request: CaptureRequest,
    camera: Box<dyn CaptureSource>,
    stream: Option<Box<dyn CaptureHandle>>,
    sampler: FrameSampler,
    sampling: Option<Interval>,
    transport: SessionTransport,
    render: RenderSink,
    stats: SessionStats,
}

impl SessionController {
    /// Build an idle controller and present the initial view.
    pub fn new(
        config: &ClientConfig,
        camera: Box<dyn CaptureSource>,
        transport: SessionTransport,
        surface: Box<dyn DisplaySurface>,
    ) -> Self {
        let mut render = RenderSink::new(surface);
        render.set_connection(transport.state().into());
        render.present();

        Self {
            session: Session::new(config.default_exercise.as_str()),
            exercises: config.exercises.clone(),
            period: config.sampling.interval(),
            request: config.capture.request(),
            camera,
            stream: None,
            sampler: FrameSampler::new(config.sampling.encoding, config.sampling.jpeg_quality),
            sampling: None,
            transport,
            render,
            stats: SessionStats::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn display(&self) -> &DisplayState {
        self.render.view()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.transport.malformed_count())
    }

    /// Acquire the camera and begin sampling.
    ///
    /// On a capture failure the user is alerted and nothing else changes.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.session.is_exercising() {
            return Err(SessionError::AlreadyExercising);
        }

        info!(
            "starting {} with {}",
            self.session.exercise_kind(),
            self.camera.name()
        );
        let stream = match self.camera.acquire(&self.request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("camera acquisition failed: {e}");
                self.render.alert(&format!("Could not access the camera: {e}"));
                return Err(e.into());
            }
        };
        info!("capturing at {}", stream.resolution());

        self.stream = Some(stream);
        self.session.begin();
        self.stats.reset();
        self.sampling = Some(sampling_interval(self.period));

        self.render.set_controls(ControlAffordances::exercising());
        self.render.reset_stats();
        self.render.present();
        Ok(())
    }

    /// End the session. Returns `false` when there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        if !self.teardown() {
            return false;
        }
        self.render.present();
        true
    }

    /// Change the exercise kind while idle. Resets the displayed counters.
    pub fn select_exercise(&mut self, exercise_kind: &str) -> Result<(), SessionError> {
        if self.session.is_exercising() {
            return Err(SessionError::SelectorLocked);
        }
        if !self.exercises.iter().any(|known| known == exercise_kind) {
            return Err(SessionError::UnknownExercise(exercise_kind.to_string()));
        }

        debug!("exercise selected: {exercise_kind}");
        self.session.select(exercise_kind);
        self.render.reset_stats();
        self.render.present();
        Ok(())
    }

    /// One sampling tick: capture, encode and send if the session is
    /// exercising and the channel is open.
    pub fn on_tick(&mut self) -> TickOutcome {
        let Some(stream) = self.stream.as_deref() else {
            return TickOutcome::Skipped(SkipReason::Idle);
        };
        if !self.session.is_exercising() {
            return TickOutcome::Skipped(SkipReason::Idle);
        }
        if !self.transport.is_open() {
            self.stats.record_skip();
            return TickOutcome::Skipped(SkipReason::NotOpen);
        }

        let sample = match self.sampler.sample(stream, self.session.exercise_kind()) {
            Ok(sample) => sample,
            Err(e) => {
                debug!("tick skipped: {e}");
                self.stats.record_skip();
                return TickOutcome::Skipped(SkipReason::NoFrame);
            }
        };

        match self.transport.send(sample.payload) {
            SendOutcome::Sent { bytes } => {
                trace!("sent {} frame ({bytes} bytes)", sample.resolution);
                self.stats.record_frame(bytes);
                TickOutcome::Sent { bytes }
            }
            SendOutcome::NotOpen => {
                self.stats.record_skip();
                TickOutcome::Skipped(SkipReason::NotOpen)
            }
            SendOutcome::Failed => {
                self.stats.record_skip();
                TickOutcome::Skipped(SkipReason::SendFailed)
            }
        }
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::StateChanged(ConnectionState::Connecting) => {}
            TransportEvent::StateChanged(ConnectionState::Open) => {
                self.render.set_connection(ConnectionIndicator::Connected);
                self.render.present();
            }
            TransportEvent::StateChanged(ConnectionState::Closed) => {
                if self.teardown() {
                    info!("session stopped because the connection closed");
                }
                self.render.set_connection(ConnectionIndicator::Disconnected);
                self.render.present();
            }
            TransportEvent::Result(result) => self.on_result(&result),
        }
    }

    /// Wait for the next sampling tick or transport event.
    ///
    /// Cancel-safe, so it can sit in a `select!` next to other sources.
    pub async fn next_wakeup(&mut self) -> Wakeup {
        let sampling = &mut self.sampling;
        let transport = &mut self.transport;
        tokio::select! {
            () = next_tick(sampling) => Wakeup::Tick,
            event = transport.next_event() => Wakeup::Transport(event),
        }
    }

    pub fn handle_wakeup(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::Tick => {
                self.on_tick();
            }
            Wakeup::Transport(event) => self.handle_transport_event(event),
        }
    }

    /// Stop any running session and return the final counters.
    pub fn shutdown(mut self) -> StatsSnapshot {
        self.stop();
        self.stats()
    }

    fn on_result(&mut self, result: &ResultPayload) {
        if self.render.render(&self.session, result) {
            self.session.record_result(result.rep_count, &result.feedback);
            self.stats.record_render();
        } else {
            debug!("dropping result that arrived after stop");
            self.stats.record_stale();
        }
    }

    /// Release the device, cancel sampling and return the view to idle
    /// without presenting. Returns `false` if already idle.
    fn teardown(&mut self) -> bool {
        if !self.session.is_exercising() {
            return false;
        }

        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.sampling = None;
        self.session.end();

        self.render.set_controls(ControlAffordances::idle());
        self.render.show_placeholder();

        let stats = self.stats();
        info!(
            frames_sent = stats.frames_sent,
            ticks_skipped = stats.ticks_skipped,
            results_rendered = stats.results_rendered,
            send_fps = stats.send_fps,
            "session stopped"
        );
        true
    }
}

/// First tick fires one period after start.
fn sampling_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(sampling: &mut Option<Interval>) {
    match sampling {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::camera::dummy::DummyCamera;
    use crate::camera::error::CameraError;
    use crate::camera::types::Resolution;
    use crate::sampler::compress::parse_data_url;
    use crate::session::render::ImageSurface;
    use crate::session::state::WAITING_FEEDBACK;
    use crate::session::testing::RecordingSurface;
    use crate::transport::link::{self, WireEnd};

    struct Harness {
        controller: SessionController,
        wire: WireEnd,
        surface: RecordingSurface,
    }

    fn harness_with(camera: DummyCamera) -> Harness {
        let (link, wire) = link::pair();
        let surface = RecordingSurface::default();
        let controller = SessionController::new(
            &ClientConfig::default(),
            Box::new(camera),
            SessionTransport::over(link),
            Box::new(surface.clone()),
        );
        Harness {
            controller,
            wire,
            surface,
        }
    }

    fn harness() -> Harness {
        harness_with(DummyCamera::new())
    }

    fn result_json(rep_count: u32, feedback: &str) -> String {
        serde_json::json!({
            "type": "processed_data",
            "image": "data:image/jpeg;base64,AA==",
            "rep_count": rep_count,
            "feedback": feedback,
        })
        .to_string()
    }

    /// Handle transport events until none arrive for a short while.
    async fn drain_transport(controller: &mut SessionController) {
        while let Ok(event) =
            tokio::time::timeout(Duration::from_millis(20), controller.transport.next_event()).await
        {
            controller.handle_transport_event(event);
        }
    }

    async fn open(h: &mut Harness) {
        h.wire.open();
        drain_transport(&mut h.controller).await;
        assert_eq!(h.controller.connection_state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn initial_view_is_idle_and_disconnected() {
        let h = harness();
        let view = h.surface.last_view().expect("initial view presented");
        assert_eq!(view, DisplayState::default());
        assert_eq!(h.controller.session().exercise_kind(), "bicep_curl");
        assert!(!h.controller.is_sampling());
    }

    #[tokio::test]
    async fn open_connection_turns_the_indicator_on() {
        let mut h = harness();
        open(&mut h).await;
        assert_eq!(
            h.controller.display().connection,
            ConnectionIndicator::Connected
        );
    }

    #[tokio::test]
    async fn start_enters_exercising_with_reset_counters() {
        let mut h = harness();
        open(&mut h).await;

        h.controller.start().await.expect("start");

        let session = h.controller.session();
        assert!(session.is_exercising());
        assert_eq!(session.rep_count(), 0);
        assert_eq!(session.feedback(), WAITING_FEEDBACK);
        assert!(h.controller.is_sampling());
        assert!(h.controller.is_capturing());
        assert_eq!(h.controller.display().controls, ControlAffordances::exercising());
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let mut h = harness();
        h.controller.start().await.expect("start");
        assert_eq!(
            h.controller.start().await,
            Err(SessionError::AlreadyExercising)
        );
    }

    #[tokio::test]
    async fn denied_camera_alerts_and_changes_nothing() {
        let mut h = harness_with(DummyCamera::denied());
        open(&mut h).await;
        let before = h.controller.display().clone();
        let presents = h.surface.present_count();

        let err = h.controller.start().await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Capture(CameraError::PermissionDenied(_))
        ));
        assert_eq!(h.surface.alerts().len(), 1);
        assert!(!h.controller.session().is_exercising());
        assert!(!h.controller.is_sampling());
        assert_eq!(h.controller.display(), &before);
        assert_eq!(h.surface.present_count(), presents);
    }

    #[tokio::test]
    async fn tick_sends_a_frame_at_the_granted_resolution() {
        let mut h = harness_with(
            DummyCamera::new().with_native_resolution(Resolution::new(1280, 720)),
        );
        open(&mut h).await;
        h.controller.start().await.expect("start");

        let outcome = h.controller.on_tick();
        assert!(matches!(outcome, TickOutcome::Sent { .. }));

        let text = h.wire.try_next_outgoing().expect("a frame on the wire");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["type"], "frame");
        assert_eq!(value["exercise_type"], "bicep_curl");

        let url = value["image"].as_str().expect("image string");
        let data = parse_data_url(url).expect("data url");
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&data.bytes).expect("decodable jpeg");
        assert_eq!((decoded.width(), decoded.height()), (1280, 720));
    }

    #[tokio::test]
    async fn tick_while_not_open_sends_nothing() {
        let mut h = harness();
        h.controller.start().await.expect("start");

        assert_eq!(
            h.controller.on_tick(),
            TickOutcome::Skipped(SkipReason::NotOpen)
        );
        assert!(h.wire.try_next_outgoing().is_none());
        assert_eq!(h.controller.stats().ticks_skipped, 1);
    }

    #[tokio::test]
    async fn tick_while_idle_sends_nothing() {
        let mut h = harness();
        open(&mut h).await;

        assert_eq!(h.controller.on_tick(), TickOutcome::Skipped(SkipReason::Idle));
        assert!(h.wire.try_next_outgoing().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_drives_sampling_ticks() {
        let mut h = harness();
        open(&mut h).await;
        h.controller.start().await.expect("start");

        for _ in 0..3 {
            let wakeup = h.controller.next_wakeup().await;
            assert!(matches!(wakeup, Wakeup::Tick));
            h.controller.handle_wakeup(wakeup);
        }

        let mut frames = 0;
        while h.wire.try_next_outgoing().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 3);
    }

    #[tokio::test]
    async fn result_is_displayed_verbatim() {
        let mut h = harness();
        open(&mut h).await;
        h.controller.start().await.expect("start");

        h.wire.deliver(result_json(7, "Good form!"));
        drain_transport(&mut h.controller).await;

        let view = h.controller.display();
        assert_eq!(view.rep_count, 7);
        assert_eq!(view.feedback, "Good form!");
        assert_eq!(
            view.image,
            ImageSurface::Frame("data:image/jpeg;base64,AA==".to_string())
        );
        assert_eq!(h.controller.session().rep_count(), 7);
    }

    #[tokio::test]
    async fn latest_result_wins() {
        let mut h = harness();
        open(&mut h).await;
        h.controller.start().await.expect("start");

        h.wire.deliver(result_json(3, "Keep going"));
        h.wire.deliver(result_json(5, "Almost there"));
        drain_transport(&mut h.controller).await;

        assert_eq!(h.controller.display().rep_count, 5);
        assert_eq!(h.controller.display().feedback, "Almost there");
    }

    #[tokio::test]
    async fn stop_releases_the_camera_and_restores_idle() {
        let camera = DummyCamera::new();
        let releases = camera.release_counter();
        let mut h = harness_with(camera);
        open(&mut h).await;
        h.controller.start().await.expect("start");

        assert!(h.controller.stop());

        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!h.controller.session().is_exercising());
        assert!(!h.controller.is_sampling());
        assert!(!h.controller.is_capturing());
        let view = h.controller.display();
        assert_eq!(view.controls, ControlAffordances::idle());
        assert_eq!(view.image, ImageSurface::Placeholder);
        assert_eq!(view.connection, ConnectionIndicator::Connected);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_idle_stop_releases_nothing() {
        let camera = DummyCamera::new();
        let releases = camera.release_counter();
        let mut h = harness_with(camera);

        assert!(!h.controller.stop());
        assert_eq!(releases.load(Ordering::SeqCst), 0);

        h.controller.start().await.expect("start");
        assert!(h.controller.stop());
        let presents = h.surface.present_count();
        assert!(!h.controller.stop());

        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(h.surface.present_count(), presents);
    }

    #[tokio::test]
    async fn results_after_stop_are_dropped() {
        let mut h = harness();
        open(&mut h).await;
        h.controller.start().await.expect("start");
        h.wire.deliver(result_json(2, "Nice"));
        drain_transport(&mut h.controller).await;
        h.controller.stop();

        h.wire.deliver(result_json(9, "Late"));
        drain_transport(&mut h.controller).await;

        assert_eq!(h.controller.display().rep_count, 2);
        assert_eq!(h.controller.display().image, ImageSurface::Placeholder);
        assert_eq!(h.controller.stats().stale_results, 1);
    }

    #[tokio::test]
    async fn closed_connection_forces_a_stop() {
        let camera = DummyCamera::new();
        let releases = camera.release_counter();
        let mut h = harness_with(camera);
        open(&mut h).await;
        h.controller.start().await.expect("start");
        let presents = h.surface.present_count();

        h.wire.close(Some("server going away".to_string()));
        drain_transport(&mut h.controller).await;

        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!h.controller.session().is_exercising());
        assert!(!h.controller.is_sampling());
        assert_eq!(h.surface.present_count(), presents + 1);
        let view = h.controller.display();
        assert_eq!(view.controls, ControlAffordances::idle());
        assert_eq!(view.image, ImageSurface::Placeholder);
        assert_eq!(view.connection, ConnectionIndicator::Disconnected);
    }

    #[tokio::test]
    async fn forced_stop_matches_explicit_stop_except_indicator() {
        let mut explicit = harness();
        open(&mut explicit).await;
        explicit.controller.start().await.expect("start");
        explicit.controller.stop();

        let mut forced = harness();
        open(&mut forced).await;
        forced.controller.start().await.expect("start");
        forced.wire.close(None);
        drain_transport(&mut forced.controller).await;

        let mut expected = explicit.controller.display().clone();
        expected.connection = ConnectionIndicator::Disconnected;
        assert_eq!(forced.controller.display(), &expected);
        assert_eq!(
            forced.controller.session(),
            explicit.controller.session()
        );
    }

    #[tokio::test]
    async fn close_while_idle_only_updates_the_indicator() {
        let mut h = harness();
        open(&mut h).await;
        let presents = h.surface.present_count();

        h.wire.close(None);
        drain_transport(&mut h.controller).await;

        assert_eq!(h.surface.present_count(), presents + 1);
        assert_eq!(
            h.controller.display().connection,
            ConnectionIndicator::Disconnected
        );
    }

    #[tokio::test]
    async fn start_after_close_never_sends() {
        let mut h = harness();
        open(&mut h).await;
        h.wire.close(None);
        drain_transport(&mut h.controller).await;

        h.controller.start().await.expect("start");
        assert_eq!(
            h.controller.on_tick(),
            TickOutcome::Skipped(SkipReason::NotOpen)
        );
        assert!(h.wire.try_next_outgoing().is_none());
    }

    #[tokio::test]
    async fn selecting_an_exercise_resets_counters() {
        let mut h = harness();
        open(&mut h).await;
        h.controller.start().await.expect("start");
        h.wire.deliver(result_json(4, "Solid"));
        drain_transport(&mut h.controller).await;
        h.controller.stop();

        h.controller.select_exercise("squat").expect("select");

        assert_eq!(h.controller.session().exercise_kind(), "squat");
        assert_eq!(h.controller.display().rep_count, 0);
        assert_eq!(h.controller.display().feedback, WAITING_FEEDBACK);
    }

    #[tokio::test]
    async fn selector_is_locked_while_exercising() {
        let mut h = harness();
        h.controller.start().await.expect("start");
        assert_eq!(
            h.controller.select_exercise("squat"),
            Err(SessionError::SelectorLocked)
        );
        assert_eq!(h.controller.session().exercise_kind(), "bicep_curl");
    }

    #[tokio::test]
    async fn unknown_exercise_is_rejected() {
        let mut h = harness();
        assert_eq!(
            h.controller.select_exercise("jumping_jack"),
            Err(SessionError::UnknownExercise("jumping_jack".to_string()))
        );
    }

    #[tokio::test]
    async fn frames_carry_the_selected_exercise() {
        let mut h = harness();
        open(&mut h).await;
        h.controller.select_exercise("push_up").expect("select");
        h.controller.start().await.expect("start");

        h.controller.on_tick();

        let text = h.wire.try_next_outgoing().expect("frame");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["exercise_type"], "push_up");
    }

    #[tokio::test]
    async fn shutdown_stops_and_reports() {
        let camera = DummyCamera::new();
        let releases = camera.release_counter();
        let mut h = harness_with(camera);
        open(&mut h).await;
        h.controller.start().await.expect("start");
        h.controller.on_tick();

        let stats = h.controller.shutdown();

        assert_eq!(stats.frames_sent, 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
