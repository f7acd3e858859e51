use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::error::AuscultError;
use crate::models::recording::{CaptureOutcome, Recording};
use crate::models::state::CaptureState;
use crate::storage::wav_sink::WavFileSink;
use crate::traits::audio_input::{AudioInput, InputStream};

/// How long the writer loop sleeps when the input has no data ready.
/// Also bounds the latency between `stop` and the loop observing it.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Microphone-to-file recorder.
///
/// `start` opens the device stream and the file sink on the calling
/// thread, then hands both to a dedicated writer thread that drains the
/// stream into the file until stopped. At most one session is active at
/// a time; the returned `CaptureSession` is the handle that stops it.
pub struct Recorder<I: AudioInput> {
    input: I,
    config: CaptureConfig,
    recordings_dir: PathBuf,
    busy: Arc<AtomicBool>,
    active_target: Arc<Mutex<Option<PathBuf>>>,
}

impl<I: AudioInput> Recorder<I> {
    pub fn new(input: I, config: CaptureConfig, recordings_dir: PathBuf) -> Self {
        Self {
            input,
            config,
            recordings_dir,
            busy: Arc::new(AtomicBool::new(false)),
            active_target: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        if self.busy.load(Ordering::SeqCst) {
            CaptureState::Capturing
        } else {
            CaptureState::Idle
        }
    }

    /// Path of the file the active session is writing, if any.
    pub fn active_target(&self) -> Option<PathBuf> {
        self.active_target.lock().clone()
    }

    /// Start capturing into `<recordings_dir>/<name>.wav`.
    ///
    /// Fails with `InvalidState` while another session is active, with
    /// `DeviceUnavailable` when the input stream cannot be opened, and
    /// with `Io` when the target file cannot be created. On success the
    /// placeholder header is already on disk before the writer loop runs
    /// its first iteration.
    pub fn start(&self, name: &str) -> Result<CaptureSession, AuscultError> {
        self.config.validate().map_err(AuscultError::InvalidState)?;

        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(AuscultError::InvalidState(
                "a capture session is already active".into(),
            ));
        }

        let result = self.open_session(name);
        if result.is_err() {
            *self.active_target.lock() = None;
            self.busy.store(false, Ordering::SeqCst);
        }
        result
    }

    fn open_session(&self, name: &str) -> Result<CaptureSession, AuscultError> {
        let path = self.recordings_dir.join(format!("{}.wav", name));

        // Registered before the stream and sink open, so store and
        // playback guards already cover the target while the session is
        // being set up. `start` clears it again on failure.
        *self.active_target.lock() = Some(path.clone());

        let stream = self.input.open(&self.config)?;
        let sink = WavFileSink::open(path.clone(), self.config)?;

        let recording = Recording {
            name: name.to_string(),
            path,
        };
        let active = Arc::new(AtomicBool::new(true));
        let config = self.config;

        let writer = {
            let active = Arc::clone(&active);
            let recording = recording.clone();
            thread::Builder::new()
                .name("capture-writer".into())
                .spawn(move || run_writer(stream, sink, active, config, recording))
                .map_err(|e| AuscultError::Io(format!("failed to spawn writer thread: {}", e)))?
        };

        log::info!(
            "capture started: {:?} ({} Hz, {} ch, {}-bit)",
            recording.path,
            config.sample_rate,
            config.channels,
            config.bits_per_sample
        );

        Ok(CaptureSession {
            recording,
            active,
            busy: Arc::clone(&self.busy),
            active_target: Arc::clone(&self.active_target),
            writer: Some(writer),
            finished: None,
        })
    }
}

/// Writer loop: drain the input stream into the sink until the active
/// flag clears, then finalize the file.
fn run_writer<S: InputStream>(
    mut stream: S,
    mut sink: WavFileSink,
    active: Arc<AtomicBool>,
    config: CaptureConfig,
    recording: Recording,
) -> Result<CaptureOutcome, AuscultError> {
    let mut buf = vec![0u8; config.chunk_bytes()];
    let mut failure: Option<AuscultError> = None;

    while active.load(Ordering::SeqCst) {
        match stream.read(&mut buf) {
            // No data ready yet
            Ok(0) => thread::sleep(POLL_INTERVAL),
            Ok(n) => {
                if let Err(e) = sink.write(&buf[..n]) {
                    failure = Some(e);
                    break;
                }
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    // Release the device before touching the header.
    drop(stream);

    let payload_bytes = sink.payload_bytes();
    let finalize_result = sink.finalize();

    match failure {
        Some(e) => {
            // Best-effort finalize above leaves a partial-but-valid file.
            if let Err(fin) = finalize_result {
                log::error!("header finalize failed after capture error: {}", fin);
            }
            log::error!("capture aborted: {}", e);
            Err(e)
        }
        None => {
            let checksum = finalize_result?;
            let duration_secs = config.duration_secs(payload_bytes);
            log::info!(
                "capture finished: {:?} ({} payload bytes, {:.2}s)",
                recording.path,
                payload_bytes,
                duration_secs
            );
            Ok(CaptureOutcome {
                recording,
                bytes_written: payload_bytes,
                duration_secs,
                checksum,
            })
        }
    }
}

/// Handle to an in-progress capture, obtained from `Recorder::start`.
///
/// Dropping an unstopped session stops it, logging any failure instead
/// of returning it.
#[derive(Debug)]
pub struct CaptureSession {
    recording: Recording,
    active: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    active_target: Arc<Mutex<Option<PathBuf>>>,
    writer: Option<thread::JoinHandle<Result<CaptureOutcome, AuscultError>>>,
    finished: Option<Result<CaptureOutcome, AuscultError>>,
}

impl CaptureSession {
    /// The recording this session is writing.
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Whether the writer thread is still running (i.e. `stop` has not
    /// been called yet).
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Signal the writer loop to stop and wait for the file to be
    /// finalized. Returns the completed recording, or the first failure
    /// the writer hit; the file is still finalized best-effort, so a
    /// partial recording remains on disk either way.
    ///
    /// Idempotent: repeat calls return the first call's result without
    /// touching the file again.
    pub fn stop(&mut self) -> Result<CaptureOutcome, AuscultError> {
        if let Some(handle) = self.writer.take() {
            self.active.store(false, Ordering::SeqCst);
            let result = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(AuscultError::Io("capture writer thread panicked".into())),
            };
            *self.active_target.lock() = None;
            self.busy.store(false, Ordering::SeqCst);
            self.finished = Some(result);
        }

        match self.finished.clone() {
            Some(result) => result,
            None => Err(AuscultError::InvalidState(
                "capture session never started".into(),
            )),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.stop() {
                log::warn!("capture session dropped while active: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Instant;
    use tempfile::TempDir;

    /// Input fake replaying a fixed script of chunks, then `Ok(0)`,
    /// or an error when built with `failing_after`.
    struct ScriptedInput {
        chunks: Arc<Mutex<VecDeque<Vec<u8>>>>,
        fail_at_end: bool,
        steps_left: Arc<AtomicUsize>,
    }

    impl ScriptedInput {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self::build(chunks, false)
        }

        fn failing_after(chunks: Vec<Vec<u8>>) -> Self {
            Self::build(chunks, true)
        }

        // steps_left counts chunks plus the optional final error; tests
        // clone the Arc before the input moves into the recorder.
        fn build(chunks: Vec<Vec<u8>>, fail_at_end: bool) -> Self {
            let steps = chunks.len() + usize::from(fail_at_end);
            Self {
                chunks: Arc::new(Mutex::new(chunks.into())),
                fail_at_end,
                steps_left: Arc::new(AtomicUsize::new(steps)),
            }
        }
    }

    impl AudioInput for ScriptedInput {
        type Stream = ScriptedStream;

        fn open(&self, _config: &CaptureConfig) -> Result<Self::Stream, AuscultError> {
            Ok(ScriptedStream {
                chunks: Arc::clone(&self.chunks),
                fail_at_end: self.fail_at_end,
                steps_left: Arc::clone(&self.steps_left),
            })
        }
    }

    struct ScriptedStream {
        chunks: Arc<Mutex<VecDeque<Vec<u8>>>>,
        fail_at_end: bool,
        steps_left: Arc<AtomicUsize>,
    }

    impl InputStream for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, AuscultError> {
            let next = self.chunks.lock().pop_front();
            match next {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    self.steps_left.fetch_sub(1, Ordering::SeqCst);
                    Ok(chunk.len())
                }
                None if self.fail_at_end => {
                    self.fail_at_end = false;
                    self.steps_left.fetch_sub(1, Ordering::SeqCst);
                    Err(AuscultError::Io("stream died".into()))
                }
                None => Ok(0),
            }
        }
    }

    /// Input whose device can never be opened.
    struct UnavailableInput;

    impl AudioInput for UnavailableInput {
        type Stream = ScriptedStream;

        fn open(&self, _config: &CaptureConfig) -> Result<Self::Stream, AuscultError> {
            Err(AuscultError::DeviceUnavailable("no microphone".into()))
        }
    }

    /// Input that parks inside `open` until released, holding the
    /// session in its setup window.
    struct GatedInput {
        entered: mpsc::Sender<()>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl AudioInput for GatedInput {
        type Stream = ScriptedStream;

        fn open(&self, _config: &CaptureConfig) -> Result<Self::Stream, AuscultError> {
            self.entered.send(()).unwrap();
            self.release.lock().recv().unwrap();
            Ok(ScriptedStream {
                chunks: Arc::new(Mutex::new(VecDeque::new())),
                fail_at_end: false,
                steps_left: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    fn wait_until(what: &str, condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn capture_writes_all_scripted_data() {
        let dir = TempDir::new().unwrap();
        let input = ScriptedInput::new(vec![vec![1; 100], vec![2; 100], vec![3; 100]]);
        let steps = Arc::clone(&input.steps_left);
        let recorder = Recorder::new(input, CaptureConfig::default(), dir.path().to_path_buf());

        let mut session = recorder.start("Recording_1").unwrap();
        assert!(recorder.state().is_capturing());
        assert_eq!(
            recorder.active_target().unwrap(),
            dir.path().join("Recording_1.wav")
        );

        wait_until("scripted chunks to drain", || {
            steps.load(Ordering::SeqCst) == 0
        });
        let outcome = session.stop().unwrap();

        assert_eq!(outcome.bytes_written, 300);
        assert_eq!(outcome.recording.name, "Recording_1");
        assert_eq!(outcome.checksum.len(), 64);
        assert_relative_eq!(outcome.duration_secs, 300.0 / 88200.0, epsilon = 1e-9);

        let file_data = fs::read(&outcome.recording.path).unwrap();
        assert_eq!(file_data.len(), 44 + 300);
        let data_len = u32::from_le_bytes([file_data[40], file_data[41], file_data[42], file_data[43]]);
        assert_eq!(data_len, 300);

        assert!(recorder.state().is_idle());
        assert!(recorder.active_target().is_none());
    }

    #[test]
    fn zero_sample_session_yields_a_valid_empty_wav() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(
            ScriptedInput::new(vec![]),
            CaptureConfig::default(),
            dir.path().to_path_buf(),
        );

        let mut session = recorder.start("Recording_empty").unwrap();
        let outcome = session.stop().unwrap();

        assert_eq!(outcome.bytes_written, 0);
        assert_eq!(outcome.duration_secs, 0.0);

        let path = dir.path().join("Recording_empty.wav");
        assert_eq!(fs::metadata(&path).unwrap().len(), 44);
        assert_eq!(hound::WavReader::open(&path).unwrap().len(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let input = ScriptedInput::new(vec![vec![9; 50]]);
        let steps = Arc::clone(&input.steps_left);
        let recorder = Recorder::new(input, CaptureConfig::default(), dir.path().to_path_buf());

        let mut session = recorder.start("Recording_2").unwrap();
        wait_until("scripted chunks to drain", || {
            steps.load(Ordering::SeqCst) == 0
        });

        let first = session.stop().unwrap();
        let file_after_first = fs::read(&first.recording.path).unwrap();

        let second = session.stop().unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&first.recording.path).unwrap(), file_after_first);
    }

    #[test]
    fn start_while_active_is_rejected() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(
            ScriptedInput::new(vec![]),
            CaptureConfig::default(),
            dir.path().to_path_buf(),
        );

        let mut session = recorder.start("Recording_a").unwrap();

        let err = recorder.start("Recording_b").unwrap_err();
        assert!(matches!(err, AuscultError::InvalidState(_)));

        session.stop().unwrap();
        let mut second = recorder.start("Recording_b").unwrap();
        second.stop().unwrap();
    }

    #[test]
    fn stream_failure_aborts_and_still_finalizes() {
        let dir = TempDir::new().unwrap();
        let input = ScriptedInput::failing_after(vec![vec![5; 100]]);
        let steps = Arc::clone(&input.steps_left);
        let recorder = Recorder::new(input, CaptureConfig::default(), dir.path().to_path_buf());

        let mut session = recorder.start("Recording_fail").unwrap();
        wait_until("the scripted failure", || steps.load(Ordering::SeqCst) == 0);

        let err = session.stop().unwrap_err();
        assert_eq!(err, AuscultError::Io("stream died".into()));

        // The partial file is finalized and valid
        let path = dir.path().join("Recording_fail.wav");
        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44 + 100);
        let data_len = u32::from_le_bytes([file_data[40], file_data[41], file_data[42], file_data[43]]);
        assert_eq!(data_len, 100);

        assert!(recorder.state().is_idle());
    }

    #[test]
    fn cancellation_is_stop_then_delete() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(
            ScriptedInput::new(vec![vec![1; 20]]),
            CaptureConfig::default(),
            dir.path().to_path_buf(),
        );
        let store = crate::storage::store::RecordingStore::new(dir.path().to_path_buf());

        let mut session = recorder.start("Recording_cancel").unwrap();
        let outcome = session.stop().unwrap();

        store.delete(&outcome.recording).unwrap();
        assert!(!outcome.recording.path.exists());
    }

    #[test]
    fn dropping_an_unstopped_session_stops_it() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(
            ScriptedInput::new(vec![]),
            CaptureConfig::default(),
            dir.path().to_path_buf(),
        );

        let session = recorder.start("Recording_dropped").unwrap();
        drop(session);

        assert!(recorder.state().is_idle());
        assert_eq!(
            fs::metadata(dir.path().join("Recording_dropped.wav")).unwrap().len(),
            44
        );

        // The recorder is free for the next session
        let mut next = recorder.start("Recording_next").unwrap();
        next.stop().unwrap();
    }

    #[test]
    fn open_failure_leaves_the_recorder_idle() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new(
            UnavailableInput,
            CaptureConfig::default(),
            dir.path().to_path_buf(),
        );

        let err = recorder.start("Recording_x").unwrap_err();
        assert!(matches!(err, AuscultError::DeviceUnavailable(_)));
        assert!(recorder.state().is_idle());
        assert!(recorder.active_target().is_none());

        // Not stuck busy: the same error again, not InvalidState
        let err = recorder.start("Recording_x").unwrap_err();
        assert!(matches!(err, AuscultError::DeviceUnavailable(_)));
    }

    #[test]
    fn target_is_registered_before_the_device_opens() {
        let dir = TempDir::new().unwrap();
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let recorder = Recorder::new(
            GatedInput {
                entered: entered_tx,
                release: Mutex::new(release_rx),
            },
            CaptureConfig::default(),
            dir.path().to_path_buf(),
        );

        thread::scope(|s| {
            let starter = s.spawn(|| recorder.start("Recording_gated"));

            // The device open is still in progress, but the target is
            // already visible to delete/rename/play guards.
            entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(
                recorder.active_target().unwrap(),
                dir.path().join("Recording_gated.wav")
            );

            release_tx.send(()).unwrap();
            let mut session = starter.join().unwrap().unwrap();
            session.stop().unwrap();
        });

        assert!(recorder.active_target().is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_opening_anything() {
        let dir = TempDir::new().unwrap();
        let config = CaptureConfig {
            bits_per_sample: 12,
            ..CaptureConfig::default()
        };
        let recorder = Recorder::new(ScriptedInput::new(vec![]), config, dir.path().to_path_buf());

        let err = recorder.start("Recording_bad").unwrap_err();
        assert!(matches!(err, AuscultError::InvalidState(_)));
        assert!(!dir.path().join("Recording_bad.wav").exists());
    }
}
