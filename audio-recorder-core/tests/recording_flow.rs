use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use audio_recorder_core::{
    AudioRecorder, EventQueue, InterruptionEvent, QueueHandle, QueuedSource, RecorderError,
    RecorderEvent, RecorderOptions, SessionStatus, WavHeader,
};

fn recorder() -> (AudioRecorder<QueuedSource>, QueueHandle) {
    let (source, handle) = QueuedSource::new(64 * 1024);
    let source = source.with_poll_interval(Duration::from_millis(5));
    (AudioRecorder::new(source, RecorderOptions::default()).unwrap(), handle)
}

fn wait_for_duration(recorder: &AudioRecorder<QueuedSource>, duration_ms: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while recorder.current().duration_ms < duration_ms {
        assert!(Instant::now() < deadline, "timed out waiting for {} ms", duration_ms);
        thread::sleep(Duration::from_millis(2));
    }
}

fn push_blocks(handle: &QueueHandle, count: usize) {
    for i in 0..count {
        let samples: Vec<i16> = (0..512).map(|n| (n as i16) - 256 + i as i16).collect();
        handle.push(&samples);
    }
}

#[test]
fn init_start_pause_resume_stop() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a.wav");
    let out_str = out.display().to_string();
    let (mut recorder, handle) = recorder();

    let initial = recorder.init(16000, &out_str, ".wav").unwrap();
    assert_eq!(initial.status, SessionStatus::Initialized);

    recorder.start().unwrap();
    push_blocks(&handle, 3);
    wait_for_duration(&recorder, 96);
    recorder.pause().unwrap();

    recorder.resume().unwrap();
    push_blocks(&handle, 2);
    wait_for_duration(&recorder, 160);

    let snapshot = recorder.stop().unwrap();
    assert_eq!(snapshot.duration_ms, 160);
    assert_eq!(snapshot.path, out_str);
    assert_eq!(snapshot.status, SessionStatus::Stopped);

    let bytes = fs::read(&out).unwrap();
    let header = WavHeader::parse(&bytes).unwrap();
    assert_eq!(header.data_size, 5120);
    assert_eq!(header.chunk_size, 5120 + 36);
    assert_eq!(header.block_align, 1);
    assert!(!dir.path().join("a.wav.temp").exists());

    // Stopped is terminal until the next init.
    assert!(matches!(recorder.start(), Err(RecorderError::InvalidState(_))));
    assert_eq!(recorder.stop().unwrap(), snapshot);
}

#[test]
fn combine_finished_segments() {
    let dir = tempfile::tempdir().unwrap();
    let (mut recorder, handle) = recorder();
    let mut finished = Vec::new();

    for (name, blocks) in [("one.wav", 2usize), ("two.wav", 1)] {
        let path = dir.path().join(name).display().to_string();
        recorder.init(16000, &path, ".wav").unwrap();
        recorder.start().unwrap();
        push_blocks(&handle, blocks);
        wait_for_duration(&recorder, 32 * blocks as u64);
        recorder.stop().unwrap();
        finished.push(path);
    }

    let joined = dir.path().join("joined.wav").display().to_string();
    assert_eq!(recorder.combine_files(&finished[..], &joined).unwrap(), joined);

    let one = fs::read(&finished[0]).unwrap();
    let two = fs::read(&finished[1]).unwrap();
    let bytes = fs::read(&joined).unwrap();
    let header = WavHeader::parse(&bytes).unwrap();
    assert_eq!(header.data_size, 3072);

    let mut expected = one[44..].to_vec();
    expected.extend_from_slice(&two[44..]);
    assert_eq!(&bytes[44..], &expected[..]);
}

#[test]
fn combine_raw_segments_outside_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let seg_a = dir.path().join("a.pcm");
    let seg_b = dir.path().join("b.pcm");
    fs::write(&seg_a, vec![0x11u8; 600]).unwrap();
    fs::write(&seg_b, vec![0x22u8; 400]).unwrap();

    let (recorder, _handle) = recorder();
    let out = dir.path().join("out.wav").display().to_string();
    recorder.combine_files(&[&seg_a, &seg_b], &out).unwrap();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(WavHeader::parse(&bytes).unwrap().data_size, 1000);
    assert!(bytes[44..644].iter().all(|&b| b == 0x11));
    assert!(bytes[644..].iter().all(|&b| b == 0x22));
}

#[test]
fn interruptions_are_informational() {
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(EventQueue::new());
    let (mut recorder, _handle) = recorder();
    recorder.set_delegate(events.clone());

    recorder
        .init(16000, &dir.path().join("i.wav").display().to_string(), ".wav")
        .unwrap();
    recorder.start().unwrap();
    recorder.handle_interruption(InterruptionEvent::InterruptionBegan);
    recorder.handle_interruption(InterruptionEvent::InterruptionEndedWithoutResume);
    assert_eq!(recorder.current().status, SessionStatus::Recording);
    recorder.stop().unwrap();

    let interruptions: Vec<_> = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, RecorderEvent::Interruption(_)))
        .collect();
    assert_eq!(interruptions.len(), 2);
}
