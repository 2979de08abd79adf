use std::time::Duration;

use rankrace::{
    Animator, AnimatorOpts, ChartLayout, CpuRenderer, DEFAULT_RANK_CAP, Dataset, InMemorySink,
    PlaybackPhase, PngDirSink, RenderOptions,
};

const CSV: &str = "Year,Country name,Population\n\
                   1950,Alpha,1000\n1950,Beta,800\n1950,Gamma,600\n\
                   1951,Beta,1200\n1951,Alpha,1100\n1951,Gamma,700\n\
                   1952,Gamma,1500\n1952,Beta,1300\n1952,Alpha,1200\n\
                   1953,Gamma,1600\n1953,Beta,1400\n1953,Delta,1350\n";

fn animator(steps: usize) -> Animator {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dataset = Dataset::from_reader(CSV.as_bytes(), DEFAULT_RANK_CAP).unwrap();
    let renderer = CpuRenderer::new(RenderOptions::default()).unwrap();
    let opts = AnimatorOpts {
        steps_per_frame: steps,
        interval: Duration::ZERO,
        ..AnimatorOpts::default()
    };
    Animator::new(dataset, ChartLayout::default(), renderer, opts)
}

#[test]
fn full_race_emits_one_frame_per_year() {
    let mut anim = animator(1);
    let mut sink = InMemorySink::new();
    let stats = anim.run(&mut sink).unwrap();

    assert_eq!(stats.years_played, 4);
    assert_eq!(stats.frames_rendered, 4);
    assert_eq!(sink.frames.len(), 4);
    assert!(sink.finished);
    assert_eq!(anim.phase(), PlaybackPhase::Finished);

    // Years differ, so consecutive frames must differ.
    assert_ne!(sink.frames[0].data, sink.frames[1].data);
}

#[test]
fn eased_steps_insert_in_between_frames() {
    let mut anim = animator(4);
    let mut sink = InMemorySink::new();
    let stats = anim.run(&mut sink).unwrap();

    // First year renders once, the remaining three blend in 4 steps each.
    assert_eq!(stats.frames_rendered, 1 + 3 * 4);
    assert_eq!(sink.frames.len(), 13);
}

#[test]
fn toggling_pause_mid_race_resumes_where_it_stopped() {
    let mut anim = animator(1);
    let mut sink = InMemorySink::new();

    assert!(anim.tick(&mut sink).unwrap());
    assert!(anim.tick(&mut sink).unwrap());
    assert_eq!(anim.phase(), PlaybackPhase::Playing);

    anim.toggle_play();
    assert_eq!(anim.phase(), PlaybackPhase::Paused);
    assert!(!anim.tick(&mut sink).unwrap());
    assert_eq!(sink.frames.len(), 2);

    anim.toggle_play();
    assert!(anim.tick(&mut sink).unwrap());
    assert!(anim.tick(&mut sink).unwrap());
    assert!(!anim.tick(&mut sink).unwrap());
    assert_eq!(sink.frames.len(), 4);
    assert_eq!(anim.phase(), PlaybackPhase::Finished);
}

#[test]
fn finished_race_ignores_further_toggles_and_ticks() {
    let mut anim = animator(1);
    let mut sink = InMemorySink::new();
    anim.run(&mut sink).unwrap();

    assert_eq!(anim.toggle_play(), PlaybackPhase::Finished);
    assert!(!anim.tick(&mut sink).unwrap());
    assert_eq!(sink.frames.len(), 4);
}

#[test]
fn png_sink_round_trips_through_image_decode() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");

    let mut anim = animator(1);
    let mut sink = PngDirSink::new(&out);
    let stats = anim.run(&mut sink).unwrap();
    assert_eq!(stats.frames_rendered, 4);

    for i in 0..4 {
        let path = out.join(format!("frame_{i:05}.png"));
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 1200);
        assert_eq!(img.height(), 600);
    }
    assert!(!out.join("frame_00004.png").exists());
}
