use std::time::Instant;

use crate::stream::{trim_for_display, StreamAccumulator};

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

fn long_answer() -> StreamAccumulator {
    let mut buffer = StreamAccumulator::new();
    for i in 0..2_000 {
        buffer.push(&format!("token{i:04} "));
        if i % 40 == 0 {
            buffer.push("\n\n\n\n");
        }
    }
    buffer
}

#[test]
fn fragment_append_p95_under_2ms() {
    let mut samples = Vec::with_capacity(2_000);
    let mut buffer = StreamAccumulator::new();
    for i in 0..2_000 {
        let fragment = format!("word{i:05} ");
        let start = Instant::now();
        buffer.push(&fragment);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    let p95 = p95_ms(&mut samples);
    assert!(p95 <= 2.0, "append p95 too high: {p95:.3}ms (budget 2.0ms)");
}

#[test]
fn render_of_long_answer_under_15ms() {
    let buffer = long_answer();
    for _ in 0..5 {
        let _ = trim_for_display(buffer.transcript());
    }

    let mut samples = Vec::with_capacity(50);
    for _ in 0..50 {
        let start = Instant::now();
        let rendered = buffer.rendered();
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
        assert!(!rendered.contains("\n\n\n"));
    }

    let p95 = p95_ms(&mut samples);
    assert!(p95 <= 15.0, "render p95 too high: {p95:.3}ms (budget 15.0ms)");
}
