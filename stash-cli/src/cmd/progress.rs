use async_trait::async_trait;
use stash_exec::executor::{Event, EventSink};

/// Console progress for text output: one line per sequence and request.
pub struct ProgressEventSink;

#[async_trait]
impl EventSink for ProgressEventSink {
    async fn emit(&self, event: Event) {
        match event {
            Event::SequenceStarted {
                index,
                total,
                name,
                kind,
                workers,
            } => {
                if kind == "Concurrent" {
                    println!("Processing sequence {index}/{total}: {name} (Type={kind}, workers={workers})");
                } else {
                    println!("Processing sequence {index}/{total}: {name} (Type={kind})");
                }
            }
            Event::RequestStarted {
                index, total, key, ..
            } => println!("Running request {index}/{total}: {key}"),
            Event::RequestFinished {
                key,
                status: -1,
                attempts,
                ..
            } if attempts > 0 => eprintln!("  {key}: failed after {attempts} attempt(s)"),
            _ => {}
        }
    }
}
