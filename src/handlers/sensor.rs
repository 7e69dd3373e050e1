use std::path::PathBuf;
use std::time::{Duration, Instant};
use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use crate::handlers::events::TrackerEvent;
use crate::models::error::SensorError;
use crate::models::position::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorOptions {
    /// How long to wait for a reading before reporting a timeout.
    pub timeout: Duration,
    /// How old a previous fix may be and still be reported on timeout.
    pub maximum_age: Duration,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorSource {
    /// JSON lines of `{"latitude": .., "longitude": ..}`, one fix per `interval`.
    Replay { path: PathBuf, interval: Duration },
    Fixed(Coordinate),
}

/// Watches a position feed. Errors do not end the watch; only the end of the feed does.
pub fn watch_lines<R>(reader: R, options: SensorOptions, interval: Duration)
                      -> impl Stream<Item=Result<Coordinate, SensorError>>
    where R: AsyncBufRead + Unpin {
    stream! {
        let mut lines = reader.lines();
        let mut last_fix: Option<(Coordinate, Instant)> = None;

        loop {
            match tokio::time::timeout(options.timeout, lines.next_line()).await {
                Err(_) => match last_fix {
                    Some((fix, at)) if at.elapsed() <= options.maximum_age => {
                        yield Ok(fix);
                    }
                    _ => {
                        yield Err(SensorError::Timeout(options.timeout.as_millis() as u64));
                    }
                },
                Ok(Ok(Some(line))) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Coordinate>(&line) {
                        Ok(fix) => {
                            last_fix = Some((fix, Instant::now()));
                            yield Ok(fix);
                            if !interval.is_zero() {
                                tokio::time::sleep(interval).await;
                            }
                        }
                        Err(source) => {
                            yield Err(SensorError::Malformed { line, source });
                        }
                    }
                }
                Ok(Ok(None)) => break,
                Ok(Err(e)) => {
                    yield Err(SensorError::Io(e));
                    break;
                }
            }
        }
    }
}

pub fn watch_position(source: SensorSource, options: SensorOptions)
                      -> impl Stream<Item=Result<Coordinate, SensorError>> {
    stream! {
        match source {
            SensorSource::Fixed(fix) => {
                yield Ok(fix);
            }
            SensorSource::Replay { path, interval } => {
                match tokio::fs::File::open(&path).await {
                    Ok(file) => {
                        info!("Replaying positions from {}", path.display());
                        let fixes = watch_lines(BufReader::new(file), options, interval);
                        futures::pin_mut!(fixes);
                        while let Some(fix) = fixes.next().await {
                            yield fix;
                        }
                    }
                    Err(e) => {
                        yield Err(SensorError::Io(e));
                    }
                }
            }
        }
    }
}

pub struct GeolocationWatcher;

impl GeolocationWatcher {
    pub async fn run_actor(source: SensorSource,
                           options: SensorOptions,
                           events: mpsc::Sender<TrackerEvent>) {
        let fixes = watch_position(source, options);
        futures::pin_mut!(fixes);

        while let Some(reading) = fixes.next().await {
            let event = match reading {
                Ok(fix) => TrackerEvent::SensorFix(fix),
                Err(e) => TrackerEvent::SensorFailure(e.to_string()),
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
        debug!("Position watch ended");
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;
    use super::*;

    fn quick(timeout_ms: u64) -> SensorOptions {
        SensorOptions { timeout: Duration::from_millis(timeout_ms), maximum_age: Duration::ZERO }
    }

    #[tokio::test]
    async fn replays_lines_and_reports_bad_ones() {
        let input: &[u8] = b"{\"latitude\":1.0,\"longitude\":2.0}\n\n\
            not json\n\
            {\"latitude\":3.0,\"longitude\":4.0}\n";
        let readings: Vec<_> = watch_lines(input, quick(1000), Duration::ZERO).collect().await;

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].as_ref().unwrap(), &Coordinate::new(1.0, 2.0));
        assert!(matches!(readings[1], Err(SensorError::Malformed { .. })));
        assert_eq!(readings[2].as_ref().unwrap(), &Coordinate::new(3.0, 4.0));
    }

    #[tokio::test]
    async fn silent_feed_times_out_and_keeps_watching() {
        let (reader, mut writer) = tokio::io::duplex(256);
        let readings = watch_lines(BufReader::new(reader), quick(20), Duration::ZERO);
        futures::pin_mut!(readings);

        assert!(matches!(readings.next().await, Some(Err(SensorError::Timeout(20)))));

        writer.write_all(b"{\"latitude\":5.0,\"longitude\":6.0}\n").await.unwrap();
        assert_eq!(readings.next().await.unwrap().unwrap(), Coordinate::new(5.0, 6.0));

        // zero maximum age never reuses the last fix
        assert!(matches!(readings.next().await, Some(Err(SensorError::Timeout(_)))));

        drop(writer);
        assert!(readings.next().await.is_none());
    }

    #[tokio::test]
    async fn recent_fix_is_reused_within_maximum_age() {
        let (reader, mut writer) = tokio::io::duplex(256);
        let options = SensorOptions {
            timeout: Duration::from_millis(20),
            maximum_age: Duration::from_secs(60),
        };
        let readings = watch_lines(BufReader::new(reader), options, Duration::ZERO);
        futures::pin_mut!(readings);

        writer.write_all(b"{\"latitude\":5.0,\"longitude\":6.0}\n").await.unwrap();
        assert_eq!(readings.next().await.unwrap().unwrap(), Coordinate::new(5.0, 6.0));
        assert_eq!(readings.next().await.unwrap().unwrap(), Coordinate::new(5.0, 6.0));
    }

    #[tokio::test]
    async fn missing_replay_file_is_reported() {
        let source = SensorSource::Replay {
            path: "/nonexistent/positions.jsonl".into(),
            interval: Duration::ZERO,
        };
        let readings: Vec<_> = watch_position(source, SensorOptions::default()).collect().await;
        assert_eq!(readings.len(), 1);
        assert!(matches!(readings[0], Err(SensorError::Io(_))));
    }

    #[tokio::test]
    async fn watcher_turns_readings_into_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let source = SensorSource::Fixed(Coordinate::new(7.0, 8.0));
        GeolocationWatcher::run_actor(source, SensorOptions::default(), tx).await;
        assert_eq!(rx.recv().await, Some(TrackerEvent::SensorFix(Coordinate::new(7.0, 8.0))));
        assert_eq!(rx.recv().await, None);
    }
}
