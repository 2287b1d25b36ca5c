/// Query Execution Runner
///
/// Drives a single query to completion: the session produces results on a
/// scoped worker thread while the calling thread renders them as they
/// arrive.
///
/// ## Output
///
/// Each result is written on its own line(s). When at least one result was
/// written, a summary follows:
///
/// ```text
/// -----------
/// 2 Results
/// Elapsed time: 0.412 ms
///
/// ```
///
/// A query with no results writes nothing at all.
use crate::core::{Result, ShellError};
use crate::session::{result_channel, Session, RESULT_BUFFER, RESULT_LIMIT};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// What a finished query produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of results rendered
    pub results: usize,
    /// Time from launch until the stream was drained; `None` when there
    /// were no results and nothing was reported
    pub elapsed: Option<Duration>,
}

/// Runs `query` on `session`, writing rendered results to `out`.
///
/// # Errors
///
/// Only failures to write to `out` are returned. Errors raised by the
/// session while producing results are written as `Error: ...` lines.
pub fn run_query<W: Write>(out: &mut W, session: &dyn Session, query: &str) -> Result<RunSummary> {
    let started = Instant::now();
    let (sink, stream) = result_channel(RESULT_BUFFER, RESULT_LIMIT);

    let (results, drained_at, outcome) = thread::scope(|scope| {
        // The sink moves into the worker, so the stream closes however the
        // worker exits.
        let producer = scope.spawn(move || {
            panic::catch_unwind(AssertUnwindSafe(|| {
                session.execute(query, sink, RESULT_LIMIT)
            }))
        });

        let mut results = 0;
        for value in stream {
            let text = session.render(&value);
            writeln!(out, "{}", text)?;
            results += 1;
        }
        let drained_at = Instant::now();

        let outcome = match producer.join() {
            Ok(Ok(produced)) => produced,
            Ok(Err(_)) | Err(_) => {
                error!("Query worker panicked while running {:?}", query);
                Err(ShellError::Query("query execution failed".to_string()))
            }
        };
        Ok::<_, ShellError>((results, drained_at, outcome))
    })?;

    let elapsed = if results > 0 {
        let elapsed = drained_at.duration_since(started);
        writeln!(out, "-----------")?;
        writeln!(out, "{} Results", results)?;
        writeln!(
            out,
            "Elapsed time: {:.3} ms\n",
            elapsed.as_secs_f64() * 1000.0
        )?;
        Some(elapsed)
    } else {
        None
    };

    if let Err(e) = outcome {
        warn!("Query failed: {}", e);
        writeln!(out, "Error: {}", e)?;
    }
    out.flush()?;

    debug!("Query produced {} results", results);
    Ok(RunSummary { results, elapsed })
}
