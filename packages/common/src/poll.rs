use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Returned when a check never succeeded within the allowed attempts.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Repeatedly run `check` until it succeeds, sleeping `interval` between failures.
///
/// `max_attempts = None` polls forever. Returns the number of attempts that were
/// needed, so `Ok(1)` means the resource was ready on the first try.
pub async fn wait_until_ready<F, Fut, E>(
    check: F,
    interval: Duration,
    max_attempts: Option<u32>,
) -> Result<u32, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    poll("resource", check, interval, max_attempts).await
}

/// Log-wrapped variant used by the management commands.
pub async fn wait_for<F, Fut, E>(
    what: &str,
    check: F,
    interval: Duration,
    max_attempts: Option<u32>,
) -> Result<u32, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    info!("Waiting for {what}...");
    let attempts = poll(what, check, interval, max_attempts).await?;
    info!(attempts, "{} available!", capitalize(what));
    Ok(attempts)
}

async fn poll<F, Fut, E>(
    what: &str,
    mut check: F,
    interval: Duration,
    max_attempts: Option<u32>,
) -> Result<u32, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match check().await {
            Ok(()) => return Ok(attempt),
            Err(e) => {
                if max_attempts.is_some_and(|max| attempt >= max) {
                    return Err(PollError::Exhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                warn!(attempt, error = %e, "{}", retry_message(what, interval));
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// e.g. `Database unavailable, waiting 1 second...`
fn retry_message(what: &str, interval: Duration) -> String {
    let secs = interval.as_secs_f32();
    let unit = if secs == 1.0 { "second" } else { "seconds" };
    format!("{} unavailable, waiting {secs} {unit}...", capitalize(what))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
