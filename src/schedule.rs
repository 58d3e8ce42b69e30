use std::future::Future;
use std::time::Duration;

use log::info;

/// How often the update runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Once,
    /// Run, then keep running with this pause in between.
    Every(Duration),
}

/// Suspends the loop between runs. Swapped out in tests.
pub trait Sleeper {
    fn sleep(&self, period: Duration) -> impl Future<Output = ()> + Send;
}

/// Real wall-clock sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, period: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(period)
    }
}

enum State {
    Running,
    Idle(Duration),
}

/// Runs `job` according to `schedule`, stopping at the first failure.
pub async fn run<S, F, Fut, E>(schedule: Schedule, sleeper: &S, mut job: F) -> Result<(), E>
where
    S: Sleeper,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let mut state = State::Running;
    loop {
        state = match state {
            State::Running => {
                job().await?;
                match schedule {
                    Schedule::Once => return Ok(()),
                    Schedule::Every(period) => State::Idle(period),
                }
            }
            State::Idle(period) => {
                info!("sleeping till next update: sleep={period:?}");
                sleeper.sleep(period).await;
                State::Running
            }
        };
    }
}
