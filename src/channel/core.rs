use std::{sync::Weak, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use super::{FetchOptions, Inner, SCOPE};
use crate::{ArcStr, channel::Fetch};

/// The background refresh of one request.
///
/// Holds the channel weakly: the task ends at the first tick after the last
/// channel handle is dropped. Each tick's refresh runs as its own task, so
/// aborting the timer never cancels a refresh already under way.
pub(super) struct Refresher<F: Fetch> {
    channel: Weak<Inner<F>>,
    endpoint: ArcStr,
    options: FetchOptions,
    period: Duration,
}

impl<F: Fetch> Refresher<F> {
    pub fn new(channel: Weak<Inner<F>>, endpoint: ArcStr, options: FetchOptions, period: Duration) -> Self {
        Self {
            channel,
            endpoint,
            options,
            period,
        }
    }

    /// Spawns the timer loop. The first refresh happens one period from now.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(channel) = self.channel.upgrade() else {
                    break;
                };
                channel
                    .log
                    .info(SCOPE, format!("Refreshing {}", self.endpoint));
                let endpoint = self.endpoint.clone();
                let options = self.options.clone();
                tokio::spawn(async move {
                    channel.refresh(endpoint, options).await;
                });
            }
        })
    }
}
