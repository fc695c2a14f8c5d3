use core::cell::Cell;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::{self, raw::RawMutex};
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_sync::pubsub::{self, PubSubChannel, Subscriber};
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;

use crate::bme680::{Bme680, ChangeResult, Config, PhysicalReading};
use crate::transport::{Error, RegisterTransport};

/// Message published to subscribers of a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    Changed(ChangeResult),
    /// The session ended, after a stop or an error. A later session publishes
    /// on the same channel.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    Idle,
    Running,
    /// Stop requested, the loop has not noticed yet.
    Stopping,
}

pub type ChangeSubscriber<'a, M, const CAP: usize, const SUBS: usize> =
    Subscriber<'a, M, Notification, CAP, SUBS, 1>;

/// Serializes access to one sensor and runs its continuous sampling session.
///
/// All register traffic, one-shot or continuous, goes through the same lock.
/// At most one session runs at a time; `CAP` is the per-subscriber backlog and
/// `SUBS` the number of subscribers.
pub struct Sampler<M: RawMutex, T, D, const CAP: usize = 4, const SUBS: usize = 4> {
    sensor: Mutex<M, Bme680<T, D>>,
    pacing: Mutex<M, D>,
    session: blocking_mutex::Mutex<M, Cell<Session>>,
    wake: Signal<M, ()>,
    changes: PubSubChannel<M, Notification, CAP, SUBS, 1>,
}

impl<M, T, D, const CAP: usize, const SUBS: usize> Sampler<M, T, D, CAP, SUBS>
where
    M: RawMutex,
    T: RegisterTransport,
    D: DelayNs + Clone,
{
    pub fn new(sensor: Bme680<T, D>) -> Self {
        let pacing = sensor.delay().clone();

        Self {
            sensor: Mutex::new(sensor),
            pacing: Mutex::new(pacing),
            session: blocking_mutex::Mutex::new(Cell::new(Session::Idle)),
            wake: Signal::new(),
            changes: PubSubChannel::new(),
        }
    }

    /// Exclusive access to the driver, e.g. to change a heater profile.
    pub async fn sensor(&self) -> MutexGuard<'_, M, Bme680<T, D>> {
        self.sensor.lock().await
    }

    pub async fn read_once(&self, config: &Config) -> Result<PhysicalReading, Error<T::Error>> {
        self.sensor.lock().await.read_once(config).await
    }

    /// Subscribes to change notifications. Dropping the subscriber unsubscribes.
    pub fn subscribe(&self) -> Result<ChangeSubscriber<'_, M, CAP, SUBS>, pubsub::Error> {
        self.changes.subscriber()
    }

    pub fn is_running(&self) -> bool {
        self.session.lock(|session| session.get() == Session::Running)
    }

    /// Requests the running session to end and returns without waiting for it.
    ///
    /// The loop notices at its next iteration boundary, so one more
    /// notification may still arrive. Does nothing when no session is running.
    pub fn stop(&self) {
        let requested = self.session.lock(|session| {
            if session.get() == Session::Running {
                session.set(Session::Stopping);
                true
            } else {
                false
            }
        });

        if requested {
            debug!("sampling stop requested");
            self.wake.signal(());
        }
    }

    /// Runs a sampling session until [`stop`](Self::stop) or a failed read.
    ///
    /// Reads immediately, then every `interval_ms`, publishing the change
    /// against the previous reading each time. Subscribers get
    /// [`Notification::Completed`] when the session ends; the error that ended
    /// it, if any, is returned here.
    pub async fn start_continuous(
        &self,
        config: &Config,
        interval_ms: u32,
    ) -> Result<(), Error<T::Error>> {
        if interval_ms == 0 {
            return Err(Error::InvalidConfiguration(
                "polling interval must be positive",
            ));
        }
        config.validate()?;

        self.session.lock(|session| {
            if session.get() == Session::Idle {
                // a stop can only land once the session is Running
                self.wake.reset();
                session.set(Session::Running);
                Ok(())
            } else {
                Err(Error::AlreadyRunning)
            }
        })?;
        let guard = SessionGuard {
            session: &self.session,
            changes: &self.changes,
        };
        debug!("sampling started, interval {} ms", interval_ms);

        let result = self.run(config, interval_ms).await;
        drop(guard);

        match result {
            Ok(()) => debug!("sampling stopped"),
            Err(_) => warn!("sampling ended by a failed read"),
        }
        result
    }

    async fn run(&self, config: &Config, interval_ms: u32) -> Result<(), Error<T::Error>> {
        let publisher = self.changes.immediate_publisher();
        let mut pacing = self.pacing.lock().await;

        loop {
            if self.stop_requested() {
                return Ok(());
            }

            let change = {
                let mut sensor = self.sensor.lock().await;
                let old = sensor.last_reading();
                let new = sensor.read_once(config).await?;
                ChangeResult::compute(old, new)
            };
            publisher.publish_immediate(Notification::Changed(change));

            if let Either::Second(()) = select(pacing.delay_ms(interval_ms), self.wake.wait()).await
            {
                trace!("sampling interval cut short");
            }
        }
    }

    fn stop_requested(&self) -> bool {
        self.session
            .lock(|session| session.get() == Session::Stopping)
    }
}

/// Releases the session and signals completion, also when the session
/// future is dropped before it finishes.
struct SessionGuard<'a, M: RawMutex, const CAP: usize, const SUBS: usize> {
    session: &'a blocking_mutex::Mutex<M, Cell<Session>>,
    changes: &'a PubSubChannel<M, Notification, CAP, SUBS, 1>,
}

impl<M: RawMutex, const CAP: usize, const SUBS: usize> Drop for SessionGuard<'_, M, CAP, SUBS> {
    fn drop(&mut self) {
        self.session.lock(|session| session.set(Session::Idle));
        self.changes
            .immediate_publisher()
            .publish_immediate(Notification::Completed);
    }
}
