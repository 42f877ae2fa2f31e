//! Task runners wiring the control core into threads.
//!
//! Mirrors the firmware's task split: a sensor sampler publishing into the
//! [`SampleSlot`], the controller tick loop, and the motion arbiter
//! draining the intent channel. Each runner owns its loop; the shared
//! pieces (`SampleSlot`, `SharedCraneState`, the intent channel) are the
//! only coupling between them.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::arbiter::{IntentSink, MotionArbiter, MotionIntent};
use crate::sensor::{RangeSensor, SampleSlot};
use crate::services::SharedCraneState;
use crate::traits::{EchoTimer, ServoController};

/// Spawn the sensor sampling loop.
///
/// Each period: one measurement, published to the slot on success. A
/// timeout leaves the slot untouched (consumers hold the last good value);
/// a hardware error is logged and the loop continues.
pub fn spawn_sensor_task<T>(
    mut sensor: RangeSensor<T>,
    slot: Arc<SampleSlot>,
) -> JoinHandle<()>
where
    T: EchoTimer + Send + 'static,
    T::Error: core::fmt::Debug,
{
    let period = Duration::from_millis(sensor.config().period_ms as u64);
    thread::spawn(move || {
        println!("[Sensor] sampling every {:?}", period);
        loop {
            match sensor.sample() {
                Ok(Some(sample)) => {
                    slot.publish(sample);
                }
                Ok(None) => {
                    // No echo this cycle; hold the previous value.
                }
                Err(e) => {
                    println!("[Sensor] measurement error: {:?}", e);
                }
            }
            thread::sleep(period);
        }
    })
}

/// Spawn the controller tick loop.
///
/// Fixed-period, sleep-until-deadline scheduling: a slow tick eats into
/// its own slack instead of shifting every later tick.
pub fn spawn_controller_task<S>(state: Arc<SharedCraneState<S>>, slot: Arc<SampleSlot>) -> JoinHandle<()>
where
    S: IntentSink + Send + 'static,
{
    let tick = Duration::from_millis(state.with_controller(|c| c.config().control.tick_ms) as u64);
    thread::spawn(move || {
        println!("[Control] tick loop at {:?}", tick);
        let mut deadline = Instant::now();
        loop {
            deadline += tick;
            state.tick(slot.latest());
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
        }
    })
}

/// Spawn the motion arbiter consumer.
///
/// Blocks on the intent channel; exits when every sender is dropped or on
/// an actuation error, leaving a log line either way.
pub fn spawn_arbiter_task<V>(
    mut arbiter: MotionArbiter<V>,
    rx: Receiver<MotionIntent>,
) -> JoinHandle<()>
where
    V: ServoController + Send + 'static,
    V::Error: core::fmt::Debug,
{
    thread::spawn(move || match arbiter.run(rx) {
        Ok(()) => println!("[Arbiter] intent channel closed, exiting"),
        Err(e) => println!("[Arbiter] actuation error: {:?}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::intent_channel;
    use crate::events::{Axis, MotionDirection};
    use crate::hal::MockServos;

    #[test]
    fn arbiter_task_drains_and_exits_on_close() {
        let (mut tx, rx) = intent_channel(10);
        tx.submit(MotionIntent::new(Axis::Vertical, MotionDirection::Forward))
            .unwrap();
        tx.submit(MotionIntent::stop(Axis::Vertical)).unwrap();

        let handle = spawn_arbiter_task(MotionArbiter::new(MockServos::new()), rx);
        drop(tx);
        handle.join().unwrap();
    }
}
