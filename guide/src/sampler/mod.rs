//! Frame sampler: one capture per base tick, fanned out to subscribers on
//! their own power-of-two cadence.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::RawFrame;

mod interval;
pub use interval::CaptureInterval;
mod signature;
pub use signature::FrameSignature;

/// Source of frames. Called at most once per tick.
pub trait FrameProvider {
	fn capture_frame(&mut self) -> anyhow::Result<RawFrame>;
}

impl<F> FrameProvider for F
where
	F: FnMut() -> anyhow::Result<RawFrame>,
{
	fn capture_frame(&mut self) -> anyhow::Result<RawFrame> {
		self()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTime {
	pub tick: u64,
	pub now: Instant,
}

/// What a subscriber receives for one delivered tick.
#[derive(Debug, Clone)]
pub struct CaptureEvent {
	pub time: CaptureTime,
	pub frame: Rc<RawFrame>,
	pub signature: FrameSignature,
	pub unchanged_from_previous: bool,
	pub capture_ms: f64,
}

type Callback = Rc<RefCell<dyn FnMut(&CaptureEvent)>>;

struct Subscriber {
	id: u64,
	interval: CaptureInterval,
	on_frame: Callback,
}

type Subscribers = Rc<RefCell<Vec<Subscriber>>>;

/// Handle returned by [`Sampler::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop deliveries.
#[must_use = "keep the handle to be able to unsubscribe"]
pub struct Subscription {
	id: u64,
	subscribers: Weak<RefCell<Vec<Subscriber>>>,
}

impl Subscription {
	/// Remove the consumer from the next tick onward. A callback already
	/// running for the current tick still completes.
	///
	/// Returns `false` when the sampler is gone or the consumer was already removed.
	pub fn unsubscribe(self) -> bool {
		let Some(subscribers) = self.subscribers.upgrade() else {
			return false;
		};
		let mut subscribers = subscribers.borrow_mut();
		let before = subscribers.len();
		subscribers.retain(|s| s.id != self.id);
		subscribers.len() != before
	}
}

pub struct Sampler<P> {
	provider: P,
	base_tick_ms: f64,
	origin: Option<Instant>,
	last_tick: Option<u64>,
	last_signature: Option<FrameSignature>,
	subscribers: Subscribers,
	next_id: u64,
}

impl<P: FrameProvider> Sampler<P> {
	pub fn new(provider: P, max_fps: u32) -> Self {
		Self {
			provider,
			base_tick_ms: 1000.0 / max_fps.max(1) as f64,
			origin: None,
			last_tick: None,
			last_signature: None,
			subscribers: Rc::default(),
			next_id: 1,
		}
	}

	#[inline]
	pub fn base_tick_ms(&self) -> f64 {
		self.base_tick_ms
	}

	pub fn subscribe(&mut self, interval_ms: f64, on_frame: impl FnMut(&CaptureEvent) + 'static) -> Subscription {
		let id = self.next_id;
		self.next_id += 1;
		self.subscribers.borrow_mut().push(Subscriber {
			id,
			interval: CaptureInterval::from_approximate_interval(interval_ms, self.base_tick_ms),
			on_frame: Rc::new(RefCell::new(on_frame)),
		});
		Subscription {
			id,
			subscribers: Rc::downgrade(&self.subscribers),
		}
	}

	pub fn has_subscribers(&self) -> bool {
		!self.subscribers.borrow().is_empty()
	}

	/// Tick index of `now`. The first poll defines tick zero.
	pub fn tick_at(&mut self, now: Instant) -> u64 {
		let origin = *self.origin.get_or_insert(now);
		let elapsed_ms = now.saturating_duration_since(origin).as_secs_f64() * 1000.0;
		(elapsed_ms / self.base_tick_ms).floor() as u64
	}

	/// Capture and dispatch one frame, unless nobody listens or `now` falls in
	/// the tick that was already served.
	///
	/// Returns the number of subscribers notified.
	pub fn poll_once(&mut self, now: Instant) -> usize {
		if !self.has_subscribers() {
			return 0;
		}
		let tick = self.tick_at(now);
		if self.last_tick == Some(tick) {
			return 0;
		}
		self.last_tick = Some(tick);

		let started = Instant::now();
		let frame = match self.provider.capture_frame() {
			Ok(frame) => frame,
			Err(err) => {
				tracing::warn!(error = %err, tick, "capture failed; skipping tick");
				return 0;
			}
		};
		let capture_ms = started.elapsed().as_secs_f64() * 1000.0;

		let signature = FrameSignature::of_tokens(&frame.tokens);
		let unchanged_from_previous = self.last_signature == Some(signature);
		self.last_signature = Some(signature);

		let event = CaptureEvent {
			time: CaptureTime { tick, now },
			frame: Rc::new(frame),
			signature,
			unchanged_from_previous,
			capture_ms,
		};

		// Snapshot so callbacks may unsubscribe while we iterate.
		let due: Vec<Callback> = self
			.subscribers
			.borrow()
			.iter()
			.filter(|s| s.interval.matches(tick))
			.map(|s| s.on_frame.clone())
			.collect();

		for callback in &due {
			(&mut *callback.borrow_mut())(&event);
		}
		due.len()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::time::Duration;

	use super::*;
	use crate::Token;

	fn counting_provider(calls: Rc<Cell<u32>>) -> impl FnMut() -> anyhow::Result<RawFrame> {
		move || {
			calls.set(calls.get() + 1);
			Ok(RawFrame::from_tokens(vec![Token::new("hero")]))
		}
	}

	#[test]
	fn idle_without_subscribers() {
		let calls = Rc::new(Cell::new(0));
		let mut sampler = Sampler::new(counting_provider(calls.clone()), 60);
		assert_eq!(sampler.poll_once(Instant::now()), 0);
		assert_eq!(calls.get(), 0);
	}

	#[test]
	fn one_capture_per_tick() {
		let calls = Rc::new(Cell::new(0));
		let mut sampler = Sampler::new(counting_provider(calls.clone()), 50);
		let _a = sampler.subscribe(0.0, |_| {});
		let _b = sampler.subscribe(0.0, |_| {});

		let t0 = Instant::now();
		assert_eq!(sampler.poll_once(t0), 2);
		assert_eq!(sampler.poll_once(t0 + Duration::from_millis(5)), 0);
		assert_eq!(calls.get(), 1);

		assert_eq!(sampler.poll_once(t0 + Duration::from_millis(21)), 2);
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn failed_capture_skips_the_tick() {
		let mut sampler = Sampler::new(|| -> anyhow::Result<RawFrame> { anyhow::bail!("window gone") }, 60);
		let hits = Rc::new(Cell::new(0));
		let seen = hits.clone();
		let _sub = sampler.subscribe(0.0, move |_| seen.set(seen.get() + 1));
		assert_eq!(sampler.poll_once(Instant::now()), 0);
		assert_eq!(hits.get(), 0);
	}

	#[test]
	fn unsubscribe_twice_reports_false() {
		let mut sampler = Sampler::new(counting_provider(Rc::default()), 60);
		let sub = sampler.subscribe(0.0, |_| {});
		let id = sub.id;
		assert!(sub.unsubscribe());
		let stale = Subscription {
			id,
			subscribers: Rc::downgrade(&sampler.subscribers),
		};
		assert!(!stale.unsubscribe());
		assert!(!sampler.has_subscribers());
	}
}
