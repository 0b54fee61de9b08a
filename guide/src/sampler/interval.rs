/// Delivery cadence of one subscriber, as a power-of-two multiple of the base tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureInterval {
	tick_modulo: u64,
}

impl CaptureInterval {
	/// Round `interval_ms` to the nearest power-of-two multiple of `base_tick_ms`.
	///
	/// Intervals shorter than one tick fire every tick.
	pub fn from_approximate_interval(interval_ms: f64, base_tick_ms: f64) -> Self {
		let base = if base_tick_ms.is_finite() && base_tick_ms > 0.0 { base_tick_ms } else { 1.0 };
		let ratio = interval_ms.max(base) / base;
		let level = if ratio.is_finite() { ratio.log2().round().clamp(0.0, 62.0) as u32 } else { 62 };
		Self { tick_modulo: 1u64 << level }
	}

	#[inline]
	pub fn tick_modulo(&self) -> u64 {
		self.tick_modulo
	}

	#[inline]
	pub fn matches(&self, tick: u64) -> bool {
		tick % self.tick_modulo == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TICK: f64 = 1000.0 / 60.0;

	#[test]
	fn modulo_is_always_a_power_of_two() {
		for ms in [TICK, 20.0, 33.0, 50.0, 100.0, 250.0, 1000.0, 5000.0] {
			let interval = CaptureInterval::from_approximate_interval(ms, TICK);
			assert!(interval.tick_modulo().is_power_of_two(), "{ms} ms");
		}
	}

	#[test]
	fn rounds_to_nearest_power() {
		// 50 ms / 16.67 ms = 3 ticks, log2(3) = 1.58 -> 2^2
		assert_eq!(CaptureInterval::from_approximate_interval(50.0, TICK).tick_modulo(), 4);
		assert_eq!(CaptureInterval::from_approximate_interval(33.3, TICK).tick_modulo(), 2);
		assert_eq!(CaptureInterval::from_approximate_interval(5.0, TICK).tick_modulo(), 1);
	}

	#[test]
	fn matches_exactly_on_multiples() {
		let interval = CaptureInterval::from_approximate_interval(8.0 * TICK, TICK);
		assert_eq!(interval.tick_modulo(), 8);
		let fired: Vec<u64> = (0..40).filter(|t| interval.matches(*t)).collect();
		assert_eq!(fired, vec![0, 8, 16, 24, 32]);
	}
}
