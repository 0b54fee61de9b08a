//! Runtime orchestrator: sampler -> detectors -> fusion -> state machine.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use data::CategorySchema;

use crate::detect::{AnchorCatalog, AnchorSearch, PixelSearch};
use crate::fusion::{build_snapshot, elapsed_ms};
use crate::sampler::{CaptureEvent, FrameProvider, FrameSignature, Sampler, Subscription};
use crate::workflow::{Phase, evaluate};
use crate::{BootstrapState, FrameSnapshot, GuideConfig, GuideInstruction, RawFrame, Telemetry};

/// How many fragment texts an update carries for diagnostics.
const SAMPLE_TOKENS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FrameStats {
	pub token_count: usize,
	pub unchanged_from_previous: bool,
	pub frame_signature: String,
	pub sample_tokens: Vec<String>,
	pub matched_anchors: Vec<String>,
}

/// What consumers receive once per delivered tick.
///
/// Phases may go backwards between updates; the guide does not smooth flicker.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RuntimeUpdate {
	pub phase: Phase,
	pub state: BootstrapState,
	pub instruction: GuideInstruction,
	pub frame_stats: FrameStats,
	pub telemetry: Telemetry,
}

/// Detectors, fusion and state machine over a single frame.
pub struct Pipeline {
	catalog: Arc<AnchorCatalog>,
	search: Box<dyn AnchorSearch>,
	schema: Arc<CategorySchema>,
	config: GuideConfig,
}

impl Pipeline {
	/// Searches frame pixels with the configured match threshold.
	pub fn new(catalog: Arc<AnchorCatalog>, schema: Arc<CategorySchema>, config: GuideConfig) -> Self {
		Self {
			search: Box::new(PixelSearch::from_config(&config)),
			catalog,
			schema,
			config,
		}
	}

	/// Replace the sub-image search backend.
	pub fn with_search(mut self, search: impl AnchorSearch + 'static) -> Self {
		self.search = Box::new(search);
		self
	}

	pub fn config(&self) -> &GuideConfig {
		&self.config
	}

	pub fn schema(&self) -> &CategorySchema {
		&self.schema
	}

	pub fn build_snapshot(&self, frame: &RawFrame) -> FrameSnapshot {
		build_snapshot(frame, &self.catalog, self.search.as_ref(), &self.schema, &self.config)
	}

	/// Evaluate one frame outside of the sampler.
	pub fn evaluate_frame(&self, frame: &RawFrame) -> RuntimeUpdate {
		let signature = FrameSignature::of_tokens(&frame.tokens);
		self.update(frame, None, signature, false, None)
	}

	fn update(
		&self,
		frame: &RawFrame,
		tick: Option<u64>,
		signature: FrameSignature,
		unchanged_from_previous: bool,
		capture_ms: Option<f64>,
	) -> RuntimeUpdate {
		let mut snapshot = self.build_snapshot(frame);
		snapshot.tick = tick;

		let fsm_started = Instant::now();
		let evaluation = evaluate(&snapshot, &self.schema);
		let fsm_ms = elapsed_ms(fsm_started);

		let detect = snapshot.signals.telemetry;
		let total_ms = capture_ms.unwrap_or(0.0) + detect.total_ms.unwrap_or(0.0) + fsm_ms;
		RuntimeUpdate {
			phase: evaluation.phase,
			state: evaluation.state,
			instruction: evaluation.instruction,
			frame_stats: FrameStats {
				token_count: frame.tokens.len(),
				unchanged_from_previous,
				frame_signature: signature.to_string(),
				sample_tokens: frame.tokens.iter().take(SAMPLE_TOKENS).map(|t| t.text.clone()).collect(),
				matched_anchors: snapshot.signals.matched_anchors.unwrap_or_default(),
			},
			telemetry: Telemetry {
				capture_ms,
				finder_ms: detect.finder_ms,
				recognition_ms: detect.recognition_ms,
				fsm_ms: Some(fsm_ms),
				total_ms: Some(total_ms),
			},
		}
	}

	fn update_for_event(&self, event: &CaptureEvent) -> RuntimeUpdate {
		self.update(
			&event.frame,
			Some(event.time.tick),
			event.signature,
			event.unchanged_from_previous,
			Some(event.capture_ms),
		)
	}
}

/// Evaluation shared by every subscriber served in the same tick.
type TickCache = Rc<RefCell<Option<(u64, Rc<RuntimeUpdate>)>>>;

/// Timer-driven guide: call [`GuideRuntime::poll_once`] once per base tick.
pub struct GuideRuntime<P> {
	sampler: Sampler<P>,
	pipeline: Rc<Pipeline>,
	cache: TickCache,
}

impl<P: FrameProvider> GuideRuntime<P> {
	pub fn new(provider: P, pipeline: Pipeline) -> Self {
		Self {
			sampler: Sampler::new(provider, pipeline.config.max_fps),
			pipeline: Rc::new(pipeline),
			cache: Rc::default(),
		}
	}

	pub fn pipeline(&self) -> &Pipeline {
		&self.pipeline
	}

	/// Length of one base tick; the caller's timer should fire at this cadence.
	pub fn base_tick(&self) -> Duration {
		Duration::from_secs_f64(self.sampler.base_tick_ms() / 1000.0)
	}

	/// Subscribe at the configured interval.
	pub fn subscribe(&mut self, on_update: impl FnMut(&RuntimeUpdate) + 'static) -> Subscription {
		let interval_ms = self.pipeline.config.interval_ms as f64;
		self.subscribe_every(interval_ms, on_update)
	}

	pub fn subscribe_every(
		&mut self,
		interval_ms: f64,
		mut on_update: impl FnMut(&RuntimeUpdate) + 'static,
	) -> Subscription {
		let pipeline = self.pipeline.clone();
		let cache = self.cache.clone();
		self.sampler.subscribe(interval_ms, move |event| {
			let cached = match &*cache.borrow() {
				Some((tick, update)) if *tick == event.time.tick => Some(update.clone()),
				_ => None,
			};
			let update = cached.unwrap_or_else(|| {
				let update = Rc::new(pipeline.update_for_event(event));
				*cache.borrow_mut() = Some((event.time.tick, update.clone()));
				update
			});
			on_update(&update);
		})
	}

	/// Capture and evaluate at most once per tick. Returns the number of consumers notified.
	pub fn poll_once(&mut self, now: Instant) -> usize {
		self.sampler.poll_once(now)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Token;

	fn pipeline() -> Pipeline {
		Pipeline::new(
			Arc::new(AnchorCatalog::empty()),
			Arc::new(CategorySchema::bundled()),
			GuideConfig::default(),
		)
	}

	#[test]
	fn evaluate_frame_reports_stats() {
		let frame = RawFrame::from_tokens(
			["a", "b", "c", "d", "e"].into_iter().map(Token::new).collect(),
		);
		let update = pipeline().evaluate_frame(&frame);
		assert_eq!(update.phase, Phase::Bootstrap);
		assert_eq!(update.frame_stats.token_count, 5);
		assert_eq!(update.frame_stats.sample_tokens, vec!["a", "b", "c", "d"]);
		assert!(update.frame_stats.matched_anchors.is_empty());
		assert_eq!(update.telemetry.capture_ms, None);
		assert!(update.telemetry.total_ms.is_some());
	}

	#[test]
	fn subscribers_in_one_tick_share_an_evaluation() {
		let evaluations = Rc::new(RefCell::new(Vec::new()));
		let mut runtime = GuideRuntime::new(
			|| -> anyhow::Result<RawFrame> { Ok(RawFrame::from_tokens(vec![Token::new("Options"), Token::new("Menu")])) },
			pipeline(),
		);
		for _ in 0..2 {
			let sink = evaluations.clone();
			let _sub = runtime.subscribe(move |u: &RuntimeUpdate| sink.borrow_mut().push(u.clone()));
		}
		assert_eq!(runtime.poll_once(Instant::now()), 2);
		let seen = evaluations.borrow();
		assert_eq!(seen.len(), 2);
		assert_eq!(seen[0], seen[1]);
		assert_eq!(seen[0].state, BootstrapState::WaitHeroWindow);
	}
}
