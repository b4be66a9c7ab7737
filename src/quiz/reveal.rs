//! Seeded masking of inline tokens. Masking only changes on an explicit reset.

use std::collections::HashMap;

use tracing::debug;

use super::spans::Fragment;
use super::view::{InteractiveView, StaticView, TokenView};

pub const DEFAULT_RATIO: f64 = 0.5;
pub const INITIAL_SEED: u64 = 1;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// 32-bit FNV-1a over the UTF-16 code units of `input`, scaled into `[0, 1)`.
pub fn hash01(input: &str) -> f64 {
    let hash = input.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    });
    f64::from(hash) / TWO_POW_32
}

/// The value compared against the ratio for one token.
pub fn hide_score(seed: u64, index: usize, text: &str) -> f64 {
    hash01(&format!("{seed}::{index}::{text}"))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealState {
    seed: u64,
    ratio: f64,
    reset_signal: u64,
}

impl Default for RevealState {
    fn default() -> Self {
        Self::new(DEFAULT_RATIO)
    }
}

impl RevealState {
    pub fn new(ratio: f64) -> Self {
        Self::with_seed(INITIAL_SEED, ratio)
    }

    pub fn with_seed(seed: u64, ratio: f64) -> Self {
        let mut state = Self {
            seed,
            ratio: DEFAULT_RATIO,
            reset_signal: 0,
        };
        state.set_ratio(ratio);
        state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fraction of tokens shown in plain form.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn reset_signal(&self) -> u64 {
        self.reset_signal
    }

    /// Clamped into `[0, 1]`. NaN is ignored.
    pub fn set_ratio(&mut self, ratio: f64) {
        if !ratio.is_nan() {
            self.ratio = ratio.clamp(0.0, 1.0);
        }
    }

    pub fn should_hide(&self, text: &str, index: usize) -> bool {
        hide_score(self.seed, index, text) > self.ratio
    }

    fn advance(&mut self) {
        self.seed += 1;
        self.reset_signal += 1;
    }
}

/// Appearance indices handed out to inline tokens during one render.
///
/// Tokens are keyed by their position in document order; the first encounter
/// fixes the index for as long as the arena lives.
#[derive(Debug, Clone, Default)]
pub struct IndexArena {
    counter: usize,
    assigned: HashMap<usize, usize>,
}

impl IndexArena {
    pub fn index_for(&mut self, position: usize) -> usize {
        *self.assigned.entry(position).or_insert_with(|| {
            self.counter += 1;
            self.counter
        })
    }

    pub fn get(&self, position: usize) -> Option<usize> {
        self.assigned.get(&position).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    fn clear(&mut self) {
        self.counter = 0;
        self.assigned.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First paint: every inline token is plain text.
    Static,
    /// Hide decisions are live. Never goes back to `Static`.
    Interactive,
}

/// Reveal state of one document view, from mount to unmount.
#[derive(Debug, Clone)]
pub struct RevealSession {
    state: RevealState,
    arena: IndexArena,
    phase: Phase,
}

impl Default for RevealSession {
    fn default() -> Self {
        Self::new(RevealState::default())
    }
}

impl RevealSession {
    pub fn new(state: RevealState) -> Self {
        Self {
            state,
            arena: IndexArena::default(),
            phase: Phase::Static,
        }
    }

    pub fn state(&self) -> &RevealState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.phase == Phase::Interactive
    }

    /// Confirm that interactivity has taken over the static first paint.
    pub fn mount(&mut self) -> InteractiveView<'_> {
        self.phase = Phase::Interactive;
        InteractiveView::new(self)
    }

    /// The interactive view, once mounted.
    pub fn interactive(&mut self) -> Option<InteractiveView<'_>> {
        if self.is_mounted() {
            Some(InteractiveView::new(self))
        } else {
            None
        }
    }

    /// Render through whichever view the current phase allows.
    pub fn render<'f>(&mut self, fragments: &'f [Fragment]) -> Vec<TokenView<'f>> {
        match self.phase {
            Phase::Static => StaticView.render(fragments),
            Phase::Interactive => InteractiveView::new(self).render(fragments),
        }
    }

    /// Changing the ratio keeps every assigned index.
    pub fn set_ratio(&mut self, ratio: f64) {
        self.state.set_ratio(ratio);
    }

    /// Reshuffle the page: new seed, new reset signal, fresh index counter.
    /// Returns the new reset signal.
    pub fn reset(&mut self) -> u64 {
        self.state.advance();
        self.arena.clear();
        debug!(
            "reveal reset: seed {} signal {}",
            self.state.seed, self.state.reset_signal
        );
        self.state.reset_signal
    }

    pub(crate) fn index_for(&mut self, position: usize) -> usize {
        self.arena.index_for(position)
    }

    pub fn arena(&self) -> &IndexArena {
        &self.arena
    }
}
