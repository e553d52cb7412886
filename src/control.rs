//! Grid press/release mapping.
//!
//! A press on an idle row triggers that column. Holding one column and
//! pressing a second defines an inner loop spanning both (backward when the
//! second is left of the first). A press on a row with an inner loop clears
//! it instead of starting playback: a stopped strip clears at once, a playing
//! strip jumps to the pressed column and clears the loop when the jump fires,
//! on the grid when quantizing.

use crate::{Engine, Result};

/// What a grid press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAction {
    Trigger { column: u32, quantized: bool },
    DefineInnerLoop { start: u32, end: u32, reversed: bool },
    /// `jump_to` is set when the strip was playing.
    ClearInnerLoop { jump_to: Option<u32> },
    /// The strip had nothing loaded.
    NoSample,
}

/// Press/release state for every strip row.
#[derive(Debug, Clone)]
pub struct ControlSurface {
    held: Vec<Option<u32>>,
    quantize: bool,
}

impl ControlSurface {
    pub fn new(num_strips: usize) -> Self {
        Self {
            held: vec![None; num_strips],
            quantize: true,
        }
    }

    pub fn for_engine(engine: &Engine) -> Self {
        Self::new(engine.num_strips())
    }

    /// Quantize triggers to the engine grid. Default: true
    pub fn set_quantize_enabled(&mut self, enabled: bool) {
        self.quantize = enabled;
    }

    pub fn quantize_enabled(&self) -> bool {
        self.quantize
    }

    /// First column currently held on `strip`.
    pub fn held_column(&self, strip: usize) -> Option<u32> {
        self.held.get(strip).copied().flatten()
    }

    pub fn press(&mut self, engine: &Engine, strip: usize, column: u32) -> Result<GridAction> {
        let handle = engine.strip(strip)?;
        let held = self.held.get(strip).copied().flatten();

        if let Some(first) = held.filter(|&first| first != column) {
            // Both held cells are inside the loop.
            let reversed = column < first;
            let (from, to) = if reversed {
                (first + 1, column)
            } else {
                (first, column + 1)
            };
            let (start, end) = engine.define_inner_loop(strip, from, to)?;
            return Ok(GridAction::DefineInnerLoop {
                start,
                end,
                reversed,
            });
        }

        self.hold(strip, column);
        if handle.inner_loop().is_some() {
            if handle.is_playing() && engine.trigger_clearing_loop(strip, column, self.quantize)? {
                return Ok(GridAction::ClearInnerLoop {
                    jump_to: Some(column),
                });
            }
            engine.clear_inner_loop(strip)?;
            return Ok(GridAction::ClearInnerLoop { jump_to: None });
        }

        if engine.trigger(strip, column, self.quantize)? {
            Ok(GridAction::Trigger {
                column,
                quantized: self.quantize,
            })
        } else {
            Ok(GridAction::NoSample)
        }
    }

    pub fn release(&mut self, engine: &Engine, strip: usize, column: u32) -> Result<()> {
        engine.release(strip, column)?;
        if let Some(slot) = self.held.get_mut(strip) {
            if *slot == Some(column) {
                *slot = None;
            }
        }
        Ok(())
    }

    fn hold(&mut self, strip: usize, column: u32) {
        if strip >= self.held.len() {
            self.held.resize(strip + 1, None);
        }
        if self.held[strip].is_none() {
            self.held[strip] = Some(column);
        }
    }
}
