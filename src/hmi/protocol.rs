//! HMI command dispatch.
//!
//! Called once per superloop iteration; a no-op when no frame is
//! pending, otherwise exactly one command is processed and at most one
//! reply emitted. The rx/tx buffers are allocated once and reused for
//! every exchange — no per-frame allocation.
//!
//! Error signalling is deliberately minimal: a rejected recipe upload is
//! answered with the input frame with its opcode blanked. The host
//! validates an upload by byte-comparing the echo against what it sent,
//! so the mangled opcode makes that comparison fail immediately — the
//! host learns of the rejection without waiting for a timeout, and the
//! wire protocol needs no error opcode.

use log::{debug, warn};

use crate::recipe::RecipeStep;
use crate::state::{OvenState, OvenStatus};

use super::codec;
use super::transport::FrameLink;
use super::{Command, BUFFER_SIZE, MAX_RECIPE_STEPS};

/// The protocol engine. Owns the fixed frame buffers.
pub struct HmiProtocol {
    rx: [u8; BUFFER_SIZE],
    tx: [u8; BUFFER_SIZE],
}

impl HmiProtocol {
    pub fn new() -> Self {
        Self {
            rx: [0; BUFFER_SIZE],
            tx: [0; BUFFER_SIZE],
        }
    }

    /// Process at most one pending host frame.
    ///
    /// Mutates `state` per the command semantics; transport errors
    /// propagate, protocol-level problems never do.
    pub fn poll<L: FrameLink>(
        &mut self,
        link: &mut L,
        state: &mut OvenState,
    ) -> Result<(), L::Error> {
        let Some(len) = link.poll_frame(&mut self.rx)? else {
            return Ok(());
        };
        if len == 0 || len > BUFFER_SIZE {
            return Ok(());
        }

        let Some(cmd) = Command::from_opcode(self.rx[0]) else {
            debug!("hmi: ignoring unknown opcode 0x{:02X}", self.rx[0]);
            return Ok(());
        };

        match cmd {
            Command::Start => {
                if state.status == OvenStatus::Standby {
                    state.startup = true;
                    state.status = OvenStatus::Running;
                    debug!("hmi: start — entering Running");
                }
                self.tx[0] = state.status.as_u8();
                link.send_frame(&self.tx[..1])?;
            }

            Command::Stop => {
                // Stop doubles as the fault acknowledgment: a Faulted
                // oven returns to Standby once the host commands Stop.
                if matches!(state.status, OvenStatus::Running | OvenStatus::Faulted) {
                    state.status = OvenStatus::Standby;
                    debug!("hmi: stop — entering Standby");
                }
                self.tx[0] = state.status.as_u8();
                link.send_frame(&self.tx[..1])?;
            }

            Command::StartRecipe => self.handle_recipe_upload(link, state, len)?,

            Command::GetCurrentSample => {
                let time = codec::encode_time(state.current_time.max(0.0));
                let temp = codec::encode_temperature(state.current_temperature);
                let ambient = codec::encode_temperature(state.ambient_temperature);
                self.tx[0..2].copy_from_slice(&time);
                self.tx[2..4].copy_from_slice(&temp);
                self.tx[4..6].copy_from_slice(&ambient);
                self.tx[6] = state.duty_cycle;
                link.send_frame(&self.tx[..7])?;
            }

            Command::GetStatus => {
                self.tx[0] = state.status.as_u8();
                link.send_frame(&self.tx[..1])?;
                // One-shot power-up acknowledgment gate: the first status
                // poll after boot unlocks recipe upload.
                if state.status == OvenStatus::NeedRestart {
                    state.status = OvenStatus::WaitingForRecipe;
                }
            }

            Command::SetAmbient => {
                if len >= 3 {
                    state.ambient_temperature =
                        codec::decode_temperature([self.rx[1], self.rx[2]]);
                    debug!("hmi: ambient set to {:.2} degC", state.ambient_temperature);
                }
                // No reply.
            }

            Command::SetPid => {
                if len >= 13 {
                    state.p_gain = codec::decode_f32([
                        self.rx[1], self.rx[2], self.rx[3], self.rx[4],
                    ]);
                    state.i_gain = codec::decode_f32([
                        self.rx[5], self.rx[6], self.rx[7], self.rx[8],
                    ]);
                    state.d_gain = codec::decode_f32([
                        self.rx[9], self.rx[10], self.rx[11], self.rx[12],
                    ]);
                    // Echo the new gains so the host can confirm them.
                    self.send_gains(link, state)?;
                }
            }

            Command::GetPid => self.send_gains(link, state)?,

            Command::EndRecipe => {
                // Terminator marker, not a command.
                debug!("hmi: stray EndRecipe marker ignored");
            }
        }

        Ok(())
    }

    /// Validate and apply a recipe upload, echoing the re-encoded recipe
    /// on success or a deliberately mangled copy of the input on
    /// rejection.
    fn handle_recipe_upload<L: FrameLink>(
        &mut self,
        link: &mut L,
        state: &mut OvenState,
        len: usize,
    ) -> Result<(), L::Error> {
        // 4 bytes per step flanked by opcode and terminator; at least two
        // steps; never while Running.
        let valid = len >= 10
            && len <= MAX_RECIPE_STEPS * 4 + 2
            && len % 4 == 2
            && self.rx[len - 1] == Command::EndRecipe as u8
            && state.status != OvenStatus::Running;

        if !valid {
            warn!("hmi: rejecting recipe upload ({} bytes)", len);
            self.send_rejection(link, len)?;
            return Ok(());
        }

        let step_count = len / 4;
        let mut steps: heapless::Vec<RecipeStep, MAX_RECIPE_STEPS> = heapless::Vec::new();
        for i in 0..step_count {
            let base = 1 + i * 4;
            let step = RecipeStep {
                time_secs: codec::decode_time([self.rx[base], self.rx[base + 1]]),
                temperature_c: codec::decode_temperature([self.rx[base + 2], self.rx[base + 3]]),
            };
            // Capacity bounded by the length check above.
            let _ = steps.push(step);
        }

        if !state.recipe.replace(&steps) {
            warn!("hmi: recipe replace failed ({} steps)", steps.len());
            self.send_rejection(link, len)?;
            return Ok(());
        }

        // Round-trip confirmation: echo the recipe as parsed, re-encoded.
        self.tx[0] = Command::StartRecipe as u8;
        for (i, step) in state.recipe.steps().iter().enumerate() {
            let base = 1 + i * 4;
            self.tx[base..base + 2].copy_from_slice(&codec::encode_time(step.time_secs));
            self.tx[base + 2..base + 4]
                .copy_from_slice(&codec::encode_temperature(step.temperature_c));
        }
        self.tx[step_count * 4 + 1] = Command::EndRecipe as u8;
        link.send_frame(&self.tx[..step_count * 4 + 2])?;

        state.status = OvenStatus::Standby;
        debug!("hmi: accepted {}-step recipe, entering Standby", step_count);
        Ok(())
    }

    /// Rejection reply: the input frame with its opcode blanked. Same
    /// length as the upload, but never byte-identical to it, so the
    /// host's echo comparison reports the failure at once.
    fn send_rejection<L: FrameLink>(&mut self, link: &mut L, len: usize) -> Result<(), L::Error> {
        self.tx[..len].copy_from_slice(&self.rx[..len]);
        self.tx[0] = 0;
        link.send_frame(&self.tx[..len])
    }

    fn send_gains<L: FrameLink>(
        &mut self,
        link: &mut L,
        state: &OvenState,
    ) -> Result<(), L::Error> {
        self.tx[0..4].copy_from_slice(&codec::encode_f32(state.p_gain));
        self.tx[4..8].copy_from_slice(&codec::encode_f32(state.i_gain));
        self.tx[8..12].copy_from_slice(&codec::encode_f32(state.d_gain));
        link.send_frame(&self.tx[..12])
    }
}

impl Default for HmiProtocol {
    fn default() -> Self {
        Self::new()
    }
}
