// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded stderr capture so a noisy agent can't exhaust memory (§5).

const MAX_RING_BYTES: usize = 16 * 1024;
const TAIL_CHARS: usize = 500;

#[derive(Debug, Default, Clone)]
pub struct StderrRing {
    buf: String,
}

impl StderrRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
        if self.buf.len() > MAX_RING_BYTES {
            let excess = self.buf.len() - MAX_RING_BYTES;
            let cut = self.buf.char_indices().map(|(i, _)| i).find(|&i| i >= excess).unwrap_or(self.buf.len());
            self.buf.drain(..cut);
        }
    }

    /// The last up-to-500 characters, for embedding in error messages.
    pub fn tail(&self) -> String {
        let char_count = self.buf.chars().count();
        if char_count <= TAIL_CHARS {
            self.buf.clone()
        } else {
            self.buf.chars().skip(char_count - TAIL_CHARS).collect()
        }
    }
}

#[cfg(test)]
#[path = "stderr_ring_tests.rs"]
mod tests;
