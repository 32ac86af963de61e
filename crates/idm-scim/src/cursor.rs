// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rewindable character reader shared by the path and filter tokenizers.

/// A character cursor over an expression.
///
/// Positions are character offsets. A cursor created with [`Cursor::with_base`]
/// reports positions shifted by the base, so a cursor over a fragment of a
/// larger expression reports offsets in the coordinates of the whole
/// expression.
#[derive(Debug, Clone)]
pub struct Cursor {
	chars: Vec<char>,
	pos: usize,
	mark: usize,
	base: usize,
}

impl Cursor {
	pub fn new(text: &str) -> Self {
		Self::with_base(text, 0)
	}

	pub fn with_base(text: &str, base: usize) -> Self {
		Self {
			chars: text.chars().collect(),
			pos: 0,
			mark: 0,
			base,
		}
	}

	/// Reads the next character, `None` at the end of input.
	pub fn read(&mut self) -> Option<char> {
		let c = self.chars.get(self.pos).copied()?;
		self.pos += 1;
		Some(c)
	}

	/// Steps back one character.
	pub fn unread(&mut self) {
		self.pos = self.pos.saturating_sub(1);
	}

	/// Remembers the current position for a later [`Cursor::reset`].
	pub fn mark(&mut self) {
		self.mark = self.pos;
	}

	/// Rewinds to the last mark.
	pub fn reset(&mut self) {
		self.pos = self.mark;
	}

	/// Advances up to `n` characters and returns how many were skipped.
	pub fn skip(&mut self, n: usize) -> usize {
		let skipped = n.min(self.remaining());
		self.pos += skipped;
		skipped
	}

	/// Drains everything that is left into a string.
	pub fn read_to_end(&mut self) -> String {
		let rest: String = self.chars[self.pos..].iter().collect();
		self.pos = self.chars.len();
		rest
	}

	pub fn remaining(&self) -> usize {
		self.chars.len() - self.pos
	}

	pub fn is_at_end(&self) -> bool {
		self.pos >= self.chars.len()
	}

	/// Absolute offset of the next character to be read.
	pub fn position(&self) -> usize {
		self.base + self.pos
	}

	/// Absolute offset of the last mark.
	pub fn marked(&self) -> usize {
		self.base + self.mark
	}
}
