//! Session progress bookkeeping

/// Monotonic progress counters for one recording session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCounter {
    chars_total: usize,
    chars_done: usize,
    trigrams_per_char: usize,
    repeats_per_trigram: usize,
    trigrams_done: usize,
    repeats_done: usize,
}

impl SessionCounter {
    pub fn new(chars_total: usize, trigrams_per_char: usize, repeats_per_trigram: usize) -> Self {
        Self {
            chars_total,
            chars_done: 0,
            trigrams_per_char,
            repeats_per_trigram,
            trigrams_done: 0,
            repeats_done: 0,
        }
    }

    /// One more repetition captured
    pub fn increment(&mut self) {
        self.repeats_done += 1;
    }

    pub fn finish_trigram(&mut self) {
        self.trigrams_done += 1;
    }

    pub fn finish_char(&mut self) {
        self.chars_done += 1;
    }

    /// Account for `trigrams` planned trigrams that will never be recorded
    pub fn skip_trigrams(&mut self, trigrams: usize) {
        self.trigrams_done += trigrams;
        self.repeats_done += trigrams * self.repeats_per_trigram;
    }

    pub fn chars_total(&self) -> usize {
        self.chars_total
    }

    pub fn chars_done(&self) -> usize {
        self.chars_done
    }

    pub fn trigrams_per_char(&self) -> usize {
        self.trigrams_per_char
    }

    pub fn repeats_per_trigram(&self) -> usize {
        self.repeats_per_trigram
    }

    pub fn total_trigrams(&self) -> usize {
        self.chars_total * self.trigrams_per_char
    }

    pub fn trigrams_done(&self) -> usize {
        self.trigrams_done
    }

    pub fn total_repeats(&self) -> usize {
        self.total_trigrams() * self.repeats_per_trigram
    }

    pub fn repeats_done(&self) -> usize {
        self.repeats_done
    }
}
