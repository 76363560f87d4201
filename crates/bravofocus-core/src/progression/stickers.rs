use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Stickers a level-up can award.
pub const STICKER_EMOJIS: [&str; 20] = [
    "🏆", "🚀", "🌟", "⚡", "🎯", "🔥", "💎", "🎖️", "🏅", "🎪",
    "🎭", "🎨", "🦄", "🐉", "🦅", "🌈", "⭐", "✨", "💫", "🎊",
];

/// Uniform choice of an index in `0..len`.
///
/// Any `FnMut(usize) -> usize` works, which lets tests pin the sticker.
pub trait StickerPicker {
    fn pick_index(&mut self, len: usize) -> usize;
}

impl<F: FnMut(usize) -> usize> StickerPicker for F {
    fn pick_index(&mut self, len: usize) -> usize {
        self(len)
    }
}

/// Thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl StickerPicker for RandomPicker {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Reproducible picks from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededPicker(Pcg64);

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self(Pcg64::seed_from_u64(seed))
    }
}

impl StickerPicker for SeededPicker {
    fn pick_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

pub fn pick_sticker<P: StickerPicker + ?Sized>(picker: &mut P) -> &'static str {
    // Out-of-range picks wrap instead of panicking.
    let index = picker.pick_index(STICKER_EMOJIS.len()) % STICKER_EMOJIS.len();
    STICKER_EMOJIS[index]
}
