/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All effects are generated as in-memory WAV buffers at init time.
/// Effect playback is fire-and-forget (non-blocking) via rodio's Sink.
/// Music is a looping procedural line on a dedicated sink, switched
/// between the normal and boss themes by game events.
///
/// Compile with `--no-default-features` or without the "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

/// Which background line is playing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Music {
    Normal,
    Boss,
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::source::Source;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Music;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_attack: [Arc<Vec<u8>>; 3],
        sfx_jump: Arc<Vec<u8>>,
        sfx_dash: Arc<Vec<u8>>,
        sfx_hurt: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_enemy_down: Arc<Vec<u8>>,
        sfx_vanish: Arc<Vec<u8>>,
        sfx_boss_special: Arc<Vec<u8>>,
        sfx_boss_impact: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        music_normal: Arc<Vec<u8>>,
        music_boss: Arc<Vec<u8>>,
        music_sink: std::cell::RefCell<Option<Sink>>,
        current_music: std::cell::Cell<Option<Music>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx_attack = [
                Arc::new(make_wav(&gen_swing(520.0))),
                Arc::new(make_wav(&gen_swing(620.0))),
                Arc::new(make_wav(&gen_swing(440.0))),
            ];

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_attack,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_dash: Arc::new(make_wav(&gen_dash())),
                sfx_hurt: Arc::new(make_wav(&gen_hurt())),
                sfx_death: Arc::new(make_wav(&gen_death())),
                sfx_enemy_down: Arc::new(make_wav(&gen_enemy_down())),
                sfx_vanish: Arc::new(make_wav(&gen_vanish())),
                sfx_boss_special: Arc::new(make_wav(&gen_boss_special())),
                sfx_boss_impact: Arc::new(make_wav(&gen_boss_impact())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
                music_normal: Arc::new(make_wav(&gen_music_normal())),
                music_boss: Arc::new(make_wav(&gen_music_boss())),
                music_sink: std::cell::RefCell::new(None),
                current_music: std::cell::Cell::new(None),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_attack(&self, combo: u8) {
            self.play(&self.sfx_attack[(combo as usize) % 3]);
        }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_dash(&self) { self.play(&self.sfx_dash); }
        pub fn play_hurt(&self) { self.play(&self.sfx_hurt); }
        pub fn play_death(&self) { self.play(&self.sfx_death); }
        pub fn play_enemy_down(&self) { self.play(&self.sfx_enemy_down); }
        pub fn play_vanish(&self) { self.play(&self.sfx_vanish); }
        pub fn play_boss_special(&self) { self.play(&self.sfx_boss_special); }
        pub fn play_boss_impact(&self) { self.play(&self.sfx_boss_impact); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }

        /// Switch the looping background line. No-op if it is already
        /// the active one.
        pub fn play_music(&self, music: Music) {
            if self.current_music.get() == Some(music) {
                return;
            }
            self.stop_music();
            let buf = match music {
                Music::Normal => &self.music_normal,
                Music::Boss => &self.music_boss,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src.repeat_infinite());
                    sink.set_volume(0.5);
                    *self.music_sink.borrow_mut() = Some(sink);
                    self.current_music.set(Some(music));
                }
            }
        }

        pub fn stop_music(&self) {
            if let Some(sink) = self.music_sink.borrow_mut().take() {
                sink.stop();
            }
            self.current_music.set(None);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Short noise-edged whoosh for a sword swing.
    fn gen_swing(freq: f32) -> Vec<f32> {
        let duration = 0.09;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 77777;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let sweep = freq + t * 300.0;
                let tone = (ti * sweep * 2.0 * std::f32::consts::PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.2);
                (tone * 0.5 + noise * 0.5) * env * 0.25
            })
            .collect()
    }

    /// Jump: quick rising chirp.
    fn gen_jump() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 500.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.22
            })
            .collect()
    }

    /// Dash: breathy burst with a falling edge.
    fn gen_dash() -> Vec<f32> {
        let duration = 0.15;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 24601;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.5);
                noise * env * 0.2
            })
            .collect()
    }

    /// Player hurt: short dissonant bite.
    fn gen_hurt() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let wave = (ti * 220.0 * 2.0 * std::f32::consts::PI).sin() * 0.5
                    + (ti * 233.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
                wave * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Player death: sad descending tone.
    fn gen_death() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0]; // A4→F#4→Eb4→C4
        let note_dur = 0.12;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin();
                samples.push(wave * env * 0.3);
            }
        }
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Enemy death: two falling square-ish notes.
    fn gen_enemy_down() -> Vec<f32> {
        let pairs = [(392.0_f32, 0.07), (262.0, 0.12)];
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Duwende vanish: shimmering downward glide.
    fn gen_vanish() -> Vec<f32> {
        let duration = 0.25;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 600.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tremolo = 1.0 + (ti * 30.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
                let env = (1.0 - t).powf(0.8);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * tremolo * env * 0.15
            })
            .collect()
    }

    /// Boss leap: rising growl.
    fn gen_boss_special() -> Vec<f32> {
        let duration = 0.3;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 90.0 + t * 160.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let wave = (ti * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (ti * freq * 1.5 * 2.0 * std::f32::consts::PI).sin() * 0.4;
                wave * (1.0 - t * 0.4) * 0.3
            })
            .collect()
    }

    /// Boss landing: low thud with noise tail.
    fn gen_boss_impact() -> Vec<f32> {
        let duration = 0.22;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 31337;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 120.0 - t * 60.0;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.8);
                (tone * 0.7 + noise * 0.3) * env * 0.35
            })
            .collect()
    }

    /// Stage clear: victory ascending fanfare.
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = (t * last_freq * 2.0 * std::f32::consts::PI).sin();
            samples.push(wave * env * 0.3);
        }
        samples
    }

    /// Four-bar loop over a walking bass line.
    fn gen_music_normal() -> Vec<f32> {
        let line = [220.0_f32, 262.0, 330.0, 262.0, 220.0, 196.0, 220.0, 262.0];
        gen_loop(&line, 0.28, 0.10)
    }

    /// Tighter, lower, faster line for the boss.
    fn gen_music_boss() -> Vec<f32> {
        let line = [147.0_f32, 147.0, 175.0, 147.0, 139.0, 147.0, 196.0, 175.0];
        gen_loop(&line, 0.18, 0.13)
    }

    fn gen_loop(line: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in line {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.6;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_attack(&self, _combo: u8) {}
    pub fn play_jump(&self) {}
    pub fn play_dash(&self) {}
    pub fn play_hurt(&self) {}
    pub fn play_death(&self) {}
    pub fn play_enemy_down(&self) {}
    pub fn play_vanish(&self) {}
    pub fn play_boss_special(&self) {}
    pub fn play_boss_impact(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_music(&self, _music: Music) {}
    pub fn stop_music(&self) {}
}
