use std::sync::Arc;

use crate::{
    dsp::wavetable::WavetableBank,
    params::ParamSnapshot,
    synth::{
        message::{MessageReceiver, SynthMessage},
        voice::{Voice, VoiceState},
    },
};

/// Fixed-size pool of voices sharing one wavetable bank.
///
/// A note-on first sends any voice still holding that key into release, so a
/// re-struck key rings out underneath the new note. The new note then takes:
///
/// 1. the first free voice
/// 2. the oldest releasing voice
/// 3. the oldest active voice
///
/// "Oldest" compares the note-on counter; ties go to the lowest index. The
/// pool never grows and never drops a note.
pub struct PolySynth {
    voices: Box<[Voice]>,
    bank: Arc<WavetableBank>,
    next_age: u64,
    sample_rate: f32,
}

impl PolySynth {
    pub fn new(
        sample_rate: f32,
        max_voices: usize,
        bank: Arc<WavetableBank>,
        params: &ParamSnapshot,
    ) -> Self {
        let voices = (0..max_voices.max(1))
            .map(|_| Voice::new(&bank, sample_rate, params))
            .collect();

        Self {
            voices,
            bank,
            next_age: 0,
            sample_rate,
        }
    }

    /// Start `note` and return the index of the voice that plays it.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> usize {
        for voice in self.voices.iter_mut().filter(|v| v.note() == note) {
            voice.stop();
        }

        let index = self.allocate_voice();
        let age = self.next_age;
        self.next_age += 1;

        self.voices[index].start(note, velocity, age);
        index
    }

    pub fn note_off(&mut self, note: u8) {
        if let Some(voice) = self.find_voice(note) {
            voice.stop();
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.stop();
        }
    }

    pub fn all_sound_off(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.kill();
        }
    }

    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity } => {
                self.note_on(note, velocity);
            }
            SynthMessage::NoteOff { note, .. } => self.note_off(note),
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::AllSoundOff => self.all_sound_off(),
        }
    }

    /// Apply every queued message.
    pub fn drain<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) {
        while let Some(msg) = rx.pop() {
            self.handle_message(msg);
        }
    }

    /// Overwrite `out` with the sum of all voices.
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        for voice in self.voices.iter_mut() {
            voice.render_add(out);
        }
    }

    pub fn apply_params(&mut self, params: &ParamSnapshot) {
        for voice in self.voices.iter_mut() {
            voice.apply_params(params);
        }
    }

    /// Load table `index` into `slot` on every voice.
    pub fn set_wavetable(&mut self, slot: usize, index: usize) {
        for voice in self.voices.iter_mut() {
            voice.set_wavetable(slot, index, &self.bank);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for voice in self.voices.iter_mut() {
            voice.kill();
            voice.set_sample_rate(sample_rate);
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of voices that are not free.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_busy()).count()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    fn allocate_voice(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return idx;
        }

        self.oldest_in(VoiceState::Releasing)
            .or_else(|| self.oldest_in(VoiceState::Active))
            .unwrap_or(0)
    }

    fn oldest_in(&self, state: VoiceState) -> Option<usize> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == state)
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx)
    }

    fn find_voice(&mut self, note: u8) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| v.note() == note && v.state() == VoiceState::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_VOICE_COUNT;

    fn synth() -> PolySynth {
        PolySynth::new(
            48_000.0,
            DEFAULT_VOICE_COUNT,
            Arc::new(WavetableBank::builtin()),
            &ParamSnapshot::default(),
        )
    }

    #[test]
    fn idle_synth_renders_exact_silence() {
        let mut synth = synth();
        let mut out = vec![1.0f32; 512];
        synth.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn ninth_note_steals_exactly_one_voice() {
        let mut synth = synth();
        for (i, note) in (60..68).enumerate() {
            assert_eq!(synth.note_on(note, 100), i);
        }
        assert_eq!(synth.active_voice_count(), 8);

        let stolen = synth.note_on(72, 100);
        assert_eq!(stolen, 0, "oldest active voice is stolen");
        assert_eq!(synth.active_voice_count(), 8);

        let notes: Vec<u8> = synth.voices().iter().map(|v| v.note()).collect();
        assert_eq!(notes, vec![72, 61, 62, 63, 64, 65, 66, 67]);
    }

    #[test]
    fn releasing_voices_are_stolen_before_active_ones() {
        let mut synth = synth();
        for note in 60..68 {
            synth.note_on(note, 100);
        }
        synth.note_off(65);
        synth.note_off(63);

        // 63 started before 65, so it is the oldest releasing voice
        assert_eq!(synth.note_on(80, 100), 3);
        assert_eq!(synth.note_on(81, 100), 5);
        assert_eq!(synth.note_on(82, 100), 0);
    }

    #[test]
    fn restruck_note_rings_out_on_a_new_voice() {
        let mut synth = synth();
        assert_eq!(synth.note_on(60, 100), 0);
        assert_eq!(synth.note_on(64, 100), 1);

        // Held key struck again: the old voice releases, a free one takes over
        assert_eq!(synth.note_on(60, 90), 2);
        assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);
        assert_eq!(synth.voices()[2].state(), VoiceState::Active);
        assert_eq!(synth.active_voice_count(), 3);

        synth.note_off(60);
        assert_eq!(synth.voices()[2].state(), VoiceState::Releasing);

        // Released key struck again while its tail is still sounding
        let mut out = vec![0.0f32; 4_800];
        synth.render_block(&mut out);
        assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);
        assert_eq!(synth.note_on(60, 100), 3);
        assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);
        assert_eq!(synth.voices()[0].note(), 60);
    }

    #[test]
    fn messages_drive_the_pool() {
        let mut synth = synth();
        synth.handle_message(SynthMessage::NoteOn {
            note: 60,
            velocity: 100,
        });
        synth.handle_message(SynthMessage::NoteOn {
            note: 67,
            velocity: 100,
        });
        assert_eq!(synth.active_voice_count(), 2);

        synth.handle_message(SynthMessage::NoteOff {
            note: 60,
            velocity: 0,
        });
        assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);

        synth.handle_message(SynthMessage::AllNotesOff);
        assert_eq!(synth.voices()[1].state(), VoiceState::Releasing);

        synth.handle_message(SynthMessage::AllSoundOff);
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn drains_a_receiver() {
        struct Script(Vec<SynthMessage>);

        impl MessageReceiver for Script {
            fn pop(&mut self) -> Option<SynthMessage> {
                if self.0.is_empty() {
                    None
                } else {
                    Some(self.0.remove(0))
                }
            }
        }

        let mut synth = synth();
        let mut rx = Script(vec![
            SynthMessage::NoteOn {
                note: 50,
                velocity: 80,
            },
            SynthMessage::NoteOn {
                note: 55,
                velocity: 80,
            },
        ]);
        synth.drain(&mut rx);
        assert_eq!(synth.active_voice_count(), 2);
        assert!(rx.0.is_empty());
    }

    #[test]
    fn slot_changes_reach_every_voice() {
        let mut synth = synth();
        synth.set_wavetable(4, 17);
        assert!(synth.voices().iter().all(|v| v.table_indices()[4] == 17));
    }

    #[test]
    fn voices_return_to_pool_after_release() {
        let mut params = ParamSnapshot::default();
        params.amp_env.release = 0.005;

        let mut synth = PolySynth::new(
            48_000.0,
            4,
            Arc::new(WavetableBank::builtin()),
            &params,
        );
        synth.note_on(60, 100);
        synth.note_on(64, 100);

        let mut out = vec![0.0f32; 1_024];
        synth.render_block(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));

        synth.all_notes_off();
        synth.render_block(&mut out);
        assert_eq!(synth.active_voice_count(), 0);

        synth.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
