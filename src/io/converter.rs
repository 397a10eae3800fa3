use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

/// Map a MIDI event on `channel_filter` to a synth message.
///
/// A note-on with velocity 0 is a note-off, per the MIDI running-status
/// convention.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }

    match midi {
        MidiEvent::NoteOn { key, velocity, .. } if velocity == 0 => Some(SynthMessage::NoteOff {
            note: key,
            velocity: 0,
        }),
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff { key, velocity, .. } => Some(SynthMessage::NoteOff {
            note: key,
            velocity,
        }),
        MidiEvent::ControlChange { controller, .. } => match controller {
            CC_ALL_SOUND_OFF => Some(SynthMessage::AllSoundOff),
            CC_ALL_NOTES_OFF => Some(SynthMessage::AllNotesOff),
            _ => None,
        },
    }
}
