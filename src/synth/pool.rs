//! Fixed-capacity voice allocation.
//!
//! Voices are addressed by packed slot ids that remember which channel and
//! note they were started for. Two ring queues of ids track the pool: `free`
//! holds slots available for new notes, oldest release first; `active` holds
//! sounding notes, oldest first. Note-offs remove entries from the middle of
//! `active` by overwriting them with a tombstone, and tombstones are only
//! compacted away when a queue fills up.

use log::{debug, warn};

use super::channel::ChannelState;
use super::config::POLYPHONY;
use super::normalizer::{Normalizer, SoftLimiter};
use super::voice::Voice;
use super::voice_config::VoiceConfig;

const TOMBSTONE: u32 = u32::MAX;
const NOTE_BITS: u32 = 7;

/// Handle to a pool slot together with the channel and note it plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub channel: u8,
    pub note: u8,
    pub index: usize,
}

/// Bit layout of packed slot ids: `channel | note | index`, with as many index
/// bits as the pool capacity needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLayout {
    index_bits: u32,
}

impl SlotLayout {
    pub fn for_capacity(capacity: usize) -> Self {
        let index_bits = capacity.max(1).next_power_of_two().trailing_zeros();
        Self { index_bits }
    }

    fn index_mask(&self) -> u32 {
        (1 << self.index_bits) - 1
    }

    pub fn pack(&self, slot: SlotId) -> u32 {
        ((slot.channel as u32 & 0x0F) << (self.index_bits + NOTE_BITS))
            | ((slot.note as u32 & 0x7F) << self.index_bits)
            | (slot.index as u32 & self.index_mask())
    }

    pub fn unpack(&self, packed: u32) -> SlotId {
        SlotId {
            channel: (packed >> (self.index_bits + NOTE_BITS)) as u8,
            note: ((packed >> self.index_bits) & 0x7F) as u8,
            index: (packed & self.index_mask()) as usize,
        }
    }

    /// Keeps the index of `old` and stamps it with a new channel and note.
    pub fn retarget(&self, old: u32, channel: u8, note: u8) -> u32 {
        self.pack(SlotId {
            channel,
            note,
            index: (old & self.index_mask()) as usize,
        })
    }
}

/// Ring buffer of packed slot ids with lazy deletion.
#[derive(Clone, Debug)]
pub struct SlotQueue {
    data: Vec<u32>,
    head: usize,
    tail: usize,
    mask: usize,
}

impl SlotQueue {
    /// A queue able to hold `capacity` live ids. One ring position always
    /// stays empty to tell a full ring from an empty one.
    pub fn with_capacity(capacity: usize) -> Self {
        let size = (capacity + 1).next_power_of_two();
        Self {
            data: vec![TOMBSTONE; size],
            head: 0,
            tail: 0,
            mask: size - 1,
        }
    }

    pub fn push(&mut self, id: u32) -> bool {
        if self.is_full() {
            self.gc();
        }
        if self.is_full() {
            return false;
        }
        self.data[self.head] = id;
        self.head = (self.head + 1) & self.mask;
        true
    }

    /// Removes and returns the oldest live id.
    pub fn pop(&mut self) -> Option<u32> {
        if self.is_empty() {
            return None;
        }
        let id = self.data[self.tail];
        self.tail = (self.tail + 1) & self.mask;
        Some(id)
    }

    /// True when no live ids remain. Skips tombstones at the tail as it goes.
    pub fn is_empty(&mut self) -> bool {
        while self.head != self.tail {
            if self.data[self.tail] != TOMBSTONE {
                return false;
            }
            self.tail = (self.tail + 1) & self.mask;
        }
        true
    }

    pub fn is_full(&self) -> bool {
        (self.head + 1) & self.mask == self.tail
    }

    /// Tombstones the oldest live id matching `predicate` and returns it.
    pub fn take_first(&mut self, mut predicate: impl FnMut(u32) -> bool) -> Option<u32> {
        let position = self.positions().find(|&p| predicate(self.data[p]))?;
        let id = self.data[position];
        self.data[position] = TOMBSTONE;
        Some(id)
    }

    /// Live ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.positions().map(|p| self.data[p])
    }

    pub fn len(&self) -> usize {
        self.positions().count()
    }

    fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        let occupied = self.head.wrapping_sub(self.tail) & self.mask;
        (0..occupied)
            .map(move |offset| (self.tail + offset) & self.mask)
            .filter(move |&p| self.data[p] != TOMBSTONE)
    }

    /// Slides live ids toward the tail over any tombstones.
    fn gc(&mut self) {
        let mut dest = self.tail;
        let mut src = self.tail;
        while src != self.head {
            if self.data[src] != TOMBSTONE {
                self.data[dest] = self.data[src];
                dest = (dest + 1) & self.mask;
            }
            src = (src + 1) & self.mask;
        }
        self.head = dest;
    }
}

/// The voice pool: `POLYPHONY` voices and the queues that hand them out.
pub struct VoicePool {
    voices: Vec<Voice>,
    layout: SlotLayout,
    free: SlotQueue,
    active: SlotQueue,
    normalizer: Box<dyn Normalizer + Send>,
}

impl VoicePool {
    pub fn new() -> Self {
        Self::with_normalizer(Box::new(SoftLimiter))
    }

    pub fn with_normalizer(normalizer: Box<dyn Normalizer + Send>) -> Self {
        let layout = SlotLayout::for_capacity(POLYPHONY);
        let mut free = SlotQueue::with_capacity(POLYPHONY);
        for index in 0..POLYPHONY {
            free.push(layout.pack(SlotId {
                channel: 0,
                note: 0,
                index,
            }));
        }
        Self {
            voices: (0..POLYPHONY).map(|_| Voice::new()).collect(),
            layout,
            free,
            active: SlotQueue::with_capacity(POLYPHONY),
            normalizer,
        }
    }

    /// Starts a note. When every slot is busy the oldest active note is cut
    /// off without a release and its slot reused.
    pub fn note_on(
        &mut self,
        note: u8,
        velocity: u8,
        config: &VoiceConfig,
        channel: &ChannelState,
    ) -> Option<SlotId> {
        let recycled = match self.free.pop() {
            Some(id) => id,
            None => {
                let stolen = self.active.pop()?;
                debug!("stealing voice {:?}", self.layout.unpack(stolen));
                stolen
            }
        };
        let packed = self.layout.retarget(recycled, channel.index, note);
        let slot = self.layout.unpack(packed);
        self.voices[slot.index].note_on(note, velocity as f32 / 127.0, config, channel);
        if !self.active.push(packed) {
            warn!("active slot queue overflow, dropping {slot:?}");
        }
        Some(slot)
    }

    /// Releases the oldest active note matching `channel` and `note`.
    pub fn note_off(&mut self, channel: u8, note: u8) -> Option<SlotId> {
        let layout = self.layout;
        let packed = self.active.take_first(|id| {
            let slot = layout.unpack(id);
            slot.channel == channel && slot.note == note
        })?;
        let slot = layout.unpack(packed);
        self.voices[slot.index].note_off();
        self.free.push(packed);
        Some(slot)
    }

    /// Retunes every active note of the channel.
    pub fn pitch_bend(&mut self, channel: &ChannelState) {
        let layout = self.layout;
        for id in self.active.iter() {
            let slot = layout.unpack(id);
            if slot.channel == channel.index {
                self.voices[slot.index].pitch_bend(channel);
            }
        }
    }

    /// Releases every active note; voices keep sounding through their release.
    pub fn all_notes_off(&mut self) {
        while let Some(id) = self.active.pop() {
            self.voices[self.layout.unpack(id).index].note_off();
            self.free.push(id);
        }
    }

    /// Frees every slot and silences every voice at once.
    pub fn reset(&mut self) {
        while let Some(id) = self.active.pop() {
            self.free.push(id);
        }
        self.voices.iter_mut().for_each(Voice::reset);
    }

    /// Mixes one output sample from all voices.
    pub fn render(&mut self) -> f32 {
        let mut output = 0.0;
        let mut weight = 0.0;
        for voice in self.voices.iter_mut() {
            output += voice.render();
            weight += voice.current_level();
        }
        self.normalizer.normalize(output, weight)
    }

    pub fn advance(&mut self) {
        self.voices.iter_mut().for_each(Voice::advance);
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Notes currently held, oldest first.
    pub fn active_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.active.iter().map(|id| self.layout.unpack(id))
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_round_trips_fields() {
        let layout = SlotLayout::for_capacity(16);
        let slot = SlotId {
            channel: 15,
            note: 127,
            index: 15,
        };
        assert_eq!(layout.unpack(layout.pack(slot)), slot);
        assert_ne!(layout.pack(slot), TOMBSTONE);
        assert_eq!(layout.pack(slot), (15 << 11) | (127 << 4) | 15);
    }

    #[test]
    fn queue_holds_full_capacity() {
        let mut queue = SlotQueue::with_capacity(16);
        for id in 0..16 {
            assert!(queue.push(id));
        }
        assert_eq!(queue.len(), 16);
        assert_eq!(queue.pop(), Some(0));
    }

    #[test]
    fn queue_skips_tombstones_when_popping() {
        let mut queue = SlotQueue::with_capacity(4);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.take_first(|id| id == 1), Some(1));
        assert_eq!(queue.take_first(|id| id == 1), None);
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_compacts_tombstones() {
        let mut queue = SlotQueue::with_capacity(4);
        for id in 0..7 {
            assert!(queue.push(id));
        }
        assert!(queue.is_full());
        queue.take_first(|id| id == 2);
        queue.take_first(|id| id == 4);
        assert!(queue.push(7));
        assert!(queue.push(8));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![0, 1, 3, 5, 6, 7, 8]);
        assert!(!queue.push(9));
    }

    #[test]
    fn queue_wraps_around_the_ring() {
        let mut queue = SlotQueue::with_capacity(2);
        for round in 0..10 {
            assert!(queue.push(round));
            assert!(queue.push(round + 100));
            assert_eq!(queue.pop(), Some(round));
            assert_eq!(queue.pop(), Some(round + 100));
        }
        assert!(queue.is_empty());
    }
}
