/// Circular byte buffer between a device callback and the capture loop.
///
/// Wrap in `Arc<parking_lot::Mutex<PcmRing>>` for cross-thread access.
///
/// Overflow behavior: drops the oldest bytes and counts them, so a
/// stalled consumer shows up in logs instead of blocking the device
/// callback.
#[derive(Debug)]
pub struct PcmRing {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
    dropped: u64,
}

impl PcmRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
            dropped: 0,
        }
    }

    /// Write bytes into the ring.
    ///
    /// If the ring overflows, the oldest bytes are dropped. If `data` is
    /// larger than capacity, only the last `capacity` bytes are kept.
    pub fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        // If more data than capacity, only keep the tail
        let data = if data.len() > self.capacity {
            self.dropped += (data.len() - self.capacity) as u64;
            &data[data.len() - self.capacity..]
        } else {
            data
        };

        // Drop oldest if we'd overflow
        let overflow = (self.available + data.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
            self.dropped += overflow as u64;
        }

        // Write bytes into the circular buffer
        for &byte in data {
            self.buffer[self.write_index] = byte;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += data.len();
    }

    /// Drain up to `dst.len()` bytes into `dst`, returning how many were
    /// copied. Returns 0 when the ring is empty.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let to_read = dst.len().min(self.available);
        if to_read == 0 {
            return 0;
        }

        for slot in dst.iter_mut().take(to_read) {
            *slot = self.buffer[self.read_index];
            self.read_index = (self.read_index + 1) % self.capacity;
        }
        self.available -= to_read;
        to_read
    }

    /// Number of bytes currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Total bytes dropped to overflow since creation or the last reset.
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped
    }

    /// Reset the ring to its empty state, clearing the drop counter.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
        self.dropped = 0;
    }

    /// The total capacity of the ring.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
