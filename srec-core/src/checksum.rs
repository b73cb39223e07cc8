//! S-record checksum: one's complement of the low byte of the sum of the
//! count, address and payload bytes.

/// Running checksum over the bytes of one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    /// Start a checksum seeded with the record's byte count
    pub fn new(count: u8) -> Self {
        Self { sum: count }
    }

    /// Add the low `size` bytes of `address`
    pub fn add_address(&mut self, address: u32, size: usize) {
        for byte in &address.to_be_bytes()[4 - size..] {
            self.add(*byte);
        }
    }

    /// Add a single byte
    pub fn add(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    /// Add a run of bytes
    pub fn add_slice(&mut self, bytes: &[u8]) {
        self.sum = bytes.iter().fold(self.sum, |acc, &b| acc.wrapping_add(b));
    }

    /// Final checksum byte
    pub fn value(&self) -> u8 {
        0xFF - self.sum
    }
}

/// Checksum of a whole record
pub fn checksum(count: u8, address: u32, address_size: usize, payload: &[u8]) -> u8 {
    let mut sum = Checksum::new(count);
    sum.add_address(address, address_size);
    sum.add_slice(payload);
    sum.value()
}
