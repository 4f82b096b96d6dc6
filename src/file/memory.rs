use super::{backend_read, Backend, ImageProvider, SectionMap};
use crate::Result;

/// Image provider backed by an owned buffer
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
    sections: SectionMap,
}

impl Memory {
    /// Create a new memory provider where every RVA equals its file offset
    ///
    /// ## Arguments
    /// * 'data' - The data buffer to consume
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory {
            data,
            sections: SectionMap::identity(),
        }
    }

    /// Create a new memory provider translating RVAs through `sections`
    ///
    /// ## Arguments
    /// * 'data'     - The data buffer to consume
    /// * 'sections' - The section map of the image
    #[must_use]
    pub fn with_sections(data: Vec<u8>, sections: SectionMap) -> Memory {
        Memory { data, sections }
    }

    /// The complete image
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

impl ImageProvider for Memory {
    fn rva_to_offset(&self, rva: u32) -> Result<u64> {
        self.sections.rva_to_offset(rva)
    }

    fn read_bytes(&self, offset: u64, len: usize) -> Result<&[u8]> {
        backend_read(self, offset, len)
    }

    fn image_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{file::Section, Error::OutOfBounds};

    #[test]
    fn memory() {
        let mut data = vec![0xCC_u8; 1048];
        data[10..15].copy_from_slice(&[0xBB; 5]);

        let memory = Memory::new(data);

        assert_eq!(memory.image_len(), 1048);
        assert_eq!(memory.read_bytes(10, 5).unwrap(), &[0xBB, 0xBB, 0xBB, 0xBB, 0xBB]);
        assert_eq!(memory.rva_to_offset(42).unwrap(), 42);

        assert!(memory.read_bytes(u64::from(u32::MAX), u32::MAX as usize).is_err());
        assert!(memory.read_bytes(0, 2048).is_err());
    }

    #[test]
    fn empty_buffer() {
        let memory = Memory::new(vec![]);

        assert!(memory.read_bytes(0, 1).is_err());
        assert!(memory.read_bytes(1, 0).is_err());
        assert!(memory.read_bytes(0, 0).unwrap().is_empty());
        assert!(memory.read_to_end(0).unwrap().is_empty());
    }

    #[test]
    fn offset_overflow() {
        let memory = Memory::new(vec![0x00; 100]);

        assert!(matches!(memory.read_bytes(u64::MAX, 1), Err(OutOfBounds)));
        assert!(matches!(memory.read_bytes(100, 1), Err(OutOfBounds)));
        assert!(matches!(memory.read_bytes(99, 2), Err(OutOfBounds)));
        assert!(matches!(memory.read_to_end(101), Err(OutOfBounds)));
    }

    #[test]
    fn translated_reads() {
        let mut data = vec![0u8; 0x300];
        data[0x210] = 0x2A;

        let memory = Memory::with_sections(
            data,
            SectionMap::new(vec![Section {
                virtual_address: 0x2000,
                virtual_size: 0x100,
                pointer_to_raw_data: 0x200,
                size_of_raw_data: 0x100,
            }]),
        );

        let offset = memory.rva_to_offset(0x2010).unwrap();
        assert_eq!(offset, 0x210);
        assert_eq!(memory.read_bytes(offset, 1).unwrap(), &[0x2A]);
        assert_eq!(memory.read_to_end(offset).unwrap().len(), 0xF0);
    }
}
