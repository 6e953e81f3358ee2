pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_u8(&mut self) -> Result<u8, String> {
        let bytes: [u8; 1] = self.read_array()?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, String> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, String> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a payload prefixed with a `u32` length.
    pub fn read_blob(&mut self) -> Result<Vec<u8>, String> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let bytes = self.take(N)?;
        let mut value = [0u8; N];
        value.copy_from_slice(bytes);
        Ok(value)
    }

    pub fn read_string(&mut self) -> Result<String, String> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| "Invalid UTF-8".to_string())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], String> {
        if self.data.len() < len {
            return Err("Unexpected end of data".to_string());
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }
}

pub struct Writer<'a> {
    data: &'a mut Vec<u8>,
}

impl<'a> Writer<'a> {
    pub fn new(data: &'a mut Vec<u8>) -> Self {
        Self { data }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_blob(&mut self, value: &[u8]) {
        assert!(value.len() <= u32::MAX as usize, "Payload is too large");
        self.write_u32(value.len() as u32);
        self.data.extend_from_slice(value);
    }

    pub fn write_string(&mut self, value: &str) {
        assert!(value.len() <= u16::MAX as usize, "String is too long");
        self.write_u16(value.len() as u16);
        self.data.extend_from_slice(value.as_bytes());
    }
}
