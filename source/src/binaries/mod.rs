use std::io::{self, Read};

/// Fixed-size little endian records that can be pulled straight off a reader.
pub trait BinaryData {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self>
    where
        Self: Sized;
}

impl<T: bytemuck::Pod> BinaryData for T {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self> {
        let mut value = T::zeroed();
        buffer.read_exact(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }
}

/// Decode as many whole `T` records as `bytes` holds. Trailing partial records are ignored.
pub fn read_records<T: bytemuck::Pod>(bytes: &[u8]) -> Box<[T]> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect()
}

/// Reads a nul terminated string, stopping at the end of `bytes` if no nul is found.
pub fn read_cstr(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
